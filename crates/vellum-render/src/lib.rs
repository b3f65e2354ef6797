//! # Vellum Render - Theme Rendering Façade
//!
//! `vellum-render` is the rendering layer of a multi-tenant storefront
//! theming platform. It wraps an embedded template engine (MiniJinja) with
//! the pieces a theme runtime needs around it:
//!
//! - [`HelperDescriptor`] / [`HelperRegistry`]: helpers built from a shared
//!   [`HelperContext`] (settings, translator, content regions, scratch)
//! - [`TemplateStore`]: partials keyed by logical path, first registration wins
//! - [`PrecompiledArtifact`]: build-time compiled templates, detected and
//!   restored at registration
//! - [`DecoratorChain`]: ordered post-render transforms
//! - [`Error`]: one error type with five [`ErrorKind`]s
//!
//! ## Quick Start
//!
//! ```rust
//! use minijinja::Value;
//! use serde_json::json;
//! use vellum_render::{helper_fn, HelperDescriptor, Renderer, RendererConfig};
//!
//! let store_name = HelperDescriptor::new("store_name", |ctx| {
//!     let name = ctx.site_settings().get("name").cloned().unwrap_or_default();
//!     Ok(helper_fn(move |_, _| Ok(Value::from_serialize(&name))))
//! });
//!
//! let mut settings = serde_json::Map::new();
//! settings.insert("name".into(), json!("Acme"));
//! let config = RendererConfig::default().with_site_settings(settings);
//!
//! let mut renderer = Renderer::new(config, vec![store_name]).unwrap();
//! renderer
//!     .add_templates([
//!         ("components/header", "<h1>{{ store_name() }}</h1>"),
//!         ("pages/home", "{% include 'components/header' %}<p>{{ tagline }}</p>"),
//!     ])
//!     .unwrap();
//!
//! let html = renderer.render("pages/home", &json!({"tagline": "Hello"})).unwrap();
//! assert_eq!(html, "<h1>Acme</h1><p>Hello</p>");
//! ```
//!
//! ## Precompiled Templates
//!
//! ```rust
//! use vellum_render::{Renderer, RendererConfig};
//!
//! let builder = Renderer::new(RendererConfig::default(), Vec::new()).unwrap();
//! let artifacts = builder
//!     .pre_processor()
//!     .process([("pages/cart", "{{ items | length }} items")])
//!     .unwrap();
//!
//! let mut runtime = Renderer::new(RendererConfig::default(), Vec::new()).unwrap();
//! runtime.add_templates(artifacts).unwrap();
//! let out = runtime
//!     .render("pages/cart", &serde_json::json!({"items": [1, 2]}))
//!     .unwrap();
//! assert_eq!(out, "2 items");
//! ```

mod config;
mod context;
mod decorator;
mod engine;
mod error;
mod helper;
pub mod precompiled;
mod renderer;
mod store;

pub use config::{ConfigError, EscapeMode, RendererConfig, ScratchScope, UndefinedMode};
pub use context::{ContentRegions, HelperContext, Scratch, Translator};
pub use decorator::{Decorator, DecoratorChain};
pub use engine::{CompiledTemplate, MiniJinjaEngine, TemplateEngine};
pub use error::{BoxError, Error, ErrorKind, Result};
pub use helper::{
    helper_fn, EmptyHelperName, HelperDescriptor, HelperFactory, HelperFn, HelperRegistry,
};
pub use precompiled::{classify, looks_precompiled, Payload, PrecompiledArtifact};
pub use renderer::{PreProcessor, Renderer};
pub use store::{StoredTemplate, TemplateOrigin, TemplateStore};
