//! The theme renderer.
//!
//! [`Renderer`] ties the pieces together: it owns the engine, the shared
//! [`HelperContext`], the [`TemplateStore`] and the [`DecoratorChain`].
//!
//! # Lifecycle
//!
//! 1. Construction builds the helper context from the configuration, runs
//!    every helper factory and registers the helpers with the engine.
//! 2. Setup: [`add_templates`](Renderer::add_templates),
//!    [`add_decorator`](Renderer::add_decorator),
//!    [`set_translator`](Renderer::set_translator),
//!    [`add_content`](Renderer::add_content). These take `&mut self`.
//! 3. Rendering: [`render`](Renderer::render) and
//!    [`render_string`](Renderer::render_string) take `&self`, so a configured
//!    renderer can be shared behind an `Arc` and used from many threads.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use vellum_render::{Renderer, RendererConfig};
//!
//! let mut renderer = Renderer::new(RendererConfig::default(), Vec::new()).unwrap();
//! renderer
//!     .add_templates([("home", "<h1>{{ title }}</h1> ({{ template }})")])
//!     .unwrap();
//! renderer.add_decorator(|html: String| Ok(html.to_uppercase()));
//!
//! let out = renderer.render("home", &json!({"title": "Sale"})).unwrap();
//! assert_eq!(out, "<H1>SALE</H1> (HOME)");
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::config::{RendererConfig, ScratchScope};
use crate::context::{ContentRegions, HelperContext, Translator};
use crate::decorator::{Decorator, DecoratorChain};
use crate::engine::{MiniJinjaEngine, TemplateEngine};
use crate::error::{BoxError, Error, Result};
use crate::helper::HelperRegistry;
use crate::store::TemplateStore;

/// Renders registered partials and ad-hoc template strings.
pub struct Renderer {
    engine: Box<dyn TemplateEngine>,
    context: Arc<HelperContext>,
    store: TemplateStore,
    decorators: DecoratorChain,
    scratch_scope: ScratchScope,
}

impl Renderer {
    /// Creates a renderer on the default MiniJinja engine.
    ///
    /// # Errors
    ///
    /// Returns the first helper factory error, unchanged.
    pub fn new(
        config: RendererConfig,
        helpers: impl Into<HelperRegistry>,
    ) -> std::result::Result<Self, BoxError> {
        let engine = Box::new(MiniJinjaEngine::new(&config));
        Self::with_engine(config, helpers, engine)
    }

    /// Creates a renderer driving a custom engine.
    pub fn with_engine(
        config: RendererConfig,
        helpers: impl Into<HelperRegistry>,
        mut engine: Box<dyn TemplateEngine>,
    ) -> std::result::Result<Self, BoxError> {
        let RendererConfig {
            site_settings,
            theme_settings,
            scratch,
            ..
        } = config;
        let context = Arc::new(HelperContext::new(site_settings, theme_settings));

        helpers.into().register_all(engine.as_mut(), &context)?;

        Ok(Self {
            engine,
            context,
            store: TemplateStore::new(),
            decorators: DecoratorChain::new(),
            scratch_scope: scratch,
        })
    }

    /// Sets the translator used for `locale_name` and by helpers.
    pub fn set_translator(&mut self, translator: impl Translator + 'static) {
        self.context.set_translator(Some(Arc::new(translator)));
    }

    /// Removes the translator.
    pub fn clear_translator(&mut self) {
        self.context.set_translator(None);
    }

    pub fn translator(&self) -> Option<Arc<dyn Translator>> {
        self.context.translator()
    }

    /// Registers partials; paths already loaded are skipped.
    ///
    /// Payloads may be raw template source or precompiled artifacts as
    /// produced by [`PreProcessor::process`]. See
    /// [`TemplateStore::add_templates`] for the failure rules.
    pub fn add_templates<I, K, V>(&mut self, templates: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        self.store.add_templates(self.engine.as_mut(), templates)
    }

    pub fn is_template_loaded(&self, path: &str) -> bool {
        self.store.is_template_loaded(path)
    }

    /// Registered partial paths, in no particular order.
    pub fn template_paths(&self) -> impl Iterator<Item = &str> {
        self.store.paths()
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// Returns a pre-processor that precompiles templates with this
    /// renderer's engine.
    pub fn pre_processor(&self) -> PreProcessor<'_> {
        PreProcessor {
            engine: self.engine.as_ref(),
        }
    }

    /// Precompiles one template source into its serialized artifact.
    pub fn precompile(&self, source: &str) -> Result<String> {
        self.engine.precompile(source)?.to_json()
    }

    /// Appends a decorator to the chain applied after [`render`](Self::render).
    pub fn add_decorator<D: Decorator + 'static>(&mut self, decorator: D) {
        self.decorators.push(decorator);
    }

    /// Replaces the content regions exposed to helpers.
    pub fn add_content(&mut self, regions: ContentRegions) {
        self.context.set_content(regions);
    }

    pub fn content(&self) -> Arc<ContentRegions> {
        self.context.content()
    }

    /// The context shared with every helper.
    pub fn helper_context(&self) -> &Arc<HelperContext> {
        &self.context
    }

    /// Renders the partial registered under `path`.
    ///
    /// `data` must serialize to a map (or to nothing). The template sees it
    /// with two extra keys: `template` (the path) and, when a translator is
    /// set, `locale_name`. The output then goes through the decorators.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::TemplateNotFound`](crate::ErrorKind::TemplateNotFound) if the engine has no
    ///   partial under `path`, checked before `data` is looked at
    /// - [`ErrorKind::Render`](crate::ErrorKind::Render) if execution fails
    /// - [`ErrorKind::Decorator`](crate::ErrorKind::Decorator) if a decorator fails
    pub fn render<T: Serialize + ?Sized>(&self, path: &str, data: &T) -> Result<String> {
        if !self.engine.has_partial(path) {
            debug!(path, "render of unknown template");
            return Err(Error::template_not_found(path));
        }

        let mut context = to_context(data).map_err(|err| err.with_path(path))?;
        context.insert("template".to_string(), Value::String(path.to_string()));
        if let Some(translator) = self.context.translator() {
            context.insert("locale_name".to_string(), Value::String(translator.locale()));
        }

        trace!(path, "rendering template");
        self.begin_render();
        let output = self.engine.render_partial(path, &Value::Object(context))?;
        self.decorators.apply(path, output)
    }

    /// Compiles and renders `source` without touching the store.
    ///
    /// No `template`/`locale_name` keys are added and no decorators run.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Compile`](crate::ErrorKind::Compile) if `source` does not compile
    /// - [`ErrorKind::Render`](crate::ErrorKind::Render) if execution fails
    pub fn render_string<T: Serialize + ?Sized>(&self, source: &str, data: &T) -> Result<String> {
        let compiled = self.engine.compile(source)?;
        let context = to_context(data)?;
        self.begin_render();
        self.engine.render_compiled(&compiled, &Value::Object(context))
    }

    fn begin_render(&self) {
        if self.scratch_scope == ScratchScope::PerRender {
            self.context.clear_scratch();
        }
    }
}

fn to_context<T: Serialize + ?Sized>(data: &T) -> Result<Map<String, Value>> {
    let value = serde_json::to_value(data).map_err(|err| {
        Error::render(format!("failed to serialize render context: {}", err)).with_source(err)
    })?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(Error::render(format!(
            "render context must be a map, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}

/// Precompiles batches of templates, see [`Renderer::pre_processor`].
pub struct PreProcessor<'a> {
    engine: &'a dyn TemplateEngine,
}

impl PreProcessor<'_> {
    /// Precompiles every entry, returning artifacts keyed by path.
    ///
    /// The first entry that fails to compile stops the batch with
    /// [`ErrorKind::Compile`](crate::ErrorKind::Compile) carrying that entry's path.
    pub fn process<I, K, V>(&self, templates: I) -> Result<BTreeMap<String, String>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        templates
            .into_iter()
            .map(|(path, source)| {
                let path = path.into();
                let artifact = self
                    .engine
                    .precompile(source.as_ref())
                    .and_then(|artifact| artifact.to_json())
                    .map_err(|err| err.with_path(&path))?;
                Ok((path, artifact))
            })
            .collect()
    }
}
