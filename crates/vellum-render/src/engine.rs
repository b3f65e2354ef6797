//! Template engine abstraction.
//!
//! This module defines the [`TemplateEngine`] trait, the narrow interface the
//! renderer drives: compile, precompile, attach behavior to a precompiled
//! artifact, register a partial, and render. The default implementation is
//! [`MiniJinjaEngine`].
//!
//! Engines hand out [`CompiledTemplate`] handles. A handle is only created
//! after the engine accepted the source, so registering or rendering it
//! never reports a syntax problem.

use std::sync::Arc;

use minijinja::{AutoEscape, Environment, UndefinedBehavior, Value};

use crate::config::{EscapeMode, RendererConfig, UndefinedMode};
use crate::error::{Error, ErrorKind, Result};
use crate::helper::{HelperFn, HelperObject};
use crate::precompiled::PrecompiledArtifact;

/// Executable template handle produced by [`TemplateEngine::compile`] or
/// [`TemplateEngine::attach`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    source: Arc<str>,
}

impl CompiledTemplate {
    /// Wraps a template body the engine has already checked.
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// A template engine the renderer can drive.
///
/// Error kinds are part of the contract: `compile` and `precompile` fail
/// with [`ErrorKind::Compile`], `attach` with [`ErrorKind::Format`],
/// `render_partial` and `render_compiled` with [`ErrorKind::Render`]
/// (or [`ErrorKind::TemplateNotFound`] for an unknown partial).
pub trait TemplateEngine: Send + Sync {
    /// Exposes `helper` to templates under `name`, replacing any previous one.
    fn register_helper(&mut self, name: &str, helper: HelperFn);

    /// Checks `source` and returns an executable handle.
    fn compile(&self, source: &str) -> Result<CompiledTemplate>;

    /// Compiles `source` into a serializable artifact.
    fn precompile(&self, source: &str) -> Result<PrecompiledArtifact> {
        let compiled = self.compile(source)?;
        Ok(PrecompiledArtifact::new(compiled.source()))
    }

    /// Turns a deserialized artifact back into an executable handle.
    ///
    /// The artifact's compiler revision and digest are verified first.
    fn attach(&self, artifact: &PrecompiledArtifact) -> Result<CompiledTemplate> {
        artifact.verify()?;
        self.compile(artifact.source()).map_err(|err| {
            Error::format(format!(
                "precompiled template body does not compile: {}",
                err.message()
            ))
            .with_source(err)
        })
    }

    /// Registers `template` as a partial reachable under `path`.
    fn register_partial(&mut self, path: &str, template: &CompiledTemplate) -> Result<()>;

    /// Whether a partial is registered under `path`.
    fn has_partial(&self, path: &str) -> bool;

    /// Renders the partial registered under `path`.
    fn render_partial(&self, path: &str, context: &serde_json::Value) -> Result<String>;

    /// Renders a handle that is not registered as a partial.
    fn render_compiled(
        &self,
        template: &CompiledTemplate,
        context: &serde_json::Value,
    ) -> Result<String>;
}

/// MiniJinja-based template engine.
///
/// Partials live in one environment, so templates can pull each other in
/// with `{% include "path" %}`. Helpers are exposed as callable globals.
///
/// # Example
///
/// ```rust
/// use vellum_render::{MiniJinjaEngine, RendererConfig, TemplateEngine};
/// use serde_json::json;
///
/// let mut engine = MiniJinjaEngine::new(&RendererConfig::default());
/// let card = engine.compile("<b>{{ title }}</b>").unwrap();
/// engine.register_partial("components/card", &card).unwrap();
///
/// let out = engine
///     .render_partial("components/card", &json!({"title": "Sale"}))
///     .unwrap();
/// assert_eq!(out, "<b>Sale</b>");
/// ```
pub struct MiniJinjaEngine {
    env: Environment<'static>,
    trim_blocks: bool,
    lstrip_blocks: bool,
}

impl MiniJinjaEngine {
    /// Creates an engine configured from `config`.
    pub fn new(config: &RendererConfig) -> Self {
        let mut env = Environment::new();

        let escape = config.escape;
        env.set_auto_escape_callback(move |_name: &str| match escape {
            EscapeMode::Html => AutoEscape::Html,
            EscapeMode::None => AutoEscape::None,
        });
        env.set_undefined_behavior(match config.undefined {
            UndefinedMode::Lenient => UndefinedBehavior::Lenient,
            UndefinedMode::Chainable => UndefinedBehavior::Chainable,
            UndefinedMode::Strict => UndefinedBehavior::Strict,
        });
        env.set_trim_blocks(config.trim_blocks);
        env.set_lstrip_blocks(config.lstrip_blocks);
        env.set_keep_trailing_newline(config.keep_trailing_newline);

        Self {
            env,
            trim_blocks: config.trim_blocks,
            lstrip_blocks: config.lstrip_blocks,
        }
    }

    /// Returns a reference to the underlying MiniJinja environment.
    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// Returns a mutable reference to the underlying MiniJinja environment.
    ///
    /// This allows registering filters or tests directly.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }

    // Parsing needs no helpers or partials, only the syntax settings, so a
    // scratch environment keeps the shared one untouched.
    fn parse_check(&self, source: &str) -> std::result::Result<(), minijinja::Error> {
        let mut probe = Environment::new();
        probe.set_trim_blocks(self.trim_blocks);
        probe.set_lstrip_blocks(self.lstrip_blocks);
        probe.add_template_owned("<compile>".to_string(), source.to_string())
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new(&RendererConfig::default())
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn register_helper(&mut self, name: &str, helper: HelperFn) {
        self.env.add_global(
            name.to_string(),
            Value::from_object(HelperObject::new(name, helper)),
        );
    }

    fn compile(&self, source: &str) -> Result<CompiledTemplate> {
        self.parse_check(source)
            .map_err(|err| Error::from_engine(ErrorKind::Compile, err))?;
        Ok(CompiledTemplate::new(source))
    }

    fn register_partial(&mut self, path: &str, template: &CompiledTemplate) -> Result<()> {
        self.env
            .add_template_owned(path.to_string(), template.source().to_string())
            .map_err(|err| Error::from_engine(ErrorKind::Compile, err).with_path(path))
    }

    fn has_partial(&self, path: &str) -> bool {
        self.env.get_template(path).is_ok()
    }

    fn render_partial(&self, path: &str, context: &serde_json::Value) -> Result<String> {
        let template = self.env.get_template(path).map_err(|err| {
            if err.kind() == minijinja::ErrorKind::TemplateNotFound {
                Error::template_not_found(path)
            } else {
                Error::from_engine(ErrorKind::Render, err).with_path(path)
            }
        })?;
        template
            .render(context)
            .map_err(|err| Error::from_engine(ErrorKind::Render, err).with_path(path))
    }

    fn render_compiled(
        &self,
        template: &CompiledTemplate,
        context: &serde_json::Value,
    ) -> Result<String> {
        self.env
            .render_str(template.source(), context)
            .map_err(|err| Error::from_engine(ErrorKind::Render, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::helper_fn;
    use serde_json::json;

    #[test]
    fn test_compile_and_render() {
        let engine = MiniJinjaEngine::default();
        let tmpl = engine.compile("Hello, {{ name }}!").unwrap();
        let out = engine.render_compiled(&tmpl, &json!({"name": "World"})).unwrap();
        assert_eq!(out, "Hello, World!");
    }

    #[test]
    fn test_compile_error_kind() {
        let engine = MiniJinjaEngine::default();
        let err = engine.compile("{% if open %}never closed").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Compile);
    }

    #[test]
    fn test_render_error_kind() {
        let engine = MiniJinjaEngine::default();
        let tmpl = engine.compile("{{ missing_helper() }}").unwrap();
        let err = engine.render_compiled(&tmpl, &json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Render);
    }

    #[test]
    fn test_partials_include_each_other() {
        let mut engine = MiniJinjaEngine::default();
        let price = engine.compile("${{ amount }}").unwrap();
        let card = engine.compile("[{% include 'components/price' %}]").unwrap();
        engine.register_partial("components/price", &price).unwrap();
        engine.register_partial("components/card", &card).unwrap();

        assert!(engine.has_partial("components/card"));
        let out = engine
            .render_partial("components/card", &json!({"amount": 5}))
            .unwrap();
        assert_eq!(out, "[$5]");
    }

    #[test]
    fn test_unknown_partial_is_not_found() {
        let engine = MiniJinjaEngine::default();
        let err = engine.render_partial("nope", &json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TemplateNotFound);
        assert_eq!(err.path(), Some("nope"));
    }

    #[test]
    fn test_html_escaping_by_default() {
        let engine = MiniJinjaEngine::default();
        let tmpl = engine.compile("{{ markup }}").unwrap();
        let out = engine
            .render_compiled(&tmpl, &json!({"markup": "<b>&"}))
            .unwrap();
        assert_eq!(out, "&lt;b&gt;&amp;");
    }

    #[test]
    fn test_escaping_disabled() {
        let config = RendererConfig::default().with_escape(EscapeMode::None);
        let engine = MiniJinjaEngine::new(&config);
        let tmpl = engine.compile("{{ markup }}").unwrap();
        let out = engine
            .render_compiled(&tmpl, &json!({"markup": "<b>"}))
            .unwrap();
        assert_eq!(out, "<b>");
    }

    #[test]
    fn test_trailing_newline_handling() {
        let mut stripping = MiniJinjaEngine::default();
        let line = stripping.compile("{{ name }}\n").unwrap();
        stripping.register_partial("line", &line).unwrap();
        assert_eq!(stripping.render_partial("line", &json!({"name": "a"})).unwrap(), "a");

        let config = RendererConfig {
            keep_trailing_newline: true,
            ..RendererConfig::default()
        };
        let mut keeping = MiniJinjaEngine::new(&config);
        keeping.register_partial("line", &line).unwrap();
        assert_eq!(keeping.render_partial("line", &json!({"name": "a"})).unwrap(), "a\n");
    }

    #[test]
    fn test_strict_undefined() {
        let config = RendererConfig::default().with_undefined(UndefinedMode::Strict);
        let engine = MiniJinjaEngine::new(&config);
        let tmpl = engine.compile("{{ nothing }}").unwrap();
        assert!(engine.render_compiled(&tmpl, &json!({})).is_err());
    }

    #[test]
    fn test_chainable_undefined_renders_empty() {
        let engine = MiniJinjaEngine::default();
        let tmpl = engine.compile("[{{ product.brand.name }}]").unwrap();
        let out = engine.render_compiled(&tmpl, &json!({})).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_helper_is_callable() {
        let mut engine = MiniJinjaEngine::default();
        engine.register_helper(
            "add",
            helper_fn(|_, args| {
                let sum: i64 = args.iter().filter_map(|v| i64::try_from(v.clone()).ok()).sum();
                Ok(Value::from(sum))
            }),
        );
        let tmpl = engine.compile("{{ add(1, 2, 3) }}").unwrap();
        assert_eq!(engine.render_compiled(&tmpl, &json!({})).unwrap(), "6");
    }

    #[test]
    fn test_precompile_then_attach() {
        let engine = MiniJinjaEngine::default();
        let artifact = engine.precompile("{{ a }}-{{ b }}").unwrap();
        let restored = engine.attach(&artifact).unwrap();
        let out = engine
            .render_compiled(&restored, &json!({"a": 1, "b": 2}))
            .unwrap();
        assert_eq!(out, "1-2");
    }

    #[test]
    fn test_attach_rejects_uncompilable_body() {
        let engine = MiniJinjaEngine::default();
        let artifact = PrecompiledArtifact::new("{% for %}");
        let err = engine.attach(&artifact).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
