//! Renderer configuration.
//!
//! [`RendererConfig`] collects everything fixed at construction time: the
//! site and theme settings exposed to helpers, and the engine knobs
//! (escaping, undefined-value behavior, whitespace control, scratch scope).
//! Every field has a default, so partial documents are valid:
//!
//! ```rust
//! use vellum_render::{EscapeMode, RendererConfig, ScratchScope};
//!
//! let config = RendererConfig::from_yaml(r#"
//! escape: none
//! scratch: render
//! site_settings:
//!   store_name: Acme
//! "#).unwrap();
//!
//! assert_eq!(config.escape, EscapeMode::None);
//! assert_eq!(config.scratch, ScratchScope::PerRender);
//! assert_eq!(config.site_settings["store_name"], "Acme");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Errors raised while loading a [`RendererConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config extension: {0} (expected .yaml, .yml or .json)")]
    UnsupportedExtension(String),
}

/// Output escaping applied to `{{ expression }}` results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapeMode {
    /// HTML-escape every expression (safe strings pass through).
    #[default]
    Html,
    /// Emit values verbatim.
    None,
}

/// How the engine treats undefined values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedMode {
    /// Undefined renders as empty; attribute access on it fails.
    Lenient,
    /// Undefined renders as empty and attribute access on it stays undefined.
    #[default]
    Chainable,
    /// Any use of an undefined value is a render error.
    Strict,
}

/// Lifetime of the helper scratch store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScratchScope {
    /// One scratch map for the renderer's whole lifetime.
    #[default]
    #[serde(rename = "instance")]
    PerInstance,
    /// Scratch is cleared at the start of every render call.
    #[serde(rename = "render")]
    PerRender,
}

/// Construction-time configuration of a [`Renderer`](crate::Renderer).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Site-level settings, readable by helpers.
    pub site_settings: Map<String, Value>,
    /// Theme-level settings, readable by helpers.
    pub theme_settings: Map<String, Value>,
    pub escape: EscapeMode,
    pub undefined: UndefinedMode,
    pub scratch: ScratchScope,
    /// Remove the first newline after a block tag.
    pub trim_blocks: bool,
    /// Strip leading whitespace before a block tag.
    pub lstrip_blocks: bool,
    /// Keep the final newline of a template. Off by default, so a partial
    /// ending in `\n` renders without it.
    pub keep_trailing_newline: bool,
}

impl RendererConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration file, choosing the format by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            Some("json") => Self::from_json(&content),
            other => Err(ConfigError::UnsupportedExtension(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn with_site_settings(mut self, settings: Map<String, Value>) -> Self {
        self.site_settings = settings;
        self
    }

    pub fn with_theme_settings(mut self, settings: Map<String, Value>) -> Self {
        self.theme_settings = settings;
        self
    }

    pub fn with_escape(mut self, escape: EscapeMode) -> Self {
        self.escape = escape;
        self
    }

    pub fn with_undefined(mut self, undefined: UndefinedMode) -> Self {
        self.undefined = undefined;
        self
    }

    pub fn with_scratch(mut self, scope: ScratchScope) -> Self {
        self.scratch = scope;
        self
    }
}
