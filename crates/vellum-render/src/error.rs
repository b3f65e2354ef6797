//! Error types for the render pipeline.
//!
//! Every failure raised by a [`Renderer`](crate::Renderer) operation is an
//! [`Error`] tagged with exactly one [`ErrorKind`], one per pipeline phase.
//! Callers discriminate on [`Error::kind`] instead of on distinct types:
//!
//! ```rust
//! use vellum_render::{ErrorKind, Renderer, RendererConfig};
//!
//! let renderer = Renderer::new(RendererConfig::default(), Vec::new()).unwrap();
//! let err = renderer.render("pages/missing", &()).unwrap_err();
//!
//! assert_eq!(err.kind(), ErrorKind::TemplateNotFound);
//! assert_eq!(err.path(), Some("pages/missing"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// Boxed error used for construction-time and decorator failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The pipeline phase an [`Error`] is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// Turning raw source into an executable or serialized form failed.
    Compile,
    /// Restoring a serialized artifact into an executable handle failed.
    Format,
    /// Executing a compiled template against a context failed.
    Render,
    /// A post-render decorator returned an error.
    Decorator,
    /// The requested path is not in the template store.
    TemplateNotFound,
}

impl ErrorKind {
    /// Every error kind, in pipeline order.
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::Compile,
        ErrorKind::Format,
        ErrorKind::Render,
        ErrorKind::Decorator,
        ErrorKind::TemplateNotFound,
    ];

    /// Stable name of the kind, suitable for logs and error payloads.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Compile => "CompileError",
            ErrorKind::Format => "FormatError",
            ErrorKind::Render => "RenderError",
            ErrorKind::Decorator => "DecoratorError",
            ErrorKind::TemplateNotFound => "TemplateNotFoundError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned by rendering operations.
///
/// Carries the phase ([`ErrorKind`]), a human-readable message and an
/// optional structured context (for instance the offending template path).
/// The underlying engine or decorator error, when there is one, is available
/// through [`std::error::Error::source`].
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    context: BTreeMap<String, String>,
    #[source]
    source: Option<BoxError>,
}

impl Error {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: BTreeMap::new(),
            source: None,
        }
    }

    pub fn compile(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Compile, message)
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Format, message)
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Render, message)
    }

    pub fn decorator(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decorator, message)
    }

    /// A lookup failure for `path`. The path is part of the message and of the context.
    pub fn template_not_found(path: &str) -> Self {
        Self::new(
            ErrorKind::TemplateNotFound,
            format!("template not found: {}", path),
        )
        .with_path(path)
    }

    /// Wraps a minijinja error, keeping its full description as the message.
    pub(crate) fn from_engine(kind: ErrorKind, err: minijinja::Error) -> Self {
        Self::new(kind, err.to_string()).with_source(err)
    }

    /// Adds a key/value pair to the structured context.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Records the template path the error belongs to.
    pub fn with_path(self, path: impl Into<String>) -> Self {
        self.with_context("path", path)
    }

    /// Attaches the underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured context attached to the error.
    pub fn context(&self) -> &BTreeMap<String, String> {
        &self.context
    }

    /// The template path this error is attributed to, if any.
    pub fn path(&self) -> Option<&str> {
        self.context.get("path").map(String::as_str)
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, Error>;
