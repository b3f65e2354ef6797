//! Post-render transforms.
//!
//! A [`Decorator`] receives the output of a partial render and returns a new
//! string. Decorators run in registration order, each one receiving the
//! previous one's output; the first failure stops the chain.
//!
//! Closures implement [`Decorator`] directly:
//!
//! ```rust
//! use vellum_render::{DecoratorChain, Error};
//!
//! let mut chain = DecoratorChain::new();
//! chain.push(|html: String| Ok(html.replace("{{CDN}}", "https://cdn.example")));
//! chain.push(|html: String| Ok(format!("{}\n<!-- rendered -->", html)));
//!
//! let out = chain.apply("pages/home", r#"<img src="{{CDN}}/a.png">"#.to_string()).unwrap();
//! assert_eq!(out, "<img src=\"https://cdn.example/a.png\">\n<!-- rendered -->");
//! ```

use std::fmt;

use tracing::trace;

use crate::error::{BoxError, Error, Result};

/// A string-to-string transform applied to rendered partials.
pub trait Decorator: Send + Sync {
    fn decorate(&self, output: String) -> std::result::Result<String, BoxError>;
}

impl<F> Decorator for F
where
    F: Fn(String) -> std::result::Result<String, BoxError> + Send + Sync,
{
    fn decorate(&self, output: String) -> std::result::Result<String, BoxError> {
        (self)(output)
    }
}

/// Append-only, ordered list of decorators.
#[derive(Default)]
pub struct DecoratorChain {
    decorators: Vec<Box<dyn Decorator>>,
}

impl DecoratorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<D: Decorator + 'static>(&mut self, decorator: D) {
        self.decorators.push(Box::new(decorator));
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }

    /// Threads `output` through every decorator.
    ///
    /// `path` is only used to attribute a failure.
    pub fn apply(&self, path: &str, output: String) -> Result<String> {
        self.decorators
            .iter()
            .enumerate()
            .try_fold(output, |current, (index, decorator)| {
                trace!(path, index, "applying decorator");
                decorator.decorate(current).map_err(|err| {
                    Error::decorator(err.to_string())
                        .with_path(path)
                        .with_context("decorator", index.to_string())
                        .with_source(err)
                })
            })
    }
}

impl fmt::Debug for DecoratorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorChain")
            .field("len", &self.decorators.len())
            .finish()
    }
}
