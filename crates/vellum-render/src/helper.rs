//! Helper descriptors and registration.
//!
//! A helper is a named function callable from templates. Helpers are not
//! registered directly: each helper module provides a [`HelperDescriptor`]
//! whose factory receives the renderer's shared [`HelperContext`] and returns
//! the callable. The [`HelperRegistry`] runs every factory exactly once, in
//! declaration order, and hands the results to the engine.
//!
//! ```rust
//! use minijinja::Value;
//! use vellum_render::{helper_fn, HelperDescriptor, Renderer, RendererConfig};
//!
//! let shout = HelperDescriptor::new("shout", |_ctx| {
//!     Ok(helper_fn(|_state, args| {
//!         let text = args.first().map(|v| v.to_string()).unwrap_or_default();
//!         Ok(Value::from(text.to_uppercase()))
//!     }))
//! });
//!
//! let renderer = Renderer::new(RendererConfig::default(), vec![shout]).unwrap();
//! let out = renderer.render_string("{{ shout('hi') }}", &()).unwrap();
//! assert_eq!(out, "HI");
//! ```

use std::fmt;
use std::sync::Arc;

use minijinja::value::{Object, ObjectRepr};
use minijinja::{State, Value};
use tracing::debug;

use crate::context::HelperContext;
use crate::engine::TemplateEngine;
use crate::error::BoxError;

/// A helper callable as seen by the engine.
///
/// The [`State`] argument gives access to the running template (its name,
/// the environment, the auto-escape mode).
pub type HelperFn =
    Arc<dyn Fn(&State<'_, '_>, &[Value]) -> Result<Value, minijinja::Error> + Send + Sync>;

/// Wraps a closure as a [`HelperFn`].
pub fn helper_fn<F>(f: F) -> HelperFn
where
    F: Fn(&State<'_, '_>, &[Value]) -> Result<Value, minijinja::Error> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Builds a helper from the shared context.
pub type HelperFactory =
    Arc<dyn Fn(&Arc<HelperContext>) -> Result<HelperFn, BoxError> + Send + Sync>;

/// A helper name paired with the factory producing it.
#[derive(Clone)]
pub struct HelperDescriptor {
    name: String,
    factory: HelperFactory,
}

impl HelperDescriptor {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Arc<HelperContext>) -> Result<HelperFn, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the factory against `ctx`.
    pub fn build(&self, ctx: &Arc<HelperContext>) -> Result<HelperFn, BoxError> {
        (self.factory)(ctx)
    }
}

impl fmt::Debug for HelperDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Error raised when a descriptor is unusable before its factory even runs.
#[derive(Debug, thiserror::Error)]
#[error("helper descriptor #{index} has an empty name")]
pub struct EmptyHelperName {
    pub index: usize,
}

/// Ordered collection of helper descriptors.
#[derive(Debug, Clone, Default)]
pub struct HelperRegistry {
    descriptors: Vec<HelperDescriptor>,
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, descriptor: HelperDescriptor) -> &mut Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Helper names in declaration order (duplicates included).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name())
    }

    /// Instantiates every helper and registers it with `engine`.
    ///
    /// Factories run in declaration order; a later descriptor with the same
    /// name overwrites the earlier registration. The first factory error
    /// aborts registration and is returned unchanged.
    pub fn register_all(
        &self,
        engine: &mut dyn TemplateEngine,
        ctx: &Arc<HelperContext>,
    ) -> Result<(), BoxError> {
        for (index, descriptor) in self.descriptors.iter().enumerate() {
            if descriptor.name.is_empty() {
                return Err(Box::new(EmptyHelperName { index }));
            }
            let helper = descriptor.build(ctx)?;
            engine.register_helper(&descriptor.name, helper);
        }
        debug!(count = self.descriptors.len(), "registered template helpers");
        Ok(())
    }
}

impl FromIterator<HelperDescriptor> for HelperRegistry {
    fn from_iter<I: IntoIterator<Item = HelperDescriptor>>(iter: I) -> Self {
        Self {
            descriptors: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<HelperDescriptor>> for HelperRegistry {
    fn from(descriptors: Vec<HelperDescriptor>) -> Self {
        Self { descriptors }
    }
}

/// Adapts a [`HelperFn`] to a callable minijinja object.
pub(crate) struct HelperObject {
    name: String,
    func: HelperFn,
}

impl HelperObject {
    pub(crate) fn new(name: &str, func: HelperFn) -> Self {
        Self {
            name: name.to_string(),
            func,
        }
    }
}

impl fmt::Debug for HelperObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<helper {}>", self.name)
    }
}

impl Object for HelperObject {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn call(
        self: &Arc<Self>,
        state: &State<'_, '_>,
        args: &[Value],
    ) -> Result<Value, minijinja::Error> {
        (self.func)(state, args)
    }
}
