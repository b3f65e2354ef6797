//! Registered partials.
//!
//! The [`TemplateStore`] maps logical paths (`"pages/home"`,
//! `"components/products/card"`) to executable handles. The first
//! registration of a path wins: adding the same path again is silently
//! skipped, whatever the new payload contains.
//!
//! Each payload passes through [`classify`](crate::precompiled::classify)
//! before it reaches the engine, so raw sources and precompiled artifacts can
//! be mixed freely in one batch.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::engine::{CompiledTemplate, TemplateEngine};
use crate::error::Result;
use crate::precompiled::{classify, Payload};

/// How a stored template reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateOrigin {
    /// Compiled from raw source.
    Source,
    /// Restored from a precompiled artifact.
    Precompiled,
}

/// A template held by the store.
#[derive(Debug, Clone)]
pub struct StoredTemplate {
    pub handle: CompiledTemplate,
    pub origin: TemplateOrigin,
}

/// Partials keyed by logical path.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: HashMap<String, StoredTemplate>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds templates, keeping existing paths untouched.
    ///
    /// Entries are processed in iteration order. A payload that fails to
    /// restore stops the call with a format error (a raw payload that fails
    /// to compile, with a compile error); the error carries the entry's
    /// path. Entries processed before the failure stay registered.
    pub fn add_templates<I, K, V>(
        &mut self,
        engine: &mut dyn TemplateEngine,
        entries: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        for (path, payload) in entries {
            let path = path.into();
            if self.templates.contains_key(&path) {
                trace!(%path, "template already loaded, skipping");
                continue;
            }

            let stored =
                Self::restore(engine, payload.as_ref()).map_err(|err| err.with_path(&path))?;
            engine
                .register_partial(&path, &stored.handle)
                .map_err(|err| err.with_path(&path))?;
            debug!(%path, origin = ?stored.origin, "registered template");
            self.templates.insert(path, stored);
        }
        Ok(())
    }

    fn restore(engine: &dyn TemplateEngine, payload: &str) -> Result<StoredTemplate> {
        match classify(payload)? {
            Payload::Raw(source) => Ok(StoredTemplate {
                handle: engine.compile(source)?,
                origin: TemplateOrigin::Source,
            }),
            Payload::Precompiled(artifact) => Ok(StoredTemplate {
                handle: engine.attach(&artifact)?,
                origin: TemplateOrigin::Precompiled,
            }),
        }
    }

    /// Whether `path` has been registered.
    pub fn is_template_loaded(&self, path: &str) -> bool {
        self.templates.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&StoredTemplate> {
        self.templates.get(path)
    }

    /// Registered paths, in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
