//! Shared state handed to every helper factory.
//!
//! A [`HelperContext`] is created once per [`Renderer`](crate::Renderer) and
//! shared (through an [`Arc`]) by every helper closure registered on it. It
//! exposes:
//!
//! - site and theme settings (read-only)
//! - the current [`Translator`], if one was set
//! - the current [`ContentRegions`]
//! - a [`Scratch`] store, the only state helpers may mutate
//!
//! The translator and content slots can be replaced by the renderer after the
//! helpers captured the context, so helpers must read them at call time
//! rather than at construction time.
//!
//! # Scratch
//!
//! Stateful helpers (alternating row parity, sequence counters) keep their
//! state in the scratch map instead of in hidden statics. Whether scratch
//! lives for the whole renderer or for one render call is decided by
//! [`ScratchScope`](crate::ScratchScope).
//!
//! ```rust
//! use vellum_render::HelperContext;
//! use serde_json::{json, Map};
//!
//! let ctx = HelperContext::new(Map::new(), Map::new());
//! let next = ctx.with_scratch(|scratch| {
//!     let n = scratch.get("n").and_then(|v| v.as_u64()).unwrap_or(0) + 1;
//!     scratch.insert("n".into(), json!(n));
//!     n
//! });
//! assert_eq!(next, 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde_json::{Map, Value};

/// Named slots of externally supplied structured data (widgets and the like).
pub type ContentRegions = HashMap<String, Value>;

/// Mutable cross-call storage for stateful helpers.
pub type Scratch = HashMap<String, Value>;

/// Localization lookup used by the renderer and by helpers.
pub trait Translator: Send + Sync {
    /// The active locale, e.g. `"en-US"`.
    fn locale(&self) -> String;

    /// Looks up a translation for `key`, interpolating `params` when supported.
    fn translate(&self, key: &str, params: &Value) -> Option<String> {
        let _ = (key, params);
        None
    }
}

/// Capabilities shared by all helpers of one renderer.
pub struct HelperContext {
    site_settings: Map<String, Value>,
    theme_settings: Map<String, Value>,
    translator: RwLock<Option<Arc<dyn Translator>>>,
    content: RwLock<Arc<ContentRegions>>,
    scratch: Mutex<Scratch>,
}

impl HelperContext {
    pub fn new(site_settings: Map<String, Value>, theme_settings: Map<String, Value>) -> Self {
        Self {
            site_settings,
            theme_settings,
            translator: RwLock::new(None),
            content: RwLock::new(Arc::new(ContentRegions::new())),
            scratch: Mutex::new(Scratch::new()),
        }
    }

    pub fn site_settings(&self) -> &Map<String, Value> {
        &self.site_settings
    }

    pub fn theme_settings(&self) -> &Map<String, Value> {
        &self.theme_settings
    }

    /// The translator currently set, if any.
    pub fn translator(&self) -> Option<Arc<dyn Translator>> {
        self.translator
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The content regions currently set.
    pub fn content(&self) -> Arc<ContentRegions> {
        self.content
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs `f` with exclusive access to the scratch map.
    pub fn with_scratch<R>(&self, f: impl FnOnce(&mut Scratch) -> R) -> R {
        let mut scratch = self.scratch.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut scratch)
    }

    pub(crate) fn set_translator(&self, translator: Option<Arc<dyn Translator>>) {
        *self
            .translator
            .write()
            .unwrap_or_else(PoisonError::into_inner) = translator;
    }

    pub(crate) fn set_content(&self, regions: ContentRegions) {
        *self.content.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(regions);
    }

    pub(crate) fn clear_scratch(&self) {
        self.with_scratch(|scratch| scratch.clear());
    }
}

impl fmt::Debug for HelperContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperContext")
            .field("site_settings", &self.site_settings)
            .field("theme_settings", &self.theme_settings)
            .field("has_translator", &self.translator().is_some())
            .field("content_regions", &self.content().len())
            .finish_non_exhaustive()
    }
}
