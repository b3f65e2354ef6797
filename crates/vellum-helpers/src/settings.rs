//! Site and theme setting lookup.
//!
//! Paths are dotted: `setting('checkout.currency')`, and numeric segments
//! index into lists (`theme_setting('slides.0.title')`). A missing path
//! yields the optional second argument, or undefined.

use std::sync::Arc;

use minijinja::Value;
use serde_json::{Map, Value as Json};
use vellum_render::{helper_fn, HelperContext, HelperDescriptor};

use crate::str_arg;

/// `setting(path, default?)` over the site settings.
pub fn setting() -> HelperDescriptor {
    lookup_helper("setting", HelperContext::site_settings)
}

/// `theme_setting(path, default?)` over the theme settings.
pub fn theme_setting() -> HelperDescriptor {
    lookup_helper("theme_setting", HelperContext::theme_settings)
}

fn lookup_helper(
    name: &'static str,
    settings: fn(&HelperContext) -> &Map<String, Json>,
) -> HelperDescriptor {
    HelperDescriptor::new(name, move |ctx| {
        let ctx = Arc::clone(ctx);
        Ok(helper_fn(move |_, args| {
            let path = str_arg(name, args, 0)?;
            Ok(match lookup(settings(&ctx), path) {
                Some(value) => Value::from_serialize(value),
                None => args.get(1).cloned().unwrap_or(Value::UNDEFINED),
            })
        }))
    })
}

/// Resolves a dotted `path` inside `map`.
pub fn lookup<'a>(map: &'a Map<String, Json>, path: &str) -> Option<&'a Json> {
    let mut segments = path.split('.');
    let root = map.get(segments.next()?)?;
    segments.try_fold(root, |value, segment| match value {
        Json::Object(fields) => fields.get(segment),
        Json::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
