//! Content region output.
//!
//! `{{ region('header') }}` renders the content region registered under
//! `header` through [`Renderer::add_content`](vellum_render::Renderer::add_content),
//! wrapped in a marker element:
//!
//! ```text
//! <div data-content-region="header">…</div>
//! ```
//!
//! A region value is either an HTML string or a list whose items are HTML
//! strings or objects with an `html` field. Region HTML is trusted and not
//! escaped; the region name is. An unknown region renders an empty wrapper.

use std::sync::Arc;

use minijinja::{HtmlEscape, Value};
use serde_json::Value as Json;
use tracing::trace;
use vellum_render::{helper_fn, HelperDescriptor};

use crate::str_arg;

pub fn region() -> HelperDescriptor {
    HelperDescriptor::new("region", |ctx| {
        let ctx = Arc::clone(ctx);
        Ok(helper_fn(move |state, args| {
            let name = str_arg("region", args, 0)?;
            let content = ctx.content();
            let inner = content.get(name).map(region_html).unwrap_or_default();
            trace!(template = state.name(), region = name, "rendering content region");
            Ok(Value::from_safe_string(format!(
                "<div data-content-region=\"{}\">{}</div>",
                HtmlEscape(name),
                inner
            )))
        }))
    })
}

fn region_html(value: &Json) -> String {
    match value {
        Json::String(html) => html.clone(),
        Json::Array(items) => items.iter().filter_map(item_html).collect(),
        other => item_html(other).unwrap_or_default(),
    }
}

fn item_html(item: &Json) -> Option<String> {
    match item {
        Json::String(html) => Some(html.clone()),
        Json::Object(widget) => widget.get("html").and_then(Json::as_str).map(str::to_string),
        _ => None,
    }
}
