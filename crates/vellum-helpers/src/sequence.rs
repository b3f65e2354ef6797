//! Stateful helpers backed by the renderer's scratch store.
//!
//! Whether the state survives across renders depends on the renderer's
//! [`ScratchScope`](vellum_render::ScratchScope).

use std::sync::Arc;

use minijinja::{Error, ErrorKind, Value};
use serde_json::json;
use vellum_render::{helper_fn, HelperDescriptor};

const CYCLE_PREFIX: &str = "cycle:";
const COUNTER_PREFIX: &str = "counter:";

/// `cycle(a, b, ...)`: returns its arguments in turn, one per call.
///
/// Calls with the same argument list share a position, so
/// `{{ cycle('odd', 'even') }}` alternates across a loop.
pub fn cycle() -> HelperDescriptor {
    HelperDescriptor::new("cycle", |ctx| {
        let ctx = Arc::clone(ctx);
        Ok(helper_fn(move |_, args| {
            if args.is_empty() {
                return Err(Error::new(
                    ErrorKind::MissingArgument,
                    "cycle() requires at least one value",
                ));
            }

            let key = format!(
                "{}{}",
                CYCLE_PREFIX,
                args.iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join("\u{1f}")
            );
            let position = ctx.with_scratch(|scratch| {
                let position = scratch.get(&key).and_then(|v| v.as_u64()).unwrap_or(0);
                scratch.insert(key, json!(position + 1));
                position
            });
            Ok(args[(position % args.len() as u64) as usize].clone())
        }))
    })
}

/// `counter(name?)`: increments and returns a named counter, starting at 1.
pub fn counter() -> HelperDescriptor {
    HelperDescriptor::new("counter", |ctx| {
        let ctx = Arc::clone(ctx);
        Ok(helper_fn(move |_, args| {
            let name = match args.first() {
                Some(value) => value.as_str().ok_or_else(|| {
                    Error::new(
                        ErrorKind::InvalidOperation,
                        "counter() name must be a string",
                    )
                })?,
                None => "default",
            };

            let key = format!("{}{}", COUNTER_PREFIX, name);
            let next = ctx.with_scratch(|scratch| {
                let next = scratch.get(&key).and_then(|v| v.as_u64()).unwrap_or(0) + 1;
                scratch.insert(key, json!(next));
                next
            });
            Ok(Value::from(next))
        }))
    })
}
