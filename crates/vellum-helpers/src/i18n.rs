//! Translation helpers.
//!
//! Both helpers read the translator at call time, so a translator set after
//! the renderer was built is picked up.

use std::sync::Arc;

use minijinja::{Error, ErrorKind, Value};
use serde_json::Value as Json;
use tracing::debug;
use vellum_render::{helper_fn, HelperDescriptor};

use crate::str_arg;

/// `lang(key, params?)`: the translation of `key`, or `key` itself when no
/// translator is set or the key is unknown.
pub fn lang() -> HelperDescriptor {
    HelperDescriptor::new("lang", |ctx| {
        let ctx = Arc::clone(ctx);
        Ok(helper_fn(move |_, args| {
            let key = str_arg("lang", args, 0)?;
            let params = match args.get(1) {
                Some(value) => serde_json::to_value(value).map_err(|err| {
                    Error::new(
                        ErrorKind::InvalidOperation,
                        format!("lang() parameters are not serializable: {}", err),
                    )
                })?,
                None => Json::Null,
            };

            let translated = ctx
                .translator()
                .and_then(|translator| translator.translate(key, &params));
            match translated {
                Some(text) => Ok(Value::from(text)),
                None => {
                    debug!(key, "missing translation");
                    Ok(Value::from(key))
                }
            }
        }))
    })
}

/// `locale()`: the active locale, undefined without a translator.
pub fn locale() -> HelperDescriptor {
    HelperDescriptor::new("locale", |ctx| {
        let ctx = Arc::clone(ctx);
        Ok(helper_fn(move |_, _| {
            Ok(ctx
                .translator()
                .map(|translator| Value::from(translator.locale()))
                .unwrap_or(Value::UNDEFINED))
        }))
    })
}
