//! # Vellum Helpers
//!
//! Reference helper modules for [`vellum_render`]. Every helper is built from
//! the renderer's [`HelperContext`](vellum_render::HelperContext) by a
//! [`HelperDescriptor`] factory, so it sees the live translator, content
//! regions and settings of the renderer it is registered on.
//!
//! | Helper | Module | Reads |
//! |---|---|---|
//! | `region(name)` | [`content`] | content regions |
//! | `lang(key, params?)` | [`i18n`] | translator |
//! | `locale()` | [`i18n`] | translator |
//! | `setting(path, default?)` | [`settings`] | site settings |
//! | `theme_setting(path, default?)` | [`settings`] | theme settings |
//! | `cycle(a, b, ...)` | [`sequence`] | scratch |
//! | `counter(name?)` | [`sequence`] | scratch |
//!
//! ```rust
//! use serde_json::{json, Map};
//! use vellum_render::{Renderer, RendererConfig};
//!
//! let mut theme = Map::new();
//! theme.insert("colors".into(), json!({"accent": "teal"}));
//! let config = RendererConfig::default().with_theme_settings(theme);
//!
//! let renderer = Renderer::new(config, vellum_helpers::builtin()).unwrap();
//! let out = renderer
//!     .render_string("{{ theme_setting('colors.accent') }}", &())
//!     .unwrap();
//! assert_eq!(out, "teal");
//! ```

use minijinja::{Error, ErrorKind, Value};
use vellum_render::HelperDescriptor;

pub mod content;
pub mod i18n;
pub mod sequence;
pub mod settings;

/// Every helper shipped by this crate, in registration order.
pub fn builtin() -> Vec<HelperDescriptor> {
    vec![
        content::region(),
        i18n::lang(),
        i18n::locale(),
        settings::setting(),
        settings::theme_setting(),
        sequence::cycle(),
        sequence::counter(),
    ]
}

// Required string argument at `index`.
fn str_arg<'a>(helper: &str, args: &'a [Value], index: usize) -> Result<&'a str, Error> {
    let value = args.get(index).ok_or_else(|| {
        Error::new(
            ErrorKind::MissingArgument,
            format!("{}() requires argument #{}", helper, index + 1),
        )
    })?;
    value.as_str().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("{}() argument #{} must be a string", helper, index + 1),
        )
    })
}
