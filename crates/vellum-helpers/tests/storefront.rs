//! Builtin helpers driving a small storefront theme.

use serde::Serialize;
use serde_json::{json, Map, Value};
use vellum_render::{ContentRegions, Renderer, RendererConfig, ScratchScope, Translator};

struct English;

impl Translator for English {
    fn locale(&self) -> String {
        "en-US".to_string()
    }

    fn translate(&self, key: &str, params: &Value) -> Option<String> {
        match key {
            "products.heading" => Some("Our products".to_string()),
            "products.count" => Some(format!("{} items", params["n"])),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct Listing {
    products: Vec<Item>,
}

#[derive(Serialize)]
struct Item {
    title: String,
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

fn storefront() -> Renderer {
    let config = RendererConfig::default()
        .with_site_settings(object(json!({"name": "Acme", "currency": "EUR"})))
        .with_theme_settings(object(json!({"layout": {"columns": 3}})))
        .with_scratch(ScratchScope::PerRender);

    let mut renderer = Renderer::new(config, vellum_helpers::builtin()).unwrap();
    renderer.set_translator(English);
    renderer
        .add_templates([
            (
                "components/row",
                "<li class=\"{{ cycle('odd', 'even') }}\">{{ counter('rows') }}. {{ item.title }}</li>",
            ),
            (
                "pages/list",
                concat!(
                    "<h1>{{ lang('products.heading') }} ({{ locale() }})</h1>",
                    "{{ region('banner') }}",
                    "<ul data-cols=\"{{ theme_setting('layout.columns') }}\">",
                    "{% for item in products %}{% include 'components/row' %}{% endfor %}",
                    "</ul>",
                    "<p>{{ lang('products.count', {'n': (products | length)}) }} in {{ setting('currency') }}</p>",
                ),
            ),
        ])
        .unwrap();

    let mut regions = ContentRegions::new();
    regions.insert("banner".into(), json!([{"html": "<b>Sale</b>"}]));
    renderer.add_content(regions);
    renderer
}

fn listing() -> Listing {
    Listing {
        products: vec![
            Item { title: "Lamp".into() },
            Item { title: "Desk".into() },
        ],
    }
}

#[test]
fn renders_full_page_with_builtin_helpers() {
    let out = storefront().render("pages/list", &listing()).unwrap();
    assert_eq!(
        out,
        concat!(
            "<h1>Our products (en-US)</h1>",
            "<div data-content-region=\"banner\"><b>Sale</b></div>",
            "<ul data-cols=\"3\">",
            "<li class=\"odd\">1. Lamp</li>",
            "<li class=\"even\">2. Desk</li>",
            "</ul>",
            "<p>2 items in EUR</p>",
        )
    );
}

#[test]
fn per_render_scratch_restarts_sequences() {
    let renderer = storefront();
    let first = renderer.render("pages/list", &listing()).unwrap();
    let second = renderer.render("pages/list", &listing()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn precompiled_theme_behaves_like_source() {
    let source = "{{ setting('name') }}: {{ cycle('x', 'y') }}{{ cycle('x', 'y') }}";
    let renderer = storefront();
    let artifact = renderer.precompile(source).unwrap();

    let mut restored = storefront();
    restored.add_templates([("snippets/brand", artifact)]).unwrap();
    assert_eq!(
        restored.render("snippets/brand", &()).unwrap(),
        renderer.render_string(source, &()).unwrap()
    );
}

#[test]
fn builtin_names_are_unique() {
    let mut names: Vec<_> = vellum_helpers::builtin()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    let total = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), total);
}
