//! HTML rendering of the tree document through Tera.
//!
//! The built-in template produces a self-contained page with the
//! subject summary and the full result matrix; callers can substitute
//! their own template text, which sees the tree document as `report`.

use serde_json::Value;
use tera::{Context, Tera};

use crate::error::Result;

pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/earl_report.html.tera");

const TEMPLATE_NAME: &str = "earl_report.html";

pub fn render_html(tree: &Value, template: Option<&str>) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, template.unwrap_or(DEFAULT_TEMPLATE))?;

    let mut context = Context::new();
    context.insert("report", tree);
    Ok(tera.render(TEMPLATE_NAME, &context)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tree() -> Value {
        json!({
            "@id": "",
            "name": "Example Results",
            "bibRef": "[[EXAMPLE]]",
            "generatedBy": {"@id": "https://crates.io/crates/earl-rollup", "name": "earl-rollup"},
            "assertions": ["a.ttl"],
            "testSubjects": [{
                "@id": "http://example.org/impl-a",
                "name": "Impl A",
                "developer": [],
            }],
            "entries": [{
                "@id": "http://example.org/manifest",
                "title": "Example Suite",
                "entries": [{
                    "@id": "http://example.org/t1",
                    "title": "Test one",
                    "assertions": [{
                        "subject": "http://example.org/impl-a",
                        "test": "http://example.org/t1",
                        "result": {"outcome": "earl:passed"},
                    }],
                }],
            }],
        })
    }

    #[test]
    fn built_in_template_renders_matrix() {
        let html = render_html(&sample_tree(), None).unwrap();
        assert!(html.contains("Example Results"));
        assert!(html.contains("Impl A"));
        assert!(html.contains("Test one"));
        assert!(html.contains("passed"));
    }

    #[test]
    fn caller_template_overrides_built_in() {
        let html = render_html(&sample_tree(), Some("<p>{{ report.name }}</p>")).unwrap();
        assert_eq!(html, "<p>Example Results</p>");
    }

    #[test]
    fn broken_template_is_an_error() {
        assert!(render_html(&sample_tree(), Some("{{ unclosed")).is_err());
    }
}
