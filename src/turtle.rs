//! Text notation output.
//!
//! Works from the tree document rather than the flat graph, so the
//! report header, manifests, tests, subjects, and generator come out
//! grouped and ordered the way a human reads them. Values render as
//! bracketed IRIs, short names where a declared prefix applies, or
//! quoted literals with language and datatype tags.

use serde_json::{Map, Value};

use crate::error::{Result, RollupError};
use crate::vocab;

/// Predicates for tree-document keys, with the value form each takes.
#[derive(Clone, Copy, PartialEq)]
enum Form {
    Iri,
    Literal,
    LangLiteral,
    DateLiteral,
}

const KEY_TABLE: &[(&str, &str, Form)] = &[
    ("name", "doap:name", Form::Literal),
    ("bibRef", "dc:bibliographicCitation", Form::Literal),
    ("generatedBy", "earl:generatedBy", Form::Iri),
    ("testSubjects", "earl:testSubjects", Form::Iri),
    ("homepage", "doap:homepage", Form::Iri),
    ("language", "doap:programming-language", Form::Literal),
    ("doapDesc", "doap:description", Form::LangLiteral),
    ("description", "rdfs:comment", Form::LangLiteral),
    ("title", "mf:name", Form::Literal),
    ("testAction", "mf:action", Form::Iri),
    ("testResult", "mf:result", Form::Iri),
    ("developer", "doap:developer", Form::Iri),
    ("revision", "doap:revision", Form::Literal),
    ("created", "doap:created", Form::DateLiteral),
    ("foaf:name", "foaf:name", Form::Literal),
    ("foaf:homepage", "foaf:homepage", Form::Iri),
    ("subject", "earl:subject", Form::Iri),
    ("test", "earl:test", Form::Iri),
    ("mode", "earl:mode", Form::Iri),
    ("assertedBy", "earl:assertedBy", Form::Iri),
];

/// Serialize a tree document into the grouped text notation.
pub fn serialize(tree: &Value) -> Result<String> {
    let root = tree
        .as_object()
        .ok_or_else(|| unrenderable("document root is not an object"))?;

    let mut out = String::new();
    out.push_str(vocab::TURTLE_PREFIXES);
    out.push('\n');

    entity(&mut out, root)?;

    out.push_str("# Manifests\n");
    for manifest in array_of(root, "entries") {
        let manifest = manifest
            .as_object()
            .ok_or_else(|| unrenderable("manifest entry is not an object"))?;
        entity(&mut out, manifest)?;
        for test in array_of(manifest, "entries") {
            let test = test
                .as_object()
                .ok_or_else(|| unrenderable("test entry is not an object"))?;
            entity(&mut out, test)?;
        }
    }

    for subject in array_of(root, "testSubjects") {
        let subject = subject
            .as_object()
            .ok_or_else(|| unrenderable("test subject is not an object"))?;
        entity(&mut out, subject)?;
        for developer in array_of(subject, "developer") {
            let developer = developer
                .as_object()
                .ok_or_else(|| unrenderable("developer is not an object"))?;
            entity(&mut out, developer)?;
        }
    }

    out.push_str("# Report Generation Software\n");
    if let Some(generator) = root.get("generatedBy").and_then(Value::as_object) {
        entity(&mut out, generator)?;
    }

    Ok(out)
}

fn array_of<'a>(node: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    node.get(key).and_then(Value::as_array).map_or(&[], Vec::as_slice)
}

/// One entity block: subject, `;`-joined properties, terminated by `.`.
fn entity(out: &mut String, node: &Map<String, Value>) -> Result<()> {
    let id = node.get("@id").and_then(Value::as_str).unwrap_or_default();
    let mut lines = Vec::new();

    for (key, value) in node {
        match key.as_str() {
            "@context" | "@id" => {}
            "@type" => lines.push(format!("a {}", type_values(value)?)),
            "assertions" => lines.push(assertions_property(value)?),
            "entries" => lines.push(format!("mf:entries {}", list_value(value)?)),
            "release" => lines.push(release_property(value)?),
            key => {
                if let Some(line) = plain_property(key, value)? {
                    lines.push(line);
                }
            }
        }
    }

    out.push_str(&iri_value(id));
    out.push(' ');
    out.push_str(&lines.join(" ;\n  "));
    out.push_str(" .\n\n");
    Ok(())
}

fn type_values(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(iri_value(s)),
        Value::Array(values) => {
            let rendered: Result<Vec<String>> = values.iter().map(type_values).collect();
            Ok(rendered?.join(", "))
        }
        other => Err(unrenderable(&other.to_string())),
    }
}

/// `earl:assertions` holds source-file references on the report node
/// and inline assertion blocks on tests.
fn assertions_property(value: &Value) -> Result<String> {
    let values = value
        .as_array()
        .ok_or_else(|| unrenderable("assertions is not an array"))?;
    let rendered: Result<Vec<String>> = values
        .iter()
        .map(|v| match v {
            Value::String(s) => Ok(iri_value(s)),
            Value::Object(node) => assertion_block(node),
            other => Err(unrenderable(&other.to_string())),
        })
        .collect();
    Ok(format!("earl:assertions {}", rendered?.join(", ")))
}

fn assertion_block(node: &Map<String, Value>) -> Result<String> {
    let field = |key: &str| -> Result<String> {
        node.get(key)
            .and_then(Value::as_str)
            .map(iri_value)
            .ok_or_else(|| unrenderable(&format!("assertion without {key}")))
    };
    let outcome = node
        .get("result")
        .and_then(Value::as_object)
        .and_then(|r| r.get("outcome"))
        .and_then(Value::as_str)
        .map(iri_value)
        .ok_or_else(|| unrenderable("assertion without an outcome"))?;

    let mut block = vec![
        "[".to_string(),
        "    a earl:Assertion ;".to_string(),
        format!("    earl:test {} ;", field("test")?),
        format!("    earl:subject {} ;", field("subject")?),
        "    earl:result [".to_string(),
        "      a earl:TestResult ;".to_string(),
        format!("      earl:outcome {}", outcome),
        "    ] ;".to_string(),
    ];
    if let Some(by) = node.get("assertedBy").and_then(Value::as_str) {
        block.push(format!("    earl:assertedBy {} ;", iri_value(by)));
    }
    if let Some(mode) = node.get("mode").and_then(Value::as_str) {
        block.push(format!("    earl:mode {} ;", iri_value(mode)));
    }

    Ok(block.join("\n") + "\n  ]")
}

/// An ordered collection; members are entity references.
fn list_value(value: &Value) -> Result<String> {
    let values = value
        .as_array()
        .ok_or_else(|| unrenderable("entries is not an array"))?;
    let rendered: Result<Vec<String>> = values
        .iter()
        .map(|v| match v {
            Value::String(s) => Ok(iri_value(s)),
            Value::Object(node) => node
                .get("@id")
                .and_then(Value::as_str)
                .map(iri_value)
                .ok_or_else(|| unrenderable("list member without @id")),
            other => Err(unrenderable(&other.to_string())),
        })
        .collect();
    Ok(format!("({})", rendered?.join("\n    ")))
}

/// Releases inline as anonymous property blocks; their ids are
/// run-scoped and carry no information worth an own entity.
fn release_property(value: &Value) -> Result<String> {
    let node = value
        .as_object()
        .ok_or_else(|| unrenderable("release is not an object"))?;
    let revision = node
        .get("revision")
        .and_then(Value::as_str)
        .ok_or_else(|| unrenderable("release without revision"))?;
    let mut block = format!("doap:release [doap:revision {}", quoted(revision, None, None));
    if let Some(created) = node.get("created").and_then(Value::as_str) {
        block.push_str(&format!(
            "; doap:created {}",
            quoted(created, None, Some("xsd:date"))
        ));
    }
    block.push(']');
    Ok(block)
}

fn plain_property(key: &str, value: &Value) -> Result<Option<String>> {
    let Some((_, predicate, form)) = KEY_TABLE.iter().find(|(k, _, _)| *k == key) else {
        // Unknown keys are dropped rather than guessed at.
        return Ok(None);
    };

    let values = match value {
        Value::Array(values) => values.as_slice(),
        single => std::slice::from_ref(single),
    };

    let mut rendered = Vec::with_capacity(values.len());
    for v in values {
        rendered.push(single_value(v, *form)?);
    }
    if rendered.is_empty() {
        return Ok(None);
    }
    Ok(Some(format!("{predicate} {}", rendered.join(",\n    "))))
}

fn single_value(value: &Value, form: Form) -> Result<String> {
    let Value::String(s) = value else {
        if let Value::Object(node) = value {
            if let Some(id) = node.get("@id").and_then(Value::as_str) {
                return Ok(iri_value(id));
            }
        }
        return Err(unrenderable(&value.to_string()));
    };
    Ok(match form {
        Form::Iri => iri_value(s),
        Form::Literal => quoted(s, None, None),
        Form::LangLiteral => quoted(s, Some("en"), None),
        Form::DateLiteral => quoted(s, None, Some("xsd:date")),
    })
}

/// Reference form for one IRI-position value: bracketed IRI, `<>` for
/// the relative report node, short name when a prefix applies, or a
/// pass-through for values already in short form.
fn iri_value(value: &str) -> String {
    if value.is_empty() {
        return "<>".to_string();
    }
    if let Some(short) = vocab::shorten(value) {
        return short;
    }
    if value.starts_with("http://") || value.starts_with("https://") || value.starts_with('/') {
        return format!("<{value}>");
    }
    if value.starts_with("_:") || value.contains(':') {
        return value.to_string();
    }
    format!("<{value}>")
}

/// Literal quoting. Embedded quotes and newlines switch to the
/// triple-quoted long form with quotes escaped.
fn quoted(value: &str, language: Option<&str>, datatype: Option<&str>) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    let mut out = if value.contains('\n') || value.contains('"') {
        format!("\"\"\"{escaped}\"\"\"")
    } else {
        format!("\"{escaped}\"")
    };
    if let Some(language) = language {
        out.push('@');
        out.push_str(language);
    }
    if let Some(datatype) = datatype {
        out.push_str("^^");
        out.push_str(datatype);
    }
    out
}

fn unrenderable(value: &str) -> RollupError {
    RollupError::Serialization {
        value: value.to_string(),
        form: "text notation".to_string(),
    }
}
