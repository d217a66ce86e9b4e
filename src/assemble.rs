//! Report assembly: the correlated matrix becomes a [`Report`], and the
//! report becomes a tree document or a flat triple graph.
//!
//! The tree document is the canonical interchange form; it can be fed
//! back in to reconstruct a `Report` without touching resolution or
//! correlation. The flat graph is written into a [`GraphStore`] that
//! already holds the manifest triples, ready for any triple serializer.

use indexmap::IndexMap;
use oxigraph::model::{Literal, Subject as GraphSubject, Term};
use serde_json::{json, Map, Value};

use crate::error::{Result, RollupError};
use crate::graph::GraphStore;
use crate::manifest::TestSuite;
use crate::model::{
    Assertion, BlankArena, Developer, DeveloperKind, Generator, Manifest, Mode, NodeId, Outcome,
    Release, Report, Subject, Test,
};
use crate::resolve::ResolvedSources;
use crate::vocab;

/// The tree document names the report with a relative `@id`. The flat
/// graph cannot hold a relative IRI, so the report node is grounded at
/// this placeholder there; the text serializer renders it back as `<>`.
pub const REPORT_NODE: &str = "http://example.org/report";

/// Fold the correlated suite and resolved sources into a report value.
pub fn assemble(
    suite: TestSuite,
    resolved: ResolvedSources,
    name: &str,
    bib_ref: &str,
) -> Report {
    let mut source_files = Vec::new();
    for subject in resolved.subjects.values() {
        if !source_files.contains(&subject.source) {
            source_files.push(subject.source.clone());
        }
    }

    Report {
        name: name.to_string(),
        bib_ref: bib_ref.to_string(),
        generated_by: Generator::this_tool(),
        subjects: resolved.subjects.into_values().collect(),
        manifests: suite.manifests,
        tests: suite.tests,
        source_files,
    }
}

/// The `@context` of every tree document this tool emits or accepts.
fn tree_context() -> Value {
    json!({
        "@version": 1.1,
        "@vocab": "http://www.w3.org/ns/earl#",
        "foaf:homepage": {"@type": "@id"},
        "dc": vocab::DC,
        "doap": vocab::DOAP,
        "earl": vocab::EARL,
        "mf": vocab::MF,
        "foaf": vocab::FOAF,
        "rdfs": vocab::RDFS,
        "xsd": {"@id": vocab::XSD},
        "assertedBy": {"@type": "@id"},
        "assertions": {"@type": "@id", "@container": "@set"},
        "bibRef": {"@id": "dc:bibliographicCitation"},
        "created": {"@id": "doap:created", "@type": "xsd:date"},
        "description": {"@id": "rdfs:comment", "@language": "en"},
        "developer": {"@id": "doap:developer", "@type": "@id", "@container": "@set"},
        "doapDesc": {"@id": "doap:description", "@language": "en"},
        "generatedBy": {"@type": "@id"},
        "homepage": {"@id": "doap:homepage", "@type": "@id"},
        "language": {"@id": "doap:programming-language"},
        "mode": {"@type": "@id"},
        "name": {"@id": "doap:name"},
        "outcome": {"@type": "@id"},
        "release": {"@id": "doap:release", "@type": "@id"},
        "revision": {"@id": "doap:revision"},
        "subject": {"@type": "@id"},
        "test": {"@type": "@id"},
        "testAction": {"@id": "mf:action", "@type": "@id"},
        "testResult": {"@id": "mf:result", "@type": "@id"},
        "title": {"@id": "mf:name"},
        "entries": {"@id": "mf:entries", "@type": "@id", "@container": "@list"},
        "testSubjects": {"@type": "@id", "@container": "@set"},
    })
}

/// Serialize the report as its tree document. Subjects are ordered by
/// IRI; per-test assertion slots keep discovery (column) order.
pub fn to_tree(report: &Report) -> Value {
    let mut subjects: Vec<&Subject> = report.subjects.iter().collect();
    subjects.sort_by(|a, b| a.uri.cmp(&b.uri));

    let entries: Vec<Value> = report
        .manifests
        .iter()
        .map(|manifest| manifest_tree(manifest, &report.tests))
        .collect();

    json!({
        "@context": tree_context(),
        "@id": "",
        "@type": ["earl:Software", "doap:Project"],
        "name": report.name,
        "bibRef": report.bib_ref,
        "generatedBy": generator_tree(&report.generated_by),
        "assertions": report.source_files,
        "testSubjects": subjects.iter().map(|s| subject_tree(s)).collect::<Vec<_>>(),
        "entries": entries,
    })
}

fn manifest_tree(manifest: &Manifest, tests: &IndexMap<String, Test>) -> Value {
    let entries: Vec<Value> = manifest
        .entries
        .iter()
        .filter_map(|uri| tests.get(uri))
        .map(test_tree)
        .collect();

    let mut node = Map::new();
    node.insert("@id".into(), Value::String(manifest.id.id_str()));
    node.insert("@type".into(), json!(["earl:Report", "mf:Manifest"]));
    if let Some(title) = &manifest.title {
        node.insert("title".into(), Value::String(title.clone()));
    }
    node.insert("entries".into(), Value::Array(entries));
    Value::Object(node)
}

fn test_tree(test: &Test) -> Value {
    let mut types = vec![
        Value::String("earl:TestCriterion".into()),
        Value::String("earl:TestCase".into()),
    ];
    for iri in &test.types {
        let short = vocab::shorten(iri).unwrap_or_else(|| iri.clone());
        if !types.iter().any(|t| t == &Value::String(short.clone())) {
            types.push(Value::String(short));
        }
    }

    let mut node = Map::new();
    node.insert("@id".into(), Value::String(test.uri.clone()));
    node.insert("@type".into(), Value::Array(types));
    if let Some(title) = &test.title {
        node.insert("title".into(), Value::String(title.clone()));
    }
    if let Some(description) = &test.description {
        node.insert("description".into(), Value::String(description.clone()));
    }
    node.insert("testAction".into(), Value::String(test.action.clone()));
    if let Some(result) = &test.result {
        node.insert("testResult".into(), Value::String(result.clone()));
    }
    node.insert(
        "assertions".into(),
        Value::Array(test.assertions.iter().map(assertion_tree).collect()),
    );
    Value::Object(node)
}

fn assertion_tree(assertion: &Assertion) -> Value {
    let mut node = Map::new();
    node.insert("@type".into(), Value::String("earl:Assertion".into()));
    if let Some(by) = &assertion.asserted_by {
        node.insert("assertedBy".into(), Value::String(by.clone()));
    }
    if let Some(mode) = assertion.mode {
        node.insert("mode".into(), Value::String(mode.curie()));
    }
    node.insert("subject".into(), Value::String(assertion.subject.clone()));
    node.insert("test".into(), Value::String(assertion.test.clone()));
    node.insert(
        "result".into(),
        json!({
            "@type": "earl:TestResult",
            "outcome": assertion.outcome.curie(),
        }),
    );
    Value::Object(node)
}

fn subject_tree(subject: &Subject) -> Value {
    let mut node = Map::new();
    node.insert("@id".into(), Value::String(subject.uri.clone()));
    node.insert("@type".into(), json!(["earl:TestSubject", "doap:Project"]));
    node.insert("name".into(), Value::String(subject.name.clone()));
    if let Some(description) = &subject.description {
        node.insert("doapDesc".into(), Value::String(description.clone()));
    }
    if let Some(homepage) = &subject.homepage {
        node.insert("homepage".into(), Value::String(homepage.clone()));
    }
    if let Some(language) = &subject.language {
        node.insert("language".into(), Value::String(language.clone()));
    }
    node.insert(
        "developer".into(),
        Value::Array(subject.developers.iter().map(developer_tree).collect()),
    );
    if let Some(release) = &subject.release {
        node.insert("release".into(), release_tree(release));
    }
    Value::Object(node)
}

fn developer_tree(developer: &Developer) -> Value {
    let mut node = Map::new();
    node.insert("@id".into(), Value::String(developer.id.id_str()));
    if let Some(curie) = developer.kind.curie() {
        node.insert("@type".into(), json!([curie]));
    }
    if let Some(name) = &developer.name {
        node.insert("foaf:name".into(), Value::String(name.clone()));
    }
    if let Some(homepage) = &developer.homepage {
        node.insert("foaf:homepage".into(), Value::String(homepage.clone()));
    }
    Value::Object(node)
}

fn release_tree(release: &Release) -> Value {
    json!({
        "@id": release.id.id_str(),
        "revision": release.revision,
    })
}

fn generator_tree(generator: &Generator) -> Value {
    json!({
        "@id": generator.iri,
        "@type": ["earl:Software", "doap:Project"],
        "name": generator.name,
        "homepage": generator.homepage,
        "language": generator.language,
        "release": {
            "revision": generator.revision,
            "created": generator.created,
        },
    })
}

/// Reconstruct a report from a previously materialized tree document.
/// Anonymous and relative identities come back exactly as emitted.
pub fn from_tree(tree: &Value) -> Result<Report> {
    let root = tree
        .as_object()
        .ok_or_else(|| malformed("document root is not an object"))?;

    let name = string_of(root, "name").unwrap_or_default();
    let bib_ref = string_of(root, "bibRef").unwrap_or_default();

    let source_files = root
        .get("assertions")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut subjects = Vec::new();
    for value in root
        .get("testSubjects")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        subjects.push(subject_from_tree(value)?);
    }

    let mut manifests = Vec::new();
    let mut tests: IndexMap<String, Test> = IndexMap::new();
    for value in root
        .get("entries")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let node = value
            .as_object()
            .ok_or_else(|| malformed("manifest entry is not an object"))?;
        let id = string_of(node, "@id").ok_or_else(|| malformed("manifest without @id"))?;
        let mut entries = Vec::new();
        for entry in node
            .get("entries")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let test = test_from_tree(entry)?;
            entries.push(test.uri.clone());
            tests.entry(test.uri.clone()).or_insert(test);
        }
        manifests.push(Manifest {
            id: NodeId::from_id_str(&id),
            title: string_of(node, "title"),
            entries,
        });
    }

    let generated_by = root
        .get("generatedBy")
        .map(generator_from_tree)
        .unwrap_or_else(Generator::this_tool);

    Ok(Report {
        name,
        bib_ref,
        generated_by,
        subjects,
        manifests,
        tests,
        source_files,
    })
}

fn subject_from_tree(value: &Value) -> Result<Subject> {
    let node = value
        .as_object()
        .ok_or_else(|| malformed("test subject is not an object"))?;
    let uri = string_of(node, "@id").ok_or_else(|| malformed("test subject without @id"))?;

    let mut developers = Vec::new();
    for dev in node
        .get("developer")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let dev = dev
            .as_object()
            .ok_or_else(|| malformed("developer is not an object"))?;
        let id = string_of(dev, "@id").ok_or_else(|| malformed("developer without @id"))?;
        let kind = dev
            .get("@type")
            .and_then(Value::as_array)
            .and_then(|types| types.first())
            .and_then(Value::as_str)
            .map(DeveloperKind::from_type_iri)
            .unwrap_or(DeveloperKind::Unknown);
        developers.push(Developer {
            id: NodeId::from_id_str(&id),
            name: string_of(dev, "foaf:name"),
            kind,
            homepage: string_of(dev, "foaf:homepage"),
        });
    }

    let release = node
        .get("release")
        .and_then(Value::as_object)
        .map(|rel| Release {
            id: string_of(rel, "@id")
                .map(|id| NodeId::from_id_str(&id))
                .unwrap_or_else(|| NodeId::Anon("release".to_string())),
            revision: string_of(rel, "revision").unwrap_or_else(|| "unknown".to_string()),
        });

    Ok(Subject {
        uri: uri.clone(),
        name: string_of(node, "name").unwrap_or_default(),
        description: string_of(node, "doapDesc"),
        homepage: string_of(node, "homepage"),
        language: string_of(node, "language"),
        developers,
        release,
        source: String::new(),
    })
}

fn test_from_tree(value: &Value) -> Result<Test> {
    let node = value
        .as_object()
        .ok_or_else(|| malformed("test entry is not an object"))?;
    let uri = string_of(node, "@id").ok_or_else(|| malformed("test without @id"))?;

    let mut assertions = Vec::new();
    for assertion in node
        .get("assertions")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        assertions.push(assertion_from_tree(assertion, &uri)?);
    }

    let types = node
        .get("@type")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .filter(|t| !t.starts_with("earl:"))
                .filter_map(vocab::expand)
                .collect()
        })
        .unwrap_or_default();

    Ok(Test {
        uri: uri.clone(),
        title: string_of(node, "title"),
        description: string_of(node, "description"),
        action: string_of(node, "testAction").unwrap_or_default(),
        result: string_of(node, "testResult"),
        types,
        assertions,
    })
}

fn assertion_from_tree(value: &Value, test: &str) -> Result<Assertion> {
    let node = value
        .as_object()
        .ok_or_else(|| malformed("assertion is not an object"))?;
    let subject = string_of(node, "subject").ok_or_else(|| malformed("assertion without subject"))?;

    let outcome = node
        .get("result")
        .and_then(Value::as_object)
        .and_then(|result| string_of(result, "outcome"))
        .and_then(|iri| Outcome::from_iri(&iri))
        .ok_or_else(|| malformed("assertion without a recognizable outcome"))?;

    let asserted_by = string_of(node, "assertedBy");
    let synthesized = asserted_by.is_none() && outcome == Outcome::Untested;

    Ok(Assertion {
        subject,
        test: test.to_string(),
        asserted_by,
        mode: string_of(node, "mode").as_deref().and_then(Mode::from_iri),
        outcome,
        synthesized,
    })
}

fn generator_from_tree(value: &Value) -> Generator {
    let mut generator = Generator::this_tool();
    if let Some(node) = value.as_object() {
        if let Some(iri) = string_of(node, "@id") {
            generator.iri = iri;
        }
        if let Some(name) = string_of(node, "name") {
            generator.name = name;
        }
        if let Some(homepage) = string_of(node, "homepage") {
            generator.homepage = homepage;
        }
        if let Some(language) = string_of(node, "language") {
            generator.language = language;
        }
        if let Some(release) = node.get("release").and_then(Value::as_object) {
            if let Some(revision) = string_of(release, "revision") {
                generator.revision = revision;
            }
            if let Some(created) = string_of(release, "created") {
                generator.created = created;
            }
        }
    }
    generator
}

fn string_of(node: &Map<String, Value>, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).map(str::to_string)
}

fn malformed(detail: &str) -> RollupError {
    RollupError::Serialization {
        value: detail.to_string(),
        form: "tree document".to_string(),
    }
}

/// Write the report's flat triples into `store`, which already holds
/// the loaded manifest graph. Blank node ids for assertions, results,
/// and the wrapper entries list come from the run-scoped arena.
pub fn write_graph(report: &Report, store: &GraphStore, arena: &mut BlankArena) -> Result<()> {
    let root = NodeId::Iri(REPORT_NODE.to_string());
    let root_subject = root.to_subject();

    insert_iri(store, &root_subject, &vocab::rdf("type"), vocab::EARL, "Software")?;
    insert_iri(store, &root_subject, &vocab::rdf("type"), vocab::DOAP, "Project")?;
    insert_str(store, &root_subject, &vocab::doap("name"), &report.name)?;
    insert_str(
        store,
        &root_subject,
        &vocab::dc("bibliographicCitation"),
        &report.bib_ref,
    )?;
    store.insert(
        &root_subject,
        &vocab::earl("generatedBy"),
        &NodeId::Iri(report.generated_by.iri.clone()).to_term(),
    )?;
    // Source references are IRI-valued, relative paths included, so
    // the flat graph agrees with the tree context's `@type: @id`.
    for file in &report.source_files {
        store.insert(
            &root_subject,
            &vocab::earl("assertions"),
            &NodeId::Iri(file.clone()).to_term(),
        )?;
    }
    for subject in &report.subjects {
        store.insert(
            &root_subject,
            &vocab::earl("testSubjects"),
            &NodeId::Iri(subject.uri.clone()).to_term(),
        )?;
    }
    let manifest_terms: Vec<Term> = report.manifests.iter().map(|m| m.id.to_term()).collect();
    insert_list(store, arena, &root_subject, &vocab::mf("entries"), &manifest_terms)?;

    for manifest in &report.manifests {
        let subject = manifest.id.to_subject();
        insert_iri(store, &subject, &vocab::rdf("type"), vocab::EARL, "Report")?;
    }

    for subject in &report.subjects {
        write_subject(store, subject)?;
    }

    for test in report.tests.values() {
        write_test(store, test, arena)?;
    }

    write_generator(store, &report.generated_by, arena)?;
    Ok(())
}

fn write_subject(store: &GraphStore, subject: &Subject) -> Result<()> {
    let node = NodeId::Iri(subject.uri.clone());
    let graph_subject = node.to_subject();

    insert_iri(store, &graph_subject, &vocab::rdf("type"), vocab::EARL, "TestSubject")?;
    insert_iri(store, &graph_subject, &vocab::rdf("type"), vocab::EARL, "Software")?;
    insert_iri(store, &graph_subject, &vocab::rdf("type"), vocab::DOAP, "Project")?;
    insert_str(store, &graph_subject, &vocab::doap("name"), &subject.name)?;
    if let Some(description) = &subject.description {
        insert_lang(store, &graph_subject, &vocab::doap("description"), description)?;
    }
    if let Some(homepage) = &subject.homepage {
        store.insert(
            &graph_subject,
            &vocab::doap("homepage"),
            &NodeId::Iri(homepage.clone()).to_term(),
        )?;
    }
    if let Some(language) = &subject.language {
        insert_str(
            store,
            &graph_subject,
            &vocab::doap("programming-language"),
            language,
        )?;
    }

    for developer in &subject.developers {
        let dev_subject = developer.id.to_subject();
        store.insert(&graph_subject, &vocab::doap("developer"), &developer.id.to_term())?;
        if let Some(curie) = developer.kind.curie() {
            let local = curie.split(':').nth(1).unwrap_or("Person");
            insert_iri(store, &dev_subject, &vocab::rdf("type"), vocab::FOAF, local)?;
        }
        if let Some(name) = &developer.name {
            insert_str(store, &dev_subject, &vocab::foaf("name"), name)?;
        }
        if let Some(homepage) = &developer.homepage {
            store.insert(
                &dev_subject,
                &vocab::foaf("homepage"),
                &NodeId::Iri(homepage.clone()).to_term(),
            )?;
        }
    }

    if let Some(release) = &subject.release {
        let rel_subject = release.id.to_subject();
        store.insert(&graph_subject, &vocab::doap("release"), &release.id.to_term())?;
        insert_str(store, &rel_subject, &vocab::doap("revision"), &release.revision)?;
    }

    Ok(())
}

fn write_test(store: &GraphStore, test: &Test, arena: &mut BlankArena) -> Result<()> {
    let node = NodeId::Iri(test.uri.clone());
    let graph_subject = node.to_subject();
    insert_iri(store, &graph_subject, &vocab::rdf("type"), vocab::EARL, "TestCriterion")?;
    insert_iri(store, &graph_subject, &vocab::rdf("type"), vocab::EARL, "TestCase")?;

    // Slot order is preserved through repeated earl:assertions triples;
    // consumers needing column alignment use the tree document.
    for assertion in &test.assertions {
        let id = arena.node("assertion");
        let assertion_subject = id.to_subject();
        store.insert(&graph_subject, &vocab::earl("assertions"), &id.to_term())?;

        insert_iri(store, &assertion_subject, &vocab::rdf("type"), vocab::EARL, "Assertion")?;
        store.insert(
            &assertion_subject,
            &vocab::earl("subject"),
            &NodeId::Iri(assertion.subject.clone()).to_term(),
        )?;
        store.insert(
            &assertion_subject,
            &vocab::earl("test"),
            &NodeId::Iri(assertion.test.clone()).to_term(),
        )?;
        if let Some(by) = &assertion.asserted_by {
            store.insert(
                &assertion_subject,
                &vocab::earl("assertedBy"),
                &NodeId::Iri(by.clone()).to_term(),
            )?;
        }
        if let Some(mode) = assertion.mode {
            store.insert(
                &assertion_subject,
                &vocab::earl("mode"),
                &NodeId::Iri(mode.iri()).to_term(),
            )?;
        }

        let result = arena.node("result");
        let result_subject = result.to_subject();
        store.insert(&assertion_subject, &vocab::earl("result"), &result.to_term())?;
        insert_iri(store, &result_subject, &vocab::rdf("type"), vocab::EARL, "TestResult")?;
        store.insert(
            &result_subject,
            &vocab::earl("outcome"),
            &NodeId::Iri(assertion.outcome.iri()).to_term(),
        )?;
    }

    Ok(())
}

fn write_generator(store: &GraphStore, generator: &Generator, arena: &mut BlankArena) -> Result<()> {
    let node = NodeId::Iri(generator.iri.clone());
    let graph_subject = node.to_subject();

    insert_iri(store, &graph_subject, &vocab::rdf("type"), vocab::EARL, "Software")?;
    insert_iri(store, &graph_subject, &vocab::rdf("type"), vocab::DOAP, "Project")?;
    insert_str(store, &graph_subject, &vocab::doap("name"), &generator.name)?;
    if !generator.homepage.is_empty() {
        store.insert(
            &graph_subject,
            &vocab::doap("homepage"),
            &NodeId::Iri(generator.homepage.clone()).to_term(),
        )?;
    }
    insert_str(
        store,
        &graph_subject,
        &vocab::doap("programming-language"),
        &generator.language,
    )?;

    let release = arena.node("release");
    let rel_subject = release.to_subject();
    store.insert(&graph_subject, &vocab::doap("release"), &release.to_term())?;
    insert_str(store, &rel_subject, &vocab::doap("revision"), &generator.revision)?;
    store.insert(
        &rel_subject,
        &vocab::doap("created"),
        &Term::Literal(Literal::new_typed_literal(
            generator.created.clone(),
            vocab::xsd("date"),
        )),
    )?;
    Ok(())
}

fn insert_iri(
    store: &GraphStore,
    subject: &GraphSubject,
    predicate: &oxigraph::model::NamedNode,
    namespace: &str,
    local: &str,
) -> Result<()> {
    store.insert(
        subject,
        predicate,
        &NodeId::Iri(format!("{namespace}{local}")).to_term(),
    )
}

fn insert_str(
    store: &GraphStore,
    subject: &GraphSubject,
    predicate: &oxigraph::model::NamedNode,
    value: &str,
) -> Result<()> {
    store.insert(
        subject,
        predicate,
        &Term::Literal(Literal::new_simple_literal(value)),
    )
}

fn insert_lang(
    store: &GraphStore,
    subject: &GraphSubject,
    predicate: &oxigraph::model::NamedNode,
    value: &str,
) -> Result<()> {
    store.insert(
        subject,
        predicate,
        &Term::Literal(Literal::new_language_tagged_literal_unchecked(value, "en")),
    )
}

/// Insert an RDF collection in member order.
fn insert_list(
    store: &GraphStore,
    arena: &mut BlankArena,
    subject: &GraphSubject,
    predicate: &oxigraph::model::NamedNode,
    members: &[Term],
) -> Result<()> {
    let nil = Term::NamedNode(vocab::rdf("nil"));
    if members.is_empty() {
        return store.insert(subject, predicate, &nil);
    }

    let mut cells = Vec::with_capacity(members.len());
    for _ in members {
        cells.push(arena.node("entries"));
    }
    store.insert(subject, predicate, &cells[0].to_term())?;
    for (index, member) in members.iter().enumerate() {
        let cell = cells[index].to_subject();
        store.insert(&cell, &vocab::rdf("first"), member)?;
        let rest = cells
            .get(index + 1)
            .map(NodeId::to_term)
            .unwrap_or_else(|| nil.clone());
        store.insert(&cell, &vocab::rdf("rest"), &rest)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mode;
    use oxigraph::io::RdfFormat;

    fn sample_report() -> Report {
        let subjects = vec![
            Subject {
                uri: "http://example.org/impl-b".to_string(),
                name: "Impl B".to_string(),
                description: Some("Second implementation".to_string()),
                homepage: Some("http://example.org/b".to_string()),
                language: Some("Rust".to_string()),
                developers: vec![Developer {
                    id: NodeId::Iri("http://example.org/b#dev".to_string()),
                    name: Some("Bea".to_string()),
                    kind: DeveloperKind::Person,
                    homepage: None,
                }],
                release: Some(Release {
                    id: NodeId::Anon("release0".to_string()),
                    revision: "unknown".to_string(),
                }),
                source: "b.ttl".to_string(),
            },
            Subject {
                uri: "http://example.org/impl-a".to_string(),
                name: "Impl A".to_string(),
                description: None,
                homepage: None,
                language: None,
                developers: Vec::new(),
                release: Some(Release {
                    id: NodeId::Iri("http://example.org/a/v1".to_string()),
                    revision: "1.0".to_string(),
                }),
                source: "a.ttl".to_string(),
            },
        ];

        let test = Test {
            uri: "http://example.org/t1".to_string(),
            title: Some("Test one".to_string()),
            description: None,
            action: "http://example.org/t1-in".to_string(),
            result: None,
            types: vec![format!("{}QueryEvaluationTest", vocab::MF)],
            assertions: vec![
                Assertion {
                    subject: "http://example.org/impl-b".to_string(),
                    test: "http://example.org/t1".to_string(),
                    asserted_by: Some("http://example.org/bot".to_string()),
                    mode: Some(Mode::Automatic),
                    outcome: Outcome::Passed,
                    synthesized: false,
                },
                Assertion::untested("http://example.org/impl-a", "http://example.org/t1"),
            ],
        };

        let mut tests = IndexMap::new();
        tests.insert(test.uri.clone(), test);

        Report {
            name: "Example Results".to_string(),
            bib_ref: "[[EXAMPLE]]".to_string(),
            generated_by: Generator::this_tool(),
            subjects,
            manifests: vec![Manifest {
                id: NodeId::Iri("http://example.org/manifest".to_string()),
                title: Some("Example Suite".to_string()),
                entries: vec!["http://example.org/t1".to_string()],
            }],
            tests,
            source_files: vec!["b.ttl".to_string(), "a.ttl".to_string()],
        }
    }

    #[test]
    fn tree_sorts_subjects_but_keeps_slot_order() {
        let tree = to_tree(&sample_report());

        let subjects = tree["testSubjects"].as_array().unwrap();
        assert_eq!(subjects[0]["@id"], "http://example.org/impl-a");
        assert_eq!(subjects[1]["@id"], "http://example.org/impl-b");

        // Slot order stays column-aligned: impl-b resolved first.
        let assertions = tree["entries"][0]["entries"][0]["assertions"]
            .as_array()
            .unwrap();
        assert_eq!(assertions[0]["subject"], "http://example.org/impl-b");
        assert_eq!(assertions[0]["result"]["outcome"], "earl:passed");
        assert_eq!(assertions[1]["subject"], "http://example.org/impl-a");
        assert_eq!(assertions[1]["result"]["outcome"], "earl:untested");
        assert!(assertions[1].get("assertedBy").is_none());
    }

    #[test]
    fn tree_report_node_is_relative() {
        let tree = to_tree(&sample_report());
        assert_eq!(tree["@id"], "");
        assert_eq!(tree["name"], "Example Results");
        assert_eq!(tree["bibRef"], "[[EXAMPLE]]");
    }

    #[test]
    fn tree_round_trips_identities() {
        let report = sample_report();
        let tree = to_tree(&report);
        let back = from_tree(&tree).unwrap();

        assert_eq!(back.name, report.name);
        assert_eq!(back.bib_ref, report.bib_ref);
        assert_eq!(back.source_files, report.source_files);
        assert_eq!(back.manifests, report.manifests);

        // Subjects come back in tree (sorted) order with ids intact.
        assert_eq!(back.subjects.len(), 2);
        let impl_b = back
            .subjects
            .iter()
            .find(|s| s.uri == "http://example.org/impl-b")
            .unwrap();
        assert_eq!(
            impl_b.release.as_ref().unwrap().id,
            NodeId::Anon("release0".to_string())
        );
        assert_eq!(impl_b.developers[0].name.as_deref(), Some("Bea"));

        let t1 = &back.tests["http://example.org/t1"];
        assert_eq!(t1.assertions.len(), 2);
        assert!(t1.assertions[1].synthesized);
        assert_eq!(t1.types, vec![format!("{}QueryEvaluationTest", vocab::MF)]);
    }

    #[test]
    fn flat_graph_carries_wrapper_and_types() {
        let report = sample_report();
        let store = GraphStore::new().unwrap();
        let mut arena = BlankArena::new();
        write_graph(&report, &store, &mut arena).unwrap();

        let dump = store.dump(RdfFormat::NTriples).unwrap();
        assert!(dump.contains(REPORT_NODE));
        assert!(dump.contains("\"Example Results\""));
        assert!(dump.contains("http://www.w3.org/ns/earl#TestSubject"));
        assert!(dump.contains("http://www.w3.org/ns/earl#TestCase"));
        assert!(dump.contains("http://www.w3.org/ns/earl#untested"));
        assert!(dump.contains("http://www.w3.org/1999/02/22-rdf-syntax-ns#first"));
        assert!(dump.contains("\"Second implementation\"@en"));
    }

    #[test]
    fn flat_graph_source_references_are_iris() {
        let store = GraphStore::new().unwrap();
        let mut arena = BlankArena::new();
        write_graph(&sample_report(), &store, &mut arena).unwrap();

        let dump = store.dump(RdfFormat::NTriples).unwrap();
        assert!(dump.contains("<http://www.w3.org/ns/earl#assertions> <b.ttl>"));
        assert!(dump.contains("<http://www.w3.org/ns/earl#assertions> <a.ttl>"));
        assert!(!dump.contains("\"b.ttl\""));
    }

    #[test]
    fn subjects_are_typed_as_software_too() {
        let store = GraphStore::new().unwrap();
        let mut arena = BlankArena::new();
        write_graph(&sample_report(), &store, &mut arena).unwrap();

        let dump = store.dump(RdfFormat::NTriples).unwrap();
        assert!(dump.contains(
            "<http://example.org/impl-a> \
             <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> \
             <http://www.w3.org/ns/earl#Software>"
        ));
    }

    #[test]
    fn assemble_collects_distinct_source_files() {
        let report = sample_report();
        assert_eq!(report.source_files, vec!["b.ttl", "a.ttl"]);
    }
}
