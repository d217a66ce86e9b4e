//! Manifest loading and test discovery.
//!
//! Manifest sources are loaded into the report store, then a discovery
//! query finds every resource carrying a test action. Ordering comes
//! from each manifest's own entries list, walked positionally — never
//! from query result or map insertion order.

use indexmap::IndexMap;
use oxigraph::model::{Subject as GraphSubject, Term};

use crate::binding::Binding;
use crate::diagnostics::Diagnostics;
use crate::error::{Result, RollupError};
use crate::fetch::{load_reference, DocumentFetcher};
use crate::graph::GraphStore;
use crate::model::{Manifest, NodeId, Test};
use crate::vocab;

/// Everything the correlator needs about the test universe.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSuite {
    /// Discovery order.
    pub manifests: Vec<Manifest>,
    /// Keyed by test uri; insertion follows discovery order.
    pub tests: IndexMap<String, Test>,
}

pub fn load_manifests(
    store: &GraphStore,
    fetcher: &dyn DocumentFetcher,
    diag: &mut Diagnostics,
    manifest_refs: &[String],
    base: Option<&str>,
    discovery_query: &str,
) -> Result<TestSuite> {
    for reference in manifest_refs {
        diag.status(format!("read {reference}"));
        let added = load_reference(store, fetcher, reference, base)?;
        diag.status(format!("  loaded {added} triples from {reference}"));
    }

    let rows = store.query(discovery_query)?;
    if rows.is_empty() {
        return Err(RollupError::Discovery {
            query: discovery_query.to_string(),
        });
    }

    let mut tests: IndexMap<String, Test> = IndexMap::new();
    let mut test_manifest: IndexMap<String, Option<NodeId>> = IndexMap::new();
    let mut manifest_ids: Vec<NodeId> = Vec::new();

    for row in &rows {
        let binding = Binding::new(row);
        let uri = binding
            .iri("uri")
            .map_err(|e| RollupError::Graph(format!("discovery query: {e}")))?;
        let action = binding
            .term("testAction")
            .map(term_value)
            .unwrap_or_default();
        let manifest = binding.node_opt("manUri");

        if let Some(id) = &manifest {
            if !manifest_ids.contains(id) {
                manifest_ids.push(id.clone());
            }
        }
        // A test can surface in several discovery rows; the first one
        // fixes its manifest attribution.
        test_manifest.entry(uri.clone()).or_insert(manifest);
        tests
            .entry(uri.clone())
            .or_insert_with(|| describe_test(store, &uri, action));
    }

    let mut manifests = Vec::with_capacity(manifest_ids.len());
    for id in manifest_ids {
        let subject = id.to_subject();
        let title = literal_of(store, &subject, &[vocab::mf("name"), vocab::dc("title"), vocab::rdfs("label")])?;

        // Declared entries first, walked positionally.
        let mut entries = Vec::new();
        for entry in walk_entries(store, &subject)? {
            if tests.contains_key(&entry) && !entries.contains(&entry) {
                entries.push(entry);
            }
        }
        // Discovered tests the list does not mention keep discovery order.
        for (uri, owner) in &test_manifest {
            if owner.as_ref() == Some(&id) && !entries.contains(uri) {
                entries.push(uri.clone());
            }
        }

        manifests.push(Manifest { id, title, entries });
    }

    diag.status(format!(
        "discovered {} tests across {} manifests",
        tests.len(),
        manifests.len()
    ));

    Ok(TestSuite { manifests, tests })
}

fn describe_test(store: &GraphStore, uri: &str, action: String) -> Test {
    let subject = NodeId::Iri(uri.to_string()).to_subject();
    let title = literal_of(
        store,
        &subject,
        &[vocab::mf("name"), vocab::dc("title"), vocab::rdfs("label")],
    )
    .unwrap_or(None);
    let description = literal_of(
        store,
        &subject,
        &[vocab::rdfs("comment"), vocab::dc("description")],
    )
    .unwrap_or(None);
    let result = store
        .first_object(&subject, &vocab::mf("result"))
        .unwrap_or(None)
        .map(|term| term_value(&term));
    let types = store
        .objects(&subject, &vocab::rdf("type"))
        .unwrap_or_default()
        .into_iter()
        .filter_map(|term| match term {
            Term::NamedNode(node) => Some(node.as_str().to_string()),
            _ => None,
        })
        .collect();

    Test {
        uri: uri.to_string(),
        title,
        description,
        action,
        result,
        types,
        assertions: Vec::new(),
    }
}

/// Walk an `mf:entries` RDF collection, returning member IRIs in list
/// order. Malformed lists terminate early rather than looping.
fn walk_entries(store: &GraphStore, manifest: &GraphSubject) -> Result<Vec<String>> {
    let mut members = Vec::new();
    let mut seen = Vec::new();

    let Some(head) = store.first_object(manifest, &vocab::mf("entries"))? else {
        return Ok(members);
    };

    let mut cursor = head;
    loop {
        let node = match &cursor {
            Term::NamedNode(n) if n.as_str() == format!("{}nil", vocab::RDF) => break,
            Term::NamedNode(n) => GraphSubject::NamedNode(n.clone()),
            Term::BlankNode(b) => GraphSubject::BlankNode(b.clone()),
            _ => break,
        };
        if seen.contains(&cursor) {
            break;
        }
        seen.push(cursor.clone());

        if let Some(Term::NamedNode(first)) = store.first_object(&node, &vocab::rdf("first"))? {
            members.push(first.as_str().to_string());
        }
        match store.first_object(&node, &vocab::rdf("rest"))? {
            Some(rest) => cursor = rest,
            None => break,
        }
    }

    Ok(members)
}

fn literal_of(
    store: &GraphStore,
    subject: &GraphSubject,
    predicates: &[oxigraph::model::NamedNode],
) -> Result<Option<String>> {
    for predicate in predicates {
        if let Some(Term::Literal(lit)) = store.first_object(subject, predicate)? {
            return Ok(Some(lit.value().to_string()));
        }
    }
    Ok(None)
}

fn term_value(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => node.as_str().to_string(),
        Term::Literal(lit) => lit.value().to_string(),
        Term::BlankNode(node) => format!("_:{}", node.as_str()),
        Term::Triple(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;
    use crate::queries::DISCOVERY_QUERY;
    use assert_matches::assert_matches;
    use oxigraph::io::RdfFormat;

    const MANIFEST: &str = r#"
        @prefix mf: <http://www.w3.org/2001/sw/DataAccess/tests/test-manifest#> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

        <http://example.org/manifest> a mf:Manifest ;
            rdfs:label "Example Suite" ;
            mf:entries ( <http://example.org/t2> <http://example.org/t1> ) .

        <http://example.org/t1> a mf:QueryEvaluationTest ;
            mf:name "Test one" ;
            rdfs:comment "First check" ;
            mf:action <http://example.org/t1-in> ;
            mf:result <http://example.org/t1-out> .

        <http://example.org/t2> mf:name "Test two" ;
            mf:action <http://example.org/t2-in> .
    "#;

    fn loaded_suite() -> TestSuite {
        let store = GraphStore::new().unwrap();
        store
            .load_bytes(RdfFormat::Turtle, MANIFEST.as_bytes(), None)
            .unwrap();
        let mut diag = Diagnostics::new();
        // Manifest already in the store; pass no further references.
        load_manifests(
            &store,
            &StaticFetcher::new(),
            &mut diag,
            &[],
            None,
            DISCOVERY_QUERY,
        )
        .unwrap()
    }

    #[test]
    fn entries_follow_declared_list_order() {
        let suite = loaded_suite();
        assert_eq!(suite.manifests.len(), 1);
        let manifest = &suite.manifests[0];
        assert_eq!(manifest.title.as_deref(), Some("Example Suite"));
        assert_eq!(
            manifest.entries,
            vec![
                "http://example.org/t2".to_string(),
                "http://example.org/t1".to_string()
            ]
        );
    }

    #[test]
    fn test_metadata_is_collected() {
        let suite = loaded_suite();
        let t1 = &suite.tests["http://example.org/t1"];
        assert_eq!(t1.title.as_deref(), Some("Test one"));
        assert_eq!(t1.description.as_deref(), Some("First check"));
        assert_eq!(t1.action, "http://example.org/t1-in");
        assert_eq!(t1.result.as_deref(), Some("http://example.org/t1-out"));
        assert!(t1
            .types
            .iter()
            .any(|t| t.ends_with("QueryEvaluationTest")));
    }

    #[test]
    fn zero_tests_is_fatal_and_echoes_query() {
        let store = GraphStore::new().unwrap();
        let mut diag = Diagnostics::new();
        let err = load_manifests(
            &store,
            &StaticFetcher::new(),
            &mut diag,
            &[],
            None,
            DISCOVERY_QUERY,
        )
        .unwrap_err();
        assert_matches!(&err, RollupError::Discovery { query } if query.contains("mf:action"));
    }
}
