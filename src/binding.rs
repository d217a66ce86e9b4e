//! Typed extraction from SPARQL query solutions.
//!
//! The rollup queries bind a small set of shapes: IRIs for resources,
//! plain or tagged literals for names and descriptions, and blank nodes
//! for anonymous developers and releases.

use oxigraph::model::Term;
use oxigraph::sparql::QuerySolution;
use thiserror::Error;

use crate::model::NodeId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindingError {
    #[error("variable '{0}' is unbound")]
    Missing(String),

    #[error("expected {expected} for '{var}', got {actual}")]
    TypeMismatch {
        var: String,
        expected: String,
        actual: String,
    },
}

pub struct Binding<'a> {
    solution: &'a QuerySolution,
}

impl<'a> Binding<'a> {
    pub fn new(solution: &'a QuerySolution) -> Self {
        Self { solution }
    }

    pub fn term(&self, var: &str) -> Option<&Term> {
        self.solution.get(var)
    }

    pub fn iri(&self, var: &str) -> Result<String, BindingError> {
        match self.term(var) {
            Some(Term::NamedNode(node)) => Ok(node.as_str().to_string()),
            Some(term) => Err(mismatch(var, "IRI", term)),
            None => Err(BindingError::Missing(var.to_string())),
        }
    }

    pub fn iri_opt(&self, var: &str) -> Option<String> {
        match self.term(var) {
            Some(Term::NamedNode(node)) => Some(node.as_str().to_string()),
            _ => None,
        }
    }

    /// IRI or blank node, for variables that may bind anonymous nodes.
    pub fn node_opt(&self, var: &str) -> Option<NodeId> {
        match self.term(var) {
            Some(Term::NamedNode(node)) => Some(NodeId::Iri(node.as_str().to_string())),
            Some(Term::BlankNode(node)) => Some(NodeId::Anon(node.as_str().to_string())),
            _ => None,
        }
    }

    /// Literal value with its tags stripped; the queries only bind
    /// plain or language-tagged strings in literal position.
    pub fn literal_opt(&self, var: &str) -> Option<String> {
        match self.term(var) {
            Some(Term::Literal(lit)) => Some(lit.value().to_string()),
            _ => None,
        }
    }
}

fn mismatch(var: &str, expected: &str, term: &Term) -> BindingError {
    let actual = match term {
        Term::NamedNode(_) => "IRI",
        Term::BlankNode(_) => "blank node",
        Term::Literal(_) => "literal",
        Term::Triple(_) => "quoted triple",
    };
    BindingError::TypeMismatch {
        var: var.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStore;
    use assert_matches::assert_matches;
    use oxigraph::io::RdfFormat;

    fn solutions(turtle: &str, query: &str) -> Vec<QuerySolution> {
        let store = GraphStore::new().unwrap();
        store
            .load_bytes(RdfFormat::Turtle, turtle.as_bytes(), None)
            .unwrap();
        store.query(query).unwrap()
    }

    #[test]
    fn extracts_iri_and_literal() {
        let rows = solutions(
            r#"<http://example.org/s> <http://example.org/p> "hello"@en ."#,
            "SELECT ?s ?o WHERE { ?s ?p ?o }",
        );
        let binding = Binding::new(&rows[0]);
        assert_eq!(binding.iri("s").unwrap(), "http://example.org/s");
        assert_eq!(binding.literal_opt("o").as_deref(), Some("hello"));
    }

    #[test]
    fn mismatches_are_typed() {
        let rows = solutions(
            r#"<http://example.org/s> <http://example.org/p> "hello" ."#,
            "SELECT ?s ?o WHERE { ?s ?p ?o }",
        );
        let binding = Binding::new(&rows[0]);
        assert_matches!(binding.iri("o"), Err(BindingError::TypeMismatch { .. }));
        assert_matches!(binding.iri("missing"), Err(BindingError::Missing(_)));
        assert_eq!(binding.literal_opt("s"), None);
    }
}
