//! Thin wrapper over an in-memory oxigraph store.
//!
//! One instance accumulates the report graph; a fresh instance per
//! assertion source serves as that source's private scratch graph, so
//! inputs are never mutated in place.

use std::fs;
use std::path::Path;

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{GraphNameRef, NamedNode, QuadRef, Subject, Term};
use oxigraph::sparql::{QueryResults, QuerySolution};
use oxigraph::store::Store;

use crate::error::{Result, RollupError};

pub struct GraphStore {
    store: Store,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore").finish_non_exhaustive()
    }
}

impl GraphStore {
    pub fn new() -> Result<Self> {
        Ok(Self {
            store: Store::new()?,
        })
    }

    /// Parse `bytes` into the store. Blank nodes are renamed on load so
    /// merging several documents never conflates their anonymous nodes.
    pub fn load_bytes(&self, format: RdfFormat, bytes: &[u8], base: Option<&str>) -> Result<usize> {
        let before = self.len()?;
        let mut parser = RdfParser::from_format(format).rename_blank_nodes();
        if let Some(base) = base {
            parser = parser
                .with_base_iri(base)
                .map_err(|e| RollupError::Graph(format!("invalid base IRI {base:?}: {e}")))?;
        }
        self.store.load_from_reader(parser, bytes)?;
        Ok(self.len()? - before)
    }

    /// Load a local file, choosing the parser from its extension.
    pub fn load_path(&self, path: &Path, base: Option<&str>) -> Result<usize> {
        let bytes = fs::read(path)
            .map_err(|e| RollupError::Graph(format!("failed to read {}: {e}", path.display())))?;
        self.load_bytes(format_for_path(path), &bytes, base)
    }

    /// Run a SELECT query and collect its solutions.
    pub fn query(&self, text: &str) -> Result<Vec<QuerySolution>> {
        match self.store.query(text)? {
            QueryResults::Solutions(solutions) => {
                let mut rows = Vec::new();
                for solution in solutions {
                    rows.push(solution?);
                }
                Ok(rows)
            }
            _ => Err(RollupError::Graph(format!(
                "expected a SELECT query, got a different form:\n{text}"
            ))),
        }
    }

    pub fn insert(&self, subject: &Subject, predicate: &NamedNode, object: &Term) -> Result<()> {
        self.store.insert(QuadRef::new(
            subject.as_ref(),
            predicate.as_ref(),
            object.as_ref(),
            GraphNameRef::DefaultGraph,
        ))?;
        Ok(())
    }

    /// First object of any triple with the given predicate, regardless
    /// of subject. Used for the rollup-marker check.
    pub fn any_object_of(&self, predicate: &NamedNode) -> Result<Option<Term>> {
        match self
            .store
            .quads_for_pattern(None, Some(predicate.as_ref()), None, None)
            .next()
        {
            Some(quad) => Ok(Some(quad?.object)),
            None => Ok(None),
        }
    }

    pub fn first_object(&self, subject: &Subject, predicate: &NamedNode) -> Result<Option<Term>> {
        match self
            .store
            .quads_for_pattern(
                Some(subject.as_ref().into()),
                Some(predicate.as_ref()),
                None,
                None,
            )
            .next()
        {
            Some(quad) => Ok(Some(quad?.object)),
            None => Ok(None),
        }
    }

    /// All objects for (subject, predicate), sorted for determinism —
    /// store iteration order is not meaningful.
    pub fn objects(&self, subject: &Subject, predicate: &NamedNode) -> Result<Vec<Term>> {
        let mut terms = Vec::new();
        for quad in self.store.quads_for_pattern(
            Some(subject.as_ref().into()),
            Some(predicate.as_ref()),
            None,
            None,
        ) {
            terms.push(quad?.object);
        }
        terms.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
        Ok(terms)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.store.len()?)
    }

    /// Serialize the default graph, for use with any triple serializer
    /// format oxigraph supports.
    pub fn dump(&self, format: RdfFormat) -> Result<String> {
        let buffer = self
            .store
            .dump_graph_to_writer(GraphNameRef::DefaultGraph, format, Vec::new())?;
        String::from_utf8(buffer)
            .map_err(|e| RollupError::Graph(format!("serializer produced invalid UTF-8: {e}")))
    }
}

pub fn format_for_path(path: &Path) -> RdfFormat {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("nt") => RdfFormat::NTriples,
        Some("nq") => RdfFormat::NQuads,
        Some("trig") => RdfFormat::TriG,
        Some("rdf") | Some("xml") | Some("owl") => RdfFormat::RdfXml,
        _ => RdfFormat::Turtle,
    }
}
