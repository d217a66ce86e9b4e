//! Best-effort retrieval of remote RDF documents.
//!
//! Subject and developer metadata (DOAP/FOAF) is dereferenced inline
//! during resolution. Failures there are logged by the caller and never
//! propagated; each request carries a fixed timeout.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use oxigraph::io::RdfFormat;

use crate::error::{Result as RollupResult, RollupError};
use crate::graph::{format_for_path, GraphStore};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const ACCEPT: &str =
    "text/turtle, application/rdf+xml;q=0.8, application/n-triples;q=0.6, text/plain;q=0.2";

#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub iri: String,
    pub format: RdfFormat,
    pub body: Vec<u8>,
}

/// Dereferences an IRI to an RDF document. Implemented over HTTP for
/// production and over a static map for deterministic tests.
pub trait DocumentFetcher {
    fn fetch(&self, iri: &str) -> Result<FetchedDocument>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch(&self, iri: &str) -> Result<FetchedDocument> {
        let response = self
            .client
            .get(iri)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .send()
            .with_context(|| format!("request to {iri} failed"))?
            .error_for_status()
            .with_context(|| format!("request to {iri} returned an error status"))?;

        let format = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .and_then(RdfFormat::from_media_type)
            .unwrap_or_else(|| format_for_path(Path::new(iri)));

        let body = response
            .bytes()
            .with_context(|| format!("failed to read body from {iri}"))?
            .to_vec();

        Ok(FetchedDocument {
            iri: iri.to_string(),
            format,
            body,
        })
    }
}

/// Fixed document set, for deterministic runs and tests.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    documents: HashMap<String, (RdfFormat, String)>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(
        mut self,
        iri: impl Into<String>,
        format: RdfFormat,
        body: impl Into<String>,
    ) -> Self {
        self.documents.insert(iri.into(), (format, body.into()));
        self
    }
}

impl DocumentFetcher for StaticFetcher {
    fn fetch(&self, iri: &str) -> Result<FetchedDocument> {
        let (format, body) = self
            .documents
            .get(iri)
            .ok_or_else(|| anyhow!("no document available for {iri}"))?;
        Ok(FetchedDocument {
            iri: iri.to_string(),
            format: *format,
            body: body.clone().into_bytes(),
        })
    }
}

pub fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Load a local path or remote reference into `store`. Remote documents
/// are parsed relative to their own IRI, local files relative to the
/// optional base.
pub fn load_reference(
    store: &GraphStore,
    fetcher: &dyn DocumentFetcher,
    reference: &str,
    base: Option<&str>,
) -> RollupResult<usize> {
    if is_remote(reference) {
        let document = fetcher
            .fetch(reference)
            .map_err(|e| RollupError::Graph(format!("failed to load {reference}: {e:#}")))?;
        store.load_bytes(document.format, &document.body, Some(reference))
    } else {
        store.load_path(Path::new(reference), base)
    }
}
