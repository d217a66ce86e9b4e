//! Rollup engine for EARL conformance-test reports.
//!
//! Aggregates assertion sources against a shared test manifest into a
//! complete Subject × Test matrix, fills coverage gaps with explicit
//! `untested` placeholders, and serializes the result as a tree
//! document, Turtle text notation, flat triples, or HTML.
//!
//! ```no_run
//! use earl_rollup::{CliArgs, EarlRollup, HttpFetcher, RollupConfig};
//! use clap::Parser;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = RollupConfig::from_args(CliArgs::parse())?;
//! let fetcher = HttpFetcher::new()?;
//! let rollup = EarlRollup::run(&config, &fetcher)?;
//! println!("{}", rollup.generate(config.format, config.template.as_deref())?);
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod binding;
pub mod config;
pub mod correlate;
pub mod diagnostics;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod manifest;
pub mod model;
pub mod queries;
pub mod render;
pub mod resolve;
pub mod turtle;
pub mod vocab;

use std::fs;

use oxigraph::io::RdfFormat;

pub use crate::config::{CliArgs, OutputFormat, RollupConfig};
pub use crate::diagnostics::Diagnostics;
pub use crate::error::{Result, RollupError};
pub use crate::fetch::{DocumentFetcher, HttpFetcher, StaticFetcher};
pub use crate::model::Report;

use crate::graph::GraphStore;
use crate::model::BlankArena;
use crate::resolve::SubjectResolver;

/// A completed rollup run: the assembled report plus its flat graph.
#[derive(Debug)]
pub struct EarlRollup {
    report: Report,
    graph: GraphStore,
}

impl EarlRollup {
    /// Run the full pipeline: load manifests, resolve sources,
    /// correlate, assemble. Strict mode is evaluated last, after the
    /// report exists, so a strict failure still reflects a full run.
    pub fn run(config: &RollupConfig, fetcher: &dyn DocumentFetcher) -> Result<Self> {
        if config.json_input {
            return Self::from_json_source(config);
        }

        let store = GraphStore::new()?;
        let mut diag = Diagnostics::new();
        let mut arena = BlankArena::new();
        let base = config.base.as_deref();

        let discovery = config
            .query
            .as_deref()
            .unwrap_or(queries::DISCOVERY_QUERY);
        let mut suite = manifest::load_manifests(
            &store,
            fetcher,
            &mut diag,
            &config.manifests,
            base,
            discovery,
        )?;

        let resolved =
            SubjectResolver::new(fetcher, &mut diag, &mut arena).resolve(&config.sources, base)?;

        correlate::correlate(&mut suite, &resolved, &mut diag);

        let report = assemble::assemble(suite, resolved, &config.name, &config.bib_ref);
        assemble::write_graph(&report, &store, &mut arena)?;

        diag.finish(config.strict)?;

        Ok(Self {
            report,
            graph: store,
        })
    }

    /// Reconstruct a rollup from a previously generated tree document,
    /// bypassing resolution and correlation entirely.
    fn from_json_source(config: &RollupConfig) -> Result<Self> {
        let path = config
            .sources
            .first()
            .ok_or_else(|| RollupError::config("no report document given"))?;
        let text = fs::read_to_string(path)
            .map_err(|e| RollupError::config(format!("cannot read report {path}: {e}")))?;
        let tree: serde_json::Value = serde_json::from_str(&text)?;
        let report = assemble::from_tree(&tree)?;

        let store = GraphStore::new()?;
        let mut arena = BlankArena::new();
        assemble::write_graph(&report, &store, &mut arena)?;

        Ok(Self {
            report,
            graph: store,
        })
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Serialize the rollup in the requested output form.
    pub fn generate(&self, format: OutputFormat, template: Option<&str>) -> Result<String> {
        let tree = assemble::to_tree(&self.report);
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&tree)?),
            OutputFormat::Turtle => turtle::serialize(&tree),
            OutputFormat::Ntriples => self.graph.dump(RdfFormat::NTriples),
            OutputFormat::Html => render::render_html(&tree, template),
        }
    }
}
