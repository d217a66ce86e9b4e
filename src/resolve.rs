//! Per-source subject resolution.
//!
//! Each assertion source is parsed into a private scratch graph, probed
//! for an identifiable test subject (dereferencing DOAP/FOAF metadata
//! on demand), and mined for raw assertions. A source whose subject
//! cannot be identified is skipped whole; nothing here is fatal.

use indexmap::IndexMap;

use crate::binding::Binding;
use crate::diagnostics::{Diagnostics, STAT_SKIPPED};
use crate::error::Result;
use crate::fetch::{load_reference, DocumentFetcher};
use crate::graph::GraphStore;
use crate::model::{
    BlankArena, Developer, DeveloperKind, Mode, NodeId, Outcome, Release, Subject,
};
use crate::queries::{ASSERTION_QUERY, METADATA_GAP_QUERY, SUBJECT_QUERY};
use crate::vocab;

/// An assertion as extracted from a source, before correlation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAssertion {
    pub subject: String,
    pub test: String,
    pub asserted_by: Option<String>,
    pub mode: Option<Mode>,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub struct ResolvedSources {
    /// Keyed by subject uri; insertion order is column order.
    pub subjects: IndexMap<String, Subject>,
    pub assertions: Vec<RawAssertion>,
}

pub struct SubjectResolver<'a> {
    fetcher: &'a dyn DocumentFetcher,
    diag: &'a mut Diagnostics,
    arena: &'a mut BlankArena,
}

impl<'a> SubjectResolver<'a> {
    pub fn new(
        fetcher: &'a dyn DocumentFetcher,
        diag: &'a mut Diagnostics,
        arena: &'a mut BlankArena,
    ) -> Self {
        Self {
            fetcher,
            diag,
            arena,
        }
    }

    /// Process sources in caller-given order. Column indices are
    /// append-only: the first source to resolve a subject fixes it.
    pub fn resolve(&mut self, sources: &[String], base: Option<&str>) -> Result<ResolvedSources> {
        let mut resolved = ResolvedSources::default();

        for source in sources {
            self.diag.status(format!("read {source}"));
            let scratch = GraphStore::new()?;
            match load_reference(&scratch, self.fetcher, source, base) {
                Ok(count) => self.diag.status(format!("  loaded {count} triples")),
                Err(e) => {
                    self.diag.warn(format!("failed to load {source}: {e}"));
                    continue;
                }
            }

            // A graph that already carries a testSubjects collection is
            // a previous rollup; re-rolling it would double-count.
            if scratch
                .any_object_of(&vocab::earl("testSubjects"))?
                .is_some()
            {
                self.diag.warn(format!(
                    "skip {source}, which seems to be a previous rollup report"
                ));
                continue;
            }

            self.fill_metadata_gaps(&scratch)?;

            let mut rows = scratch.query(SUBJECT_QUERY)?;
            if rows.is_empty() {
                self.diag.warn(format!(
                    "test subject info not found for {source}, expect DOAP description \
                     of the project solving the following query:\n{SUBJECT_QUERY}"
                ));
                continue;
            }

            if let Some(requeried) = self.fill_developer_gap(&scratch, &rows)? {
                rows = requeried;
            }

            self.collect_subjects(&rows, source, &mut resolved.subjects);
            self.collect_assertions(&scratch, &mut resolved.assertions)?;
        }

        Ok(resolved)
    }

    /// Dereference asserted subjects whose project metadata is not
    /// embedded in the source. Failures are logged and skipped.
    fn fill_metadata_gaps(&mut self, scratch: &GraphStore) -> Result<()> {
        for row in scratch.query(METADATA_GAP_QUERY)? {
            let binding = Binding::new(&row);
            if binding.literal_opt("name").is_some() {
                continue;
            }
            let Some(subject) = binding.iri_opt("subject") else {
                continue;
            };
            self.diag
                .status(format!("  read doap description for {subject}"));
            match self.fetcher.fetch(&subject) {
                Ok(document) => {
                    match scratch.load_bytes(document.format, &document.body, Some(&subject)) {
                        Ok(count) => self.diag.status(format!("    loaded {count} triples")),
                        Err(e) => self
                            .diag
                            .warn(format!("failed to parse DOAP from {subject}: {e}")),
                    }
                }
                Err(e) => self
                    .diag
                    .warn(format!("failed to load DOAP from {subject}: {e:#}")),
            }
        }
        Ok(())
    }

    /// When the description references an unnamed developer, fetch the
    /// developer document, merge, and re-run the description query once.
    fn fill_developer_gap(
        &mut self,
        scratch: &GraphStore,
        rows: &[oxigraph::sparql::QuerySolution],
    ) -> Result<Option<Vec<oxigraph::sparql::QuerySolution>>> {
        let first = Binding::new(&rows[0]);
        let Some(developer) = first.node_opt("developer") else {
            if let Ok(uri) = first.iri("uri") {
                self.diag.warn(format!("no developer identified for {uri}"));
            }
            return Ok(None);
        };
        if first.literal_opt("devName").is_some() || developer.is_anon() {
            return Ok(None);
        }

        let developer = developer.id_str();
        self.diag
            .status(format!("  read description for developer {developer}"));
        match self.fetcher.fetch(&developer) {
            Ok(document) => {
                match scratch.load_bytes(document.format, &document.body, Some(&developer)) {
                    Ok(count) => {
                        self.diag.status(format!("    loaded {count} triples"));
                        return Ok(Some(scratch.query(SUBJECT_QUERY)?));
                    }
                    Err(e) => self
                        .diag
                        .warn(format!("failed to parse FOAF from {developer}: {e}")),
                }
            }
            Err(e) => self
                .diag
                .warn(format!("failed to load FOAF from {developer}: {e:#}")),
        }
        Ok(None)
    }

    fn collect_subjects(
        &mut self,
        rows: &[oxigraph::sparql::QuerySolution],
        source: &str,
        subjects: &mut IndexMap<String, Subject>,
    ) {
        for row in rows {
            let binding = Binding::new(row);
            let (Some(uri), Some(name)) = (binding.iri_opt("uri"), binding.literal_opt("name"))
            else {
                continue;
            };

            let subject = subjects.entry(uri.clone()).or_insert_with(|| {
                let release = match binding.node_opt("release") {
                    Some(id @ NodeId::Iri(_)) => id,
                    // Blank release identifiers must not leak out of the
                    // source graph; mint a run-scoped one instead.
                    _ => self.arena.node("release"),
                };
                Subject {
                    uri: uri.clone(),
                    name,
                    description: binding.literal_opt("doapDesc"),
                    homepage: binding.iri_opt("homepage"),
                    language: binding.literal_opt("language"),
                    developers: Vec::new(),
                    release: Some(Release {
                        id: release,
                        revision: binding
                            .literal_opt("revision")
                            .unwrap_or_else(|| "unknown".to_string()),
                    }),
                    source: source.to_string(),
                }
            });

            // Additional rows for one subject contribute developers only.
            if let Some(id) = binding.node_opt("developer") {
                if !subject.developers.iter().any(|d| d.id == id) {
                    subject.developers.push(Developer {
                        id,
                        name: binding.literal_opt("devName"),
                        kind: binding
                            .iri_opt("devType")
                            .map(|iri| DeveloperKind::from_type_iri(&iri))
                            .unwrap_or(DeveloperKind::Unknown),
                        homepage: binding.iri_opt("devHomepage"),
                    });
                }
            }
        }
    }

    fn collect_assertions(
        &mut self,
        scratch: &GraphStore,
        assertions: &mut Vec<RawAssertion>,
    ) -> Result<()> {
        for row in scratch.query(ASSERTION_QUERY)? {
            let binding = Binding::new(&row);
            let (Some(subject), Some(test)) =
                (binding.iri_opt("subject"), binding.iri_opt("test"))
            else {
                continue;
            };

            let outcome_iri = binding.iri_opt("outcome").unwrap_or_default();
            let Some(outcome) = Outcome::from_iri(&outcome_iri) else {
                self.diag.count(STAT_SKIPPED);
                self.diag.warn(format!(
                    "skipping result for {test} for {subject}: unrecognized outcome {outcome_iri}"
                ));
                continue;
            };

            assertions.push(RawAssertion {
                subject,
                test,
                asserted_by: binding.iri_opt("by"),
                mode: binding
                    .iri_opt("mode")
                    .as_deref()
                    .and_then(Mode::from_iri),
                outcome,
            });
        }
        Ok(())
    }
}
