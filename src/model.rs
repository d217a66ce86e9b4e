//! Data model for the rollup: manifests, tests, subjects, assertions,
//! and the assembled report.
//!
//! Identity is IRI-based throughout. Synthesized placeholders and
//! anonymous releases draw opaque ids from a run-scoped [`BlankArena`];
//! those ids never enter the stable IRI namespace and are never reused
//! across runs.

use indexmap::IndexMap;
use oxigraph::model::{BlankNode, NamedNode, Subject as GraphSubject, Term};

use crate::vocab;

/// IRI-or-anonymous identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeId {
    Iri(String),
    Anon(String),
}

impl NodeId {
    /// The `@id` string form: anonymous nodes use the `_:` convention.
    pub fn id_str(&self) -> String {
        match self {
            NodeId::Iri(iri) => iri.clone(),
            NodeId::Anon(name) => format!("_:{name}"),
        }
    }

    pub fn from_id_str(s: &str) -> NodeId {
        match s.strip_prefix("_:") {
            Some(name) => NodeId::Anon(name.to_string()),
            None => NodeId::Iri(s.to_string()),
        }
    }

    pub fn is_anon(&self) -> bool {
        matches!(self, NodeId::Anon(_))
    }

    /// Graph subject position. Callers guarantee IRIs are absolute; the
    /// empty report id is mapped before it reaches here.
    pub fn to_subject(&self) -> GraphSubject {
        match self {
            NodeId::Iri(iri) => GraphSubject::NamedNode(NamedNode::new_unchecked(iri.clone())),
            NodeId::Anon(name) => GraphSubject::BlankNode(BlankNode::new_unchecked(name.clone())),
        }
    }

    pub fn to_term(&self) -> Term {
        match self.to_subject() {
            GraphSubject::NamedNode(n) => Term::NamedNode(n),
            GraphSubject::BlankNode(b) => Term::BlankNode(b),
        }
    }
}

/// Run-scoped arena of anonymous identifiers.
#[derive(Debug, Default)]
pub struct BlankArena {
    next: u32,
}

impl BlankArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&mut self, hint: &str) -> NodeId {
        let id = NodeId::Anon(format!("{hint}{}", self.next));
        self.next += 1;
        id
    }
}

/// EARL outcome vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    CantTell,
    Inapplicable,
    Untested,
}

impl Outcome {
    pub fn from_iri(iri: &str) -> Option<Self> {
        let local = iri.strip_prefix(vocab::EARL).unwrap_or(iri);
        let local = local.strip_prefix("earl:").unwrap_or(local);
        match local {
            "passed" => Some(Outcome::Passed),
            "failed" => Some(Outcome::Failed),
            "cantTell" => Some(Outcome::CantTell),
            "inapplicable" => Some(Outcome::Inapplicable),
            "untested" => Some(Outcome::Untested),
            _ => None,
        }
    }

    pub fn local(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Failed => "failed",
            Outcome::CantTell => "cantTell",
            Outcome::Inapplicable => "inapplicable",
            Outcome::Untested => "untested",
        }
    }

    pub fn curie(&self) -> String {
        format!("earl:{}", self.local())
    }

    pub fn iri(&self) -> String {
        format!("{}{}", vocab::EARL, self.local())
    }
}

/// Assertion mode. EARL spells semi-automatic `semiAuto`; the longer
/// spelling is accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Automatic,
    Manual,
    SemiAutomatic,
}

impl Mode {
    pub fn from_iri(iri: &str) -> Option<Self> {
        let local = iri.strip_prefix(vocab::EARL).unwrap_or(iri);
        let local = local.strip_prefix("earl:").unwrap_or(local);
        match local {
            "automatic" => Some(Mode::Automatic),
            "manual" => Some(Mode::Manual),
            "semiAuto" | "semiAutomatic" => Some(Mode::SemiAutomatic),
            _ => None,
        }
    }

    pub fn local(&self) -> &'static str {
        match self {
            Mode::Automatic => "automatic",
            Mode::Manual => "manual",
            Mode::SemiAutomatic => "semiAuto",
        }
    }

    pub fn curie(&self) -> String {
        format!("earl:{}", self.local())
    }

    pub fn iri(&self) -> String {
        format!("{}{}", vocab::EARL, self.local())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeveloperKind {
    Person,
    Organization,
    Unknown,
}

impl DeveloperKind {
    /// FOAF typing is loose in the wild; anything mentioning
    /// Organization counts as one, other types default to Person.
    pub fn from_type_iri(iri: &str) -> Self {
        if iri.contains("Organization") {
            DeveloperKind::Organization
        } else {
            DeveloperKind::Person
        }
    }

    pub fn curie(&self) -> Option<&'static str> {
        match self {
            DeveloperKind::Person => Some("foaf:Person"),
            DeveloperKind::Organization => Some("foaf:Organization"),
            DeveloperKind::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Developer {
    pub id: NodeId,
    pub name: Option<String>,
    pub kind: DeveloperKind,
    pub homepage: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub id: NodeId,
    pub revision: String,
}

/// An implementation under test. Identity is the uri; the column index
/// in the assertion matrix is fixed by first successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub uri: String,
    pub name: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub language: Option<String>,
    pub developers: Vec<Developer>,
    pub release: Option<Release>,
    /// Assertion source that resolved this subject.
    pub source: String,
}

/// A claim, input-sourced or synthesized, that a subject achieved an
/// outcome on a test. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Assertion {
    pub subject: String,
    pub test: String,
    pub asserted_by: Option<String>,
    pub mode: Option<Mode>,
    pub outcome: Outcome,
    pub synthesized: bool,
}

impl Assertion {
    pub fn untested(subject: &str, test: &str) -> Self {
        Assertion {
            subject: subject.to_string(),
            test: test.to_string(),
            asserted_by: None,
            mode: None,
            outcome: Outcome::Untested,
            synthesized: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    pub uri: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub action: String,
    pub result: Option<String>,
    pub types: Vec<String>,
    /// Dense after correlation: one slot per resolved subject, in
    /// subject discovery order.
    pub assertions: Vec<Assertion>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub id: NodeId,
    pub title: Option<String>,
    /// Test uris in the order declared by the manifest's entries list.
    pub entries: Vec<String>,
}

/// Self-description of the generating tool, embedded in every output.
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub iri: String,
    pub name: String,
    pub homepage: String,
    pub language: String,
    pub revision: String,
    pub created: String,
}

impl Generator {
    pub fn this_tool() -> Self {
        Generator {
            iri: format!(
                "https://crates.io/crates/{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ),
            name: env!("CARGO_PKG_NAME").to_string(),
            homepage: env!("CARGO_PKG_REPOSITORY").to_string(),
            language: "Rust".to_string(),
            revision: env!("CARGO_PKG_VERSION").to_string(),
            created: chrono::Utc::now().format("%Y-%m-%d").to_string(),
        }
    }
}

/// The assembled rollup. A fresh derived view per generation request;
/// holds no state across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub name: String,
    pub bib_ref: String,
    pub generated_by: Generator,
    /// Discovery order.
    pub subjects: Vec<Subject>,
    /// Discovery order.
    pub manifests: Vec<Manifest>,
    /// Keyed by test uri, insertion in discovery order.
    pub tests: IndexMap<String, Test>,
    pub source_files: Vec<String>,
}

impl Report {
    pub fn subject_index(&self, uri: &str) -> Option<usize> {
        self.subjects.iter().position(|s| s.uri == uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_round_trips_anon_marker() {
        let anon = NodeId::from_id_str("_:release0");
        assert!(anon.is_anon());
        assert_eq!(anon.id_str(), "_:release0");

        let iri = NodeId::from_id_str("http://example.org/x");
        assert!(!iri.is_anon());
        assert_eq!(iri.id_str(), "http://example.org/x");
    }

    #[test]
    fn arena_never_repeats() {
        let mut arena = BlankArena::new();
        let a = arena.node("b");
        let b = arena.node("b");
        assert_ne!(a, b);
        assert_eq!(a.id_str(), "_:b0");
        assert_eq!(b.id_str(), "_:b1");
    }

    #[test]
    fn outcome_parses_iri_and_curie() {
        assert_eq!(
            Outcome::from_iri("http://www.w3.org/ns/earl#passed"),
            Some(Outcome::Passed)
        );
        assert_eq!(Outcome::from_iri("earl:cantTell"), Some(Outcome::CantTell));
        assert_eq!(Outcome::from_iri("http://example.org/nope"), None);
        assert_eq!(Outcome::Failed.curie(), "earl:failed");
    }

    #[test]
    fn mode_accepts_both_semi_spellings() {
        assert_eq!(Mode::from_iri("earl:semiAuto"), Some(Mode::SemiAutomatic));
        assert_eq!(
            Mode::from_iri("http://www.w3.org/ns/earl#semiAutomatic"),
            Some(Mode::SemiAutomatic)
        );
        assert_eq!(Mode::SemiAutomatic.curie(), "earl:semiAuto");
    }

    #[test]
    fn developer_kind_from_loose_typing() {
        assert_eq!(
            DeveloperKind::from_type_iri("http://xmlns.com/foaf/0.1/Organization"),
            DeveloperKind::Organization
        );
        assert_eq!(
            DeveloperKind::from_type_iri("http://xmlns.com/foaf/0.1/Person"),
            DeveloperKind::Person
        );
    }
}
