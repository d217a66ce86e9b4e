//! Namespace constants for the vocabularies the rollup traffics in.
//!
//! EARL carries the assertions, DOAP/FOAF describe subjects and their
//! developers, MF describes test manifests. The remaining prefixes only
//! appear in serialized output.

use oxigraph::model::NamedNode;

pub const EARL: &str = "http://www.w3.org/ns/earl#";
pub const DOAP: &str = "http://usefulinc.com/ns/doap#";
pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";
pub const MF: &str = "http://www.w3.org/2001/sw/DataAccess/tests/test-manifest#";
pub const DC: &str = "http://purl.org/dc/terms/";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Prefix block emitted at the top of Turtle output.
pub const TURTLE_PREFIXES: &str = "\
@prefix dc:   <http://purl.org/dc/terms/> .
@prefix doap: <http://usefulinc.com/ns/doap#> .
@prefix earl: <http://www.w3.org/ns/earl#> .
@prefix mf:   <http://www.w3.org/2001/sw/DataAccess/tests/test-manifest#> .
@prefix xsd:  <http://www.w3.org/2001/XMLSchema#> .
@prefix foaf: <http://xmlns.com/foaf/0.1/> .
@prefix rdf:  <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
";

fn term(namespace: &str, local: &str) -> NamedNode {
    // Namespace IRIs above are valid; locals are compile-time constants.
    NamedNode::new_unchecked(format!("{namespace}{local}"))
}

pub fn earl(local: &str) -> NamedNode {
    term(EARL, local)
}

pub fn doap(local: &str) -> NamedNode {
    term(DOAP, local)
}

pub fn foaf(local: &str) -> NamedNode {
    term(FOAF, local)
}

pub fn mf(local: &str) -> NamedNode {
    term(MF, local)
}

pub fn dc(local: &str) -> NamedNode {
    term(DC, local)
}

pub fn rdf(local: &str) -> NamedNode {
    term(RDF, local)
}

pub fn rdfs(local: &str) -> NamedNode {
    term(RDFS, local)
}

pub fn xsd(local: &str) -> NamedNode {
    term(XSD, local)
}

/// Compact a full IRI to its prefixed form when it falls inside one of
/// the declared namespaces.
pub fn shorten(iri: &str) -> Option<String> {
    const TABLE: &[(&str, &str)] = &[
        ("earl", EARL),
        ("doap", DOAP),
        ("foaf", FOAF),
        ("mf", MF),
        ("dc", DC),
        ("rdf", RDF),
        ("rdfs", RDFS),
        ("xsd", XSD),
    ];
    for (prefix, namespace) in TABLE {
        if let Some(local) = iri.strip_prefix(namespace) {
            let plain = local
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
            if !local.is_empty() && plain {
                return Some(format!("{prefix}:{local}"));
            }
        }
    }
    None
}

/// Expand a prefixed name back to a full IRI; the inverse of [`shorten`].
pub fn expand(curie: &str) -> Option<String> {
    let (prefix, local) = curie.split_once(':')?;
    let namespace = match prefix {
        "earl" => EARL,
        "doap" => DOAP,
        "foaf" => FOAF,
        "mf" => MF,
        "dc" => DC,
        "rdf" => RDF,
        "rdfs" => RDFS,
        "xsd" => XSD,
        _ => return None,
    };
    Some(format!("{namespace}{local}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortens_known_namespaces() {
        assert_eq!(
            shorten("http://www.w3.org/ns/earl#passed").as_deref(),
            Some("earl:passed")
        );
        assert_eq!(
            shorten("http://usefulinc.com/ns/doap#name").as_deref(),
            Some("doap:name")
        );
        assert_eq!(shorten("http://example.org/other#x"), None);
    }

    #[test]
    fn expand_roundtrips_shorten() {
        let iri = "http://xmlns.com/foaf/0.1/homepage";
        let short = shorten(iri).unwrap();
        assert_eq!(expand(&short).as_deref(), Some(iri));
    }

    #[test]
    fn hyphenated_locals_shorten() {
        assert_eq!(
            shorten("http://usefulinc.com/ns/doap#programming-language").as_deref(),
            Some("doap:programming-language")
        );
    }
}
