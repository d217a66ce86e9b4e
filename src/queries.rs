//! The SPARQL texts driving discovery, subject resolution, and
//! assertion extraction.
//!
//! The discovery query can be replaced from configuration; the
//! zero-tests error echoes whichever text actually ran.

/// Every test carries an `mf:action`; the containing manifest, when
/// declared, links the test through its `mf:entries` list.
pub const DISCOVERY_QUERY: &str = "\
PREFIX mf: <http://www.w3.org/2001/sw/DataAccess/tests/test-manifest#>
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>

SELECT ?uri ?testAction ?manUri
WHERE {
  ?uri mf:action ?testAction .
  OPTIONAL {
    ?manUri a mf:Manifest; mf:entries ?lh .
    ?lh rdf:first ?uri .
  }
}";

/// Full subject description. A source is only usable when this binds at
/// least uri, name, and developer.
pub const SUBJECT_QUERY: &str = "\
PREFIX doap: <http://usefulinc.com/ns/doap#>
PREFIX foaf: <http://xmlns.com/foaf/0.1/>

SELECT DISTINCT ?uri ?name ?doapDesc ?release ?revision ?homepage ?language ?developer ?devName ?devType ?devHomepage
WHERE {
  ?uri a doap:Project; doap:name ?name; doap:developer ?developer .
  OPTIONAL { ?uri doap:homepage ?homepage . }
  OPTIONAL { ?uri doap:description ?doapDesc . }
  OPTIONAL { ?uri doap:programming-language ?language . }
  OPTIONAL { ?uri doap:release ?release . }
  OPTIONAL { ?release doap:revision ?revision . }
  OPTIONAL { ?developer a ?devType . }
  OPTIONAL { ?developer foaf:name ?devName . }
  OPTIONAL { ?developer foaf:homepage ?devHomepage . }
}
ORDER BY ?name";

/// Asserted subjects whose project metadata is not embedded in the
/// source; those IRIs are candidates for dereferencing.
pub const METADATA_GAP_QUERY: &str = "\
PREFIX earl: <http://www.w3.org/ns/earl#>
PREFIX doap: <http://usefulinc.com/ns/doap#>

SELECT DISTINCT ?subject ?name
WHERE {
  [ a earl:Assertion; earl:subject ?subject ] .
  OPTIONAL {
    ?subject a doap:Project; doap:name ?name
  }
}";

/// Raw assertions in a source graph.
pub const ASSERTION_QUERY: &str = "\
PREFIX earl: <http://www.w3.org/ns/earl#>

SELECT ?test ?subject ?by ?mode ?outcome
WHERE {
  ?a a earl:Assertion;
    earl:assertedBy ?by;
    earl:result [earl:outcome ?outcome];
    earl:subject ?subject;
    earl:test ?test .
  OPTIONAL {
    ?a earl:mode ?mode .
  }
}
ORDER BY ?subject";
