//! Assertion correlation: the Subject × Test matrix.
//!
//! Two-pass by construction. Every raw assertion from every source is
//! observed first; only then can the still-empty slots be known and
//! filled with untested placeholders. The result is dense: every test
//! ends up with exactly one slot per resolved subject, column-aligned
//! with subject discovery order.

use crate::diagnostics::{
    Diagnostics, STAT_FOUND, STAT_MISSING_SUBJECT, STAT_SKIPPED, STAT_UNTESTED,
};
use crate::manifest::TestSuite;
use crate::model::Assertion;
use crate::resolve::{RawAssertion, ResolvedSources};

pub fn correlate(suite: &mut TestSuite, resolved: &ResolvedSources, diag: &mut Diagnostics) {
    let columns = resolved.subjects.len();
    let mut slots: Vec<Vec<Option<Assertion>>> = suite
        .tests
        .values()
        .map(|_| vec![None; columns])
        .collect();
    let mut contributed = vec![0usize; columns];

    for raw in &resolved.assertions {
        let Some(test_index) = suite.tests.get_index_of(&raw.test) else {
            diag.count(STAT_SKIPPED);
            diag.warn(format!(
                "skipping result for {} for {}, which is not defined in manifests",
                raw.test, raw.subject
            ));
            continue;
        };
        let Some(column) = resolved.subjects.get_index_of(&raw.subject) else {
            diag.count(STAT_MISSING_SUBJECT);
            diag.warn(format!(
                "no test result subject found for {}: known subjects are {}",
                raw.subject,
                resolved
                    .subjects
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
            continue;
        };

        let slot = &mut slots[test_index][column];
        if slot.is_some() {
            // Later write wins; sources are processed in caller order.
            tracing::debug!(test = %raw.test, subject = %raw.subject, "duplicate assertion overwritten");
        } else {
            diag.count(STAT_FOUND);
        }
        *slot = Some(found(raw));
        contributed[column] += 1;
    }

    for (test_index, test) in suite.tests.values_mut().enumerate() {
        let row = std::mem::take(&mut slots[test_index]);
        test.assertions = row
            .into_iter()
            .enumerate()
            .map(|(column, slot)| {
                slot.unwrap_or_else(|| {
                    diag.count(STAT_UNTESTED);
                    let subject = resolved
                        .subjects
                        .get_index(column)
                        .map(|(uri, _)| uri.as_str())
                        .unwrap_or_default();
                    Assertion::untested(subject, &test.uri)
                })
            })
            .collect();
    }

    // A resolved subject with no real assertion anywhere usually means
    // a malformed source.
    for (column, (uri, subject)) in resolved.subjects.iter().enumerate() {
        if contributed[column] == 0 {
            diag.warn(format!(
                "no results found for {uri} (resolved from {}): the assertion query matched nothing usable",
                subject.source
            ));
        }
    }

    diag.report_stats();
}

fn found(raw: &RawAssertion) -> Assertion {
    Assertion {
        subject: raw.subject.clone(),
        test: raw.test.clone(),
        asserted_by: raw.asserted_by.clone(),
        mode: raw.mode,
        outcome: raw.outcome,
        synthesized: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Manifest, NodeId, Outcome, Subject, Test};
    use indexmap::IndexMap;

    fn test_stub(uri: &str) -> Test {
        Test {
            uri: uri.to_string(),
            title: None,
            description: None,
            action: format!("{uri}-in"),
            result: None,
            types: Vec::new(),
            assertions: Vec::new(),
        }
    }

    fn subject_stub(uri: &str) -> Subject {
        Subject {
            uri: uri.to_string(),
            name: uri.rsplit('/').next().unwrap_or(uri).to_string(),
            description: None,
            homepage: None,
            language: None,
            developers: Vec::new(),
            release: None,
            source: format!("{uri}.ttl"),
        }
    }

    fn raw(subject: &str, test: &str, outcome: Outcome) -> RawAssertion {
        RawAssertion {
            subject: subject.to_string(),
            test: test.to_string(),
            asserted_by: Some("http://example.org/bot".to_string()),
            mode: None,
            outcome,
        }
    }

    fn suite_of(tests: &[&str]) -> TestSuite {
        let tests: IndexMap<String, Test> = tests
            .iter()
            .map(|uri| (uri.to_string(), test_stub(uri)))
            .collect();
        TestSuite {
            manifests: vec![Manifest {
                id: NodeId::Iri("http://example.org/manifest".to_string()),
                title: None,
                entries: tests.keys().cloned().collect(),
            }],
            tests,
        }
    }

    fn resolved_of(subjects: &[&str], assertions: Vec<RawAssertion>) -> ResolvedSources {
        ResolvedSources {
            subjects: subjects
                .iter()
                .map(|uri| (uri.to_string(), subject_stub(uri)))
                .collect(),
            assertions,
        }
    }

    const T1: &str = "http://example.org/t1";
    const T2: &str = "http://example.org/t2";
    const S1: &str = "http://example.org/s1";
    const S2: &str = "http://example.org/s2";

    #[test]
    fn matrix_is_dense_and_column_aligned() {
        let mut suite = suite_of(&[T1, T2]);
        let resolved = resolved_of(
            &[S1, S2],
            vec![
                raw(S1, T1, Outcome::Passed),
                raw(S2, T1, Outcome::Failed),
                raw(S2, T2, Outcome::Passed),
            ],
        );
        let mut diag = Diagnostics::new();
        correlate(&mut suite, &resolved, &mut diag);

        for test in suite.tests.values() {
            assert_eq!(test.assertions.len(), 2);
            for (column, assertion) in test.assertions.iter().enumerate() {
                let (expected, _) = resolved.subjects.get_index(column).unwrap();
                assert_eq!(&assertion.subject, expected);
            }
        }

        let t1 = &suite.tests[T1];
        assert_eq!(t1.assertions[0].outcome, Outcome::Passed);
        assert_eq!(t1.assertions[1].outcome, Outcome::Failed);

        let t2 = &suite.tests[T2];
        assert_eq!(t2.assertions[0].outcome, Outcome::Untested);
        assert!(t2.assertions[0].synthesized);
        assert!(t2.assertions[0].asserted_by.is_none());
        assert!(t2.assertions[0].mode.is_none());
        assert_eq!(t2.assertions[1].outcome, Outcome::Passed);

        assert_eq!(diag.stat(STAT_FOUND), 3);
        assert_eq!(diag.stat(STAT_UNTESTED), 1);
    }

    #[test]
    fn unknown_test_is_rejected_and_counted() {
        let mut suite = suite_of(&[T1]);
        let resolved = resolved_of(
            &[S1],
            vec![
                raw(S1, T1, Outcome::Passed),
                raw(S1, "http://example.org/ghost", Outcome::Passed),
            ],
        );
        let mut diag = Diagnostics::new();
        correlate(&mut suite, &resolved, &mut diag);

        assert_eq!(diag.stat(STAT_SKIPPED), 1);
        assert_eq!(suite.tests[T1].assertions.len(), 1);
        assert!(!suite.tests[T1]
            .assertions
            .iter()
            .any(|a| a.test.ends_with("ghost")));
    }

    #[test]
    fn unresolved_subject_is_rejected_and_counted() {
        let mut suite = suite_of(&[T1]);
        let resolved = resolved_of(
            &[S1],
            vec![raw("http://example.org/stranger", T1, Outcome::Passed)],
        );
        let mut diag = Diagnostics::new();
        correlate(&mut suite, &resolved, &mut diag);

        assert_eq!(diag.stat(STAT_MISSING_SUBJECT), 1);
        // S1 contributed nothing: slot synthesized, warning emitted.
        assert_eq!(suite.tests[T1].assertions[0].outcome, Outcome::Untested);
        assert!(diag.warnings() >= 2);
    }

    #[test]
    fn duplicate_assertion_is_overwritten_by_later_write() {
        let mut suite = suite_of(&[T1]);
        let resolved = resolved_of(
            &[S1],
            vec![raw(S1, T1, Outcome::Failed), raw(S1, T1, Outcome::Passed)],
        );
        let mut diag = Diagnostics::new();
        correlate(&mut suite, &resolved, &mut diag);

        assert_eq!(suite.tests[T1].assertions[0].outcome, Outcome::Passed);
        assert_eq!(diag.stat(STAT_FOUND), 1);
    }

    #[test]
    fn zero_subjects_yields_empty_but_valid_matrix() {
        let mut suite = suite_of(&[T1, T2]);
        let resolved = resolved_of(&[], Vec::new());
        let mut diag = Diagnostics::new();
        correlate(&mut suite, &resolved, &mut diag);

        for test in suite.tests.values() {
            assert!(test.assertions.is_empty());
        }
        assert_eq!(diag.warnings(), 0);
    }
}
