//! Output verification.
//!
//! An expectation passes when its output file exists and, after collapsing
//! whitespace on both sides, contains the expected fragment. Containment, not
//! equality: the engine is free to print more than the catalog asks about.

use crate::catalog::{Expectation, Scenario};
use crate::tally::{ExpectationId, RunCounters};
use std::fs;
use std::io;
use std::path::PathBuf;

// =============================================================================
// CORE TYPES
// =============================================================================

/// Result of checking one expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    MissingFile {
        path: PathBuf,
    },
    Unreadable {
        path: PathBuf,
        reason: String,
    },
    /// `expected` and `found` are kept verbatim for the transcript.
    ContentMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectationOutcome {
    pub id: ExpectationId,
    pub verdict: Verdict,
}

/// All verdicts of one scenario, plus the artifacts to delete afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioCheck {
    pub outcomes: Vec<ExpectationOutcome>,
    /// Distinct existing output files, in first-seen order.
    pub artifacts: Vec<PathBuf>,
}

impl ScenarioCheck {
    /// A scenario passes only if every one of its expectations passed.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.verdict.passed())
    }
}

// =============================================================================
// NORMALIZATION
// =============================================================================

/// Collapses every whitespace run to a single space and trims both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-insensitive containment. An empty fragment is always contained.
pub fn contains_normalized(haystack: &str, fragment: &str) -> bool {
    normalize_whitespace(haystack).contains(&normalize_whitespace(fragment))
}

// =============================================================================
// VERIFIER
// =============================================================================

#[derive(Debug, Clone)]
pub struct OutputVerifier {
    example_root: PathBuf,
}

impl OutputVerifier {
    pub fn new(example_root: impl Into<PathBuf>) -> Self {
        Self {
            example_root: example_root.into(),
        }
    }

    pub fn resolve(&self, expectation: &Expectation) -> PathBuf {
        self.example_root.join(&expectation.file)
    }

    /// Checks one expectation against the file system.
    pub fn check(&self, expectation: &Expectation) -> Verdict {
        let path = self.resolve(expectation);
        if !path.exists() {
            return Verdict::MissingFile { path };
        }
        let found = match fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                return Verdict::Unreadable {
                    path,
                    reason: e.to_string(),
                }
            }
        };
        if contains_normalized(&found, &expectation.content) {
            Verdict::Passed
        } else {
            Verdict::ContentMismatch {
                path,
                expected: expectation.content.clone(),
                found,
            }
        }
    }

    /// Checks every expectation of `scenario` in order and records each one.
    ///
    /// Nothing is deleted here; see [`remove_artifacts`].
    pub fn verify(&self, scenario: &Scenario, counters: &mut RunCounters) -> ScenarioCheck {
        let mut check = ScenarioCheck::default();
        for (i, expectation) in scenario.expectations.iter().enumerate() {
            let id = counters.next_expectation_id(i + 1);
            let verdict = self.check(expectation);
            counters.record_expectation(verdict.passed());

            if !matches!(verdict, Verdict::MissingFile { .. }) {
                let path = self.resolve(expectation);
                if !check.artifacts.contains(&path) {
                    check.artifacts.push(path);
                }
            }
            check.outcomes.push(ExpectationOutcome { id, verdict });
        }
        check
    }
}

/// Deletes each artifact once. Returns the ones that could not be removed.
pub fn remove_artifacts(artifacts: &[PathBuf]) -> Vec<(PathBuf, io::Error)> {
    artifacts
        .iter()
        .filter_map(|path| fs::remove_file(path).err().map(|e| (path.clone(), e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expectation(file: &str, content: &str) -> Expectation {
        Expectation {
            file: file.to_string(),
            content: content.to_string(),
        }
    }

    fn scenario(expectations: Vec<Expectation>) -> Scenario {
        Scenario {
            purpose: "p".to_string(),
            input_files: vec!["m.imi".to_string()],
            options: String::new(),
            node_count: 1,
            expectations,
        }
    }

    #[test]
    fn normalization_collapses_runs_and_is_idempotent() {
        let raw = "  L/U subclass \t\t :\n\n  L-PTA \r\n";
        let once = normalize_whitespace(raw);
        assert_eq!(once, "L/U subclass : L-PTA");
        assert_eq!(normalize_whitespace(&once), once);
        assert_eq!(normalize_whitespace(" \n\t "), "");
    }

    #[test]
    fn containment_tolerates_surrounding_text() {
        let file = "Header\nL/U subclass                            : L-PTA\nFooter\n";
        assert!(contains_normalized(file, "\nL/U subclass : L-PTA\n\t\t"));
        assert!(!contains_normalized(file, "L/U subclass : U-PTA"));
        assert!(contains_normalized("", ""));
    }

    #[test]
    fn empty_content_needs_only_existence() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("empty.res"), "").unwrap();
        let verifier = OutputVerifier::new(dir.path());

        assert_eq!(verifier.check(&expectation("empty.res", "")), Verdict::Passed);
        assert!(matches!(
            verifier.check(&expectation("absent.res", "")),
            Verdict::MissingFile { .. }
        ));
    }

    #[test]
    fn mismatch_keeps_literal_texts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.res"), "K = 2\n").unwrap();
        let verifier = OutputVerifier::new(dir.path());
        match verifier.check(&expectation("a.res", "K   = 1")) {
            Verdict::ContentMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, "K   = 1");
                assert_eq!(found, "K = 2\n");
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[test]
    fn binary_outputs_are_read_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = [0x89, b'P', b'N', b'G', 0xff, 0xfe, b'\n', b'K', b' ', b'=', b' ', b'1'];
        fs::write(dir.path().join("trace.png"), bytes).unwrap();
        let verifier = OutputVerifier::new(dir.path());

        assert_eq!(verifier.check(&expectation("trace.png", "")), Verdict::Passed);
        assert_eq!(verifier.check(&expectation("trace.png", "K = 1")), Verdict::Passed);
        assert!(matches!(
            verifier.check(&expectation("trace.png", "K = 2")),
            Verdict::ContentMismatch { .. }
        ));
    }

    #[test]
    fn directory_in_place_of_an_output_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("out.res")).unwrap();
        let verifier = OutputVerifier::new(dir.path());
        let mut counters = RunCounters::new();

        let check = verifier.verify(&scenario(vec![expectation("out.res", "")]), &mut counters);

        assert!(!check.passed());
        match &check.outcomes[0].verdict {
            Verdict::Unreadable { path, reason } => {
                assert_eq!(path, &dir.path().join("out.res"));
                assert!(!reason.is_empty());
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
        assert_eq!(counters.expectation_passed, 0);
    }

    #[test]
    fn scenario_passes_only_if_all_expectations_pass() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.res"), "alpha beta").unwrap();
        let verifier = OutputVerifier::new(dir.path());
        let mut counters = RunCounters::new();

        let check = verifier.verify(
            &scenario(vec![
                expectation("a.res", "alpha"),
                expectation("a.res", "gamma"),
                expectation("missing.res", ""),
            ]),
            &mut counters,
        );

        assert!(!check.passed());
        let passed: Vec<_> = check.outcomes.iter().map(|o| o.verdict.passed()).collect();
        assert_eq!(passed, vec![true, false, false]);
        assert_eq!(counters.expectation_total, 3);
        assert_eq!(counters.expectation_passed, 1);
        // The same file listed twice is only scheduled for removal once.
        assert_eq!(check.artifacts, vec![dir.path().join("a.res")]);
        // Files are untouched until removal is requested.
        assert!(dir.path().join("a.res").exists());
    }

    #[test]
    fn removal_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.res");
        fs::write(&present, "x").unwrap();
        let gone = dir.path().join("gone.res");

        let failures = remove_artifacts(&[present.clone(), gone.clone()]);
        assert!(!present.exists());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, gone);
    }
}
