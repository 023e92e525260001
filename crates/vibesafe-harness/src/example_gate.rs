//! The Example gate (`spec.md` §4.7 check 1): byte-exact comparison by
//! default, with an opt-in ellipsis match when `expected_output` contains
//! the literal token `...`.

use camino::Utf8Path;
use vibesafe_introspect::{LoadedArtifact, TargetIntrospector};
use vibesafe_spec::Example;
use vibesafe_utils::error::{GateFailure, GateFailureCategory};

const ELLIPSIS: &str = "...";

/// Compare an actual rendered value against an Example's expected output.
/// A single `...` in `expected` matches any span between its surrounding
/// prefix and suffix; with no `...`, comparison is byte-exact.
#[must_use]
pub fn matches_expected(actual: &str, expected: &str) -> bool {
    match expected.find(ELLIPSIS) {
        Some(idx) => {
            let prefix = &expected[..idx];
            let suffix = &expected[idx + ELLIPSIS.len()..];
            actual.starts_with(prefix)
                && actual.ends_with(suffix)
                && actual.len() >= prefix.len() + suffix.len()
        }
        None => actual == expected,
    }
}

fn fail(unit_id: &str, message: impl Into<String>) -> GateFailure {
    GateFailure {
        unit_id: unit_id.to_string(),
        category: GateFailureCategory::ExampleMismatch,
        message: message.into(),
    }
}

/// Run every Example against the candidate artifact, stopping at the first
/// mismatch.
pub fn run_example_gate(
    unit_id: &str,
    examples: &[Example],
    artifact_path: &Utf8Path,
    artifact_text: &str,
    introspector: &dyn TargetIntrospector,
) -> Result<(), GateFailure> {
    let parsed = introspector
        .parse_source(artifact_text)
        .map_err(|e| fail(unit_id, e.to_string()))?;
    let artifact = LoadedArtifact {
        path: artifact_path.to_path_buf(),
        source: artifact_text.to_string(),
        parsed,
    };

    for example in examples {
        let value = introspector
            .invoke_example(&artifact, &example.input_source)
            .map_err(|e| fail(unit_id, e.to_string()))?;
        let actual = value.to_string();
        if !matches_expected(&actual, &example.expected_output) {
            return Err(fail(
                unit_id,
                format!(
                    "`{}` produced '{actual}', expected '{}'",
                    example.input_source, example.expected_output
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use vibesafe_introspect::TextIntrospector;

    #[test]
    fn exact_match_passes() {
        assert!(matches_expected("'5'", "'5'"));
    }

    #[test]
    fn mismatch_fails() {
        assert!(!matches_expected("'5'", "'6'"));
    }

    #[test]
    fn ellipsis_matches_any_middle_span() {
        assert!(matches_expected("[1, 2, 3, 4, 5]", "[1, ..., 5]"));
        assert!(!matches_expected("[9, 2, 3, 4, 5]", "[1, ..., 5]"));
    }

    #[test]
    fn example_gate_passes_for_a_correct_artifact() {
        let examples = vec![Example {
            input_source: "add_strs(\"2\", \"3\")".to_string(),
            expected_output: "'5'".to_string(),
        }];
        let artifact_text =
            "def add_strs(a: str, b: str) -> str:\n    a_int, b_int = int(a), int(b)\n    return str(a_int + b_int)\n";
        let introspector = TextIntrospector::default();
        let result = run_example_gate(
            "pkg.math/add_strs",
            &examples,
            &Utf8PathBuf::from("pkg/math.py"),
            artifact_text,
            &introspector,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn example_gate_fails_for_a_wrong_artifact() {
        let examples = vec![Example {
            input_source: "add_strs(\"2\", \"3\")".to_string(),
            expected_output: "'5'".to_string(),
        }];
        let artifact_text =
            "def add_strs(a: str, b: str) -> str:\n    return '0'\n";
        let introspector = TextIntrospector::default();
        let err = run_example_gate(
            "pkg.math/add_strs",
            &examples,
            &Utf8PathBuf::from("pkg/math.py"),
            artifact_text,
            &introspector,
        )
        .unwrap_err();
        assert_eq!(err.category, GateFailureCategory::ExampleMismatch);
    }
}
