//! The six ordered, fast-fail checks (`spec.md` §4.5).

use vibesafe_introspect::TargetIntrospector;
use vibesafe_spec::Spec;
use vibesafe_utils::error::ValidationError;

use crate::deny_list::DenyList;

/// Enforce a sane upper bound on generated artifact size.
pub const MAX_ARTIFACT_BYTES: usize = 256 * 1024;

fn fail(spec: &Spec, kind: &str, location: &str) -> ValidationError {
    ValidationError {
        unit_id: spec.unit_id.clone(),
        kind: kind.to_string(),
        location: location.to_string(),
    }
}

/// Unit name as it would appear as a top-level definition: the segment
/// after the last `/` in `unit_id` (`spec.md` §3.1's `pkg.mod/name` shape).
fn unit_name(spec: &Spec) -> &str {
    spec.unit_id.rsplit('/').next().unwrap_or(&spec.unit_id)
}

/// Run the six checks in order against one candidate artifact, stopping at
/// the first failure.
pub fn validate(
    spec: &Spec,
    artifact_text: &str,
    introspector: &dyn TargetIntrospector,
    deny_list: &DenyList,
) -> Result<(), ValidationError> {
    // 1. Parsability
    let parsed = introspector
        .parse_source(artifact_text)
        .map_err(|e| fail(spec, "parsability", &e.to_string()))?;

    // 2. Symbol presence
    let name = unit_name(spec);
    let def = parsed
        .find(name)
        .ok_or_else(|| fail(spec, "symbol_presence", name))?;

    // 3. Signature match (name + type annotation; the reference introspector
    // does not recover default-value text, so comparison is scoped to what
    // it parses).
    if def.params.len() != spec.signature.params.len() {
        return Err(fail(spec, "signature_match", "parameter count mismatch"));
    }
    for (actual, expected) in def.params.iter().zip(spec.signature.params.iter()) {
        let actual_type = actual.1.as_deref().unwrap_or("");
        if actual.0 != expected.name || actual_type != expected.type_text {
            return Err(fail(
                spec,
                "signature_match",
                &format!("parameter '{}' does not match the Spec", expected.name),
            ));
        }
    }
    let actual_return = def.return_annotation.as_deref().unwrap_or("");
    if actual_return != spec.signature.return_type_text {
        return Err(fail(spec, "signature_match", "return annotation mismatch"));
    }

    // 4. No forbidden constructs
    if let Some(pattern_id) = deny_list.first_match(artifact_text) {
        return Err(fail(spec, "forbidden_construct", pattern_id));
    }

    // 5. Import resolution
    for import in &parsed.imports {
        if introspector.resolve_symbol(import, artifact_text).is_none() {
            return Err(fail(spec, "import_resolution", import));
        }
    }

    // 6. Artifact size
    if artifact_text.len() > MAX_ARTIFACT_BYTES {
        return Err(fail(
            spec,
            "artifact_size",
            &format!("{} bytes exceeds {MAX_ARTIFACT_BYTES}", artifact_text.len()),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use vibesafe_introspect::TextIntrospector;
    use vibesafe_spec::{DependencyDigest, Example, Param, Signature, SourceLocation, UnitKind, UnitOptions};

    fn sample_spec() -> Spec {
        Spec {
            unit_id: "pkg.math/add_strs".to_string(),
            kind: UnitKind::Function,
            source_location: SourceLocation {
                file_path: Utf8PathBuf::from("pkg/math.py"),
                byte_range: 0..10,
                line: 1,
            },
            signature: Signature {
                params: vec![
                    Param {
                        name: "a".to_string(),
                        type_text: "str".to_string(),
                        default_text: None,
                    },
                    Param {
                        name: "b".to_string(),
                        type_text: "str".to_string(),
                        default_text: None,
                    },
                ],
                return_type_text: "str".to_string(),
            },
            docstring: "doc".to_string(),
            examples: vec![Example {
                input_source: "add_strs(\"2\", \"3\")".to_string(),
                expected_output: "'5'".to_string(),
            }],
            pre_hole_source: String::new(),
            provider_ref: "default".to_string(),
            template_ref: "function".to_string(),
            options: UnitOptions::default(),
            dependency_digest: DependencyDigest::default(),
        }
    }

    const VALID_ARTIFACT: &str =
        "def add_strs(a: str, b: str) -> str:\n    return str(int(a) + int(b))\n";

    #[test]
    fn accepts_a_matching_artifact() {
        let spec = sample_spec();
        let introspector = TextIntrospector::default();
        assert!(validate(&spec, VALID_ARTIFACT, &introspector, &DenyList::empty()).is_ok());
    }

    #[test]
    fn rejects_a_missing_symbol() {
        let spec = sample_spec();
        let introspector = TextIntrospector::default();
        let artifact = "def other(a: str, b: str) -> str:\n    return a\n";
        let err = validate(&spec, artifact, &introspector, &DenyList::empty()).unwrap_err();
        assert_eq!(err.kind, "symbol_presence");
    }

    #[test]
    fn rejects_a_signature_mismatch() {
        let spec = sample_spec();
        let introspector = TextIntrospector::default();
        let artifact = "def add_strs(a: int, b: str) -> str:\n    return b\n";
        let err = validate(&spec, artifact, &introspector, &DenyList::empty()).unwrap_err();
        assert_eq!(err.kind, "signature_match");
    }

    #[test]
    fn rejects_a_forbidden_construct() {
        let spec = sample_spec();
        let introspector = TextIntrospector::default();
        let artifact =
            "def add_strs(a: str, b: str) -> str:\n    eval(a)\n    return str(int(a) + int(b))\n";
        let deny_list = DenyList::from_patterns(&crate::deny_list::common_patterns()).unwrap();
        let err = validate(&spec, artifact, &introspector, &deny_list).unwrap_err();
        assert_eq!(err.kind, "forbidden_construct");
    }

    #[test]
    fn rejects_an_oversized_artifact() {
        let spec = sample_spec();
        let introspector = TextIntrospector::default();
        let padding = "#".repeat(MAX_ARTIFACT_BYTES + 1);
        let artifact = format!(
            "def add_strs(a: str, b: str) -> str:\n    return str(int(a) + int(b))\n# {padding}"
        );
        let err = validate(&spec, &artifact, &introspector, &DenyList::empty()).unwrap_err();
        assert_eq!(err.kind, "artifact_size");
    }
}
