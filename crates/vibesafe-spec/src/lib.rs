//! The Unit/Spec data model and the Spec Extractor (`spec.md` §3, §4.1).

mod decorator;
mod docstring;
mod extractor;
mod model;
mod signature;

pub use docstring::extract_property_block;
pub use extractor::{extract_unit, scan, scan_file};
pub use model::{
    DependencyDigest, DependencyEntry, Example, Param, Signature, SourceLocation, Spec, UnitKind,
    UnitOptions,
};

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use vibesafe_introspect::TextIntrospector;

    use super::*;

    const SOURCE: &str = r#"@vibesafe(kind="function", provider="default", template="function")
def add_strs(a: str, b: str) -> str:
    """Adds two numeric strings.

    >>> add_strs("2", "3")
    '5'
    """
    a_int, b_int = int(a), int(b)
    ...
"#;

    #[test]
    fn scans_a_single_decorated_function() {
        let introspector = TextIntrospector::default();
        let specs = scan_file(
            SOURCE,
            Utf8PathBuf::from("pkg/math.py").as_path(),
            "pkg.math",
            &introspector,
        )
        .unwrap();

        assert_eq!(specs.len(), 1);
        let spec = &specs[0];
        assert_eq!(spec.unit_id, "pkg.math/add_strs");
        assert_eq!(spec.kind, UnitKind::Function);
        assert_eq!(spec.examples.len(), 1);
        assert_eq!(spec.examples[0].expected_output, "'5'");
        assert_eq!(spec.pre_hole_source.trim(), "a_int, b_int = int(a), int(b)");
    }

    #[test]
    fn missing_doctest_is_rejected() {
        let source = "@vibesafe()\ndef f(a: int) -> int:\n    \"\"\"No examples.\"\"\"\n    ...\n";
        let introspector = TextIntrospector::default();
        let err = scan_file(source, Utf8PathBuf::from("m.py").as_path(), "m", &introspector)
            .unwrap_err();
        assert!(matches!(
            err,
            vibesafe_utils::error::SpecError::MissingDoctest { .. }
        ));
    }

    #[test]
    fn missing_sentinel_is_rejected() {
        let source = "@vibesafe()\ndef f(a: int) -> int:\n    \"\"\">>> f(1)\n    1\n    \"\"\"\n    return a\n";
        let introspector = TextIntrospector::default();
        let err = scan_file(source, Utf8PathBuf::from("m.py").as_path(), "m", &introspector)
            .unwrap_err();
        assert!(matches!(
            err,
            vibesafe_utils::error::SpecError::SentinelMissing { .. }
        ));
    }

    #[test]
    fn repeated_extraction_is_deterministic() {
        let introspector = TextIntrospector::default();
        let first = scan_file(
            SOURCE,
            Utf8PathBuf::from("pkg/math.py").as_path(),
            "pkg.math",
            &introspector,
        )
        .unwrap();
        let second = scan_file(
            SOURCE,
            Utf8PathBuf::from("pkg/math.py").as_path(),
            "pkg.math",
            &introspector,
        )
        .unwrap();
        assert_eq!(first, second);
    }
}
