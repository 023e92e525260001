//! Canonical signature extraction (`spec.md` §4.1): parameter names in
//! source order, annotations normalised by collapsing insignificant
//! whitespace but preserving tokens.

use vibesafe_utils::error::SpecError;

use crate::model::{Param, Signature};

/// Parse `"a: str, b: int = 3"` into canonical [`Param`]s. Every parameter
/// must carry an annotation; an unannotated parameter is an
/// `InvalidSignature` failure (`spec.md` §4.1).
pub fn parse_params(unit_id: &str, raw: &str) -> Result<Vec<Param>, SpecError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    raw.split(',')
        .map(|part| parse_one_param(unit_id, part.trim()))
        .collect()
}

fn parse_one_param(unit_id: &str, part: &str) -> Result<Param, SpecError> {
    let (name_and_type, default_text) = match part.split_once('=') {
        Some((lhs, rhs)) => (lhs.trim(), Some(collapse_whitespace(rhs.trim()))),
        None => (part, None),
    };

    let Some((name, type_text)) = name_and_type.split_once(':') else {
        return Err(SpecError::InvalidSignature {
            unit_id: unit_id.to_string(),
            reason: format!("parameter '{name_and_type}' has no type annotation"),
        });
    };

    let name = name.trim().to_string();
    let type_text = collapse_whitespace(type_text.trim());
    if name.is_empty() || type_text.is_empty() {
        return Err(SpecError::InvalidSignature {
            unit_id: unit_id.to_string(),
            reason: format!("malformed parameter '{part}'"),
        });
    }

    Ok(Param {
        name,
        type_text,
        default_text,
    })
}

/// Parse the `-> T` return annotation; absence is `InvalidSignature`.
pub fn parse_return_type(unit_id: &str, raw: Option<&str>) -> Result<String, SpecError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => Ok(collapse_whitespace(text)),
        None => Err(SpecError::InvalidSignature {
            unit_id: unit_id.to_string(),
            reason: "missing return type annotation".to_string(),
        }),
    }
}

pub fn build_signature(
    unit_id: &str,
    raw_params: &str,
    raw_return: Option<&str>,
) -> Result<Signature, SpecError> {
    Ok(Signature {
        params: parse_params(unit_id, raw_params)?,
        return_type_text: parse_return_type(unit_id, raw_return)?,
    })
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_params() {
        let params = parse_params("m/f", "a: str, b: str").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "a");
        assert_eq!(params[0].type_text, "str");
    }

    #[test]
    fn parses_default_values() {
        let params = parse_params("m/f", "a: int = 3").unwrap();
        assert_eq!(params[0].default_text.as_deref(), Some("3"));
    }

    #[test]
    fn rejects_missing_annotation() {
        let err = parse_params("m/f", "a").unwrap_err();
        assert!(matches!(err, SpecError::InvalidSignature { .. }));
    }

    #[test]
    fn rejects_missing_return_type() {
        let err = parse_return_type("m/f", None).unwrap_err();
        assert!(matches!(err, SpecError::InvalidSignature { .. }));
    }
}
