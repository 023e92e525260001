//! `unit_id` sanitization for filesystem use.
//!
//! A `unit_id` (`"<module.path>/<name>"`) becomes a directory path segment in
//! the Checkpoint Store layout, so each segment is sanitized independently
//! before being joined into `<module_path>/<unit_name>`.

use unicode_normalization::UnicodeNormalization;

use crate::error::{ErrorCategory, UserFriendlyError};

#[derive(Debug, thiserror::Error)]
pub enum UnitIdError {
    #[error("unit id segment is empty after sanitization")]
    Empty,
    #[error("unit id segment contains only invalid characters")]
    OnlyInvalidCharacters,
    #[error("unit id '{0}' is missing the '/' separator between module path and name")]
    MissingSeparator(String),
}

impl UserFriendlyError for UnitIdError {
    fn user_message(&self) -> String {
        match self {
            Self::Empty => "unit id segment is empty".to_string(),
            Self::OnlyInvalidCharacters => {
                "unit id segment contains only invalid characters".to_string()
            }
            Self::MissingSeparator(id) => {
                format!("unit id '{id}' must contain at least one '/'")
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        vec!["unit ids look like 'module.path/function_name'".to_string()]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Spec
    }
}

/// Sanitize a single path segment: NFKC-normalize, keep `[A-Za-z0-9._-]`,
/// replace everything else (including consecutive dots) with `_`.
pub fn sanitize_segment(segment: &str) -> Result<String, UnitIdError> {
    let normalized: String = segment.nfkc().collect();

    let mut sanitized: String = normalized
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", "__");
    }

    if sanitized.is_empty() {
        return Err(UnitIdError::Empty);
    }

    let has_meaningful_content = sanitized
        .chars()
        .any(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !has_meaningful_content {
        return Err(UnitIdError::OnlyInvalidCharacters);
    }

    Ok(sanitized)
}

/// Split a `unit_id` of the form `"<module.path>/<name>"` into sanitized
/// `(module_path, unit_name)` directory segments, as required by the
/// Checkpoint Store layout (`spec.md` §4.6).
pub fn split_for_storage(unit_id: &str) -> Result<(String, String), UnitIdError> {
    let (module_path, name) = unit_id
        .rsplit_once('/')
        .ok_or_else(|| UnitIdError::MissingSeparator(unit_id.to_string()))?;

    let module_path = module_path
        .split('/')
        .map(sanitize_segment)
        .collect::<Result<Vec<_>, _>>()?
        .join("/");
    let name = sanitize_segment(name)?;

    Ok((module_path, name))
}
