//! Recognises the `@vibesafe(...)` decorator form that marks a stub for
//! extraction (`spec.md` §4.1: "Recognises units by the presence of a
//! vibesafe decorator form").

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use vibesafe_utils::error::SpecError;

use crate::model::{UnitKind, UnitOptions};

static DECORATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*@vibesafe\((.*)\)\s*$").expect("valid regex"));

const ALLOWED_KEYS: &[&str] = &[
    "kind", "provider", "template", "sentinel", "model", "tags", "method", "path",
];

/// Parsed decorator contents, before being folded into a `Spec`.
#[derive(Debug, Clone, Default)]
pub struct DecoratorInfo {
    pub kind: UnitKind,
    pub provider: Option<String>,
    pub template: Option<String>,
    pub options: UnitOptions,
}

/// Returns `Some(raw_argument_text)` if `line` is a `@vibesafe(...)` line.
#[must_use]
pub fn match_decorator_line(line: &str) -> Option<String> {
    DECORATOR_RE
        .captures(line)
        .map(|c| c[1].trim().to_string())
}

/// Parse the decorator's parenthesized argument text into structured
/// options. Unknown keys are rejected per `spec.md` §4.1's
/// `DecoratorOptionInvalid` failure.
pub fn parse_decorator_args(unit_id: &str, raw: &str) -> Result<DecoratorInfo, SpecError> {
    let mut values: BTreeMap<String, String> = BTreeMap::new();

    if !raw.trim().is_empty() {
        for part in split_top_level_commas(raw) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let Some((key, value)) = part.split_once('=') else {
                return Err(SpecError::DecoratorOptionInvalid {
                    unit_id: unit_id.to_string(),
                    option: part.to_string(),
                });
            };
            let key = key.trim();
            if !ALLOWED_KEYS.contains(&key) {
                return Err(SpecError::DecoratorOptionInvalid {
                    unit_id: unit_id.to_string(),
                    option: key.to_string(),
                });
            }
            let value = unquote(value.trim());
            values.insert(key.to_string(), value);
        }
    }

    let kind = match values.get("kind").map(String::as_str) {
        Some("function") | None => UnitKind::Function,
        Some("http") => UnitKind::Http,
        Some("cli") => UnitKind::Cli,
        Some(other) => {
            return Err(SpecError::DecoratorOptionInvalid {
                unit_id: unit_id.to_string(),
                option: format!("kind={other}"),
            })
        }
    };

    let options = UnitOptions {
        model: values.get("model").cloned(),
        sentinel: values.get("sentinel").cloned(),
        tags: values
            .get("tags")
            .map(|t| t.split(';').map(str::to_string).collect())
            .unwrap_or_default(),
        method: values.get("method").cloned(),
        path: values.get("path").cloned(),
    };

    Ok(DecoratorInfo {
        kind,
        provider: values.get("provider").cloned(),
        template: values.get("template").cloned(),
        options,
    })
}

fn unquote(s: &str) -> String {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 && (bytes[0] == b'"' || bytes[0] == b'\'') && bytes[0] == bytes[bytes.len() - 1]
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

fn split_top_level_commas(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_string: Option<char> = None;
    for c in s.chars() {
        match in_string {
            Some(q) => {
                current.push(c);
                if c == q {
                    in_string = None;
                }
            }
            None => match c {
                '"' | '\'' => {
                    in_string = Some(c);
                    current.push(c);
                }
                ',' => {
                    parts.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            },
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}
