use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::IntrospectError;
use crate::types::{FunctionDef, ParsedSource};

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:import\s+([\w.]+)|from\s+([\w.]+)\s+import\s+)").expect("valid regex")
});

static DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(([^)]*)\)\s*(?:->\s*([^:]+))?:\s*$")
        .expect("valid regex")
});

/// Parse top-level `def`s and module-level imports by line-oriented
/// scanning, per the textual-introspector contract: never relies on a
/// running interpreter.
pub fn parse(text: &str) -> Result<ParsedSource, IntrospectError> {
    let mut imports = Vec::new();
    let mut definitions = Vec::new();

    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if let Some(caps) = IMPORT_RE.captures(line) {
            let module = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string());
            if let Some(module) = module {
                imports.push(module);
            }
            i += 1;
            continue;
        }

        if let Some(caps) = DEF_RE.captures(line) {
            let name = caps[1].to_string();
            let params = parse_params(&caps[2]);
            let return_annotation = caps.get(3).map(|m| m.as_str().trim().to_string());

            let mut body_lines = Vec::new();
            let mut j = i + 1;
            while j < lines.len() {
                let body_line = lines[j];
                if body_line.trim().is_empty() {
                    body_lines.push(body_line.to_string());
                    j += 1;
                    continue;
                }
                if !body_line.starts_with(' ') && !body_line.starts_with('\t') {
                    break;
                }
                body_lines.push(body_line.to_string());
                j += 1;
            }

            if body_lines.is_empty() {
                return Err(IntrospectError::ParseError {
                    reason: format!("function '{name}' has an empty body"),
                    line: (i + 1) as u32,
                });
            }

            definitions.push(FunctionDef {
                name,
                params,
                return_annotation,
                body_lines,
            });
            i = j;
            continue;
        }

        i += 1;
    }

    Ok(ParsedSource {
        imports,
        definitions,
    })
}

fn parse_params(raw: &str) -> Vec<(String, Option<String>)> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',')
        .map(|part| {
            let part = part.trim();
            let name_and_default = part.split('=').next().unwrap_or(part).trim();
            let mut pieces = name_and_default.splitn(2, ':');
            let name = pieces.next().unwrap_or_default().trim().to_string();
            let annotation = pieces.next().map(|a| a.trim().to_string());
            (name, annotation)
        })
        .filter(|(name, _)| !name.is_empty())
        .collect()
}
