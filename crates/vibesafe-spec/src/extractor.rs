//! `scan` and `extract_unit` (`spec.md` §4.1): the Spec Extractor's public
//! operations.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::Lazy;
use regex::Regex;
use vibesafe_introspect::TargetIntrospector;
use vibesafe_utils::error::{SpecError, VibesafeError};
use vibesafe_utils::unit_id::sanitize_segment;

use crate::decorator::{match_decorator_line, parse_decorator_args};
use crate::docstring;
use crate::model::{DependencyDigest, DependencyEntry, SourceLocation, Spec, UnitOptions};
use crate::signature::build_signature;

static DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(([^)]*)\)\s*(?:->\s*([^:]+))?:\s*$")
        .expect("valid regex")
});

const DEFAULT_SENTINEL: &str = "...";

/// Walk `source_roots`, parse every `@vibesafe(...)`-decorated `def` in
/// every discovered file, and return them in a deterministic order:
/// sorted by sanitized relative path, then by position within each file.
pub fn scan(
    source_roots: &[Utf8PathBuf],
    introspector: &dyn TargetIntrospector,
) -> Result<Vec<Spec>, VibesafeError> {
    let mut files = Vec::new();
    for root in source_roots {
        collect_files(root, &mut files)?;
    }
    files.sort_by(|a, b| sanitize_segment(a.as_str()).cmp(&sanitize_segment(b.as_str())));

    let mut specs = Vec::new();
    for file in files {
        let module_path = module_path_for(&file);
        let source = fs::read_to_string(&file)?;
        let mut file_specs = scan_file(&source, &file, &module_path, introspector)
            .map_err(VibesafeError::Spec)?;
        specs.append(&mut file_specs);
    }
    Ok(specs)
}

fn collect_files(dir: &Utf8Path, out: &mut Vec<Utf8PathBuf>) -> Result<(), std::io::Error> {
    if !dir.is_dir() {
        if dir.extension() == Some("py") {
            out.push(dir.to_path_buf());
        }
        return Ok(());
    }
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(std::fs::DirEntry::path);
    for entry in entries {
        let path = Utf8PathBuf::try_from(entry.path()).unwrap_or_default();
        if path.as_str().is_empty() {
            continue;
        }
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if path.extension() == Some("py") {
            out.push(path);
        }
    }
    Ok(())
}

fn module_path_for(file: &Utf8Path) -> String {
    file.with_extension("")
        .as_str()
        .replace(['/', '\\'], ".")
        .trim_start_matches('.')
        .to_string()
}

/// Parse every decorated `def` within one file's source text, in textual
/// order.
pub fn scan_file(
    source: &str,
    file_path: &Utf8Path,
    module_path: &str,
    introspector: &dyn TargetIntrospector,
) -> Result<Vec<Spec>, SpecError> {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut specs = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(decorator_raw) = match_decorator_line(lines[i]) else {
            i += 1;
            continue;
        };
        let decorator_line = i;
        i += 1;

        let Some(caps) = DEF_RE.captures(lines.get(i).copied().unwrap_or("")) else {
            i += 1;
            continue;
        };
        let name = caps[1].to_string();
        let unit_id = format!("{module_path}/{name}");
        let decorator = parse_decorator_args(&unit_id, &decorator_raw)?;

        let signature = build_signature(&unit_id, &caps[2], caps.get(3).map(|m| m.as_str()))?;
        i += 1;

        let (docstring_raw, body_start) = extract_docstring(&lines, i);
        i = body_start;

        let sentinel = decorator
            .options
            .sentinel
            .clone()
            .unwrap_or_else(|| DEFAULT_SENTINEL.to_string());
        let (pre_hole_lines, sentinel_found, next_i) = split_at_sentinel(&lines, i, &sentinel);
        if !sentinel_found {
            return Err(SpecError::SentinelMissing { unit_id });
        }
        i = next_i;

        let normalized_docstring = docstring::normalize(&docstring_raw);
        let examples = docstring::parse_examples(&normalized_docstring);
        if examples.is_empty() {
            return Err(SpecError::MissingDoctest { unit_id });
        }

        let pre_hole_source = pre_hole_lines.join("\n");
        let dependency_digest = resolve_dependencies(&pre_hole_source, introspector);

        let byte_start = lines[..decorator_line].iter().map(|l| l.len() + 1).sum::<usize>();
        let byte_end = lines[..i].iter().map(|l| l.len() + 1).sum::<usize>();

        specs.push(Spec {
            unit_id,
            kind: decorator.kind,
            source_location: SourceLocation {
                file_path: file_path.to_path_buf(),
                byte_range: byte_start..byte_end,
                line: (decorator_line + 1) as u32,
            },
            signature,
            docstring: normalized_docstring,
            examples,
            pre_hole_source,
            provider_ref: decorator.provider.unwrap_or_else(|| "default".to_string()),
            template_ref: decorator
                .template
                .unwrap_or_else(|| decorator.kind.as_str().to_string()),
            options: UnitOptions {
                sentinel: Some(sentinel),
                ..decorator.options
            },
            dependency_digest,
        });
    }

    Ok(specs)
}

fn extract_docstring(lines: &[&str], start: usize) -> (String, usize) {
    let mut i = start;
    while i < lines.len() && lines[i].trim().is_empty() {
        i += 1;
    }
    let Some(first) = lines.get(i) else {
        return (String::new(), i);
    };
    let trimmed = first.trim_start();
    let quote = if trimmed.starts_with("\"\"\"") {
        "\"\"\""
    } else if trimmed.starts_with("'''") {
        "'''"
    } else {
        return (String::new(), i);
    };

    let after_open = &trimmed[quote.len()..];
    if let Some(end) = after_open.find(quote) {
        let text = after_open[..end].to_string();
        return (text, i + 1);
    }

    let mut content = vec![after_open.to_string()];
    i += 1;
    while i < lines.len() {
        if let Some(end) = lines[i].find(quote) {
            content.push(lines[i][..end].to_string());
            i += 1;
            return (content.join("\n"), i);
        }
        content.push(lines[i].to_string());
        i += 1;
    }
    (content.join("\n"), i)
}

fn split_at_sentinel(
    lines: &[&str],
    start: usize,
    sentinel: &str,
) -> (Vec<String>, bool, usize) {
    let mut i = start;
    let mut pre_hole = Vec::new();
    while i < lines.len() {
        if lines[i].trim() == sentinel {
            return (pre_hole, true, i + 1);
        }
        if !lines[i].starts_with(' ') && !lines[i].starts_with('\t') && !lines[i].trim().is_empty()
        {
            break;
        }
        pre_hole.push(lines[i].to_string());
        i += 1;
    }
    (pre_hole, false, i)
}

fn resolve_dependencies(
    pre_hole_source: &str,
    introspector: &dyn TargetIntrospector,
) -> DependencyDigest {
    static NAME_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").expect("valid regex"));

    let mut entries = Vec::new();
    let mut seen = std::collections::BTreeSet::new();
    for caps in NAME_RE.captures_iter(pre_hole_source) {
        let name = caps[1].to_string();
        if !seen.insert(name.clone()) {
            continue;
        }
        match introspector.resolve_symbol(&name, pre_hole_source) {
            Some(resolved) => entries.push(DependencyEntry {
                name,
                resolved_path: resolved.resolved_path.to_string(),
                content_hash: resolved.content_hash,
            }),
            None => entries.push(DependencyEntry::tombstone(name)),
        }
    }
    DependencyDigest::from_entries(entries)
}

/// Extract a single named unit from `source` without scanning the whole
/// project. Used by `compile --target` and `extract_unit`.
pub fn extract_unit(
    source: &str,
    file_path: &Utf8Path,
    module_path: &str,
    unit_name: &str,
    introspector: &dyn TargetIntrospector,
) -> Result<Spec, SpecError> {
    let unit_id = format!("{module_path}/{unit_name}");
    scan_file(source, file_path, module_path, introspector)?
        .into_iter()
        .find(|s| s.unit_id == unit_id)
        .ok_or_else(|| SpecError::InvalidSignature {
            unit_id,
            reason: "no decorated definition with this name was found in source".to_string(),
        })
}
