//! The Unit/Spec data model (`spec.md` §3.1).

use std::ops::Range;

use camino::Utf8PathBuf;
use serde::Serialize;

/// A concrete, opaque handle sufficient to re-read the exact source slice a
/// Spec was extracted from — used for re-hashing and for diagnostics
/// (`diff`, error remediation). Ambient supplement; dropped by the
/// distillation but implied by "pre_hole_source... is hashed verbatim".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file_path: Utf8PathBuf,
    pub byte_range: Range<usize>,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    #[default]
    Function,
    Http,
    Cli,
}

impl UnitKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Http => "http",
            Self::Cli => "cli",
        }
    }
}

/// One parameter in a canonical signature: name, normalised annotation
/// text, and an optional default value's literal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    pub type_text: String,
    pub default_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub params: Vec<Param>,
    pub return_type_text: String,
}

impl Signature {
    /// The canonical text used as a `H_spec` input: order-preserving,
    /// insignificant whitespace collapsed, annotation tokens preserved.
    #[must_use]
    pub fn canonical_text(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| match &p.default_text {
                Some(default) => format!("{}: {} = {}", p.name, p.type_text, default),
                None => format!("{}: {}", p.name, p.type_text),
            })
            .collect();
        format!("({}) -> {}", params.join(", "), self.return_type_text)
    }
}

/// A single `>>>` doctest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Example {
    pub input_source: String,
    pub expected_output: String,
}

/// Per-unit decorator overrides (`spec.md` §3.1 `options`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnitOptions {
    pub model: Option<String>,
    pub sentinel: Option<String>,
    pub tags: Vec<String>,
    pub method: Option<String>,
    pub path: Option<String>,
}

/// One entry of the DependencyDigest: a name referenced in the pre-hole
/// slice, resolved (or tombstoned) to a path and content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEntry {
    pub name: String,
    pub resolved_path: String,
    pub content_hash: String,
}

impl DependencyEntry {
    pub const UNRESOLVED: &'static str = "unresolved";

    #[must_use]
    pub fn tombstone(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolved_path: String::new(),
            content_hash: Self::UNRESOLVED.to_string(),
        }
    }
}

/// Deterministic ordered mapping name -> `(resolved_path, content_hash)`,
/// per `spec.md` §3.1. Always kept sorted by name so hashing is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyDigest(pub Vec<DependencyEntry>);

impl DependencyDigest {
    #[must_use]
    pub fn from_entries(mut entries: Vec<DependencyEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self(entries)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The immutable extraction of a Unit, per `spec.md` §3.1. The Hasher
/// consumes this; the Orchestrator owns it only transiently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spec {
    pub unit_id: String,
    pub kind: UnitKind,
    pub source_location: SourceLocation,
    pub signature: Signature,
    pub docstring: String,
    pub examples: Vec<Example>,
    pub pre_hole_source: String,
    pub provider_ref: String,
    pub template_ref: String,
    pub options: UnitOptions,
    pub dependency_digest: DependencyDigest,
}
