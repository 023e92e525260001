use std::collections::BTreeMap;
use std::fmt;

use camino::Utf8PathBuf;

/// A name resolved to its defining source location and a content hash of
/// that location, per `spec.md` §6.6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSymbol {
    pub resolved_path: Utf8PathBuf,
    pub content_hash: String,
}

/// Minimal parse result: enough structure for the Extractor and Validator
/// to check symbol presence, signatures, and import resolution without a
/// full AST.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSource {
    pub imports: Vec<String>,
    pub definitions: Vec<FunctionDef>,
}

impl ParsedSource {
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&FunctionDef> {
        self.definitions.iter().find(|d| d.name == name)
    }
}

/// A single top-level `def` as recovered by [`TextIntrospector`](crate::TextIntrospector).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<(String, Option<String>)>,
    pub return_annotation: Option<String>,
    pub body_lines: Vec<String>,
}

/// A loaded artifact: the parsed definitions plus the raw text, sufficient
/// for the reference mini-evaluator to execute an Example's `input_source`
/// against it.
#[derive(Debug, Clone)]
pub struct LoadedArtifact {
    pub path: Utf8PathBuf,
    pub source: String,
    pub parsed: ParsedSource,
}

/// A runtime value produced by the reference mini-evaluator. `Display`
/// renders it the way Python's `repr()` would, since `spec.md`'s doctest
/// examples compare against `repr`-style expected output (e.g. strings are
/// single-quoted).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Str(String),
    List(Vec<Value>),
    None,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "'{s}'"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::None => write!(f, "None"),
        }
    }
}

/// Variable bindings during mini-evaluation, kept as a `BTreeMap` so
/// iteration order (used only for diagnostics) is deterministic.
pub type Bindings = BTreeMap<String, Value>;
