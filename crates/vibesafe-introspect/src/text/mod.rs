//! Reference/test-only `TargetIntrospector` for the Python-like stub
//! dialect used throughout `spec.md`'s examples. Locates top-level `def`s
//! and module-level imports by line-oriented scanning; never relies on a
//! running interpreter. Production deployments supply their own
//! introspector for their host language.

mod eval;
mod scan;

use std::collections::HashMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use sha2::{Digest, Sha256};

use crate::error::IntrospectError;
use crate::traits::TargetIntrospector;
use crate::types::{LoadedArtifact, ParsedSource, ResolvedSymbol, Value};

pub use eval::evaluate_call;

/// A textual introspector scoped to a set of module search roots, used to
/// resolve dependency references to a `(path, content_hash)` pair.
#[derive(Debug, Clone, Default)]
pub struct TextIntrospector {
    search_roots: Vec<Utf8PathBuf>,
    /// Pre-registered symbols (name -> resolved path), for callers that
    /// already know the mapping (e.g. the Extractor's own module scan)
    /// rather than needing a filesystem search.
    known_symbols: HashMap<String, Utf8PathBuf>,
}

impl TextIntrospector {
    #[must_use]
    pub fn new(search_roots: Vec<Utf8PathBuf>) -> Self {
        Self {
            search_roots,
            known_symbols: HashMap::new(),
        }
    }

    /// Register a symbol's defining path explicitly, bypassing the
    /// filesystem search used by [`resolve_symbol`](TargetIntrospector::resolve_symbol).
    pub fn register_symbol(&mut self, name: impl Into<String>, path: Utf8PathBuf) {
        self.known_symbols.insert(name.into(), path);
    }

    fn hash_file(path: &Utf8Path) -> Option<String> {
        let bytes = fs::read(path).ok()?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Some(hex::encode(hasher.finalize()))
    }

    /// Evaluate a doctest-style `input_source` call against a loaded
    /// artifact, returning a `repr`-style string for comparison against
    /// `expected_output`.
    pub fn invoke(
        &self,
        artifact: &LoadedArtifact,
        input_source: &str,
    ) -> Result<Value, IntrospectError> {
        evaluate_call(artifact, input_source)
    }
}

impl TargetIntrospector for TextIntrospector {
    fn resolve_symbol(&self, name: &str, _context: &str) -> Option<ResolvedSymbol> {
        let path = self.known_symbols.get(name)?.clone();
        let content_hash = Self::hash_file(&path)?;
        Some(ResolvedSymbol {
            resolved_path: path,
            content_hash,
        })
    }

    fn parse_source(&self, text: &str) -> Result<ParsedSource, IntrospectError> {
        scan::parse(text)
    }

    fn load_artifact(&self, path: &Utf8Path) -> Result<LoadedArtifact, IntrospectError> {
        let source = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IntrospectError::ArtifactNotFound {
                    path: path.to_string(),
                }
            } else {
                IntrospectError::ArtifactLoadError {
                    path: path.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        let parsed = scan::parse(&source)?;
        Ok(LoadedArtifact {
            path: path.to_path_buf(),
            source,
            parsed,
        })
    }

    fn invoke_example(
        &self,
        artifact: &LoadedArtifact,
        input_source: &str,
    ) -> Result<Value, IntrospectError> {
        evaluate_call(artifact, input_source)
    }
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        use std::fmt::Write;
        let mut out = String::with_capacity(bytes.as_ref().len() * 2);
        for byte in bytes.as_ref() {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_function() {
        let src = "import os\n\ndef add_strs(a: str, b: str) -> str:\n    a_int, b_int = int(a), int(b)\n    return str(a_int + b_int)\n";
        let parsed = scan::parse(src).unwrap();
        assert_eq!(parsed.imports, vec!["os".to_string()]);
        let def = parsed.find("add_strs").unwrap();
        assert_eq!(def.params.len(), 2);
        assert_eq!(def.return_annotation.as_deref(), Some("str"));
    }
}
