use camino::Utf8Path;

use crate::error::IntrospectError;
use crate::types::{LoadedArtifact, ParsedSource, ResolvedSymbol, Value};

/// The Target Introspector port (`spec.md` §6.6). A deployment supplies an
/// implementation for its host language; the core pipeline never assumes a
/// particular one.
pub trait TargetIntrospector {
    /// Resolve `name`, referenced from `context` (the pre-hole source it
    /// appeared in), to the module/value that defines it.
    fn resolve_symbol(&self, name: &str, context: &str) -> Option<ResolvedSymbol>;

    /// Parse `text` into the minimal structure the Extractor/Validator need.
    fn parse_source(&self, text: &str) -> Result<ParsedSource, IntrospectError>;

    /// Load the artifact at `path` into an executable binding.
    fn load_artifact(&self, path: &Utf8Path) -> Result<LoadedArtifact, IntrospectError>;

    /// Evaluate one Example's `input_source` against a loaded artifact,
    /// returning a value whose `Display` is comparable to `expected_output`.
    /// Used by the Verification Harness's Example gate.
    fn invoke_example(
        &self,
        artifact: &LoadedArtifact,
        input_source: &str,
    ) -> Result<Value, IntrospectError>;
}
