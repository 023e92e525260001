//! The Hasher (`spec.md` §4.2): `H_spec`, `H_prompt`, and
//! `H_chk = SHA256(H_spec || H_prompt || H_impl)`. Every hash is SHA-256,
//! lowercase hex.

mod tagged;

use vibesafe_spec::Spec;

pub use tagged::{plain_sha256_hex, TaggedHasher};

/// Tool schema version bound to this implementation's `H_spec` contract.
/// Bumping this deliberately invalidates every existing `H_spec`.
pub const SCHEMA_VERSION: &str = "vibesafe-spec-v1";

/// `"<kind>:<model>"`, the provider identity fed into `H_spec`.
#[derive(Debug, Clone)]
pub struct ProviderIdentity {
    pub kind: String,
    pub model: String,
}

impl ProviderIdentity {
    #[must_use]
    pub fn as_str(&self) -> String {
        format!("{}:{}", self.kind, self.model)
    }
}

/// Deterministic provider parameters, per `spec.md` §4.2 input 7.
#[derive(Debug, Clone, Default)]
pub struct ProviderParams {
    pub seed: Option<u64>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl ProviderParams {
    /// Canonical numeric text, stable across repeated calls on the same
    /// values (P1).
    #[must_use]
    fn canonical_text(&self) -> String {
        format!(
            "seed={};temperature={};max_tokens={}",
            self.seed.map_or("none".to_string(), |s| s.to_string()),
            self.temperature
                .map_or("none".to_string(), |t| t.to_string()),
            self.max_tokens.map_or("none".to_string(), |m| m.to_string()),
        )
    }
}

mod tag {
    pub const SCHEMA_VERSION: u8 = 1;
    pub const SIGNATURE: u8 = 2;
    pub const DOCSTRING: u8 = 3;
    pub const PRE_HOLE: u8 = 4;
    pub const TEMPLATE_ID: u8 = 5;
    pub const PROVIDER_IDENTITY: u8 = 6;
    pub const PROVIDER_PARAMS: u8 = 7;
    pub const DEPENDENCY_DIGEST: u8 = 8;
}

/// `H_spec`: SHA-256 over the eight ordered inputs of `spec.md` §4.2.
#[must_use]
pub fn hash_spec(spec: &Spec, identity: &ProviderIdentity, params: &ProviderParams) -> String {
    let mut hasher = TaggedHasher::new();
    hasher
        .feed(tag::SCHEMA_VERSION, SCHEMA_VERSION.as_bytes())
        .feed(tag::SIGNATURE, spec.signature.canonical_text().as_bytes())
        .feed(tag::DOCSTRING, spec.docstring.as_bytes())
        .feed(tag::PRE_HOLE, spec.pre_hole_source.as_bytes())
        .feed(tag::TEMPLATE_ID, spec.template_ref.as_bytes())
        .feed(tag::PROVIDER_IDENTITY, identity.as_str().as_bytes())
        .feed(tag::PROVIDER_PARAMS, params.canonical_text().as_bytes())
        .feed(
            tag::DEPENDENCY_DIGEST,
            dependency_digest_text(spec).as_bytes(),
        );
    hasher.finalize_hex()
}

fn dependency_digest_text(spec: &Spec) -> String {
    spec.dependency_digest
        .0
        .iter()
        .map(|e| format!("{}||{}||{}", e.name, e.resolved_path, e.content_hash))
        .collect::<Vec<_>>()
        .join(";")
}

/// `H_prompt`: SHA-256 of the rendered prompt's raw bytes.
#[must_use]
pub fn hash_prompt(rendered_bytes: &[u8]) -> String {
    plain_sha256_hex(rendered_bytes)
}

/// `H_impl`: SHA-256 of the validated artifact's raw bytes.
#[must_use]
pub fn hash_impl(artifact_bytes: &[u8]) -> String {
    plain_sha256_hex(artifact_bytes)
}

/// `H_chk = SHA256(H_spec || H_prompt || H_impl)`.
#[must_use]
pub fn hash_checkpoint(h_spec: &str, h_prompt: &str, h_impl: &str) -> String {
    let mut hasher = TaggedHasher::new();
    hasher
        .feed(1, h_spec.as_bytes())
        .feed(2, h_prompt.as_bytes())
        .feed(3, h_impl.as_bytes());
    hasher.finalize_hex()
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use vibesafe_spec::{
        DependencyDigest, Example, Signature, SourceLocation, Spec, UnitKind, UnitOptions,
    };

    fn sample_spec() -> Spec {
        Spec {
            unit_id: "m/add_strs".to_string(),
            kind: UnitKind::Function,
            source_location: SourceLocation {
                file_path: Utf8PathBuf::from("m.py"),
                byte_range: 0..10,
                line: 1,
            },
            signature: Signature {
                params: Vec::new(),
                return_type_text: "str".to_string(),
            },
            docstring: "doc".to_string(),
            examples: vec![Example {
                input_source: "add_strs(\"2\",\"3\")".to_string(),
                expected_output: "'5'".to_string(),
            }],
            pre_hole_source: "a_int, b_int = int(a), int(b)".to_string(),
            provider_ref: "default".to_string(),
            template_ref: "function".to_string(),
            options: UnitOptions::default(),
            dependency_digest: DependencyDigest::default(),
        }
    }

    #[test]
    fn identical_specs_hash_identically() {
        let spec = sample_spec();
        let identity = ProviderIdentity {
            kind: "anthropic".to_string(),
            model: "claude".to_string(),
        };
        let params = ProviderParams::default();
        assert_eq!(
            hash_spec(&spec, &identity, &params),
            hash_spec(&spec, &identity, &params)
        );
    }

    #[test]
    fn changing_docstring_changes_hash() {
        let mut spec = sample_spec();
        let identity = ProviderIdentity {
            kind: "anthropic".to_string(),
            model: "claude".to_string(),
        };
        let params = ProviderParams::default();
        let before = hash_spec(&spec, &identity, &params);
        spec.docstring = "different doc".to_string();
        let after = hash_spec(&spec, &identity, &params);
        assert_ne!(before, after);
    }

    #[test]
    fn changing_seed_changes_hash() {
        let spec = sample_spec();
        let identity = ProviderIdentity {
            kind: "anthropic".to_string(),
            model: "claude".to_string(),
        };
        let before = hash_spec(&spec, &identity, &ProviderParams::default());
        let after = hash_spec(
            &spec,
            &identity,
            &ProviderParams {
                seed: Some(42),
                ..Default::default()
            },
        );
        assert_ne!(before, after);
    }

    #[test]
    fn checkpoint_hash_is_a_function_of_its_three_inputs() {
        let a = hash_checkpoint("s1", "p1", "i1");
        let b = hash_checkpoint("s1", "p1", "i1");
        let c = hash_checkpoint("s1", "p1", "i2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    use proptest::prelude::*;

    proptest! {
        /// P1: byte-equal prompts/artifacts always yield the same digest,
        /// for any bytes at all, not just the handful of fixed cases above.
        #[test]
        fn hash_prompt_and_hash_impl_are_deterministic(bytes: Vec<u8>) {
            prop_assert_eq!(hash_prompt(&bytes), hash_prompt(&bytes));
            prop_assert_eq!(hash_impl(&bytes), hash_impl(&bytes));
        }

        /// P2: any change to the docstring (a declared `H_spec` input) flips
        /// the hash, for any nonempty suffix appended to it.
        #[test]
        fn appending_to_the_docstring_always_changes_h_spec(suffix in "\\PC+") {
            let mut spec = sample_spec();
            let identity = ProviderIdentity { kind: "anthropic".to_string(), model: "claude".to_string() };
            let params = ProviderParams::default();
            let before = hash_spec(&spec, &identity, &params);
            spec.docstring.push_str(&suffix);
            let after = hash_spec(&spec, &identity, &params);
            prop_assert_ne!(before, after);
        }

        /// P1: `H_chk` is a pure function of its three string inputs.
        #[test]
        fn hash_checkpoint_is_deterministic(a in "\\PC*", b in "\\PC*", c in "\\PC*") {
            prop_assert_eq!(hash_checkpoint(&a, &b, &c), hash_checkpoint(&a, &b, &c));
        }
    }
}
