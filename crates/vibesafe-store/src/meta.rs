//! `meta.toml`: the sidecar that sits next to every checkpoint's `impl.<ext>`
//! (`spec.md` §4.6).

use serde::{Deserialize, Serialize};

/// The three hashes that produced `chk_sha`, echoed for offline diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashInputsEcho {
    pub h_spec: String,
    pub h_prompt: String,
    pub h_impl: String,
}

/// One pinned dependency content hash, recorded at generation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyPin {
    pub name: String,
    pub content_hash: String,
}

/// Everything recorded alongside a checkpoint's generated artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckpointMeta {
    pub spec_hash: String,
    pub chk_sha: String,
    pub tool_version: String,
    pub provider: String,
    pub prompt_template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub timestamp: String,
    pub hash_inputs: HashInputsEcho,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deps: Option<Vec<DependencyPin>>,
}

impl CheckpointMeta {
    /// Serialize to the TOML text written as `meta.toml`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Parse `meta.toml`'s contents back into a [`CheckpointMeta`].
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CheckpointMeta {
        CheckpointMeta {
            spec_hash: "h_spec".to_string(),
            chk_sha: "h_chk".to_string(),
            tool_version: "0.1.0".to_string(),
            provider: "anthropic:claude".to_string(),
            prompt_template: "function".to_string(),
            seed: Some(7),
            temperature: Some(0.0),
            timestamp: "2026-07-28T00:00:00Z".to_string(),
            hash_inputs: HashInputsEcho {
                h_spec: "h_spec".to_string(),
                h_prompt: "h_prompt".to_string(),
                h_impl: "h_impl".to_string(),
            },
            deps: Some(vec![DependencyPin {
                name: "pkg.util".to_string(),
                content_hash: "abc".to_string(),
            }]),
        }
    }

    #[test]
    fn round_trips_through_toml() {
        let meta = sample();
        let text = meta.to_toml().unwrap();
        let parsed = CheckpointMeta::from_toml(&text).unwrap();
        assert_eq!(meta, parsed);
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let mut meta = sample();
        meta.seed = None;
        meta.temperature = None;
        meta.deps = None;
        let text = meta.to_toml().unwrap();
        assert!(!text.contains("seed"));
        assert!(!text.contains("temperature"));
        assert!(!text.contains("deps"));
    }
}
