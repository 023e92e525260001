//! The render context injected into every template (`spec.md` §4.3): unit
//! id, structured params, return type text, docstring, examples, pre-hole
//! source, resolved imports, and declared options.

use serde::Serialize;
use vibesafe_spec::{Example, Spec};

#[derive(Debug, Clone, Serialize)]
pub struct ParamContext {
    pub name: String,
    pub type_text: String,
    pub default_text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExampleContext {
    pub input_source: String,
    pub expected_output: String,
}

impl From<&Example> for ExampleContext {
    fn from(example: &Example) -> Self {
        Self {
            input_source: example.input_source.clone(),
            expected_output: example.expected_output.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyContext {
    pub name: String,
    pub resolved_path: String,
}

/// A `Serialize`-able, JCS-canonicalizable projection of a Spec — the
/// `render_inputs` of `spec.md` §3.1.
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub unit_id: String,
    pub kind: String,
    pub params: Vec<ParamContext>,
    pub return_type_text: String,
    pub docstring: String,
    pub examples: Vec<ExampleContext>,
    pub pre_hole_source: String,
    pub imports: Vec<DependencyContext>,
    pub model: Option<String>,
    pub sentinel: Option<String>,
    pub tags: Vec<String>,
    pub method: Option<String>,
    pub path: Option<String>,
}

impl PromptContext {
    #[must_use]
    pub fn from_spec(spec: &Spec) -> Self {
        Self {
            unit_id: spec.unit_id.clone(),
            kind: spec.kind.as_str().to_string(),
            params: spec
                .signature
                .params
                .iter()
                .map(|p| ParamContext {
                    name: p.name.clone(),
                    type_text: p.type_text.clone(),
                    default_text: p.default_text.clone(),
                })
                .collect(),
            return_type_text: spec.signature.return_type_text.clone(),
            docstring: spec.docstring.clone(),
            examples: spec.examples.iter().map(ExampleContext::from).collect(),
            pre_hole_source: spec.pre_hole_source.clone(),
            imports: spec
                .dependency_digest
                .0
                .iter()
                .map(|d| DependencyContext {
                    name: d.name.clone(),
                    resolved_path: d.resolved_path.clone(),
                })
                .collect(),
            model: spec.options.model.clone(),
            sentinel: spec.options.sentinel.clone(),
            tags: spec.options.tags.clone(),
            method: spec.options.method.clone(),
            path: spec.options.path.clone(),
        }
    }

    /// JCS-canonical JSON bytes of this context, fed into `H_spec` via the
    /// template id (not `H_prompt`, which hashes the rendered text itself).
    pub fn canonical_json(&self) -> anyhow::Result<Vec<u8>> {
        let json_value = serde_json::to_value(self)?;
        let bytes = serde_json_canonicalizer::to_vec(&json_value)?;
        Ok(bytes)
    }
}
