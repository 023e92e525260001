//! The `LlmBackend` trait and the deterministic request it is invoked with
//! (`spec.md` §4.4).

use std::time::Duration;

use async_trait::async_trait;
use vibesafe_utils::error::ProviderError;

/// A single, already-rendered prompt plus the deterministic parameters that
/// are part of `H_spec`. One invocation produces one generated text.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub prompt: String,
    pub model: String,
    pub seed: Option<u64>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl ProviderRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            seed: None,
            temperature: None,
            max_tokens: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Shared abstraction over every provider (`spec.md` §4.4): HTTP-backed,
/// test-only, or otherwise. The Orchestrator works against this trait and
/// never a concrete backend.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// This backend's `kind`, as it appears in `provider.<name>.kind`.
    fn kind(&self) -> &'static str;

    async fn complete(&self, req: &ProviderRequest) -> Result<String, ProviderError>;
}
