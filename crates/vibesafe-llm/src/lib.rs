//! The Provider Client (`spec.md` §4.4): `(prompt, provider_params) ->
//! generated text`, with a content-addressed response cache and bounded
//! retry on transient failures. Every backend implements [`LlmBackend`];
//! the Orchestrator never depends on a concrete one.

mod anthropic;
mod cache;
mod mock;
mod openai_compatible;
mod retry;
mod types;

pub use anthropic::AnthropicBackend;
pub use cache::{cache_key, ResponseCache};
pub use mock::MockBackend;
pub use openai_compatible::OpenAiCompatibleBackend;
pub use types::{LlmBackend, ProviderRequest};

/// Construct a backend for `provider.<name>.kind`, mirroring the teacher's
/// `construct_backend_for_provider` dispatch.
#[must_use]
pub fn construct_backend(
    kind: &str,
    api_key: &str,
    base_url: Option<String>,
) -> Option<Box<dyn LlmBackend>> {
    match kind {
        "anthropic" => Some(Box::new(AnthropicBackend::new(api_key, base_url))),
        "openai-compatible" => {
            let url = base_url.unwrap_or_else(|| {
                "https://api.openai.com/v1/chat/completions".to_string()
            });
            Some(Box::new(OpenAiCompatibleBackend::new(api_key, url)))
        }
        "mock" => Some(Box::new(MockBackend::new())),
        _ => None,
    }
}
