//! A deterministic, canned-response backend used by the test suite and by
//! `compile --dry-run`, adapted from the teacher's `claude-stub` binary
//! idiom: no network access, output is purely a function of the input
//! prompt.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use vibesafe_utils::error::{ProviderError, ProviderErrorCategory};

use crate::types::{LlmBackend, ProviderRequest};

/// Maps exact prompt text to a canned response, or falls back to echoing
/// the prompt back wrapped in a marker so the caller can see a completion
/// happened even with no canned entry configured.
pub struct MockBackend {
    responses: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_response(mut self, prompt: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses.insert(prompt.into(), response.into());
        self
    }

    /// Every prompt this backend has been asked to complete, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn kind(&self) -> &'static str {
        "mock"
    }

    async fn complete(&self, req: &ProviderRequest) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .expect("mock lock poisoned")
            .push(req.prompt.clone());

        match self.responses.get(&req.prompt) {
            Some(response) => Ok(response.clone()),
            None => Err(ProviderError {
                provider: "mock".to_string(),
                category: ProviderErrorCategory::Malformed,
                message: "no canned response configured for this prompt".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn returns_the_canned_response_for_an_exact_prompt() {
        let backend = MockBackend::new().with_response("hello", "world");
        let req = ProviderRequest {
            prompt: "hello".to_string(),
            model: "test".to_string(),
            seed: None,
            temperature: None,
            max_tokens: None,
            timeout: Duration::from_secs(1),
        };
        assert_eq!(backend.complete(&req).await.unwrap(), "world");
    }

    #[tokio::test]
    async fn records_every_call() {
        let backend = MockBackend::new().with_response("a", "1").with_response("b", "2");
        let req_a = ProviderRequest::new("a", "test");
        let req_b = ProviderRequest::new("b", "test");
        backend.complete(&req_a).await.unwrap();
        backend.complete(&req_b).await.unwrap();
        assert_eq!(backend.calls(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn unconfigured_prompt_is_a_malformed_error() {
        let backend = MockBackend::new();
        let req = ProviderRequest::new("unknown", "test");
        let err = backend.complete(&req).await.unwrap_err();
        assert_eq!(err.category, ProviderErrorCategory::Malformed);
    }
}
