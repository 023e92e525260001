//! HTTP backend for any OpenAI-compatible chat completions endpoint
//! (covers OpenRouter-style providers), adapted from the teacher's
//! `openrouter_backend.rs`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vibesafe_utils::error::{ProviderError, ProviderErrorCategory};

use crate::retry::with_retry;
use crate::types::{LlmBackend, ProviderRequest};

pub struct OpenAiCompatibleBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiCompatibleBackend {
    #[must_use]
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn send_once(&self, req: &ProviderRequest) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: req.model.clone(),
            max_tokens: req.max_tokens,
            temperature: req.temperature,
            seed: req.seed,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: req.prompt.clone(),
            }],
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .timeout(req.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport_error("openai-compatible", &e))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ProviderError {
                provider: "openai-compatible".to_string(),
                category: ProviderErrorCategory::Auth,
                message: "request rejected: invalid API key".to_string(),
            });
        }
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError {
                provider: "openai-compatible".to_string(),
                category: ProviderErrorCategory::Quota,
                message: "rate limited".to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(ProviderError {
                provider: "openai-compatible".to_string(),
                category: ProviderErrorCategory::Protocol,
                message: format!("unexpected status {}", response.status()),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| ProviderError {
            provider: "openai-compatible".to_string(),
            category: ProviderErrorCategory::Malformed,
            message: format!("failed to parse response body: {e}"),
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError {
                provider: "openai-compatible".to_string(),
                category: ProviderErrorCategory::Malformed,
                message: "response contained no choices".to_string(),
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    fn kind(&self) -> &'static str {
        "openai-compatible"
    }

    async fn complete(&self, req: &ProviderRequest) -> Result<String, ProviderError> {
        with_retry(|| self.send_once(req)).await
    }
}

fn classify_transport_error(provider: &str, err: &reqwest::Error) -> ProviderError {
    let category = if err.is_timeout() || err.is_connect() {
        ProviderErrorCategory::Network
    } else {
        ProviderErrorCategory::Protocol
    };
    ProviderError {
        provider: provider.to_string(),
        category,
        message: err.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChatResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_reports_its_kind() {
        let backend = OpenAiCompatibleBackend::new("key", "https://openrouter.ai/api/v1/chat/completions");
        assert_eq!(backend.kind(), "openai-compatible");
    }
}
