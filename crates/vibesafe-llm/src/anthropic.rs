//! HTTP backend for Anthropic's Messages API, adapted from the teacher's
//! `anthropic_backend.rs`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vibesafe_utils::error::{ProviderError, ProviderErrorCategory};

use crate::retry::with_retry;
use crate::types::{LlmBackend, ProviderRequest};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AnthropicBackend {
    #[must_use]
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: api_key.into(),
        }
    }

    async fn send_once(&self, req: &ProviderRequest) -> Result<String, ProviderError> {
        let body = AnthropicRequest {
            model: req.model.clone(),
            max_tokens: req.max_tokens.unwrap_or(4096),
            temperature: req.temperature,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: req.prompt.clone(),
            }],
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .timeout(req.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport_error("anthropic", &e))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError {
                provider: "anthropic".to_string(),
                category: ProviderErrorCategory::Auth,
                message: "request rejected: invalid API key".to_string(),
            });
        }
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError {
                provider: "anthropic".to_string(),
                category: ProviderErrorCategory::Quota,
                message: "rate limited".to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(ProviderError {
                provider: "anthropic".to_string(),
                category: ProviderErrorCategory::Protocol,
                message: format!("unexpected status {}", response.status()),
            });
        }

        let parsed: AnthropicResponse = response.json().await.map_err(|e| ProviderError {
            provider: "anthropic".to_string(),
            category: ProviderErrorCategory::Malformed,
            message: format!("failed to parse response body: {e}"),
        })?;

        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.is_empty() {
            return Err(ProviderError {
                provider: "anthropic".to_string(),
                category: ProviderErrorCategory::Malformed,
                message: "response contained no text content".to_string(),
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    fn kind(&self) -> &'static str {
        "anthropic"
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
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_reports_its_kind() {
        let backend = AnthropicBackend::new("key", None);
        assert_eq!(backend.kind(), "anthropic");
    }

    #[test]
    fn default_base_url_is_used_when_unset() {
        let backend = AnthropicBackend::new("key", None);
        assert_eq!(backend.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn custom_base_url_overrides_the_default() {
        let backend = AnthropicBackend::new("key", Some("https://example.test".to_string()));
        assert_eq!(backend.base_url, "https://example.test");
    }
}
