//! Anthropic native adapter.
//!
//! Uses Anthropic's Messages API directly (not an OpenAI-compatible proxy).
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Fenced code blocks in the reply become code artifacts

use async_trait::async_trait;
use chatrelay_core::{
    AdapterRequest, ApiKey, ApiProvider, ChatResult, ComposedPrompt, ProviderAdapter, UpstreamError,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::artifacts;
use crate::http::{self, DEFAULT_TIMEOUT};

const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic native Messages API adapter.
pub struct AnthropicAdapter {
    base_url: String,
    model: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl AnthropicAdapter {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            client: http::build_client(DEFAULT_TIMEOUT),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http::build_client(timeout);
        self.timeout = timeout;
        self
    }

    fn request_body(&self, composed: &ComposedPrompt) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "max_tokens": DEFAULT_MAX_TOKENS,
            "system": composed.system_prompt,
            "messages": [
                { "role": "user", "content": composed.prompt },
            ],
        })
    }

    /// Build the uniform result from a parsed reply.
    fn to_chat_result(&self, response: AnthropicResponse) -> Result<ChatResult, UpstreamError> {
        let text = response
            .content
            .into_iter()
            .find_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(text),
                ResponseContentBlock::Other => None,
            })
            .ok_or_else(|| {
                UpstreamError::malformed(ApiProvider::Anthropic, "No text content in response")
            })?;

        let artifacts = if self.extracts_code_artifacts() {
            artifacts::extract_artifacts(&text)
        } else {
            Vec::new()
        };

        Ok(ChatResult::with_artifacts(text, artifacts))
    }
}

impl Default for AnthropicAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> ApiProvider {
        ApiProvider::Anthropic
    }

    fn extracts_code_artifacts(&self) -> bool {
        true
    }

    async fn send(&self, api_key: &ApiKey, request: &AdapterRequest) -> Result<ChatResult, UpstreamError> {
        let provider = ApiProvider::Anthropic;
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.request_body(&request.composed);

        debug!(provider = %provider, model = %self.model, "Sending messages request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| http::send_error(provider, self.timeout, e))?;

        let response = http::ensure_success(provider, response).await?;
        let api_resp: AnthropicResponse = http::parse_json(provider, response).await?;
        self.to_chat_result(api_resp)
    }
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ResponseContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}
