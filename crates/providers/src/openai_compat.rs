//! OpenAI-compatible `/chat/completions` endpoint.
//!
//! Shared by the OpenAI and DeepSeek adapters, which speak the same wire
//! shape: Bearer auth, `messages[system, user]`, `temperature`, `max_tokens`.

use chatrelay_core::{ApiKey, ApiProvider, ComposedPrompt, UpstreamError};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::http::{self, DEFAULT_TIMEOUT};

pub const CHAT_TEMPERATURE: f64 = 0.7;
pub const CHAT_MAX_TOKENS: u32 = 2048;

/// One chat-completions endpoint (base URL + model) for a provider.
pub struct ChatCompletions {
    provider: ApiProvider,
    base_url: String,
    model: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl ChatCompletions {
    pub fn new(provider: ApiProvider, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: http::build_client(DEFAULT_TIMEOUT),
            timeout: DEFAULT_TIMEOUT,
        }
    }

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

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build the request body for a composed prompt.
    pub(crate) fn request_body(&self, composed: &ComposedPrompt) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": composed.system_prompt },
                { "role": "user", "content": composed.prompt },
            ],
            "temperature": CHAT_TEMPERATURE,
            "max_tokens": CHAT_MAX_TOKENS,
        })
    }

    /// Send the composed prompt and return the first choice's text.
    pub async fn complete(
        &self,
        api_key: &ApiKey,
        composed: &ComposedPrompt,
    ) -> Result<String, UpstreamError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(composed);

        debug!(provider = %self.provider, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key.expose()))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| http::send_error(self.provider, self.timeout, e))?;

        let response = http::ensure_success(self.provider, response).await?;
        let api_response: ApiResponse = http::parse_json(self.provider, response).await?;
        reply_text(self.provider, api_response)
    }
}

fn reply_text(provider: ApiProvider, response: ApiResponse) -> Result<String, UpstreamError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| UpstreamError::malformed(provider, "No choices in response"))
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
