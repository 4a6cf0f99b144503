//! OpenAI adapter.
//!
//! Two upstream endpoints:
//! - `/images/generations` when the `image` template is in effect, prompted with
//!   the raw user message (no knowledge context)
//! - `/chat/completions` for everything else
//!
//! Reply text is returned as-is; no code-block extraction.

use async_trait::async_trait;
use chatrelay_core::{
    AdapterRequest, ApiKey, ApiProvider, Artifact, ChatResult, ProviderAdapter, Template,
    UpstreamError,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::http;
use crate::openai_compat::ChatCompletions;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const IMAGE_SIZE: &str = "1024x1024";
pub const IMAGE_CONFIRMATION: &str = "I've generated an image based on your request:";
pub const IMAGE_TITLE: &str = "Generated image";

pub struct OpenAiAdapter {
    chat: ChatCompletions,
}

impl OpenAiAdapter {
    pub fn new() -> Self {
        Self {
            chat: ChatCompletions::new(ApiProvider::OpenAi, DEFAULT_BASE_URL, DEFAULT_MODEL),
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.chat = self.chat.with_base_url(base_url);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.chat = self.chat.with_model(model);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.chat = self.chat.with_timeout(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        self.chat.base_url()
    }

    async fn generate_image(&self, api_key: &ApiKey, prompt: &str) -> Result<ChatResult, UpstreamError> {
        let provider = ApiProvider::OpenAi;
        let url = format!("{}/images/generations", self.chat.base_url());
        let body = image_request_body(prompt);

        debug!(provider = %provider, size = IMAGE_SIZE, "Sending image generation request");

        let response = self
            .chat
            .client()
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key.expose()))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| http::send_error(provider, self.chat.timeout(), e))?;

        let response = http::ensure_success(provider, response).await?;
        let api_response: ImageResponse = http::parse_json(provider, response).await?;
        image_result(api_response)
    }
}

impl Default for OpenAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> ApiProvider {
        ApiProvider::OpenAi
    }

    async fn send(&self, api_key: &ApiKey, request: &AdapterRequest) -> Result<ChatResult, UpstreamError> {
        if request.is_template(&Template::Image) {
            return self.generate_image(api_key, &request.message).await;
        }

        let content = self.chat.complete(api_key, &request.composed).await?;
        Ok(ChatResult::text(content))
    }
}

fn image_request_body(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "prompt": prompt,
        "n": 1,
        "size": IMAGE_SIZE,
    })
}

fn image_result(response: ImageResponse) -> Result<ChatResult, UpstreamError> {
    let url = response
        .data
        .into_iter()
        .next()
        .and_then(|image| image.url)
        .ok_or_else(|| UpstreamError::malformed(ApiProvider::OpenAi, "No image URL in response"))?;

    Ok(ChatResult::with_artifacts(
        IMAGE_CONFIRMATION,
        vec![Artifact::Image {
            url,
            title: IMAGE_TITLE.into(),
        }],
    ))
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}
