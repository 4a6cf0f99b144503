//! DeepSeek adapter: OpenAI-compatible chat completions.

use async_trait::async_trait;
use chatrelay_core::{AdapterRequest, ApiKey, ApiProvider, ChatResult, ProviderAdapter, UpstreamError};
use std::time::Duration;

use crate::openai_compat::ChatCompletions;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

pub struct DeepSeekAdapter {
    chat: ChatCompletions,
}

impl DeepSeekAdapter {
    pub fn new() -> Self {
        Self {
            chat: ChatCompletions::new(ApiProvider::DeepSeek, DEFAULT_BASE_URL, DEFAULT_MODEL),
        }
    }

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
}

impl Default for DeepSeekAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for DeepSeekAdapter {
    fn provider(&self) -> ApiProvider {
        ApiProvider::DeepSeek
    }

    async fn send(&self, api_key: &ApiKey, request: &AdapterRequest) -> Result<ChatResult, UpstreamError> {
        let content = self.chat.complete(api_key, &request.composed).await?;
        Ok(ChatResult::text(content))
    }
}
