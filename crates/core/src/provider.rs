//! Provider adapter trait: the abstraction over upstream LLM APIs.
//!
//! An adapter knows exactly one upstream wire protocol. It takes a composed
//! prompt, calls the upstream API, and returns the uniform `ChatResult`.
//!
//! Implementations: OpenAI, Anthropic, DeepSeek.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::chat::{ChatMode, ChatResult, Template};
use crate::credentials::ApiKey;
use crate::error::{UpstreamError, ValidationError};

/// The closed set of supported upstream providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiProvider {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "deepseek")]
    DeepSeek,
}

impl ApiProvider {
    pub const ALL: [ApiProvider; 3] = [
        ApiProvider::OpenAi,
        ApiProvider::Anthropic,
        ApiProvider::DeepSeek,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiProvider::OpenAi => "openai",
            ApiProvider::Anthropic => "anthropic",
            ApiProvider::DeepSeek => "deepseek",
        }
    }
}

impl std::fmt::Display for ApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiProvider {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ApiProvider::OpenAi),
            "anthropic" => Ok(ApiProvider::Anthropic),
            "deepseek" => Ok(ApiProvider::DeepSeek),
            "" => Err(ValidationError::MissingProvider),
            _ => Err(ValidationError::UnknownProvider(s.to_string())),
        }
    }
}

/// The outgoing prompt pair produced by the prompt composer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedPrompt {
    /// System instruction sent alongside the user turn
    pub system_prompt: String,

    /// The user turn, after template rewriting and context injection
    pub prompt: String,
}

/// Everything an adapter needs for one upstream call.
#[derive(Debug, Clone)]
pub struct AdapterRequest {
    /// The user's original message, untouched by templates or context
    pub message: String,

    /// The composed prompt for text endpoints
    pub composed: ComposedPrompt,

    pub chat_mode: ChatMode,

    /// The template in effect (already `None` in free mode)
    pub template: Option<Template>,
}

impl AdapterRequest {
    pub fn is_template(&self, template: &Template) -> bool {
        self.chat_mode == ChatMode::Predefined && self.template.as_ref() == Some(template)
    }
}

/// The core adapter trait.
///
/// The dispatcher selects one adapter per request by `ApiProvider` and calls
/// `send()` exactly once (retries, if configured, happen inside a wrapping adapter).
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter speaks to.
    fn provider(&self) -> ApiProvider;

    /// Whether free-form reply text is scanned for fenced code blocks.
    ///
    /// Only the Anthropic adapter does this today.
    fn extracts_code_artifacts(&self) -> bool {
        false
    }

    /// Send one request upstream and normalize the reply.
    async fn send(
        &self,
        api_key: &ApiKey,
        request: &AdapterRequest,
    ) -> std::result::Result<ChatResult, UpstreamError>;
}
