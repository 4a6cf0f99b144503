//! Upstream LLM adapters for chatrelay.
//!
//! All adapters implement the `chatrelay_core::ProviderAdapter` trait.
//! The router holds one adapter per provider, each wrapped in the retry policy.

pub mod anthropic;
pub mod artifacts;
pub mod deepseek;
mod http;
pub mod openai;
pub mod openai_compat;
pub mod prompt;
pub mod retry;
pub mod router;

pub use anthropic::AnthropicAdapter;
pub use deepseek::DeepSeekAdapter;
pub use http::DEFAULT_TIMEOUT;
pub use openai::OpenAiAdapter;
pub use openai_compat::ChatCompletions;
pub use retry::{RetryPolicy, RetryingAdapter};
pub use router::{AdapterSet, build_from_config};
