//! Provider routing: one adapter per supported provider.
//!
//! The set is closed, so lookup is an exhaustive match rather than a map.

use std::sync::Arc;

use chatrelay_config::AppConfig;
use chatrelay_core::{ApiProvider, ProviderAdapter};
use tracing::debug;

use crate::anthropic::AnthropicAdapter;
use crate::deepseek::DeepSeekAdapter;
use crate::openai::OpenAiAdapter;
use crate::retry::{RetryPolicy, RetryingAdapter};

/// The adapters the dispatcher routes to.
#[derive(Clone)]
pub struct AdapterSet {
    openai: Arc<dyn ProviderAdapter>,
    anthropic: Arc<dyn ProviderAdapter>,
    deepseek: Arc<dyn ProviderAdapter>,
}

impl AdapterSet {
    pub fn new(
        openai: Arc<dyn ProviderAdapter>,
        anthropic: Arc<dyn ProviderAdapter>,
        deepseek: Arc<dyn ProviderAdapter>,
    ) -> Self {
        Self {
            openai,
            anthropic,
            deepseek,
        }
    }

    /// Get the adapter for a provider.
    pub fn get(&self, provider: ApiProvider) -> Arc<dyn ProviderAdapter> {
        match provider {
            ApiProvider::OpenAi => self.openai.clone(),
            ApiProvider::Anthropic => self.anthropic.clone(),
            ApiProvider::DeepSeek => self.deepseek.clone(),
        }
    }
}

impl Default for AdapterSet {
    fn default() -> Self {
        build_from_config(&AppConfig::default())
    }
}

/// Build adapters from configuration.
///
/// Applies per-provider `api_url` / `model` overrides and the upstream
/// timeout, then wraps each adapter in the retry policy.
pub fn build_from_config(config: &AppConfig) -> AdapterSet {
    let timeout = config.upstream.timeout();
    let policy = RetryPolicy::from_config(&config.upstream);

    let mut openai = OpenAiAdapter::new().with_timeout(timeout);
    let mut anthropic = AnthropicAdapter::new().with_timeout(timeout);
    let mut deepseek = DeepSeekAdapter::new().with_timeout(timeout);

    if let Some(p) = config.provider(ApiProvider::OpenAi) {
        if let Some(url) = &p.api_url {
            openai = openai.with_base_url(url);
        }
        if let Some(model) = &p.model {
            openai = openai.with_model(model);
        }
    }

    if let Some(p) = config.provider(ApiProvider::Anthropic) {
        if let Some(url) = &p.api_url {
            anthropic = anthropic.with_base_url(url);
        }
        if let Some(model) = &p.model {
            anthropic = anthropic.with_model(model);
        }
    }

    if let Some(p) = config.provider(ApiProvider::DeepSeek) {
        if let Some(url) = &p.api_url {
            deepseek = deepseek.with_base_url(url);
        }
        if let Some(model) = &p.model {
            deepseek = deepseek.with_model(model);
        }
    }

    debug!(
        max_attempts = policy.max_attempts,
        timeout_secs = timeout.as_secs(),
        "Built provider adapters"
    );

    let wrap = |adapter: Arc<dyn ProviderAdapter>| -> Arc<dyn ProviderAdapter> {
        Arc::new(RetryingAdapter::new(adapter, policy.clone()))
    };

    AdapterSet::new(
        wrap(Arc::new(openai)),
        wrap(Arc::new(anthropic)),
        wrap(Arc::new(deepseek)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_provider_has_an_adapter() {
        let set = AdapterSet::default();
        for provider in ApiProvider::ALL {
            assert_eq!(set.get(provider).provider(), provider);
        }
    }

    #[test]
    fn only_anthropic_extracts_code() {
        let set = AdapterSet::default();
        assert!(set.get(ApiProvider::Anthropic).extracts_code_artifacts());
        assert!(!set.get(ApiProvider::OpenAi).extracts_code_artifacts());
        assert!(!set.get(ApiProvider::DeepSeek).extracts_code_artifacts());
    }
}
