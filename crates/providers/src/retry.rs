//! Bounded retry with per-attempt timeouts.
//!
//! Wraps any adapter. Each attempt is bounded by the upstream timeout; transient
//! failures (timeouts, transport errors, 408/429/5xx) are retried with capped
//! exponential backoff plus jitter, up to `max_attempts` total attempts.

use async_trait::async_trait;
use chatrelay_config::UpstreamConfig;
use chatrelay_core::{AdapterRequest, ApiKey, ApiProvider, ChatResult, ProviderAdapter, UpstreamError};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// One attempt, no retry.
    pub fn single(attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            attempt_timeout,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
            attempt_timeout: config.timeout(),
        }
    }

    /// Delay before retry number `retry` (1-based), without jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Backoff plus up to 50% random jitter, still capped at `max_backoff`.
    fn jittered_backoff(&self, retry: u32) -> Duration {
        let base = self.backoff(retry);
        let half_ms = (base.as_millis() / 2) as u64;
        let jitter = if half_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=half_ms)
        };
        (base + Duration::from_millis(jitter)).min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&UpstreamConfig::default())
    }
}

/// An adapter that retries its inner adapter on transient failures.
pub struct RetryingAdapter {
    inner: Arc<dyn ProviderAdapter>,
    policy: RetryPolicy,
}

impl RetryingAdapter {
    pub fn new(inner: Arc<dyn ProviderAdapter>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl ProviderAdapter for RetryingAdapter {
    fn provider(&self) -> ApiProvider {
        self.inner.provider()
    }

    fn extracts_code_artifacts(&self) -> bool {
        self.inner.extracts_code_artifacts()
    }

    async fn send(&self, api_key: &ApiKey, request: &AdapterRequest) -> Result<ChatResult, UpstreamError> {
        let provider = self.inner.provider();
        let mut attempt = 1;

        loop {
            let outcome =
                match tokio::time::timeout(self.policy.attempt_timeout, self.inner.send(api_key, request)).await {
                    Ok(result) => result,
                    Err(_) => Err(UpstreamError::timeout(
                        provider,
                        self.policy.attempt_timeout.as_secs(),
                    )),
                };

            let error = match outcome {
                Ok(result) => return Ok(result),
                Err(e) => e,
            };

            if !error.is_transient() || attempt >= self.policy.max_attempts {
                return Err(error);
            }

            let delay = self.policy.jittered_backoff(attempt);
            warn!(
                provider = %provider,
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Upstream call failed, retrying"
            );
            tokio::time::sleep(delay).await;

            attempt += 1;
            info!(provider = %provider, attempt, "Retrying upstream call");
        }
    }
}
