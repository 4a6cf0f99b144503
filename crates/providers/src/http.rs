//! Shared HTTP plumbing for the adapters: client construction and
//! translation of transport failures and non-success statuses into `UpstreamError`.

use chatrelay_core::{ApiProvider, UpstreamError};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build configured HTTP client, using defaults");
            reqwest::Client::new()
        })
}

/// Map a failed `send()` into the uniform error.
pub(crate) fn send_error(provider: ApiProvider, timeout: Duration, e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::timeout(provider, timeout.as_secs())
    } else {
        UpstreamError::network(provider, e.to_string())
    }
}

/// Pass through a success response; turn anything else into a status error.
///
/// The upstream body is logged but never carried in the error.
pub(crate) async fn ensure_success(
    provider: ApiProvider,
    response: reqwest::Response,
) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    warn!(provider = %provider, status = status.as_u16(), body = %error_body, "Provider returned error");
    Err(UpstreamError::status(
        provider,
        status.as_u16(),
        status.canonical_reason(),
    ))
}

pub(crate) async fn parse_json<T: DeserializeOwned>(
    provider: ApiProvider,
    response: reqwest::Response,
) -> Result<T, UpstreamError> {
    response
        .json()
        .await
        .map_err(|e| UpstreamError::malformed(provider, format!("Failed to parse response: {e}")))
}
