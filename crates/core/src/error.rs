//! Error types for the chatrelay domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each failure class of a chat request has its own error type.

use thiserror::Error;

use crate::provider::ApiProvider;

/// The top-level error type for all chatrelay operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Request validation ---
    #[error("{0}")]
    Validation(#[from] ValidationError),

    // --- Upstream provider errors ---
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    // --- Knowledge retrieval ---
    #[error("Knowledge lookup error: {0}")]
    Knowledge(#[from] KnowledgeError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Whether this error was caused by the caller's input (HTTP 400 class).
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

// --- Failure classes ---

/// Bad or missing input. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing API provider")]
    MissingProvider,

    #[error("Invalid API provider")]
    UnknownProvider(String),

    #[error("Missing API key for {0}")]
    MissingCredential(ApiProvider),

    #[error("Message must not be empty")]
    EmptyMessage,
}

/// A provider call that did not return success.
#[derive(Debug, Clone, Error)]
#[error("{provider} API error: {kind}")]
pub struct UpstreamError {
    pub provider: ApiProvider,
    pub kind: UpstreamErrorKind,
}

#[derive(Debug, Clone, Error)]
pub enum UpstreamErrorKind {
    #[error("{status_text} (status: {status_code})")]
    Status { status_code: u16, status_text: String },

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl UpstreamError {
    pub fn new(provider: ApiProvider, kind: UpstreamErrorKind) -> Self {
        Self { provider, kind }
    }

    /// Build a status error, using the canonical reason phrase as status text.
    pub fn status(provider: ApiProvider, status_code: u16, reason: Option<&str>) -> Self {
        Self::new(
            provider,
            UpstreamErrorKind::Status {
                status_code,
                status_text: reason.unwrap_or("Unknown status").to_string(),
            },
        )
    }

    pub fn timeout(provider: ApiProvider, timeout_secs: u64) -> Self {
        Self::new(provider, UpstreamErrorKind::Timeout { timeout_secs })
    }

    pub fn network(provider: ApiProvider, message: impl Into<String>) -> Self {
        Self::new(provider, UpstreamErrorKind::Network(message.into()))
    }

    pub fn malformed(provider: ApiProvider, message: impl Into<String>) -> Self {
        Self::new(provider, UpstreamErrorKind::MalformedResponse(message.into()))
    }

    /// Whether re-sending the same request may succeed.
    ///
    /// Timeouts, transport failures, 408, 429 and 5xx are transient;
    /// everything else (auth failures, bad requests, unparseable bodies) is not.
    pub fn is_transient(&self) -> bool {
        match &self.kind {
            UpstreamErrorKind::Status { status_code, .. } => {
                matches!(status_code, 408 | 429) || *status_code >= 500
            }
            UpstreamErrorKind::Timeout { .. } | UpstreamErrorKind::Network(_) => true,
            UpstreamErrorKind::MalformedResponse(_) => false,
        }
    }
}

/// Failure of the knowledge-retrieval collaborator.
#[derive(Debug, Clone, Error)]
pub enum KnowledgeError {
    #[error("Project {project_id} already holds {limit} documents")]
    ProjectFull { project_id: String, limit: usize },

    #[error("Knowledge query failed for project {project_id}: {reason}")]
    QueryFailed { project_id: String, reason: String },
}
