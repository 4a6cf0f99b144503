//! Chat and knowledge API handlers.
//!
//! `POST /api/chat` relays one chat request through the dispatcher.
//! `PUT /api/knowledge` saves a text document, `GET /api/knowledge/{project_id}`
//! lists a project's documents.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use chatrelay_config::AppConfig;
use chatrelay_core::{ApiProvider, Artifact, ChatRequest, Error, ProviderCredentials};
use chatrelay_dispatch::KnowledgeDocument;

use crate::{API_KEY_HEADER, SharedState};

/// Message returned for any failure that is not the caller's fault.
pub const PROCESSING_FAILED: &str = "Failed to process request";
pub const MISSING_FIELDS: &str = "Missing required fields";

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a dispatcher error to a response.
///
/// Validation failures are returned verbatim as 400; everything else is
/// logged and returned as a generic 500.
fn dispatch_error(e: Error) -> ApiError {
    match e {
        Error::Validation(v) => {
            debug!(error = %v, "Rejected chat request");
            api_error(StatusCode::BAD_REQUEST, v.to_string())
        }
        other => {
            error!(error = %other, "Chat request failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, PROCESSING_FAILED)
        }
    }
}

/// Map a JSON body rejection. Oversized bodies keep their 413.
fn json_error(rejection: JsonRejection) -> ApiError {
    let status = match &rejection {
        JsonRejection::BytesRejection(_) => rejection.status(),
        _ => StatusCode::BAD_REQUEST,
    };
    warn!(status = %status, error = %rejection.body_text(), "Rejected request body");
    api_error(status, rejection.body_text())
}

/// Credentials for one request.
///
/// Starts from the server-side keys; an `X-Api-Key` header replaces the key
/// of the requested provider only.
pub fn request_credentials(
    config: &AppConfig,
    headers: &HeaderMap,
    requested: Option<&str>,
) -> ProviderCredentials {
    let mut credentials = config.credentials();

    let header_key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty());
    let requested = requested.and_then(|name| name.parse::<ApiProvider>().ok());

    if let (Some(key), Some(provider)) = (header_key, requested) {
        credentials.set(provider, key);
    }

    credentials
}

// ── Chat ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub artifacts: Vec<Artifact>,
}

/// `POST /api/chat`
pub async fn chat_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(json_error)?;

    let credentials =
        request_credentials(&state.config, &headers, request.api_provider.as_deref());

    let result = state
        .dispatcher
        .handle(request, &credentials)
        .await
        .map_err(dispatch_error)?;

    Ok(Json(ChatResponse {
        response: result.content,
        artifacts: result.artifacts,
    }))
}

// ── Knowledge ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTextRequest {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub text_title: Option<String>,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveTextResponse {
    pub success: bool,
    pub document: KnowledgeDocument,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListResponse {
    pub project_id: String,
    pub documents: Vec<KnowledgeDocument>,
}

/// `PUT /api/knowledge`
pub async fn save_text_handler(
    State(state): State<SharedState>,
    payload: Result<Json<SaveTextRequest>, JsonRejection>,
) -> Result<Json<SaveTextResponse>, ApiError> {
    let Json(req) = payload.map_err(json_error)?;

    let title = req.text_title.as_deref().filter(|t| !t.trim().is_empty());
    let content = req.text_content.as_deref().filter(|c| !c.trim().is_empty());
    let (Some(title), Some(content)) = (title, content) else {
        return Err(api_error(StatusCode::BAD_REQUEST, MISSING_FIELDS));
    };

    let document = state
        .documents
        .save_text(&req.project_id, title, content, req.item_id.as_deref())
        .await
        .map_err(|e| {
            warn!(project = %req.project_id, error = %e, "Rejected text document");
            api_error(StatusCode::CONFLICT, e.to_string())
        })?;

    info!(
        project = %req.project_id,
        document = %document.id,
        size = document.size,
        updated = document.updated_at.is_some(),
        "Saved text document"
    );

    Ok(Json(SaveTextResponse {
        success: true,
        document,
    }))
}

/// `GET /api/knowledge/{project_id}`
pub async fn list_documents_handler(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> Json<DocumentListResponse> {
    let documents = state.documents.list(&project_id).await;
    Json(DocumentListResponse {
        project_id,
        documents,
    })
}
