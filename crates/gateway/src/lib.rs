//! HTTP API gateway for chatrelay.
//!
//! Exposes the chat relay endpoint, the text knowledge endpoints and a
//! health check.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::{
    Router,
    response::Json,
    routing::{get, post, put},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use chatrelay_config::AppConfig;
use chatrelay_dispatch::{Dispatcher, KnowledgeStore};

/// Request body limit for all routes.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Header carrying a caller-supplied key for the requested provider.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Shared application state for the gateway.
pub struct GatewayState {
    /// Source of the server-side provider keys
    pub config: AppConfig,
    pub dispatcher: Dispatcher,
    /// Text documents saved through `PUT /api/knowledge`
    pub documents: Arc<KnowledgeStore>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    /// Build the state from configuration: adapters, knowledge source and store.
    pub fn from_config(config: AppConfig) -> Result<Self, chatrelay_core::Error> {
        let documents = Arc::new(KnowledgeStore::from_config(&config.knowledge));
        let knowledge = chatrelay_dispatch::source_from_config(&config.knowledge, documents.clone())?;
        let adapters = chatrelay_providers::build_from_config(&config);

        Ok(Self {
            dispatcher: Dispatcher::new(adapters, knowledge),
            documents,
            config,
        })
    }
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS for the configured origins
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.gateway.cors_origins);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(api::chat_handler))
        .route("/api/knowledge", put(api::save_text_handler))
        .route("/api/knowledge/{project_id}", get(api::list_documents_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parse_origins(origins))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
        .max_age(std::time::Duration::from_secs(3600))
}

fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let knowledge_source = config.knowledge.source.clone();

    let state = Arc::new(GatewayState::from_config(config)?);
    let app = build_router(state);

    info!(addr = %addr, knowledge = %knowledge_source, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
