//! HTTP front end for reranking
//!
//! Each request is an independent computation; scoring runs on the
//! blocking pool so large candidate sets do not stall the runtime.

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::batch::{rerank_request, RerankRequest};
use crate::config::RerankConfig;
use crate::error::RerankError;
use crate::rerank::ScoredCandidate;

#[derive(Clone)]
struct AppState {
    config: Arc<RerankConfig>,
}

#[derive(Debug, Serialize)]
struct RerankBody {
    request_id: Uuid,
    query: Option<String>,
    results: Vec<ScoredCandidate>,
}

struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<RerankError> for ApiError {
    fn from(err: RerankError) -> Self {
        let status = match err {
            RerankError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        ApiError(status, err.to_string())
    }
}

/// Build the router with a validated base configuration
pub fn router(config: RerankConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/health", get(health))
        .route("/rerank", post(rerank))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn rerank(
    State(state): State<AppState>,
    body: std::result::Result<Json<RerankRequest>, JsonRejection>,
) -> std::result::Result<Json<RerankBody>, ApiError> {
    let request_id = Uuid::new_v4();
    let Json(request) = body.map_err(|rejection| {
        warn!(%request_id, "Malformed rerank body: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;
    let config = state.config.clone();

    let response = tokio::task::spawn_blocking(move || {
        let _span = info_span!("rerank", %request_id).entered();
        rerank_request(request, &config)
    })
    .await
    .map_err(|e| ApiError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(|e| {
        warn!(%request_id, "Rerank request rejected: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(RerankBody {
        request_id,
        query: response.query,
        results: response.results,
    }))
}

/// Run the HTTP server until interrupted
pub async fn serve(host: &str, port: u16, config: RerankConfig) -> Result<()> {
    config.validate()?;

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("travelrank server listening on {}", addr);
    axum::serve(listener, router(config))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
