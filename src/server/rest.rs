//! REST API endpoints.
//!
//! `/chat`, `/scan` and `/status` are served both at the root and under
//! `/api`; `/health` and `/metrics` only at the root.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::metrics::{render, CHAT_LATENCY, CHAT_REQUESTS};
use crate::engine::{split_conversation, Answer, Message};
use crate::service::IndexService;
use crate::{Error, Result};

/// Chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub index: String,
}

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps crate errors onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match self.0 {
            Error::InvalidRequest(msg) | Error::NotReady(msg) => msg,
            other => {
                tracing::error!(error = %other, "Request failed");
                format!("Internal server error: {other}")
            }
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Create REST API router.
pub fn create_rest_router(service: Arc<IndexService>) -> Router {
    let api = Router::new()
        .route("/chat", post(chat))
        .route("/scan", post(scan))
        .route("/status", get(status));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .merge(api.clone())
        .nest("/api", api)
        .with_state(service)
}

/// Answer a question about the indexed documents.
async fn chat(
    State(service): State<Arc<IndexService>>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> std::result::Result<Json<Answer>, ApiError> {
    let start = Instant::now();
    let result = answer_chat(&service, payload).await.map_err(ApiError);

    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => e.status_code(),
    };
    CHAT_REQUESTS.with_label_values(&[status.as_str()]).inc();
    CHAT_LATENCY
        .with_label_values(&[status.as_str()])
        .observe(start.elapsed().as_secs_f64());

    result.map(Json)
}

async fn answer_chat(
    service: &Arc<IndexService>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Answer> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Rejected chat body");
        Error::invalid_request("Invalid request format")
    })?;

    service.spawn_rescan("chat");

    let (question, history) = split_conversation(&request.messages)?;
    let engine = service.wait_until_ready(service.ready_timeout()).await?;

    let answer = engine.answer(&question, &history).await?;
    tracing::info!(
        history = history.len(),
        sources = answer.sources.len(),
        "Chat answered"
    );
    Ok(answer)
}

/// Trigger a background scan.
async fn scan(State(service): State<Arc<IndexService>>) -> impl IntoResponse {
    service.spawn_rescan("request");
    Json(serde_json::json!({ "message": "Scan initiated" }))
}

/// Index and scan state.
async fn status(State(service): State<Arc<IndexService>>) -> impl IntoResponse {
    let status = service.status();
    tracing::debug!(
        index_ready = status.index_ready,
        files = status.indexed_file_count,
        "Status retrieved"
    );
    Json(status)
}

/// Liveness endpoint; up even while the first index is being built.
async fn health_check(State(service): State<Arc<IndexService>>) -> impl IntoResponse {
    let index = if service.index().is_some() {
        "ready"
    } else {
        "building"
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        index: index.to_string(),
    })
}

/// Prometheus metrics endpoint.
async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        render(),
    )
}
