//! HTTP front door: `POST /query`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::commands::control_plane::ControlPlane;
use crate::commands::query::Assistant;
use crate::error::{QueryError, SnapshotError};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Request failure rendered as `{"detail": ...}`.
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        let status = match &err {
            QueryError::Validation(_) => StatusCode::BAD_REQUEST,
            QueryError::ClusterUnavailable(SnapshotError::Encode(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            QueryError::ClusterUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            QueryError::AssistantUnavailable(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: format!("invalid question: {}", rejection.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}

impl ApiError {
    fn timed_out(after: Duration) -> Self {
        Self {
            status: StatusCode::REQUEST_TIMEOUT,
            detail: format!("request timed out after {}s", after.as_secs_f64()),
        }
    }
}

struct AppState<C> {
    assistant: Arc<Assistant<C>>,
    timeout: Duration,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            assistant: Arc::clone(&self.assistant),
            timeout: self.timeout,
        }
    }
}

/// Answers one question. Past the deadline the in-flight snapshot and
/// provider calls are dropped and the caller gets 408.
async fn query<C: ControlPlane + Clone>(
    State(state): State<AppState<C>>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = body?;
    match tokio::time::timeout(state.timeout, state.assistant.ask(&request.query)).await {
        Ok(Ok(answer)) => Ok(Json(QueryResponse { answer })),
        Ok(Err(err)) => {
            log::warn!("query failed: {err}");
            Err(err.into())
        }
        Err(_) => {
            log::warn!("query timed out after {:?}", state.timeout);
            Err(ApiError::timed_out(state.timeout))
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

/// Builds the router. Questions running past `timeout` get 408.
pub fn router<C: ControlPlane + Clone>(assistant: Arc<Assistant<C>>, timeout: Duration) -> Router {
    Router::new()
        .route("/query", post(query::<C>))
        .route("/query/", post(query::<C>))
        .route("/healthz", get(healthz))
        .with_state(AppState { assistant, timeout })
}

/// Serves until Ctrl-C.
pub async fn run<C: ControlPlane + Clone>(
    assistant: Arc<Assistant<C>>,
    addr: SocketAddr,
    timeout: Duration,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(assistant, timeout))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("shutting down");
        })
        .await
}
