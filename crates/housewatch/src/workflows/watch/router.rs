use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::service::{WatchService, WatchServiceError};

/// Router exposing match history and run control.
pub fn watch_router(service: Arc<WatchService>) -> Router {
    Router::new()
        .route("/api/v1/matches", get(matches_handler))
        .route("/api/v1/runs/latest", get(latest_run_handler))
        .route("/api/v1/runs", post(trigger_run_handler))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryQuery {
    limit: Option<usize>,
}

pub(crate) async fn matches_handler(
    State(service): State<Arc<WatchService>>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    match service.history(query.limit) {
        Ok(entries) => {
            let payload = json!({
                "count": entries.len(),
                "matches": entries,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn latest_run_handler(State(service): State<Arc<WatchService>>) -> Response {
    match service.latest().await {
        Some(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        None => {
            let payload = json!({
                "error": "no run recorded yet",
                "running": service.is_running(),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn trigger_run_handler(State(service): State<Arc<WatchService>>) -> Response {
    match service.run_once().await {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(WatchServiceError::RunInProgress) => {
            let payload = json!({
                "error": "a run is already in progress",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
