//! Service banner, health check, and fallback.

use crate::envelope::{self, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use taskrelay_core::now_millis;

/// `GET /`: service banner and endpoint index.
pub async fn root() -> Response {
    Json(json!({
        "message": "TaskRelay API server is running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "tasks": "/api/tasks",
            "sync": "/api/sync",
            "auth": "/api/auth",
            "health": "/health",
        },
        "timestamp": now_millis(),
    }))
    .into_response()
}

/// `GET /health`: store reachability and uptime.
pub async fn health(State(state): State<AppState>) -> ApiResult {
    // A stats read proves the durable store still answers.
    let database = match state.ledger.stats() {
        Ok(_) => "Connected",
        Err(_) => "Disconnected",
    };
    Ok(Json(json!({
        "status": "OK",
        "database": database,
        "uptimeSecs": state.started_at.elapsed().as_secs(),
        "timestamp": now_millis(),
    }))
    .into_response())
}

/// Fallback for unmatched routes.
pub async fn not_found() -> Response {
    envelope::failure(StatusCode::NOT_FOUND, "Route not found")
}
