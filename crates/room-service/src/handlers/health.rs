//! Health check handlers.
//!
//! - `/health`: liveness probe - returns OK if the process is running
//! - `/ready`: readiness probe - checks the store connection

use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness probe handler.
///
/// Returns a simple "OK" response to indicate the process is running.
/// Does NOT check any dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Runs a cheap probe against the store. Returns 200 if ready, 503 if not.
/// Error messages are intentionally generic; actual errors are logged
/// server-side.
#[tracing::instrument(skip_all, name = "room.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.key_exists("health:probe").await {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                store: Some("healthy"),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!("Readiness check failed: store error: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "not_ready",
                    store: Some("unhealthy"),
                    error: Some("Service dependencies unavailable".to_string()),
                }),
            )
        }
    }
}
