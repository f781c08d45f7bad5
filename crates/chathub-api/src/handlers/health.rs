//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, StatusResponse};
use crate::state::AppState;

/// GET /api/status
pub async fn status(State(state): State<AppState>) -> Json<ApiResponse<StatusResponse>> {
    let store_healthy = match state.store.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!(error = %e, "Store health check failed");
            false
        }
    };

    Json(ApiResponse::ok(StatusResponse {
        status: if store_healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        store_healthy,
        online_users: state.realtime.registry.len(),
        metrics: state.realtime.metrics.snapshot(),
    }))
}
