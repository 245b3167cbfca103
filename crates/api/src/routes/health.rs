use axum::extract::State;
use axum::{routing::get, Json, Router};
use layoutsmith_db::StorageHealth;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the storage backend answered.
    pub storage_healthy: bool,
}

/// GET /health -- returns service and storage health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage_healthy = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Storage health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if storage_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        storage_healthy,
    })
}

/// Mount health check routes (root level, not under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
