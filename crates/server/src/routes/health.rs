// crates/server/src/routes/health.rs
//! Health and readiness endpoint for the API.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Response for the health check endpoint.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Jobs currently registered with the manager (queued or indexing).
    pub live_jobs: usize,
    /// Metadata store location; empty for an in-memory store.
    pub db_path: String,
}

/// GET /api/health - Health check endpoint.
///
/// Reports server version and uptime plus the reindexing manager's live
/// job count and the metadata store in use.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        live_jobs: state.manager.live_jobs().await,
        db_path: state.db.db_path().display().to_string(),
    })
}

/// Create the health routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}
