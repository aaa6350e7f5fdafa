//! API route handlers for the reindexd server.

pub mod health;
pub mod reindex;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET /api/health - Health check
/// - POST /api/reindex - Submit a reindexing job
/// - GET /api/reindex - List live and recently persisted jobs
/// - GET /api/reindex/latest - Most recent job
/// - GET /api/reindex/{id} - Job by id
/// - POST /api/reindex/{id}/stop - Request cancellation of a live job
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", reindex::router())
        .with_state(state)
}
