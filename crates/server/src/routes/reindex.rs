// crates/server/src/routes/reindex.rs
//! API routes for reindexing job management.
//!
//! - POST /reindex — Submit a reindexing job
//! - GET /reindex — List live and recently persisted jobs
//! - GET /reindex/latest — Most recent job
//! - GET /reindex/{id} — Job by id
//! - POST /reindex/{id}/stop — Request cancellation of a live job

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use reindexd_types::{JobRecord, JobSpec};

use crate::error::ApiResult;
use crate::state::AppState;

fn default_started_by() -> String {
    "admin".to_string()
}

/// Query parameters for job submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitParams {
    #[serde(default = "default_started_by")]
    pub started_by: String,
}

/// POST /api/reindex - Submit a reindexing job.
async fn submit_job(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SubmitParams>,
    Json(spec): Json<JobSpec>,
) -> ApiResult<Json<JobRecord>> {
    let record = state.manager.submit(&params.started_by, &spec).await?;
    Ok(Json(record))
}

/// GET /api/reindex - List jobs, live first.
async fn list_jobs(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<JobRecord>>> {
    Ok(Json(state.manager.list().await?))
}

/// GET /api/reindex/latest - Most recently submitted or persisted job.
async fn latest_job(State(state): State<Arc<AppState>>) -> ApiResult<Json<JobRecord>> {
    Ok(Json(state.manager.latest().await?))
}

/// GET /api/reindex/{id} - Job by id, live or persisted.
async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JobRecord>> {
    Ok(Json(state.manager.get(id).await?))
}

/// POST /api/reindex/{id}/stop - Request cancellation of a live job.
async fn stop_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JobRecord>> {
    Ok(Json(state.manager.stop(id).await?))
}

/// Build the reindex router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reindex", post(submit_job).get(list_jobs))
        .route("/reindex/latest", get(latest_job))
        .route("/reindex/{id}", get(get_job))
        .route("/reindex/{id}/stop", post(stop_job))
}
