// crates/server/src/lib.rs
//! Reindexd server library.
//!
//! Axum-based HTTP service that manages search-index rebuild jobs for a
//! metadata store: submit a job for a set of entity types, watch its
//! progress, stop it, and read back persisted runs from the extension log.

pub mod catalog;
pub mod error;
pub mod jobs;
pub mod routes;
pub mod state;

pub use catalog::EntityCatalog;
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use jobs::{JobError, ReindexConfig, ReindexManager};
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
