// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use reindexd_db::Database;

use crate::jobs::ReindexManager;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Database handle for entity and job-log queries.
    pub db: Database,
    /// Reindexing job manager (admission, execution, status).
    pub manager: Arc<ReindexManager>,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(db: Database, manager: Arc<ReindexManager>) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            db,
            manager,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
