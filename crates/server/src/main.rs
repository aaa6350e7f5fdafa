// crates/server/src/main.rs
//! Reindexd server binary.
//!
//! Opens the metadata store, wires the reindexing job manager to a
//! database-backed entity source, and serves the HTTP API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use reindexd_db::Database;
use reindexd_server::jobs::{DbEntitySource, NullSearchSink};
use reindexd_server::{create_app, AppState, EntityCatalog, ReindexConfig, ReindexManager};

#[derive(Debug, Parser)]
#[command(name = "reindexd", version, about = "Search reindexing job server")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "REINDEXD_PORT", default_value_t = 8585)]
    port: u16,

    /// Path to the SQLite metadata store.
    #[arg(long, env = "REINDEXD_DB", default_value = "reindexd.db")]
    db_path: PathBuf,

    /// Maximum number of jobs indexing concurrently.
    #[arg(long, env = "REINDEXD_MAX_ACTIVE", default_value_t = 5)]
    max_active: usize,

    /// Maximum number of admitted jobs waiting for a worker.
    #[arg(long, env = "REINDEXD_MAX_QUEUED", default_value_t = 5)]
    max_queued: usize,

    /// Number of job runs retained in the extension log.
    #[arg(long, env = "REINDEXD_LOG_RETAIN", default_value_t = 5)]
    log_retain: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    let args = Args::parse();

    let db = Database::new(&args.db_path).await?;
    tracing::info!(db_path = %args.db_path.display(), "Metadata store ready");

    let config = ReindexConfig {
        max_active: args.max_active,
        max_queued: args.max_queued,
        log_retain: args.log_retain,
    };
    let manager = ReindexManager::new(
        db.clone(),
        Arc::new(DbEntitySource::new(db.clone())),
        Arc::new(NullSearchSink),
        EntityCatalog::with_defaults(),
        config,
    );

    let state = AppState::new(db, manager);
    let app = create_app(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app).await?;

    Ok(())
}
