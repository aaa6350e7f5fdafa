// crates/server/src/jobs/mod.rs
//! Reindexing job system.
//!
//! - `ReindexManager` — process-wide facade: submit, query, stop, list
//! - `JobRegistry` — insertion-ordered map of live job handles
//! - `WorkerPool` — bounded executor running workflows in parallel
//! - `SearchIndexWorkflow` — one job's unit of work
//! - `EntitySource` / `SearchSink` — seams to the metadata store and the
//!   search backend

pub mod manager;
pub mod pool;
pub mod registry;
pub mod sink;
pub mod workflow;

pub use manager::{JobError, ReindexConfig, ReindexManager};
pub use pool::WorkerPool;
pub use registry::JobRegistry;
pub use sink::{DbEntitySource, EntitySource, NullSearchSink, SearchSink, SourcePage};
pub use workflow::SearchIndexWorkflow;

#[cfg(test)]
pub(crate) mod test_support;
