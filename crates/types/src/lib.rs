// crates/types/src/lib.rs
//! Shared data model for the reindexd service.
//!
//! Everything here is wire-facing: the same structs are returned from the
//! HTTP API and persisted as JSON snapshots in the extension log, so the
//! serde representation is the contract.

pub mod job;

pub use job::{
    JobFailure, JobRecord, JobSpec, JobStats, JobStatus, MappingLanguage, PublisherType, RunMode,
    REINDEX_JOB_EXTENSION, REINDEX_JOB_RECORD_KIND,
};
