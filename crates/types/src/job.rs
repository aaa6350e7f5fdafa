// crates/types/src/job.rs
//! Reindexing job records and the submission spec.

use std::collections::BTreeSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Extension name under which job snapshots are appended to the log.
pub const REINDEX_JOB_EXTENSION: &str = "reindexing.eventPublisher";

/// Record kind stored alongside each extension-log row.
pub const REINDEX_JOB_RECORD_KIND: &str = "eventPublisherJob";

/// Lifecycle status of a reindexing job.
///
/// `Started` and `Running` are the only live states; everything else is
/// terminal and absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Started,
    Running,
    Completed,
    Failed,
    Stopped,
    ActiveError,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Started | JobStatus::Running)
    }
}

/// Destination kind for published records. Only the search index today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublisherType {
    SearchIndex,
}

/// How the job consumes the entity stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunMode {
    Batch,
}

/// Analyzer language for the destination index mappings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MappingLanguage {
    #[default]
    En,
    Jp,
    Zh,
}

/// Per-job progress counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub pending: u64,
}

/// Failure context recorded while a job runs. Errors inside a job never
/// propagate to callers; they land here instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexer: Option<String>,
}

impl JobFailure {
    pub fn is_empty(&self) -> bool {
        self.sink.is_none() && self.source.is_none() && self.indexer.is_none()
    }
}

fn default_batch_size() -> u32 {
    100
}

/// Client-submitted request to create a reindexing job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    pub name: String,
    /// Entity types to reindex. `BTreeSet` keeps the wire order stable.
    pub entities: BTreeSet<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    #[serde(default)]
    pub recreate_index: bool,
    #[serde(default)]
    pub search_index_mapping_language: MappingLanguage,
    /// Opaque resumption token. Only valid with a single entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_cursor: Option<String>,
}

/// A reindexing job: returned from the API and persisted (as JSON) to the
/// extension log. The `id` never changes; `entities` holds the residual
/// set actually scheduled, which may be smaller than the spec's.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: Uuid,
    pub name: String,
    pub publisher_type: PublisherType,
    pub run_mode: RunMode,
    pub started_by: String,
    pub status: JobStatus,
    pub stats: JobStats,
    #[serde(default, skip_serializing_if = "JobFailure::is_empty")]
    pub failure: JobFailure,
    /// Epoch millis when the job was created.
    pub start_time: i64,
    /// Epoch millis of the last update. Always >= `start_time`.
    pub timestamp: i64,
    pub entities: BTreeSet<String>,
    pub batch_size: u32,
    pub recreate_index: bool,
    pub search_index_mapping_language: MappingLanguage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_cursor: Option<String>,
}

/// Current time as epoch millis, the timestamp unit used throughout.
pub fn epoch_ms_now() -> i64 {
    Utc::now().timestamp_millis()
}

impl JobRecord {
    /// Build a fresh record from a spec: new uuid, `Started`, empty stats,
    /// both timestamps set to now.
    pub fn from_spec(started_by: &str, spec: &JobSpec) -> Self {
        let now = epoch_ms_now();
        Self {
            id: Uuid::new_v4(),
            name: spec.name.clone(),
            publisher_type: PublisherType::SearchIndex,
            run_mode: RunMode::Batch,
            started_by: started_by.to_string(),
            status: JobStatus::Started,
            stats: JobStats::default(),
            failure: JobFailure::default(),
            start_time: now,
            timestamp: now,
            entities: spec.entities.clone(),
            batch_size: spec.batch_size,
            recreate_index: spec.recreate_index,
            search_index_mapping_language: spec.search_index_mapping_language,
            after_cursor: spec.after_cursor.clone(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Advance `timestamp` to now.
    pub fn touch(&mut self) {
        self.timestamp = epoch_ms_now();
    }
}
