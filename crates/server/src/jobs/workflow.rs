// crates/server/src/jobs/workflow.rs
//! One reindexing job's unit of work.
//!
//! A workflow owns its `JobRecord` and a cancellation flag. The worker
//! task is the single writer; readers (status queries, the admission
//! check) take cloned snapshots. Errors inside `run` never escape: they
//! are recorded in the job's failure context and status.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use reindexd_db::Database;
use reindexd_types::{JobRecord, JobStatus, MappingLanguage, REINDEX_JOB_EXTENSION};

use super::sink::{EntitySource, SearchSink};

pub struct SearchIndexWorkflow {
    record: RwLock<JobRecord>,
    cancelled: AtomicBool,
    db: Database,
    source: Arc<dyn EntitySource>,
    sink: Arc<dyn SearchSink>,
}

impl SearchIndexWorkflow {
    pub fn new(
        db: Database,
        source: Arc<dyn EntitySource>,
        sink: Arc<dyn SearchSink>,
        record: JobRecord,
    ) -> Self {
        Self {
            record: RwLock::new(record),
            cancelled: AtomicBool::new(false),
            db,
            source,
            sink,
        }
    }

    /// Snapshot of the current job record.
    pub fn job_data(&self) -> JobRecord {
        match self.record.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn status(&self) -> JobStatus {
        match self.record.read() {
            Ok(guard) => guard.status,
            Err(poisoned) => poisoned.into_inner().status,
        }
    }

    /// Request cooperative cancellation; observed between batches.
    pub fn stop(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn with_record<R>(&self, f: impl FnOnce(&mut JobRecord) -> R) -> R {
        let mut guard = match self.record.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    /// First batch flips Started to Running.
    fn mark_running(&self) {
        self.with_record(|record| {
            if record.status == JobStatus::Started {
                record.status = JobStatus::Running;
                record.touch();
            }
        });
    }

    /// Rewrite this job's snapshot in the extension log. Persistence
    /// failures are logged, never propagated into the job.
    async fn checkpoint(&self) {
        let record = self.job_data();
        let json = match serde_json::to_string(&record) {
            Ok(json) => json,
            Err(e) => {
                warn!(job_id = %record.id, error = %e, "Failed to serialize job snapshot");
                return;
            }
        };
        match self
            .db
            .update_extension_record(&record.id.to_string(), REINDEX_JOB_EXTENSION, &json)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(job_id = %record.id, "No extension-log row to checkpoint into")
            }
            Err(e) => warn!(job_id = %record.id, error = %e, "Failed to checkpoint job snapshot"),
        }
    }

    /// Execute the job to a terminal status.
    pub async fn run(&self) {
        let snapshot = self.job_data();
        let entities: Vec<String> = snapshot.entities.iter().cloned().collect();
        // Admission rejects a zero batch size before a workflow is built.
        let batch_size = snapshot.batch_size;
        // A resume cursor is only meaningful for a single-entity job.
        let track_cursor = entities.len() == 1;
        let mut resume = snapshot.after_cursor.clone();
        let mut failed_entities = 0usize;

        for entity_type in &entities {
            if self.is_cancelled() {
                break;
            }
            let ok = self
                .index_entity(
                    entity_type,
                    batch_size,
                    resume.take(),
                    snapshot.recreate_index,
                    snapshot.search_index_mapping_language,
                    track_cursor,
                )
                .await;
            if !ok {
                failed_entities += 1;
            }
            self.checkpoint().await;
        }

        let status = if self.is_cancelled() {
            JobStatus::Stopped
        } else if !entities.is_empty() && failed_entities == entities.len() {
            JobStatus::Failed
        } else if failed_entities > 0 {
            JobStatus::ActiveError
        } else {
            JobStatus::Completed
        };
        let (id, stats) = self.with_record(|record| {
            record.status = status;
            record.touch();
            (record.id, record.stats)
        });
        self.checkpoint().await;
        info!(
            job_id = %id,
            ?status,
            success = stats.success,
            failed = stats.failed,
            "Reindexing job finished"
        );
    }

    /// Stream one entity type into the index. Returns false when the
    /// entity failed outright; cancellation is not a failure.
    async fn index_entity(
        &self,
        entity_type: &str,
        batch_size: u32,
        resume: Option<String>,
        recreate_index: bool,
        language: MappingLanguage,
        track_cursor: bool,
    ) -> bool {
        let total = match self.source.count(entity_type).await {
            Ok(total) => total,
            Err(e) => {
                warn!(entity_type, error = %e, "Entity count failed");
                self.with_record(|record| {
                    record.failure.source = Some(format!("{entity_type}: {e}"));
                    record.touch();
                });
                return false;
            }
        };
        self.with_record(|record| {
            record.stats.total += total;
            record.stats.pending += total;
            record.touch();
        });

        if recreate_index {
            if let Err(e) = self.sink.recreate_index(entity_type, language).await {
                warn!(entity_type, error = %e, "Index recreation failed");
                self.with_record(|record| {
                    record.failure.sink = Some(format!("{entity_type}: {e}"));
                    record.touch();
                });
                return false;
            }
        }

        let mut cursor = resume;
        loop {
            if self.is_cancelled() {
                return true;
            }
            let page = match self
                .source
                .fetch_page(entity_type, cursor.as_deref(), batch_size)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    warn!(entity_type, error = %e, "Entity scan failed");
                    self.with_record(|record| {
                        record.failure.source = Some(format!("{entity_type}: {e}"));
                        record.touch();
                    });
                    return false;
                }
            };
            if page.documents.is_empty() {
                match page.after {
                    Some(next) => {
                        cursor = Some(next);
                        continue;
                    }
                    None => return true,
                }
            }

            self.mark_running();
            let count = page.documents.len() as u64;
            match self.sink.write_batch(entity_type, &page.documents).await {
                Ok(rejected) => {
                    let rejected = rejected.min(count);
                    self.with_record(|record| {
                        record.stats.success += count - rejected;
                        record.stats.failed += rejected;
                        record.stats.pending = record.stats.pending.saturating_sub(count);
                        if rejected > 0 {
                            record.failure.indexer = Some(format!(
                                "{rejected} documents rejected while indexing {entity_type}"
                            ));
                        }
                        if track_cursor {
                            record.after_cursor = page.after.clone();
                        }
                        record.touch();
                    });
                }
                Err(e) => {
                    warn!(entity_type, error = %e, "Batch write failed");
                    self.with_record(|record| {
                        record.failure.sink = Some(format!("{entity_type}: {e}"));
                        record.stats.failed += count;
                        record.stats.pending = record.stats.pending.saturating_sub(count);
                        record.touch();
                    });
                    return false;
                }
            }

            match page.after {
                Some(next) => cursor = Some(next),
                None => return true,
            }
        }
    }
}
