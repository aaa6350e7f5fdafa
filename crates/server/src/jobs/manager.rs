// crates/server/src/jobs/manager.rs
//! Process-wide facade for reindexing jobs.
//!
//! The manager is the only entry point: it validates submissions, admits
//! them against the worker pool's bounds, subtracts entity types already
//! being indexed, persists the job to the extension log, and hands the
//! workflow to the pool. Status reads merge live registry entries with
//! persisted snapshots.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use reindexd_db::{Database, DbError};
use reindexd_types::{
    JobRecord, JobSpec, REINDEX_JOB_EXTENSION, REINDEX_JOB_RECORD_KIND,
};

use crate::catalog::EntityCatalog;

use super::pool::WorkerPool;
use super::registry::JobRegistry;
use super::sink::{EntitySource, SearchSink};
use super::workflow::SearchIndexWorkflow;

/// Admission and retention knobs. Queue depth and parallelism are separate
/// bounds even though they default to the same value.
#[derive(Debug, Clone, Copy)]
pub struct ReindexConfig {
    pub max_active: usize,
    pub max_queued: usize,
    pub log_retain: u32,
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self {
            max_active: 5,
            max_queued: 5,
            log_retain: 5,
        }
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Overloaded(String),

    #[error("Reindexing job not found: {0}")]
    NotFound(Uuid),

    #[error("No reindexing job has run yet")]
    NoJobs,

    #[error("Metadata store error: {0}")]
    Store(#[from] DbError),

    #[error("Corrupt job snapshot: {0}")]
    CorruptSnapshot(#[from] serde_json::Error),
}

pub struct ReindexManager {
    db: Database,
    source: Arc<dyn EntitySource>,
    sink: Arc<dyn SearchSink>,
    catalog: EntityCatalog,
    config: ReindexConfig,
    pool: WorkerPool,
    /// Serializes submissions so the overlap check stays consistent with
    /// the subsequent registry insert. Queries take the same lock briefly.
    registry: Mutex<JobRegistry>,
}

impl ReindexManager {
    pub fn new(
        db: Database,
        source: Arc<dyn EntitySource>,
        sink: Arc<dyn SearchSink>,
        catalog: EntityCatalog,
        config: ReindexConfig,
    ) -> Arc<Self> {
        let pool = WorkerPool::new(config.max_active, config.max_queued);
        Arc::new(Self {
            db,
            source,
            sink,
            catalog,
            config,
            pool,
            registry: Mutex::new(JobRegistry::new()),
        })
    }

    /// Submit a reindexing job. Validation happens before any state
    /// change; overload checks consume no capacity.
    pub async fn submit(&self, started_by: &str, spec: &JobSpec) -> Result<JobRecord, JobError> {
        self.validate(spec)?;

        let mut registry = self.registry.lock().await;
        registry.sweep_terminal();

        if self.pool.queued() >= self.config.max_queued {
            return Err(JobError::Overloaded(
                "Cannot create new Reindexing Jobs. There are pending jobs.".to_string(),
            ));
        }
        if self.pool.active() > self.config.max_active {
            return Err(JobError::Overloaded(
                "Thread unavailable to run the jobs.".to_string(),
            ));
        }

        let mut record = JobRecord::from_spec(started_by, spec);

        // Subtract entity types already claimed by a live job; the job
        // runs on whatever remains.
        let mut residual = record.entities.clone();
        for workflow in registry.values() {
            let running = workflow.job_data();
            if !running.status.is_terminal() {
                for entity_type in &running.entities {
                    residual.remove(entity_type);
                }
            }
        }
        if residual.is_empty() {
            return Err(JobError::Conflict(
                "There are already executing Jobs working on the same Entities. Please try later."
                    .to_string(),
            ));
        }
        if record.after_cursor.is_some() && residual.len() > 1 {
            return Err(JobError::InvalidArgument(
                "After Cursor can only be associated with one entity".to_string(),
            ));
        }
        record.entities = residual;

        info!(
            job_id = %record.id,
            started_by,
            entities = ?record.entities,
            "Reindexing triggered"
        );

        let json = serde_json::to_string(&record)?;
        self.db
            .insert_extension_record(
                &record.id.to_string(),
                REINDEX_JOB_EXTENSION,
                REINDEX_JOB_RECORD_KIND,
                &json,
            )
            .await?;
        // Retention after the insert: the log ends up holding the newest
        // `log_retain` runs including this one.
        self.db
            .delete_last_records(REINDEX_JOB_EXTENSION, self.config.log_retain)
            .await?;

        let workflow = Arc::new(SearchIndexWorkflow::new(
            self.db.clone(),
            Arc::clone(&self.source),
            Arc::clone(&self.sink),
            record.clone(),
        ));
        registry.put(record.id, Arc::clone(&workflow));
        if self.pool.try_submit(workflow).is_err() {
            // The backlog check above makes this unreachable in practice,
            // but a rejected workflow must not linger in the registry.
            registry.remove(record.id);
            return Err(JobError::Overloaded(
                "Cannot create new Reindexing Jobs. There are pending jobs.".to_string(),
            ));
        }
        Ok(record)
    }

    fn validate(&self, spec: &JobSpec) -> Result<(), JobError> {
        if spec.entities.is_empty() {
            return Err(JobError::InvalidArgument(
                "Entities cannot be Empty".to_string(),
            ));
        }
        for entity_type in &spec.entities {
            if !self.catalog.is_known(entity_type) {
                return Err(JobError::InvalidArgument(format!(
                    "Entity Type : {entity_type} is not a valid Entity"
                )));
            }
        }
        if spec.batch_size == 0 {
            return Err(JobError::InvalidArgument(
                "Batch Size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Live record if the job is registered, else its latest persisted
    /// snapshot.
    pub async fn get(&self, id: Uuid) -> Result<JobRecord, JobError> {
        {
            let registry = self.registry.lock().await;
            if let Some(workflow) = registry.get(id) {
                return Ok(workflow.job_data());
            }
        }
        let row = self
            .db
            .latest_extension_record(&id.to_string(), REINDEX_JOB_EXTENSION)
            .await?
            .ok_or(JobError::NotFound(id))?;
        Ok(serde_json::from_str(&row.json)?)
    }

    /// Most recently submitted live job, or the newest persisted run.
    pub async fn latest(&self) -> Result<JobRecord, JobError> {
        {
            let registry = self.registry.lock().await;
            if let Some(workflow) = registry.values().last() {
                return Ok(workflow.job_data());
            }
        }
        let row = self
            .db
            .latest_extension_record_by_extension(REINDEX_JOB_EXTENSION)
            .await?
            .ok_or(JobError::NoJobs)?;
        Ok(serde_json::from_str(&row.json)?)
    }

    /// Live records in submission order, then persisted runs not shadowed
    /// by a live handle.
    pub async fn list(&self) -> Result<Vec<JobRecord>, JobError> {
        let live: Vec<JobRecord> = {
            let registry = self.registry.lock().await;
            registry
                .values()
                .iter()
                .map(|workflow| workflow.job_data())
                .collect()
        };

        let mut result = live;
        let rows = self.db.all_extension_records(REINDEX_JOB_EXTENSION).await?;
        for row in rows {
            let record: JobRecord = serde_json::from_str(&row.json)?;
            if !result.iter().any(|live| live.id == record.id) {
                result.push(record);
            }
        }
        Ok(result)
    }

    /// Set the cancellation flag on a live job and return its record.
    pub async fn stop(&self, id: Uuid) -> Result<JobRecord, JobError> {
        let registry = self.registry.lock().await;
        let workflow = registry.get(id).ok_or_else(|| {
            JobError::InvalidArgument("Job is not in Running state.".to_string())
        })?;
        workflow.stop();
        info!(job_id = %id, "Reindexing job stop requested");
        Ok(workflow.job_data())
    }

    /// Unregister a job; no error if it was never registered.
    pub async fn remove_completed(&self, id: Uuid) {
        let mut registry = self.registry.lock().await;
        registry.remove(id);
    }

    /// Number of registered live jobs (terminal handles included until
    /// the next submission sweeps them).
    pub async fn live_jobs(&self) -> usize {
        self.registry.lock().await.len()
    }
}
