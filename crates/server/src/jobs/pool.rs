// crates/server/src/jobs/pool.rs
//! Bounded worker pool for reindexing workflows.
//!
//! Backlog is a bounded mpsc channel; parallelism is a semaphore of
//! `max_active` permits. A dispatcher task moves workflows from the
//! backlog onto worker tasks. Rejection on a full backlog is
//! caller-checked: the manager consults `queued()`/`active()` before
//! submitting, `try_submit` is the last line of defense.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error};

use super::workflow::SearchIndexWorkflow;

#[derive(Debug, Error)]
#[error("Worker pool backlog is full")]
pub struct PoolFull;

pub struct WorkerPool {
    tx: mpsc::Sender<Arc<SearchIndexWorkflow>>,
    queued: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Start a pool with `max_active` parallel workers and a backlog of
    /// `max_queued` workflows. Must be called from within a tokio runtime.
    pub fn new(max_active: usize, max_queued: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Arc<SearchIndexWorkflow>>(max_queued.max(1));
        let queued = Arc::new(AtomicUsize::new(0));
        let active = Arc::new(AtomicUsize::new(0));
        let semaphore = Arc::new(Semaphore::new(max_active.max(1)));

        let dispatcher_queued = Arc::clone(&queued);
        let dispatcher_active = Arc::clone(&active);
        tokio::spawn(async move {
            while let Some(workflow) = rx.recv().await {
                let permit = match Arc::clone(&semaphore).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        // Only possible if the semaphore is closed, which we never do.
                        error!("Worker pool semaphore closed: {e}");
                        return;
                    }
                };
                dispatcher_queued.fetch_sub(1, Ordering::SeqCst);
                dispatcher_active.fetch_add(1, Ordering::SeqCst);

                let active = Arc::clone(&dispatcher_active);
                tokio::spawn(async move {
                    let id = workflow.job_data().id;
                    debug!(job_id = %id, "Worker picked up reindexing job");
                    workflow.run().await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    drop(permit);
                    debug!(job_id = %id, "Worker finished reindexing job");
                });
            }
        });

        Self { tx, queued, active }
    }

    /// Workflows waiting for a worker (including one being dispatched).
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Workflows currently running.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Enqueue a workflow without blocking.
    pub fn try_submit(&self, workflow: Arc<SearchIndexWorkflow>) -> Result<(), PoolFull> {
        self.queued.fetch_add(1, Ordering::SeqCst);
        match self.tx.try_send(workflow) {
            Ok(()) => Ok(()),
            Err(_) => {
                self.queued.fetch_sub(1, Ordering::SeqCst);
                Err(PoolFull)
            }
        }
    }
}
