// crates/server/src/jobs/registry.rs
//! Insertion-ordered map of live job handles.
//!
//! Ordering matters: `latest()` is defined as the most recently submitted
//! live job, so entries keep submission order. The registry itself is not
//! synchronized; the manager guards it with its submission mutex.

use std::sync::Arc;

use uuid::Uuid;

use super::workflow::SearchIndexWorkflow;

#[derive(Default)]
pub struct JobRegistry {
    entries: Vec<(Uuid, Arc<SearchIndexWorkflow>)>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a handle, replacing any existing entry with the same id
    /// (keeps the original position, like a LinkedHashMap).
    pub fn put(&mut self, id: Uuid, workflow: Arc<SearchIndexWorkflow>) {
        if let Some(slot) = self.entries.iter_mut().find(|(key, _)| *key == id) {
            slot.1 = workflow;
        } else {
            self.entries.push((id, workflow));
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<SearchIndexWorkflow>> {
        self.entries
            .iter()
            .find(|(key, _)| *key == id)
            .map(|(_, workflow)| Arc::clone(workflow))
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Arc<SearchIndexWorkflow>> {
        let index = self.entries.iter().position(|(key, _)| *key == id)?;
        Some(self.entries.remove(index).1)
    }

    /// Snapshot of all handles in submission order.
    pub fn values(&self) -> Vec<Arc<SearchIndexWorkflow>> {
        self.entries
            .iter()
            .map(|(_, workflow)| Arc::clone(workflow))
            .collect()
    }

    /// Drop every handle whose job has reached a terminal status.
    /// Returns how many entries were removed.
    pub fn sweep_terminal(&mut self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|(_, workflow)| !workflow.status().is_terminal());
        before - self.entries.len()
    }
}
