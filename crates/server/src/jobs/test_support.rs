// crates/server/src/jobs/test_support.rs
//! Fake sources and sinks shared by the job-system tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::watch;

use reindexd_db::Database;
use reindexd_types::{
    JobRecord, JobSpec, MappingLanguage, REINDEX_JOB_EXTENSION, REINDEX_JOB_RECORD_KIND,
};

use super::sink::{EntitySource, SearchSink, SourcePage};
use super::workflow::SearchIndexWorkflow;

pub fn make_spec(entities: &[&str], after_cursor: Option<String>) -> JobSpec {
    JobSpec {
        name: "test-reindex".to_string(),
        entities: entities.iter().map(|s| s.to_string()).collect(),
        batch_size: 2,
        recreate_index: false,
        search_index_mapping_language: MappingLanguage::En,
        after_cursor,
    }
}

pub fn make_record(entities: &[&str]) -> JobRecord {
    JobRecord::from_spec("tester", &make_spec(entities, None))
}

pub fn make_record_with(entities: &[&str], after_cursor: Option<String>) -> JobRecord {
    JobRecord::from_spec("tester", &make_spec(entities, after_cursor))
}

/// Workflow over explicit fakes, with its submission row pre-inserted so
/// checkpoints have a row to rewrite. Returns the database for assertions.
pub async fn workflow_with(
    source: Arc<dyn EntitySource>,
    sink: Arc<dyn SearchSink>,
    record: JobRecord,
) -> (Arc<SearchIndexWorkflow>, Database) {
    let db = Database::new_in_memory().await.unwrap();
    db.insert_extension_record(
        &record.id.to_string(),
        REINDEX_JOB_EXTENSION,
        REINDEX_JOB_RECORD_KIND,
        &serde_json::to_string(&record).unwrap(),
    )
    .await
    .unwrap();
    let workflow = Arc::new(SearchIndexWorkflow::new(db.clone(), source, sink, record));
    (workflow, db)
}

/// Workflow with an empty source and a null sink; enough for registry and
/// pool tests that only care about lifecycle.
pub async fn make_workflow(record: JobRecord) -> Arc<SearchIndexWorkflow> {
    let (workflow, _db) = workflow_with(
        Arc::new(StaticSource::new()),
        Arc::new(super::sink::NullSearchSink),
        record,
    )
    .await;
    workflow
}

/// In-memory source: N synthetic documents per entity type, cursor is the
/// numeric offset of the next document.
#[derive(Default)]
pub struct StaticSource {
    docs: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity_type: &str, count: usize) -> Self {
        let docs = (0..count)
            .map(|i| format!(r#"{{"entity":"{entity_type}","i":{i}}}"#))
            .collect();
        self.docs.insert(entity_type.to_string(), docs);
        self
    }

    /// Make scans of this entity type fail.
    pub fn failing(mut self, entity_type: &str) -> Self {
        self.failing.insert(entity_type.to_string());
        self
    }
}

#[async_trait]
impl EntitySource for StaticSource {
    async fn count(&self, entity_type: &str) -> Result<u64> {
        Ok(self.docs.get(entity_type).map_or(0, |d| d.len()) as u64)
    }

    async fn fetch_page(
        &self,
        entity_type: &str,
        after: Option<&str>,
        limit: u32,
    ) -> Result<SourcePage> {
        if self.failing.contains(entity_type) {
            return Err(anyhow!("simulated scan failure for {entity_type}"));
        }
        let docs = self.docs.get(entity_type).cloned().unwrap_or_default();
        let start: usize = after.map(|c| c.parse().unwrap_or(0)).unwrap_or(0);
        let end = (start + limit as usize).min(docs.len());
        let documents = docs[start.min(docs.len())..end].to_vec();
        let after = (end < docs.len()).then(|| end.to_string());
        Ok(SourcePage { documents, after })
    }
}

/// Source whose scans block until the gate opens; keeps jobs live for
/// overlap and capacity tests.
pub struct GatedSource {
    tx: watch::Sender<bool>,
}

impl GatedSource {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn open(&self) {
        let _ = self.tx.send(true);
    }

    pub fn source(&self) -> Arc<dyn EntitySource> {
        Arc::new(GateInner {
            rx: self.tx.subscribe(),
        })
    }

    pub async fn workflow(&self, record: JobRecord) -> Arc<SearchIndexWorkflow> {
        let (workflow, _db) = workflow_with(
            self.source(),
            Arc::new(super::sink::NullSearchSink),
            record,
        )
        .await;
        workflow
    }
}

struct GateInner {
    rx: watch::Receiver<bool>,
}

#[async_trait]
impl EntitySource for GateInner {
    async fn count(&self, _entity_type: &str) -> Result<u64> {
        Ok(0)
    }

    async fn fetch_page(
        &self,
        _entity_type: &str,
        _after: Option<&str>,
        _limit: u32,
    ) -> Result<SourcePage> {
        let mut rx = self.rx.clone();
        while !*rx.borrow() {
            rx.changed().await?;
        }
        Ok(SourcePage {
            documents: Vec::new(),
            after: None,
        })
    }
}

/// Sink that counts what it receives.
#[derive(Default)]
pub struct CountingSink {
    batches: AtomicU64,
    documents: AtomicU64,
    recreates: AtomicU64,
}

impl CountingSink {
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::SeqCst)
    }

    pub fn documents(&self) -> u64 {
        self.documents.load(Ordering::SeqCst)
    }

    pub fn recreates(&self) -> u64 {
        self.recreates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchSink for CountingSink {
    async fn recreate_index(&self, _entity_type: &str, _language: MappingLanguage) -> Result<()> {
        self.recreates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn write_batch(&self, _entity_type: &str, documents: &[String]) -> Result<u64> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.documents.fetch_add(documents.len() as u64, Ordering::SeqCst);
        Ok(0)
    }
}

/// Sink where every batch write errors out.
pub struct FailingSink;

#[async_trait]
impl SearchSink for FailingSink {
    async fn recreate_index(&self, _entity_type: &str, _language: MappingLanguage) -> Result<()> {
        Ok(())
    }

    async fn write_batch(&self, _entity_type: &str, _documents: &[String]) -> Result<u64> {
        Err(anyhow!("simulated bulk write failure"))
    }
}

/// Sink that rejects one document per batch.
pub struct RejectingSink;

#[async_trait]
impl SearchSink for RejectingSink {
    async fn recreate_index(&self, _entity_type: &str, _language: MappingLanguage) -> Result<()> {
        Ok(())
    }

    async fn write_batch(&self, _entity_type: &str, documents: &[String]) -> Result<u64> {
        Ok(1_u64.min(documents.len() as u64))
    }
}
