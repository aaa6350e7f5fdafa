// crates/server/src/jobs/sink.rs
//! Seams between the workflow and the outside world.
//!
//! `EntitySource` streams entity documents out of the metadata store;
//! `SearchSink` writes them into the destination index. Both are object
//! traits so tests and deployments can swap implementations.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use reindexd_db::Database;
use reindexd_types::MappingLanguage;

/// One page of an entity scan, with the cursor to resume after it.
#[derive(Debug, Clone)]
pub struct SourcePage {
    pub documents: Vec<String>,
    pub after: Option<String>,
}

/// Streaming read access to entity documents.
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Total documents of this entity type.
    async fn count(&self, entity_type: &str) -> Result<u64>;

    /// Fetch up to `limit` documents after the cursor (exclusive).
    async fn fetch_page(
        &self,
        entity_type: &str,
        after: Option<&str>,
        limit: u32,
    ) -> Result<SourcePage>;
}

/// Write access to the destination search index.
#[async_trait]
pub trait SearchSink: Send + Sync {
    /// Drop and recreate the index for an entity type.
    async fn recreate_index(&self, entity_type: &str, language: MappingLanguage) -> Result<()>;

    /// Write one batch of documents. Returns how many were rejected.
    async fn write_batch(&self, entity_type: &str, documents: &[String]) -> Result<u64>;
}

/// Entity source backed by the metadata store's `entities` table.
#[derive(Debug, Clone)]
pub struct DbEntitySource {
    db: Database,
}

impl DbEntitySource {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EntitySource for DbEntitySource {
    async fn count(&self, entity_type: &str) -> Result<u64> {
        Ok(self.db.count_entities(entity_type).await?)
    }

    async fn fetch_page(
        &self,
        entity_type: &str,
        after: Option<&str>,
        limit: u32,
    ) -> Result<SourcePage> {
        let page = self.db.fetch_entity_page(entity_type, after, limit).await?;
        Ok(SourcePage {
            documents: page.documents,
            after: page.after,
        })
    }
}

/// A sink that accepts everything and writes nowhere.
///
/// Used when no search backend is configured; jobs still run their full
/// lifecycle against the metadata store.
pub struct NullSearchSink;

#[async_trait]
impl SearchSink for NullSearchSink {
    async fn recreate_index(&self, entity_type: &str, language: MappingLanguage) -> Result<()> {
        info!(entity_type, ?language, "Null sink: recreate index (no-op)");
        Ok(())
    }

    async fn write_batch(&self, entity_type: &str, documents: &[String]) -> Result<u64> {
        debug!(entity_type, count = documents.len(), "Null sink: discarding batch");
        Ok(0)
    }
}
