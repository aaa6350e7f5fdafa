//! Entity document read path: keyset-paginated scans per entity type.
//!
//! The workflow streams pages of JSON documents ordered by id; the id of
//! the last row in a page is the resumption cursor.

use crate::{Database, DbResult};

/// One page of an entity scan.
#[derive(Debug, Clone)]
pub struct EntityPage {
    /// Raw JSON documents, in id order.
    pub documents: Vec<String>,
    /// Cursor for the next page; `None` when the scan is exhausted.
    pub after: Option<String>,
}

impl Database {
    /// Insert or replace an entity document.
    pub async fn upsert_entity(
        &self,
        id: &str,
        entity_type: &str,
        json: &str,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO entities (id, entity_type, json, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 entity_type = excluded.entity_type,
                 json = excluded.json,
                 updated_at = excluded.updated_at",
        )
        .bind(id)
        .bind(entity_type)
        .bind(json)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Total documents of one entity type.
    pub async fn count_entities(&self, entity_type: &str) -> DbResult<u64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM entities WHERE entity_type = ?")
            .bind(entity_type)
            .fetch_one(self.pool())
            .await?;
        Ok(n as u64)
    }

    /// Fetch one page of documents after the given cursor (exclusive).
    pub async fn fetch_entity_page(
        &self,
        entity_type: &str,
        after: Option<&str>,
        limit: u32,
    ) -> DbResult<EntityPage> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT id, json FROM entities
             WHERE entity_type = ?1 AND (?2 IS NULL OR id > ?2)
             ORDER BY id
             LIMIT ?3",
        )
        .bind(entity_type)
        .bind(after)
        .bind(limit as i64)
        .fetch_all(self.pool())
        .await?;

        // A short page means the scan is done; a full page may have more.
        let after = if rows.len() == limit as usize {
            rows.last().map(|(id, _)| id.clone())
        } else {
            None
        };
        let documents = rows.into_iter().map(|(_, json)| json).collect();
        Ok(EntityPage { documents, after })
    }
}
