//! Entity extension log: timestamped JSON snapshots keyed by
//! `(entity_id, extension)`.
//!
//! Jobs insert one row at submission and rewrite it at checkpoint
//! boundaries; retention keeps the newest N rows per extension. Every
//! operation is its own transaction.

use crate::{Database, DbResult};
use sqlx::FromRow;

/// One row of the extension log.
#[derive(Debug, Clone, FromRow)]
pub struct ExtensionRecord {
    pub entity_id: String,
    pub extension: String,
    pub json_schema: String,
    pub json: String,
    pub timestamp: i64,
}

fn epoch_ms_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl Database {
    /// Append a snapshot row for `(entity_id, extension)`.
    pub async fn insert_extension_record(
        &self,
        entity_id: &str,
        extension: &str,
        json_schema: &str,
        json: &str,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO entity_extension_log (entity_id, extension, json_schema, json, timestamp)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(entity_id)
        .bind(extension)
        .bind(json_schema)
        .bind(json)
        .bind(epoch_ms_now())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Rewrite the newest snapshot for `(entity_id, extension)` in place.
    ///
    /// Used by running jobs at checkpoint boundaries so one job occupies one
    /// row. Returns false if no row existed.
    pub async fn update_extension_record(
        &self,
        entity_id: &str,
        extension: &str,
        json: &str,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE entity_extension_log SET json = ?, timestamp = ?
             WHERE rowid = (
                 SELECT rowid FROM entity_extension_log
                 WHERE entity_id = ? AND extension = ?
                 ORDER BY timestamp DESC, rowid DESC LIMIT 1
             )",
        )
        .bind(json)
        .bind(epoch_ms_now())
        .bind(entity_id)
        .bind(extension)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Newest snapshot for a specific entity id under an extension.
    pub async fn latest_extension_record(
        &self,
        entity_id: &str,
        extension: &str,
    ) -> DbResult<Option<ExtensionRecord>> {
        let record = sqlx::query_as(
            "SELECT entity_id, extension, json_schema, json, timestamp
             FROM entity_extension_log
             WHERE entity_id = ? AND extension = ?
             ORDER BY timestamp DESC, rowid DESC LIMIT 1",
        )
        .bind(entity_id)
        .bind(extension)
        .fetch_optional(self.pool())
        .await?;
        Ok(record)
    }

    /// Newest snapshot under an extension, across all entity ids.
    pub async fn latest_extension_record_by_extension(
        &self,
        extension: &str,
    ) -> DbResult<Option<ExtensionRecord>> {
        let record = sqlx::query_as(
            "SELECT entity_id, extension, json_schema, json, timestamp
             FROM entity_extension_log
             WHERE extension = ?
             ORDER BY timestamp DESC, rowid DESC LIMIT 1",
        )
        .bind(extension)
        .fetch_optional(self.pool())
        .await?;
        Ok(record)
    }

    /// All snapshots under an extension, newest first.
    pub async fn all_extension_records(&self, extension: &str) -> DbResult<Vec<ExtensionRecord>> {
        let records = sqlx::query_as(
            "SELECT entity_id, extension, json_schema, json, timestamp
             FROM entity_extension_log
             WHERE extension = ?
             ORDER BY timestamp DESC, rowid DESC",
        )
        .bind(extension)
        .fetch_all(self.pool())
        .await?;
        Ok(records)
    }

    /// Prune the oldest rows of an extension, keeping the newest `keep`.
    /// Returns the number of rows deleted.
    pub async fn delete_last_records(&self, extension: &str, keep: u32) -> DbResult<u64> {
        let result = sqlx::query(
            "DELETE FROM entity_extension_log
             WHERE extension = ?1 AND rowid NOT IN (
                 SELECT rowid FROM entity_extension_log
                 WHERE extension = ?1
                 ORDER BY timestamp DESC, rowid DESC LIMIT ?2
             )",
        )
        .bind(extension)
        .bind(keep as i64)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected())
    }
}
