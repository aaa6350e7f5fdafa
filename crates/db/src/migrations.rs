/// Inline SQL migrations for the reindexd metadata store.
///
/// Simple inline migrations rather than sqlx migration files: the schema
/// is small and self-contained.

pub const MIGRATIONS: &[&str] = &[
    // Migration 1: entity extension log (append-only, keyed by entity_id + extension)
    r#"
CREATE TABLE IF NOT EXISTS entity_extension_log (
    entity_id   TEXT NOT NULL,
    extension   TEXT NOT NULL,
    json_schema TEXT NOT NULL,
    json        TEXT NOT NULL,
    timestamp   INTEGER NOT NULL
);
"#,
    // Migration 2: extension log indexes
    r#"
CREATE INDEX IF NOT EXISTS idx_ext_log_entity ON entity_extension_log(entity_id, extension, timestamp DESC);
"#,
    r#"
CREATE INDEX IF NOT EXISTS idx_ext_log_extension ON entity_extension_log(extension, timestamp DESC);
"#,
    // Migration 3: entity documents (the workflow's read path)
    r#"
CREATE TABLE IF NOT EXISTS entities (
    id          TEXT PRIMARY KEY,
    entity_type TEXT NOT NULL,
    json        TEXT NOT NULL,
    updated_at  INTEGER NOT NULL
);
"#,
    r#"
CREATE INDEX IF NOT EXISTS idx_entities_type ON entities(entity_type, id);
"#,
];
