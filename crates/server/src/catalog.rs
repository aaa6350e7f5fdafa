// crates/server/src/catalog.rs
//! Registry of entity types that can be reindexed.
//!
//! Injected into the manager so validation does not depend on the wider
//! platform: a type is indexable if it is a registered entity type or one
//! of the data-insight report indexes.

use std::collections::HashSet;

/// Entity types every deployment knows about.
pub const DEFAULT_ENTITY_TYPES: &[&str] = &[
    "table",
    "topic",
    "dashboard",
    "pipeline",
    "mlmodel",
    "container",
    "query",
    "database",
    "databaseSchema",
    "glossary",
    "glossaryTerm",
    "tag",
    "user",
    "team",
    "testCase",
    "testSuite",
];

/// Data-insight report indexes, addressable like entity types.
pub const DATA_INSIGHT_INDEXES: &[&str] = &[
    "entity_report_data_index",
    "web_analytic_entity_view_report_data_index",
    "web_analytic_user_activity_report_data_index",
];

/// Injected `is_known_entity` capability.
#[derive(Debug, Clone)]
pub struct EntityCatalog {
    known: HashSet<String>,
}

impl EntityCatalog {
    pub fn new(types: impl IntoIterator<Item = String>) -> Self {
        Self {
            known: types.into_iter().collect(),
        }
    }

    /// Catalog with the default platform entity types.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_ENTITY_TYPES.iter().map(|s| s.to_string()))
    }

    pub fn is_data_insight_index(entity_type: &str) -> bool {
        DATA_INSIGHT_INDEXES.contains(&entity_type)
    }

    pub fn is_known(&self, entity_type: &str) -> bool {
        self.known.contains(entity_type) || Self::is_data_insight_index(entity_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_knows_core_types() {
        let catalog = EntityCatalog::with_defaults();
        assert!(catalog.is_known("table"));
        assert!(catalog.is_known("topic"));
        assert!(!catalog.is_known("spreadsheet"));
    }

    #[test]
    fn test_data_insight_indexes_are_always_known() {
        let catalog = EntityCatalog::new(Vec::new());
        assert!(catalog.is_known("entity_report_data_index"));
        assert!(catalog.is_known("web_analytic_entity_view_report_data_index"));
        assert!(!catalog.is_known("table"));
    }

    #[test]
    fn test_custom_catalog() {
        let catalog = EntityCatalog::new(vec!["widget".to_string()]);
        assert!(catalog.is_known("widget"));
        assert!(!catalog.is_known("table"));
    }
}
