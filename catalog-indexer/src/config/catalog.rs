//! The indexer catalog: every indexer the process can serve.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::IndexingError;
use catalog_indexer_registry::{KeyedRegistry, RegistryError};
use catalog_indexer_shared::IndexerMetadata;

/// Indexer definitions as read from the catalog file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexerCatalog {
    pub indexers: Vec<IndexerMetadata>,
}

impl IndexerCatalog {
    /// Read a catalog from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IndexingError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            IndexingError::config(format!("Failed to read indexer catalog {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    /// Parse a catalog and reject duplicate or blank indexer ids.
    pub fn from_json(raw: &str) -> Result<Self, IndexingError> {
        let catalog: Self = serde_json::from_str(raw)
            .map_err(|e| IndexingError::config(format!("Invalid indexer catalog: {}", e)))?;

        let mut seen = HashSet::new();
        for metadata in &catalog.indexers {
            if metadata.indexer_id.trim().is_empty() {
                return Err(IndexingError::config("Indexer catalog has an empty indexer_id"));
            }
            if !seen.insert(metadata.indexer_id.as_str()) {
                return Err(IndexingError::config(format!(
                    "Indexer {} is defined twice",
                    metadata.indexer_id
                )));
            }
        }

        Ok(catalog)
    }

    /// Registry that lazily loads indexer metadata from this catalog.
    ///
    /// Unknown indexer ids fail with [`RegistryError::Load`].
    pub fn into_registry(self) -> KeyedRegistry<IndexerMetadata> {
        let by_id: Arc<HashMap<String, IndexerMetadata>> = Arc::new(
            self.indexers
                .into_iter()
                .map(|metadata| (metadata.indexer_id.clone(), metadata))
                .collect(),
        );

        KeyedRegistry::new(move |key: &str| {
            by_id
                .get(key)
                .cloned()
                .ok_or_else(|| RegistryError::load(key, "indexer is not in the catalog"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "indexers": [
            { "indexer_id": "catalog_product", "entity_type": "product", "index_alias": "products" },
            { "indexer_id": "sales_order", "entity_type": "order", "index_alias": "orders", "batch_size": 250 }
        ]
    }"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = IndexerCatalog::from_json(CATALOG).unwrap();

        assert_eq!(catalog.indexers.len(), 2);
        assert_eq!(catalog.indexers[0].batch_size, None);
        assert_eq!(catalog.indexers[1].batch_size, Some(250));
        assert_eq!(catalog.indexers[1].entity_type.as_str(), "order");
    }

    #[test]
    fn test_duplicate_indexer_rejected() {
        let raw = r#"{ "indexers": [
            { "indexer_id": "a", "entity_type": "product", "index_alias": "p" },
            { "indexer_id": "a", "entity_type": "order", "index_alias": "o" }
        ] }"#;

        assert!(matches!(
            IndexerCatalog::from_json(raw),
            Err(IndexingError::ConfigError(msg)) if msg.contains("twice")
        ));
    }

    #[test]
    fn test_malformed_catalog() {
        assert!(matches!(
            IndexerCatalog::from_json(r#"{ "indexers": [ { "indexer_id": "a" } ] }"#),
            Err(IndexingError::ConfigError(_))
        ));
    }

    #[test]
    fn test_registry_loads_from_catalog() {
        let mut registry = IndexerCatalog::from_json(CATALOG).unwrap().into_registry();

        assert_eq!(registry.get("sales_order").unwrap().index_alias, "orders");
        assert!(matches!(
            registry.get("cms_page"),
            Err(RegistryError::Load { .. })
        ));
        assert_eq!(registry.len(), 1);
    }
}
