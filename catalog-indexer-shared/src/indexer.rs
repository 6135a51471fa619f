//! Indexer metadata.

use serde::{Deserialize, Serialize};

use crate::document::EntityType;

/// Static description of one indexer: which entity type it builds documents
/// for and which index alias it writes into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerMetadata {
    /// Identifier used in queue messages and reindex requests.
    pub indexer_id: String,
    /// Entity type whose providers enrich this indexer's documents.
    pub entity_type: EntityType,
    /// Alias of the search index the documents are written to.
    pub index_alias: String,
    /// Page size override for full reindex runs.
    #[serde(default)]
    pub batch_size: Option<usize>,
}

impl IndexerMetadata {
    /// Create metadata for an indexer.
    pub fn new(
        indexer_id: impl Into<String>,
        entity_type: impl Into<EntityType>,
        index_alias: impl Into<String>,
    ) -> Self {
        Self {
            indexer_id: indexer_id.into(),
            entity_type: entity_type.into(),
            index_alias: index_alias.into(),
            batch_size: None,
        }
    }

    /// Set the page size override.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}
