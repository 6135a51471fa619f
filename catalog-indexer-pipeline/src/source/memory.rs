use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::errors::PipelineError;
use crate::source::EntitySource;
use catalog_indexer_shared::{Document, DocumentBatch, DocumentId, EntityType};

/// Entity source holding its rows in memory.
///
/// Backs tests and snapshot-driven runs. Rows can be changed while the
/// indexer runs, which is how deletions are exercised.
#[derive(Debug, Default)]
pub struct InMemoryEntitySource {
    rows: RwLock<HashMap<EntityType, DocumentBatch>>,
}

impl InMemoryEntitySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source from a snapshot of rows per entity type.
    pub fn from_snapshot(snapshot: HashMap<EntityType, DocumentBatch>) -> Self {
        Self {
            rows: RwLock::new(snapshot),
        }
    }

    /// Insert or replace a row.
    pub fn upsert(&self, entity_type: impl Into<EntityType>, id: DocumentId, row: Document) {
        let mut rows = self.rows.write().unwrap_or_else(|e| e.into_inner());
        rows.entry(entity_type.into()).or_default().insert(id, row);
    }

    /// Remove a row.
    pub fn remove(&self, entity_type: &EntityType, id: DocumentId) -> Option<Document> {
        let mut rows = self.rows.write().unwrap_or_else(|e| e.into_inner());
        rows.get_mut(entity_type)?.remove(&id)
    }

    /// Number of rows held for `entity_type`.
    pub fn len(&self, entity_type: &EntityType) -> usize {
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        rows.get(entity_type).map_or(0, |batch| batch.len())
    }
}

#[async_trait]
impl EntitySource for InMemoryEntitySource {
    async fn fetch_page(
        &self,
        entity_type: &EntityType,
        after: Option<DocumentId>,
        limit: usize,
    ) -> Result<DocumentBatch, PipelineError> {
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        let Some(batch) = rows.get(entity_type) else {
            return Ok(DocumentBatch::new());
        };

        let page = match after {
            Some(after) => batch
                .range(after.saturating_add(1)..)
                .take(limit)
                .map(|(id, row)| (*id, row.clone()))
                .collect(),
            None => batch
                .iter()
                .take(limit)
                .map(|(id, row)| (*id, row.clone()))
                .collect(),
        };
        Ok(page)
    }

    async fn fetch(
        &self,
        entity_type: &EntityType,
        ids: &[DocumentId],
    ) -> Result<DocumentBatch, PipelineError> {
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        let Some(batch) = rows.get(entity_type) else {
            return Ok(DocumentBatch::new());
        };

        Ok(ids
            .iter()
            .filter_map(|id| batch.get(id).map(|row| (*id, row.clone())))
            .collect())
    }
}
