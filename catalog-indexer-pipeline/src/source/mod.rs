//! Access to the raw entity rows that get indexed.
//!
//! The row store itself lives outside the indexer; only the reads a reindex
//! needs are modelled here.

mod memory;

pub use memory::InMemoryEntitySource;

use async_trait::async_trait;

use crate::errors::PipelineError;
use catalog_indexer_shared::{DocumentBatch, DocumentId, EntityType};

/// Reads raw rows of an entity type, keyed by row id.
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Up to `limit` rows with an id greater than `after`, in ascending id
    /// order. An empty batch means the end was reached.
    async fn fetch_page(
        &self,
        entity_type: &EntityType,
        after: Option<DocumentId>,
        limit: usize,
    ) -> Result<DocumentBatch, PipelineError>;

    /// The rows among `ids` that exist. Missing ids are simply absent from
    /// the result.
    async fn fetch(
        &self,
        entity_type: &EntityType,
        ids: &[DocumentId],
    ) -> Result<DocumentBatch, PipelineError>;
}
