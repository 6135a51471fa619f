//! Search index provider trait definition.

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use catalog_indexer_shared::{DocumentBatch, DocumentId};

/// Abstracts the search index the mapped documents are written to.
///
/// Every operation names the index alias it targets, since one sink serves
/// all configured indexers. Implementations must be `Send + Sync` so the
/// pipeline can share them across tasks.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Make sure an index exists behind `alias`, creating it when missing.
    async fn ensure_index(&self, alias: &str) -> Result<(), SearchIndexError>;

    /// Index (create or replace) every document of `batch` under its id.
    ///
    /// Fails with [`SearchIndexError::BulkOperationError`] if any document
    /// was rejected.
    async fn bulk_index(&self, alias: &str, batch: &DocumentBatch) -> Result<(), SearchIndexError>;

    /// Delete the given documents. Ids that are not indexed are ignored.
    async fn delete_documents(&self, alias: &str, ids: &[DocumentId]) -> Result<(), SearchIndexError>;

    /// Whether the search engine is reachable and serving.
    async fn health_check(&self) -> Result<bool, SearchIndexError>;
}
