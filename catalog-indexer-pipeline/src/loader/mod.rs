//! Loader module for the catalog indexer pipeline.
//!
//! Writes mapped documents into the search index in bounded batches.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::errors::PipelineError;
use catalog_indexer_repository::SearchIndexProvider;
use catalog_indexer_shared::{DocumentBatch, DocumentId};

/// Configuration for the search loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of documents sent in one bulk request.
    pub batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}

/// Loader that writes documents into the search index.
///
/// Batches are split into bulk requests of `batch_size` documents. When a
/// bulk request fails, its documents are retried one by one so a single bad
/// document does not hide which others were written.
pub struct SearchLoader {
    client: Arc<dyn SearchIndexProvider>,
    config: LoaderConfig,
}

impl SearchLoader {
    /// Create a new search loader with the given client.
    pub fn new(client: Arc<dyn SearchIndexProvider>) -> Self {
        Self::with_config(client, LoaderConfig::default())
    }

    /// Create a new search loader with custom configuration.
    pub fn with_config(client: Arc<dyn SearchIndexProvider>, config: LoaderConfig) -> Self {
        let config = LoaderConfig {
            batch_size: config.batch_size.max(1),
        };
        Self { client, config }
    }

    /// Index every document of `documents` under `alias`.
    ///
    /// Returns the number of documents written.
    #[instrument(skip(self, documents), fields(document_count = documents.len()))]
    pub async fn load(&self, alias: &str, documents: DocumentBatch) -> Result<usize, PipelineError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let total = documents.len();
        let mut chunk = DocumentBatch::new();

        for (id, document) in documents {
            chunk.insert(id, document);
            if chunk.len() >= self.config.batch_size {
                self.flush(alias, std::mem::take(&mut chunk)).await?;
            }
        }
        self.flush(alias, chunk).await?;

        debug!(alias = %alias, count = total, "Loaded documents");
        Ok(total)
    }

    async fn flush(&self, alias: &str, chunk: DocumentBatch) -> Result<(), PipelineError> {
        if chunk.is_empty() {
            return Ok(());
        }

        let count = chunk.len();
        info!(count = count, alias = %alias, "Flushing documents to search index");

        let Err(e) = self.client.bulk_index(alias, &chunk).await else {
            return Ok(());
        };

        error!(error = %e, count = count, "Failed to index documents");
        if count == 1 {
            return Err(e.into());
        }

        warn!("Attempting individual document indexing");
        let mut error_count = 0;

        for (id, document) in chunk {
            let single: DocumentBatch = [(id, document)].into_iter().collect();
            if let Err(e) = self.client.bulk_index(alias, &single).await {
                error!(document_id = id, error = %e, "Failed to index individual document");
                error_count += 1;
            }
        }

        info!(
            success = count - error_count,
            errors = error_count,
            "Individual indexing completed"
        );

        if error_count > 0 {
            Err(PipelineError::loader(format!(
                "Failed to index {} of {} documents",
                error_count, count
            )))
        } else {
            Ok(())
        }
    }

    /// Remove the given documents from `alias`.
    #[instrument(skip(self, ids), fields(document_count = ids.len()))]
    pub async fn delete(&self, alias: &str, ids: &[DocumentId]) -> Result<usize, PipelineError> {
        for chunk in ids.chunks(self.config.batch_size) {
            self.client.delete_documents(alias, chunk).await?;
        }
        Ok(ids.len())
    }

    /// Ensure the index behind `alias` exists.
    pub async fn ensure_index(&self, alias: &str) -> Result<(), PipelineError> {
        self.client
            .ensure_index(alias)
            .await
            .map_err(|e| PipelineError::loader(e.to_string()))
    }

    /// Check if the search engine is healthy.
    pub async fn health_check(&self) -> Result<bool, PipelineError> {
        self.client
            .health_check()
            .await
            .map_err(|e| PipelineError::loader(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use catalog_indexer_repository::SearchIndexError;
    use catalog_indexer_shared::Document;
    use serde_json::json;
    use std::collections::{BTreeMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock search index recording what reaches it, per alias.
    #[derive(Default)]
    pub(crate) struct MockSearchIndex {
        pub indexed: Mutex<BTreeMap<String, DocumentBatch>>,
        pub deleted: Mutex<Vec<DocumentId>>,
        pub ensured: Mutex<Vec<String>>,
        pub bulk_calls: AtomicUsize,
        pub rejected: HashSet<DocumentId>,
    }

    impl MockSearchIndex {
        pub(crate) fn rejecting(ids: &[DocumentId]) -> Self {
            Self {
                rejected: ids.iter().copied().collect(),
                ..Self::default()
            }
        }

        pub(crate) fn documents(&self, alias: &str) -> DocumentBatch {
            self.indexed
                .lock()
                .unwrap()
                .get(alias)
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl SearchIndexProvider for MockSearchIndex {
        async fn ensure_index(&self, alias: &str) -> Result<(), SearchIndexError> {
            self.ensured.lock().unwrap().push(alias.to_string());
            Ok(())
        }

        async fn bulk_index(&self, alias: &str, batch: &DocumentBatch) -> Result<(), SearchIndexError> {
            self.bulk_calls.fetch_add(1, Ordering::SeqCst);
            if batch.keys().any(|id| self.rejected.contains(id)) {
                return Err(SearchIndexError::bulk_operation("Mock rejection"));
            }

            let mut indexed = self.indexed.lock().unwrap();
            let target = indexed.entry(alias.to_string()).or_default();
            for (id, document) in batch {
                target.insert(*id, document.clone());
            }
            Ok(())
        }

        async fn delete_documents(&self, alias: &str, ids: &[DocumentId]) -> Result<(), SearchIndexError> {
            self.deleted.lock().unwrap().extend_from_slice(ids);
            if let Some(target) = self.indexed.lock().unwrap().get_mut(alias) {
                for id in ids {
                    target.remove(id);
                }
            }
            Ok(())
        }

        async fn health_check(&self) -> Result<bool, SearchIndexError> {
            Ok(true)
        }
    }

    fn batch(ids: impl IntoIterator<Item = DocumentId>) -> DocumentBatch {
        ids.into_iter()
            .map(|id| {
                let mut document = Document::new();
                document.insert("id".to_string(), json!(id));
                (id, document)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_load_splits_into_bulk_requests() {
        let client = Arc::new(MockSearchIndex::default());
        let loader = SearchLoader::with_config(client.clone(), LoaderConfig { batch_size: 2 });

        let written = loader.load("orders", batch(1..=5)).await.unwrap();

        assert_eq!(written, 5);
        assert_eq!(client.bulk_calls.load(Ordering::SeqCst), 3);
        assert_eq!(client.documents("orders").len(), 5);
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let client = Arc::new(MockSearchIndex::default());
        let loader = SearchLoader::new(client.clone());

        assert_eq!(loader.load("orders", DocumentBatch::new()).await.unwrap(), 0);
        assert_eq!(client.bulk_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bulk_failure_falls_back_to_individual_writes() {
        let client = Arc::new(MockSearchIndex::rejecting(&[2]));
        let loader = SearchLoader::new(client.clone());

        let err = loader.load("orders", batch(1..=3)).await.unwrap_err();

        assert!(matches!(err, PipelineError::LoaderError(_)));
        let written: Vec<DocumentId> = client.documents("orders").keys().copied().collect();
        assert_eq!(written, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_delete_in_chunks() {
        let client = Arc::new(MockSearchIndex::default());
        let loader = SearchLoader::with_config(client.clone(), LoaderConfig { batch_size: 2 });
        loader.load("orders", batch(1..=3)).await.unwrap();

        let deleted = loader.delete("orders", &[1, 2, 3]).await.unwrap();

        assert_eq!(deleted, 3);
        assert_eq!(*client.deleted.lock().unwrap(), vec![1, 2, 3]);
        assert!(client.documents("orders").is_empty());
    }
}
