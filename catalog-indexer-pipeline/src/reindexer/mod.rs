//! Reindex operations.
//!
//! A [`Reindexer`] is composed with whatever drives indexing (the queue
//! orchestrator, an admin command) and runs one operation at a time: full
//! reindex, reindex of an id list, or of a single row.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Map;
use tokio::sync::Mutex;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::loader::SearchLoader;
use crate::source::EntitySource;
use catalog_indexer_mapping::{BatchDataMapper, ACTIVE_INDEXER_KEY};
use catalog_indexer_registry::KeyedRegistry;
use catalog_indexer_shared::{DocumentBatch, DocumentId, IndexerMetadata, StoreId};

/// Configuration for reindex operations.
#[derive(Debug, Clone)]
pub struct ReindexerConfig {
    /// Rows read from the source per page, unless the indexer overrides it.
    pub page_size: usize,
    /// Store the documents are built for.
    pub store_id: StoreId,
}

impl Default for ReindexerConfig {
    fn default() -> Self {
        Self {
            page_size: 500,
            store_id: 0,
        }
    }
}

/// What an operation reindexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReindexRequest {
    /// Every row of the indexer's entity type.
    All,
    /// The listed rows.
    List(Vec<DocumentId>),
    /// One row.
    Row(DocumentId),
}

/// Outcome of one reindex operation.
#[derive(Debug, Clone)]
pub struct ReindexReport {
    pub operation_id: Uuid,
    pub indexer_id: String,
    /// Documents written to the index.
    pub indexed: usize,
    /// Documents removed because their row no longer exists.
    pub deleted: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Runs reindex operations against one operation registry.
///
/// Each operation borrows the registry for its whole duration: it loads the
/// indexer's metadata, registers it as the active indexer, maps and writes
/// the rows, and resets the registry when it ends, failed or not.
/// Operations are serialised.
pub struct Reindexer {
    registry: Mutex<KeyedRegistry<IndexerMetadata>>,
    source: Arc<dyn EntitySource>,
    mapper: BatchDataMapper,
    loader: SearchLoader,
    config: ReindexerConfig,
}

impl Reindexer {
    /// Create a reindexer with the default configuration.
    ///
    /// `registry` must load [`IndexerMetadata`] by indexer id.
    pub fn new(
        registry: KeyedRegistry<IndexerMetadata>,
        source: Arc<dyn EntitySource>,
        mapper: BatchDataMapper,
        loader: SearchLoader,
    ) -> Self {
        Self::with_config(registry, source, mapper, loader, ReindexerConfig::default())
    }

    /// Create a reindexer with custom configuration.
    pub fn with_config(
        registry: KeyedRegistry<IndexerMetadata>,
        source: Arc<dyn EntitySource>,
        mapper: BatchDataMapper,
        loader: SearchLoader,
        config: ReindexerConfig,
    ) -> Self {
        Self {
            registry: Mutex::new(registry),
            source,
            mapper,
            loader,
            config,
        }
    }

    /// Reindex every row of the indexer's entity type.
    pub async fn reindex_all(&self, indexer_id: &str) -> Result<ReindexReport, PipelineError> {
        self.execute(indexer_id, ReindexRequest::All).await
    }

    /// Reindex the given rows; rows that no longer exist are removed from
    /// the index.
    pub async fn reindex_list(
        &self,
        indexer_id: &str,
        ids: &[DocumentId],
    ) -> Result<ReindexReport, PipelineError> {
        self.execute(indexer_id, ReindexRequest::List(ids.to_vec())).await
    }

    /// Reindex a single row, or remove it from the index if it is gone.
    pub async fn reindex_row(
        &self,
        indexer_id: &str,
        id: DocumentId,
    ) -> Result<ReindexReport, PipelineError> {
        self.execute(indexer_id, ReindexRequest::Row(id)).await
    }

    /// Run one reindex operation.
    pub async fn execute(
        &self,
        indexer_id: &str,
        request: ReindexRequest,
    ) -> Result<ReindexReport, PipelineError> {
        let operation_id = Uuid::new_v4();
        let span = info_span!("reindex", operation_id = %operation_id, indexer_id = %indexer_id);

        async {
            let started_at = Utc::now();
            info!(request = ?request, "Reindex started");

            let result = {
                let mut registry = self.registry.lock().await;
                let mut scope = registry.scope();
                self.run(&mut scope, indexer_id, &request).await
            };

            match result {
                Ok((indexed, deleted)) => {
                    let finished_at = Utc::now();
                    info!(
                        indexed = indexed,
                        deleted = deleted,
                        duration_ms = (finished_at - started_at).num_milliseconds(),
                        "Reindex finished"
                    );
                    Ok(ReindexReport {
                        operation_id,
                        indexer_id: indexer_id.to_string(),
                        indexed,
                        deleted,
                        started_at,
                        finished_at,
                    })
                }
                Err(e) => {
                    error!(
                        error = %e,
                        configuration = e.is_configuration(),
                        "Reindex failed"
                    );
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        registry: &mut KeyedRegistry<IndexerMetadata>,
        indexer_id: &str,
        request: &ReindexRequest,
    ) -> Result<(usize, usize), PipelineError> {
        let metadata = registry.get(indexer_id)?.clone();
        registry.register(ACTIVE_INDEXER_KEY, metadata.clone(), false)?;

        self.loader.ensure_index(&metadata.index_alias).await?;

        let registry = &*registry;
        match request {
            ReindexRequest::All => Ok((self.reindex_pages(registry, &metadata).await?, 0)),
            ReindexRequest::List(ids) => self.reindex_ids(registry, &metadata, ids).await,
            ReindexRequest::Row(id) => self.reindex_ids(registry, &metadata, &[*id]).await,
        }
    }

    fn page_size(&self, metadata: &IndexerMetadata) -> usize {
        metadata.batch_size.unwrap_or(self.config.page_size).max(1)
    }

    async fn reindex_pages(
        &self,
        registry: &KeyedRegistry<IndexerMetadata>,
        metadata: &IndexerMetadata,
    ) -> Result<usize, PipelineError> {
        let page_size = self.page_size(metadata);
        let mut after = None;
        let mut indexed = 0;

        loop {
            let page = self
                .source
                .fetch_page(&metadata.entity_type, after, page_size)
                .await?;
            let Some(&last) = page.keys().next_back() else {
                break;
            };

            let page_len = page.len();
            indexed += self.index_batch(registry, metadata, page).await?;
            debug!(after = ?after, page_len = page_len, indexed = indexed, "Indexed page");

            if page_len < page_size {
                break;
            }
            after = Some(last);
        }

        Ok(indexed)
    }

    async fn reindex_ids(
        &self,
        registry: &KeyedRegistry<IndexerMetadata>,
        metadata: &IndexerMetadata,
        ids: &[DocumentId],
    ) -> Result<(usize, usize), PipelineError> {
        let ids: Vec<DocumentId> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let mut indexed = 0;
        let mut deleted = 0;

        for chunk in ids.chunks(self.page_size(metadata)) {
            let rows = self.source.fetch(&metadata.entity_type, chunk).await?;

            let missing: Vec<DocumentId> = chunk
                .iter()
                .copied()
                .filter(|id| !rows.contains_key(id))
                .collect();
            if !missing.is_empty() {
                warn!(count = missing.len(), "Rows no longer exist, removing from index");
                deleted += self.loader.delete(&metadata.index_alias, &missing).await?;
            }

            indexed += self.index_batch(registry, metadata, rows).await?;
        }

        Ok((indexed, deleted))
    }

    async fn index_batch(
        &self,
        registry: &KeyedRegistry<IndexerMetadata>,
        metadata: &IndexerMetadata,
        rows: DocumentBatch,
    ) -> Result<usize, PipelineError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let documents = self
            .mapper
            .map(registry, rows, self.config.store_id, Map::new())
            .await?;
        self.loader.load(&metadata.index_alias, documents).await
    }
}
