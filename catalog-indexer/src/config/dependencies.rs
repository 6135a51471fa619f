//! Dependency initialization and wiring for the catalog indexer.

use std::sync::Arc;
use tracing::info;

use super::{IndexerCatalog, IndexerSettings};
use crate::IndexingError;
use catalog_indexer_mapping::{
    BatchDataMapper, DocumentMappingResolver, EntityDataSourceRegistry, TokioExecutor,
};
use catalog_indexer_pipeline::{
    EntitySource, LoaderConfig, Orchestrator, Reindexer, ReindexerConfig, SearchLoader,
};
use catalog_indexer_repository::{OpenSearchClient, SearchIndexProvider};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Reindexer for direct operations.
    pub reindexer: Arc<Reindexer>,
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Connect to OpenSearch and wire the pipeline.
    ///
    /// `datasources` holds the providers registered per entity type and
    /// `source` serves the raw rows.
    pub async fn new(
        settings: &IndexerSettings,
        catalog: IndexerCatalog,
        datasources: EntityDataSourceRegistry,
        source: Arc<dyn EntitySource>,
    ) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            indexer_count = catalog.indexers.len(),
            "Initializing dependencies"
        );

        let search_client = OpenSearchClient::new(&settings.opensearch_url)
            .map_err(|e| IndexingError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        Self::with_search_index(settings, catalog, datasources, source, Arc::new(search_client)).await
    }

    /// Wire the pipeline around an already constructed search index.
    pub async fn with_search_index(
        settings: &IndexerSettings,
        catalog: IndexerCatalog,
        datasources: EntityDataSourceRegistry,
        source: Arc<dyn EntitySource>,
        search_index: Arc<dyn SearchIndexProvider>,
    ) -> Result<Self, IndexingError> {
        let healthy = search_index
            .health_check()
            .await
            .map_err(|e| IndexingError::config(format!("Search index health check failed: {}", e)))?;

        if !healthy {
            return Err(IndexingError::config("Search index cluster is unhealthy"));
        }

        info!("Search index connection verified");

        let executor = TokioExecutor::with_max_concurrency(settings.mapping_concurrency);
        let resolver = DocumentMappingResolver::new(Arc::new(datasources), Arc::new(executor));
        let mapper = BatchDataMapper::new(Arc::new(resolver));

        let loader = SearchLoader::with_config(
            search_index,
            LoaderConfig {
                batch_size: settings.loader_batch_size,
            },
        );

        let reindexer = Arc::new(Reindexer::with_config(
            catalog.into_registry(),
            source,
            mapper,
            loader,
            ReindexerConfig {
                page_size: settings.reindex_page_size,
                store_id: settings.store_id,
            },
        ));

        let orchestrator = Orchestrator::new(reindexer.clone());

        Ok(Self {
            reindexer,
            orchestrator,
        })
    }
}
