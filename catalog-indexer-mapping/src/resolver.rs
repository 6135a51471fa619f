//! Concurrent document mapping.

use std::sync::Arc;

use catalog_indexer_shared::{Document, DocumentBatch, EntityType, StoreContext};
use futures::FutureExt;
use tracing::{debug, error, instrument};

use crate::datasource::EntityDataSourceRegistry;
use crate::errors::MappingError;
use crate::executor::{Task, TaskExecutor};
use crate::factory::ResolvedProvider;
use crate::merge;

/// Fans documents out to their entity type's providers and merges the
/// results.
///
/// Providers run concurrently on the executor; the merge then walks their
/// results in priority order, so the output never depends on which task
/// finished first.
pub struct DocumentMappingResolver {
    datasources: Arc<EntityDataSourceRegistry>,
    executor: Arc<dyn TaskExecutor>,
}

impl DocumentMappingResolver {
    /// Create a resolver.
    pub fn new(datasources: Arc<EntityDataSourceRegistry>, executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            datasources,
            executor,
        }
    }

    /// Map a batch of documents for `entity_type`.
    ///
    /// Providers are resolved and validated before any task is scheduled.
    /// Without providers the batch is returned as is. A failing provider
    /// fails the whole batch; no partially enriched document is returned.
    #[instrument(
        skip(self, documents, context),
        fields(entity_type = %entity_type, document_count = documents.len())
    )]
    pub async fn map(
        &self,
        documents: DocumentBatch,
        context: &StoreContext,
        entity_type: &EntityType,
    ) -> Result<DocumentBatch, MappingError> {
        if documents.is_empty() {
            return Ok(documents);
        }

        let providers = self.datasources.get_datasources_for_entity(entity_type)?;
        if providers.is_empty() {
            debug!("No providers registered, passing documents through");
            return Ok(documents);
        }

        let mut context = context.clone();
        context.entity_type = entity_type.clone();
        let context = Arc::new(context);

        let tasks = Self::build_tasks(&documents, &providers, &context);
        let mut partials = self
            .executor
            .run_all(tasks)
            .await
            .inspect_err(|e| error!(error = %e, "Provider fan-out failed"))?
            .into_iter();

        let mut mapped = DocumentBatch::new();
        for (document_id, mut document) in documents {
            for _ in &providers {
                let partial = partials.next().ok_or_else(|| {
                    MappingError::executor("executor returned fewer results than submitted tasks")
                })?;
                merge::deep_merge(&mut document, partial).map_err(|conflict| {
                    MappingError::TypeMismatch {
                        document_id,
                        conflict,
                    }
                })?;
            }

            for resolved in providers.iter().filter(|p| p.transforms) {
                document = resolved
                    .provider
                    .transform(document, &context)
                    .map_err(|e| {
                        MappingError::provider_execution(&resolved.reference, document_id, e.to_string())
                    })?;
            }

            mapped.insert(document_id, document);
        }

        debug!(provider_count = providers.len(), "Mapped document batch");
        Ok(mapped)
    }

    /// One task per (document, provider), documents outer, providers in
    /// merge order inner.
    fn build_tasks(
        documents: &DocumentBatch,
        providers: &[ResolvedProvider],
        context: &Arc<StoreContext>,
    ) -> Vec<Task<Document>> {
        let mut tasks = Vec::with_capacity(documents.len() * providers.len());

        for (&document_id, document) in documents {
            for resolved in providers {
                let provider = resolved.provider.clone();
                let reference = resolved.reference.clone();
                let document = document.clone();
                let context = context.clone();

                tasks.push(
                    async move {
                        provider.map(document, &context).await.map_err(|e| {
                            MappingError::provider_execution(reference, document_id, e.to_string())
                        })
                    }
                    .boxed(),
                );
            }
        }

        tasks
    }
}
