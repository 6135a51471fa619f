//! Batch mapping entry point.

use std::sync::Arc;

use catalog_indexer_registry::KeyedRegistry;
use catalog_indexer_shared::{
    DocumentBatch, IndexerMetadata, StoreContext, StoreId, ENTITY_TYPE_KEY, STORE_ID_KEY,
};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::errors::MappingError;
use crate::resolver::DocumentMappingResolver;

/// Registry key under which an operation registers the indexer it runs for.
pub const ACTIVE_INDEXER_KEY: &str = "active_indexer";

/// The indexer registered as active for the current operation.
pub fn active_indexer(
    registry: &KeyedRegistry<IndexerMetadata>,
) -> Result<&IndexerMetadata, MappingError> {
    registry.lookup(ACTIVE_INDEXER_KEY).ok_or_else(|| {
        MappingError::config(format!(
            "No indexer registered under '{}' for this operation",
            ACTIVE_INDEXER_KEY
        ))
    })
}

/// Build a [`StoreContext`] from a loose context map.
///
/// `entity_type` is required and must be a string. `store_id` defaults to
/// the default store (0). Every other key is kept as an attribute.
pub fn store_context_from_map(mut map: Map<String, Value>) -> Result<StoreContext, MappingError> {
    let entity_type = match map.remove(ENTITY_TYPE_KEY) {
        Some(Value::String(entity_type)) => entity_type,
        Some(other) => {
            return Err(MappingError::config(format!(
                "Context key '{}' must be a string, got {}",
                ENTITY_TYPE_KEY, other
            )))
        }
        None => {
            return Err(MappingError::config(format!(
                "Context is missing '{}'",
                ENTITY_TYPE_KEY
            )))
        }
    };

    let store_id = match map.remove(STORE_ID_KEY) {
        None | Some(Value::Null) => 0,
        Some(value) => value
            .as_u64()
            .and_then(|id| StoreId::try_from(id).ok())
            .ok_or_else(|| {
                MappingError::config(format!(
                    "Context key '{}' must be a store id, got {}",
                    STORE_ID_KEY, value
                ))
            })?,
    };

    let mut context = StoreContext::new(store_id, entity_type);
    context.attributes = map;
    Ok(context)
}

/// Maps raw entity rows into search documents for the active indexer.
#[derive(Clone)]
pub struct BatchDataMapper {
    resolver: Arc<DocumentMappingResolver>,
}

impl BatchDataMapper {
    /// Create a mapper on top of `resolver`.
    pub fn new(resolver: Arc<DocumentMappingResolver>) -> Self {
        Self { resolver }
    }

    /// Map `documents` for the indexer registered as active in `registry`.
    ///
    /// Fails with a configuration error when the operation never registered
    /// an active indexer.
    #[instrument(skip(self, registry, documents, attributes), fields(document_count = documents.len()))]
    pub async fn map(
        &self,
        registry: &KeyedRegistry<IndexerMetadata>,
        documents: DocumentBatch,
        store_id: StoreId,
        attributes: Map<String, Value>,
    ) -> Result<DocumentBatch, MappingError> {
        let indexer = active_indexer(registry)?;

        let mut context = StoreContext::new(store_id, indexer.entity_type.clone());
        context.attributes = attributes;

        self.resolver
            .map(documents, &context, &indexer.entity_type)
            .await
    }

    /// Map `documents` with a caller-built context map carrying the entity
    /// type, bypassing the operation registry.
    pub async fn map_with_context(
        &self,
        documents: DocumentBatch,
        context: Map<String, Value>,
    ) -> Result<DocumentBatch, MappingError> {
        let context = store_context_from_map(context)?;
        let entity_type = context.entity_type.clone();
        self.resolver.map(documents, &context, &entity_type).await
    }
}
