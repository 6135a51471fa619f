//! Error types for the catalog indexer pipeline.

use catalog_indexer_mapping::MappingError;
use catalog_indexer_registry::RegistryError;
use catalog_indexer_repository::SearchIndexError;
use thiserror::Error;

/// Errors that can occur while running a reindex operation.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Mapping documents through the providers failed.
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// The operation registry could not serve the indexer.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Writing to the search index failed.
    #[error("Search index error: {0}")]
    SearchIndex(#[from] SearchIndexError),

    /// Reading raw rows from the entity source failed.
    #[error("Source error: {0}")]
    SourceError(String),

    /// Error from the loader component.
    #[error("Loader error: {0}")]
    LoaderError(String),

    /// A queue message could not be turned into a reindex request.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl PipelineError {
    /// Create a source error.
    pub fn source_error(msg: impl Into<String>) -> Self {
        Self::SourceError(msg.into())
    }

    /// Create a loader error.
    pub fn loader(msg: impl Into<String>) -> Self {
        Self::LoaderError(msg.into())
    }

    /// Create an invalid message error.
    pub fn invalid_message(msg: impl Into<String>) -> Self {
        Self::InvalidMessage(msg.into())
    }

    /// Whether the error points at a deployment or registration defect.
    ///
    /// These are never retried and stop the orchestrator.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Mapping(e) => e.is_configuration(),
            Self::Registry(e) => matches!(
                e,
                RegistryError::DuplicateKey { .. } | RegistryError::NotRegistered { .. }
            ),
            _ => false,
        }
    }
}
