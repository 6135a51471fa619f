//! Error types for document mapping.

use catalog_indexer_registry::RegistryError;
use catalog_indexer_shared::DocumentId;
use thiserror::Error;

use crate::merge::MergeConflict;

/// Errors that can occur while resolving providers or mapping documents.
#[derive(Error, Debug)]
pub enum MappingError {
    /// Provider registration or context is wrong; never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A provider failed while enriching a document.
    #[error("Provider '{provider}' failed for document {document_id}: {message}")]
    ProviderExecution {
        provider: String,
        document_id: DocumentId,
        message: String,
    },

    /// Two providers produced incompatible values for the same field.
    #[error("Document {document_id}: {conflict}")]
    TypeMismatch {
        document_id: DocumentId,
        conflict: MergeConflict,
    },

    /// The operation registry could not serve a required key.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A task panicked or the executor could not run it.
    #[error("Executor error: {0}")]
    Executor(String),
}

impl MappingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a provider execution error.
    pub fn provider_execution(
        provider: impl Into<String>,
        document_id: DocumentId,
        message: impl Into<String>,
    ) -> Self {
        Self::ProviderExecution {
            provider: provider.into(),
            document_id,
            message: message.into(),
        }
    }

    /// Create an executor error.
    pub fn executor(msg: impl Into<String>) -> Self {
        Self::Executor(msg.into())
    }

    /// Whether the error points at a deployment or registration defect
    /// rather than at the data being indexed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::TypeMismatch { .. }
                | Self::Registry(RegistryError::DuplicateKey { .. })
                | Self::Registry(RegistryError::NotRegistered { .. })
        )
    }
}
