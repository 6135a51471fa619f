//! Error types for the keyed registry.

use thiserror::Error;

/// Errors raised by [`KeyedRegistry`](crate::KeyedRegistry).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A non-graceful registration hit an existing key.
    #[error("Registry key '{key}' is already registered")]
    DuplicateKey { key: String },

    /// The loader failed to produce a value for the key.
    #[error("Failed to load registry key '{key}': {message}")]
    Load { key: String, message: String },

    /// The key is not registered and no value could be loaded for it.
    #[error("Registry key '{key}' is not registered")]
    NotRegistered { key: String },
}

impl RegistryError {
    /// Create a duplicate key error.
    pub fn duplicate(key: impl Into<String>) -> Self {
        Self::DuplicateKey { key: key.into() }
    }

    /// Create a load error.
    pub fn load(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a not registered error.
    pub fn not_registered(key: impl Into<String>) -> Self {
        Self::NotRegistered { key: key.into() }
    }
}
