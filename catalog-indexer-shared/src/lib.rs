//! # Catalog Indexer Shared
//!
//! Plain data types that flow between the catalog indexer crates: entity
//! types, documents and batches, the store context handed to providers,
//! indexer metadata and the queue message payload.

pub mod document;
pub mod indexer;
pub mod message;

pub use document::{
    Document, DocumentBatch, DocumentId, EntityType, StoreContext, StoreId, ENTITY_TYPE_KEY,
    STORE_ID_KEY,
};
pub use indexer::IndexerMetadata;
pub use message::{IndexAction, IndexMessage};
