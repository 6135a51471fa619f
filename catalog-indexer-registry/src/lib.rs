//! # Catalog Indexer Registry
//!
//! A keyed store that loads values on first access and memoizes them for the
//! lifetime of one indexing operation. Callers pass the registry through the
//! call chain of that operation and reset it at the boundary, either
//! explicitly or by holding a [`RegistryScope`].

pub mod errors;
mod keyed;
mod scope;

pub use errors::RegistryError;
pub use keyed::{KeyedRegistry, Loader, ReleaseHook};
pub use scope::RegistryScope;
