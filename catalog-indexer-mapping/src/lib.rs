//! # Catalog Indexer Mapping
//!
//! Turns raw entity rows into search documents by fanning each document out
//! to the enrichment providers registered for its entity type.
//!
//! ## Flow
//!
//! 1. **Registry**: [`EntityDataSourceRegistry`] holds provider descriptors per
//!    entity type, grouped by slot
//! 2. **Factory**: [`ProviderFactory`] instantiates them through the
//!    [`ProviderContainer`] and orders them by priority
//! 3. **Resolver**: [`DocumentMappingResolver`] runs one task per
//!    (document, provider) on a [`TaskExecutor`] and deep-merges the results
//!    in priority order
//! 4. **Entry point**: [`BatchDataMapper`] reads the active indexer from the
//!    operation's registry and drives the resolver

mod batch;
mod container;
mod datasource;
mod descriptor;
pub mod errors;
mod executor;
mod factory;
pub mod merge;
mod provider;
mod resolver;

pub use batch::{active_indexer, store_context_from_map, BatchDataMapper, ACTIVE_INDEXER_KEY};
pub use container::{Component, ProviderContainer, ServiceContainer};
pub use datasource::{DataSourceSlot, EntityDataSourceRegistry};
pub use descriptor::{Capability, ProviderDescriptor};
pub use errors::MappingError;
pub use executor::{SequentialExecutor, Task, TaskExecutor, TokioExecutor};
pub use factory::{ProviderFactory, ResolvedProvider};
pub use provider::{DocumentProvider, ProviderError};
pub use resolver::DocumentMappingResolver;
