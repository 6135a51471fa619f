//! # Catalog Indexer Pipeline
//!
//! Turns reindex requests into search index writes.
//!
//! ## Architecture
//!
//! 1. **Source**: [`EntitySource`] reads raw entity rows
//! 2. **Reindexer**: [`Reindexer`] scopes the operation registry, maps rows
//!    through the providers and hands the documents to the loader
//! 3. **Loader**: [`SearchLoader`] writes documents in bulk batches
//! 4. **Orchestrator**: [`Orchestrator`] drains queue messages and dispatches
//!    them to the reindexer

pub mod errors;
pub mod loader;
pub mod orchestrator;
pub mod reindexer;
pub mod source;

pub use errors::PipelineError;
pub use loader::{LoaderConfig, SearchLoader};
pub use orchestrator::{Orchestrator, OrchestratorConfig, RunSummary};
pub use reindexer::{ReindexReport, ReindexRequest, Reindexer, ReindexerConfig};
pub use source::{EntitySource, InMemoryEntitySource};
