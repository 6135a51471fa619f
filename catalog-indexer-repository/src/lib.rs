//! # Catalog Indexer Repository
//!
//! Storage-facing side of the catalog indexer:
//! - the [`SearchIndexProvider`] sink the pipeline writes mapped documents
//!   to, with an OpenSearch implementation
//! - [`IntervalSearch`], which walks a sorted numeric column through an
//!   [`IntervalQuery`] to build range aggregation buckets

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod interval;
pub mod opensearch;

pub use config::SearchIndexConfig;
pub use errors::{IntervalError, SearchIndexError};
pub use interfaces::SearchIndexProvider;
pub use interval::{InMemoryIntervalQuery, IntervalQuery, IntervalSearch};
pub use opensearch::{OpenSearchClient, OpenSearchIntervalQuery};
