//! OpenSearch implementations of the sink and of interval queries.

mod client;
mod index_config;
mod interval_query;

pub use client::OpenSearchClient;
pub use index_config::{get_index_settings, INDEXED_AT_FIELD};
pub use interval_query::OpenSearchIntervalQuery;
