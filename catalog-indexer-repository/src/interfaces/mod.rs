//! Interface definitions for the search index sink.

mod search_index_provider;

pub use search_index_provider::SearchIndexProvider;
