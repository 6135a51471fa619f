//! Error types for the repository crate.

mod interval_error;
mod search_index_error;

pub use interval_error::IntervalError;
pub use search_index_error::SearchIndexError;
