//! Interval range search for histogram-style aggregation buckets.

mod query;
mod search;

pub use query::{Comparison, InMemoryIntervalQuery, IntervalQuery, SortDirection, ValueFilter};
pub use search::{IntervalSearch, DELTA};
