use thiserror::Error;

/// Errors raised by interval range queries.
///
/// An absent previous or next interval is not an error; it is reported as
/// `None` by the search itself.
#[derive(Debug, Clone, Error)]
pub enum IntervalError {
    /// The underlying data source failed to answer.
    #[error("Interval query failed: {0}")]
    Query(String),

    /// The caller asked for something that cannot be computed.
    #[error("Invalid interval request: {0}")]
    InvalidRequest(String),
}

impl IntervalError {
    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}
