//! Queue message payload.
//!
//! The transport that delivers these messages lives outside the indexer; only
//! the payload shape is defined here.

use serde::{Deserialize, Serialize};

use crate::document::DocumentId;

/// Reindex action requested by a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexAction {
    /// Reindex a single row.
    IndexRow,
    /// Reindex an explicit list of rows.
    IndexList,
    /// Reindex the given ids, or everything when the list is empty.
    IndexIds,
}

/// A reindex request as it arrives from the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMessage {
    /// Indexer the request targets.
    pub indexer_id: String,
    /// Requested action.
    pub action: IndexAction,
    /// Row ids the action applies to.
    #[serde(default)]
    pub ids: Vec<DocumentId>,
}

impl IndexMessage {
    /// Parse a message from its JSON payload.
    pub fn from_json(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}
