//! Translation of queue messages into reindex requests.

use crate::errors::PipelineError;
use crate::reindexer::ReindexRequest;
use catalog_indexer_shared::{IndexAction, IndexMessage};

/// Validate `message` and turn it into a [`ReindexRequest`].
///
/// - `index_row` needs exactly one id
/// - `index_list` needs at least one id
/// - `index_ids` with no ids asks for a full reindex
pub fn request_from_message(message: &IndexMessage) -> Result<ReindexRequest, PipelineError> {
    if message.indexer_id.trim().is_empty() {
        return Err(PipelineError::invalid_message("indexer_id is empty"));
    }

    match message.action {
        IndexAction::IndexRow => match message.ids.as_slice() {
            [id] => Ok(ReindexRequest::Row(*id)),
            ids => Err(PipelineError::invalid_message(format!(
                "index_row expects exactly one id, got {}",
                ids.len()
            ))),
        },
        IndexAction::IndexList if message.ids.is_empty() => Err(PipelineError::invalid_message(
            "index_list expects at least one id",
        )),
        IndexAction::IndexList => Ok(ReindexRequest::List(message.ids.clone())),
        IndexAction::IndexIds if message.ids.is_empty() => Ok(ReindexRequest::All),
        IndexAction::IndexIds => Ok(ReindexRequest::List(message.ids.clone())),
    }
}
