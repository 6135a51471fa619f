//! Row snapshots for the in-memory entity source.

use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::IndexingError;
use catalog_indexer_pipeline::InMemoryEntitySource;
use catalog_indexer_shared::{DocumentBatch, EntityType};

/// Load an entity source from a JSON snapshot of the form
/// `{"<entity type>": {"<row id>": {..row..}}}`.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<InMemoryEntitySource, IndexingError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        IndexingError::config(format!("Failed to read snapshot {}: {}", path.display(), e))
    })?;
    let rows = parse_snapshot(&raw)?;

    for (entity_type, batch) in &rows {
        info!(entity_type = %entity_type, row_count = batch.len(), "Loaded snapshot rows");
    }

    Ok(InMemoryEntitySource::from_snapshot(rows))
}

fn parse_snapshot(raw: &str) -> Result<HashMap<EntityType, DocumentBatch>, IndexingError> {
    serde_json::from_str(raw).map_err(|e| IndexingError::config(format!("Invalid snapshot: {}", e)))
}
