//! Configuration types for the search index sink.

/// Configuration for indexes created by the sink.
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    /// Maximum number of documents allowed in a single bulk request.
    /// Set to None to disable the limit.
    pub max_batch_size: Option<usize>,
    /// Version suffix of the physical index behind each alias.
    pub index_version: u32,
    /// Primary shards of newly created indexes.
    pub number_of_shards: u32,
    /// Replicas of newly created indexes.
    pub number_of_replicas: u32,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(1000),
            index_version: 1,
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }
}

impl SearchIndexConfig {
    /// Create a config with a custom batch size limit.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
            ..Self::default()
        }
    }

    /// Name of the physical index an alias points to.
    pub fn index_name(&self, alias: &str) -> String {
        format!("{}_v{}", alias, self.index_version)
    }
}
