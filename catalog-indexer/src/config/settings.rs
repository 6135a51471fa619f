//! Runtime settings read from the environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::IndexingError;
use catalog_indexer_shared::StoreId;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default path of the indexer catalog.
const DEFAULT_INDEXER_CATALOG: &str = "indexers.json";

const DEFAULT_MAPPING_CONCURRENCY: usize = 16;
const DEFAULT_LOADER_BATCH_SIZE: usize = 100;
const DEFAULT_REINDEX_PAGE_SIZE: usize = 500;

/// Settings of one indexer process.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexerSettings {
    /// OpenSearch server URL.
    pub opensearch_url: String,
    /// Path to the JSON indexer catalog.
    pub catalog_path: PathBuf,
    /// Maximum number of provider tasks in flight.
    pub mapping_concurrency: usize,
    /// Documents per bulk request.
    pub loader_batch_size: usize,
    /// Rows read per page on a full reindex.
    pub reindex_page_size: usize,
    /// Store the documents are built for.
    pub store_id: StoreId,
    /// Optional JSON snapshot of entity rows.
    pub snapshot_path: Option<PathBuf>,
}

impl IndexerSettings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `INDEXER_CATALOG`: indexer catalog path (default: indexers.json)
    /// - `MAPPING_CONCURRENCY`: provider tasks in flight (default: 16)
    /// - `LOADER_BATCH_SIZE`: documents per bulk request (default: 100)
    /// - `REINDEX_PAGE_SIZE`: rows per page on full reindex (default: 500)
    /// - `STORE_ID`: store the documents are built for (default: 0)
    /// - `INDEXER_SNAPSHOT`: optional path to a JSON row snapshot
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns the raw value of a key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let opensearch_url =
            lookup("OPENSEARCH_URL").unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string());
        let catalog_path = lookup("INDEXER_CATALOG")
            .unwrap_or_else(|| DEFAULT_INDEXER_CATALOG.to_string())
            .into();

        Ok(Self {
            opensearch_url,
            catalog_path,
            mapping_concurrency: parse(&lookup, "MAPPING_CONCURRENCY", DEFAULT_MAPPING_CONCURRENCY)?,
            loader_batch_size: parse(&lookup, "LOADER_BATCH_SIZE", DEFAULT_LOADER_BATCH_SIZE)?,
            reindex_page_size: parse(&lookup, "REINDEX_PAGE_SIZE", DEFAULT_REINDEX_PAGE_SIZE)?,
            store_id: parse(&lookup, "STORE_ID", 0)?,
            snapshot_path: lookup("INDEXER_SNAPSHOT")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T, IndexingError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| IndexingError::config(format!("Invalid {}={:?}: {}", key, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<IndexerSettings, IndexingError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        IndexerSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]).unwrap();

        assert_eq!(settings.opensearch_url, "http://localhost:9200");
        assert_eq!(settings.catalog_path, PathBuf::from("indexers.json"));
        assert_eq!(settings.mapping_concurrency, 16);
        assert_eq!(settings.loader_batch_size, 100);
        assert_eq!(settings.reindex_page_size, 500);
        assert_eq!(settings.store_id, 0);
        assert_eq!(settings.snapshot_path, None);
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("OPENSEARCH_URL", "http://search:9200"),
            ("MAPPING_CONCURRENCY", "4"),
            ("STORE_ID", " 2 "),
            ("INDEXER_SNAPSHOT", "rows.json"),
        ])
        .unwrap();

        assert_eq!(settings.opensearch_url, "http://search:9200");
        assert_eq!(settings.mapping_concurrency, 4);
        assert_eq!(settings.store_id, 2);
        assert_eq!(settings.snapshot_path, Some(PathBuf::from("rows.json")));
    }

    #[test]
    fn test_invalid_number() {
        let err = settings(&[("LOADER_BATCH_SIZE", "many")]).unwrap_err();
        assert!(matches!(err, IndexingError::ConfigError(msg) if msg.contains("LOADER_BATCH_SIZE")));
    }
}
