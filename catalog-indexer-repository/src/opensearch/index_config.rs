//! OpenSearch index settings and mappings for catalog documents.

use serde_json::{json, Value};

use crate::config::SearchIndexConfig;

/// Field stamped on every document at write time.
pub const INDEXED_AT_FIELD: &str = "indexed_at";

/// Index creation body for the physical index behind `alias`.
///
/// Catalog documents have no fixed schema, since providers decide which
/// fields exist. Mappings are therefore dynamic:
/// - strings become `text` with a `raw` keyword sub-field for filtering,
///   sorting and terms aggregations
/// - whole numbers become `long`, the rest `double` (usable by range
///   aggregations)
/// - `indexed_at` is always a `date`
pub fn get_index_settings(alias: &str, config: &SearchIndexConfig) -> Value {
    json!({
        "settings": {
            "number_of_shards": config.number_of_shards,
            "number_of_replicas": config.number_of_replicas
        },
        "mappings": {
            "dynamic": true,
            "dynamic_templates": [
                {
                    "strings": {
                        "match_mapping_type": "string",
                        "mapping": {
                            "type": "text",
                            "fields": {
                                "raw": {
                                    "type": "keyword",
                                    "ignore_above": 256
                                }
                            }
                        }
                    }
                },
                {
                    "decimals": {
                        "match_mapping_type": "double",
                        "mapping": {
                            "type": "double"
                        }
                    }
                }
            ],
            "properties": {
                INDEXED_AT_FIELD: {
                    "type": "date"
                }
            }
        },
        "aliases": {
            alias: {}
        }
    })
}
