//! OpenSearch implementation of the search index sink.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opensearch::{
    cluster::ClusterHealthParts,
    http::{
        request::JsonBody,
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, OpenSearch,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::SearchIndexConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::{get_index_settings, INDEXED_AT_FIELD};
use catalog_indexer_shared::{DocumentBatch, DocumentId};

/// Search index sink backed by OpenSearch.
///
/// Documents are written through the bulk API under their source id, so a
/// reindex replaces what an earlier run wrote.
#[derive(Clone)]
pub struct OpenSearchClient {
    client: OpenSearch,
    config: SearchIndexConfig,
}

impl OpenSearchClient {
    /// Create a client connected to `url` with the default configuration.
    pub fn new(url: &str) -> Result<Self, SearchIndexError> {
        Self::with_config(url, SearchIndexConfig::default())
    }

    /// Create a client connected to `url`.
    pub fn with_config(url: &str, config: SearchIndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        info!(url = %url, index_version = config.index_version, "Created OpenSearch client");

        Ok(Self {
            client: OpenSearch::new(transport),
            config,
        })
    }

    /// The underlying OpenSearch handle, shared with interval queries.
    pub fn client(&self) -> &OpenSearch {
        &self.client
    }

    fn validate_batch_size(&self, size: usize) -> Result<(), SearchIndexError> {
        match self.config.max_batch_size {
            Some(max) if size > max => Err(SearchIndexError::batch_size_exceeded(size, max)),
            _ => Ok(()),
        }
    }

    async fn send_bulk(&self, alias: &str, body: Vec<JsonBody<Value>>) -> Result<BulkResponse, SearchIndexError> {
        let response = self
            .client
            .bulk(BulkParts::Index(alias))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::bulk_operation(e.to_string()))?;

        let response = ensure_success(response, SearchIndexError::bulk_operation).await?;
        response
            .json::<BulkResponse>()
            .await
            .map_err(|e| SearchIndexError::unexpected_response(e.to_string()))
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchClient {
    #[instrument(skip(self))]
    async fn ensure_index(&self, alias: &str) -> Result<(), SearchIndexError> {
        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[alias]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if exists.status_code().is_success() {
            debug!(alias = %alias, "Index already exists");
            return Ok(());
        }

        let index_name = self.config.index_name(alias);
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&index_name))
            .body(get_index_settings(alias, &self.config))
            .send()
            .await
            .map_err(|e| SearchIndexError::index(e.to_string()))?;

        ensure_success(response, SearchIndexError::index).await?;
        info!(alias = %alias, index = %index_name, "Created search index");
        Ok(())
    }

    #[instrument(skip(self, batch), fields(document_count = batch.len()))]
    async fn bulk_index(&self, alias: &str, batch: &DocumentBatch) -> Result<(), SearchIndexError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.validate_batch_size(batch.len())?;

        let body = build_index_body(batch, Utc::now())
            .into_iter()
            .map(JsonBody::new)
            .collect();
        let response = self.send_bulk(alias, body).await?;

        let failures = response.failures(&[]);
        if !failures.is_empty() {
            error!(failed = failures.len(), total = batch.len(), "Bulk index had failures");
            return Err(SearchIndexError::bulk_operation(describe_failures(
                &failures,
                batch.len(),
            )));
        }

        debug!(alias = %alias, "Bulk index completed");
        Ok(())
    }

    #[instrument(skip(self, ids), fields(document_count = ids.len()))]
    async fn delete_documents(&self, alias: &str, ids: &[DocumentId]) -> Result<(), SearchIndexError> {
        if ids.is_empty() {
            return Ok(());
        }
        self.validate_batch_size(ids.len())?;

        let body = build_delete_body(ids).into_iter().map(JsonBody::new).collect();
        let response = self.send_bulk(alias, body).await?;

        // Deleting a document that was never indexed answers 404 per item.
        let failures = response.failures(&[404]);
        if !failures.is_empty() {
            error!(failed = failures.len(), total = ids.len(), "Bulk delete had failures");
            return Err(SearchIndexError::delete(describe_failures(&failures, ids.len())));
        }

        debug!(alias = %alias, "Bulk delete completed");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            warn!(status = %response.status_code(), "Cluster health request failed");
            return Ok(false);
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::unexpected_response(e.to_string()))?;

        Ok(matches!(body["status"].as_str(), Some("green") | Some("yellow")))
    }
}

async fn ensure_success(
    response: Response,
    to_error: fn(String) -> SearchIndexError,
) -> Result<Response, SearchIndexError> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    error!(status = %status, body = %error_body, "OpenSearch request failed");
    Err(to_error(format!("Request failed with status {}: {}", status, error_body)))
}

/// Action and source lines of a bulk index request, each document stamped
/// with `indexed_at`.
fn build_index_body(batch: &DocumentBatch, indexed_at: DateTime<Utc>) -> Vec<Value> {
    let stamp = json!(indexed_at.to_rfc3339());
    let mut lines = Vec::with_capacity(batch.len() * 2);

    for (id, document) in batch {
        let mut source = document.clone();
        source.insert(INDEXED_AT_FIELD.to_string(), stamp.clone());

        lines.push(json!({ "index": { "_id": id.to_string() } }));
        lines.push(Value::Object(source));
    }

    lines
}

fn build_delete_body(ids: &[DocumentId]) -> Vec<Value> {
    ids.iter()
        .map(|id| json!({ "delete": { "_id": id.to_string() } }))
        .collect()
}

fn describe_failures(failures: &[(String, String)], total: usize) -> String {
    let details: Vec<String> = failures
        .iter()
        .take(5)
        .map(|(id, reason)| format!("{}: {}", id, reason))
        .collect();
    format!(
        "{} of {} documents failed ({})",
        failures.len(),
        total,
        details.join("; ")
    )
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    #[serde(rename = "_id", default)]
    id: String,
    status: u16,
    #[serde(default)]
    error: Option<Value>,
}

impl BulkResponse {
    /// `(id, reason)` of every item that failed with a status not listed in
    /// `tolerated`.
    fn failures(&self, tolerated: &[u16]) -> Vec<(String, String)> {
        if !self.errors && self.items.iter().all(|item| item.values().all(|i| i.status < 300)) {
            return Vec::new();
        }

        self.items
            .iter()
            .flat_map(|item| item.values())
            .filter(|item| item.status >= 300 && !tolerated.contains(&item.status))
            .map(|item| {
                let reason = item
                    .error
                    .as_ref()
                    .and_then(|e| e["reason"].as_str().map(str::to_string))
                    .unwrap_or_else(|| format!("status {}", item.status));
                (item.id.clone(), reason)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_indexer_shared::Document;
    use chrono::TimeZone;

    fn batch() -> DocumentBatch {
        let mut first = Document::new();
        first.insert("sku".to_string(), json!("SKU-1"));
        let mut second = Document::new();
        second.insert("sku".to_string(), json!("SKU-2"));
        [(2, second), (1, first)].into_iter().collect()
    }

    #[test]
    fn test_index_body_stamps_documents() {
        let indexed_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let lines = build_index_body(&batch(), indexed_at);

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], json!({"index": {"_id": "1"}}));
        assert_eq!(lines[1]["sku"], json!("SKU-1"));
        assert_eq!(lines[1]["indexed_at"], json!("2024-05-01T12:00:00+00:00"));
        assert_eq!(lines[2], json!({"index": {"_id": "2"}}));
    }

    #[test]
    fn test_delete_body() {
        let lines = build_delete_body(&[7, 9]);
        assert_eq!(
            lines,
            vec![json!({"delete": {"_id": "7"}}), json!({"delete": {"_id": "9"}})]
        );
    }

    #[test]
    fn test_bulk_failures_are_collected() {
        let response: BulkResponse = serde_json::from_value(json!({
            "took": 3,
            "errors": true,
            "items": [
                {"index": {"_id": "1", "status": 201}},
                {"index": {"_id": "2", "status": 400, "error": {"type": "mapper_parsing_exception", "reason": "failed to parse field [price]"}}}
            ]
        }))
        .unwrap();

        let failures = response.failures(&[]);
        assert_eq!(
            failures,
            vec![("2".to_string(), "failed to parse field [price]".to_string())]
        );
    }

    #[test]
    fn test_missing_documents_tolerated_on_delete() {
        let response: BulkResponse = serde_json::from_value(json!({
            "errors": false,
            "items": [
                {"delete": {"_id": "1", "status": 200}},
                {"delete": {"_id": "2", "status": 404}}
            ]
        }))
        .unwrap();

        assert!(response.failures(&[404]).is_empty());
        assert_eq!(response.failures(&[]).len(), 1);
    }

    #[test]
    fn test_batch_size_limit() {
        let client = OpenSearchClient::with_config(
            "http://localhost:9200",
            SearchIndexConfig::with_max_batch_size(1),
        )
        .unwrap();

        assert!(client.validate_batch_size(1).is_ok());
        assert!(matches!(
            client.validate_batch_size(2),
            Err(SearchIndexError::BatchSizeExceeded { provided: 2, max: 1 })
        ));
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            OpenSearchClient::new("not a url"),
            Err(SearchIndexError::ConnectionError(_))
        ));
    }

    #[test]
    fn test_describe_failures_truncates() {
        let failures: Vec<(String, String)> =
            (0..8).map(|i| (i.to_string(), "bad".to_string())).collect();
        let message = describe_failures(&failures, 10);

        assert!(message.starts_with("8 of 10 documents failed"));
        assert!(!message.contains("6: bad"));
    }
}
