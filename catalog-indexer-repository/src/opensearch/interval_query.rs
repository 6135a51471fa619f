//! Interval queries executed against an OpenSearch index.

use async_trait::async_trait;
use opensearch::{http::response::Response, CountParts, OpenSearch, SearchParts};
use serde_json::{json, Map, Value};
use tracing::{debug, error};

use crate::errors::IntervalError;
use crate::interval::{Comparison, IntervalQuery, SortDirection, ValueFilter};

/// Page size used when a value query has no explicit window.
const DEFAULT_FETCH_SIZE: usize = 10_000;

/// Interval query over one numeric field of an OpenSearch index.
///
/// Builder state renders to `_count` and `_search` request bodies; cloning
/// shares the underlying connection.
#[derive(Clone)]
pub struct OpenSearchIntervalQuery {
    client: OpenSearch,
    index: String,
    field: String,
    filters: Vec<ValueFilter>,
    direction: SortDirection,
    window: Option<(usize, usize)>,
}

impl OpenSearchIntervalQuery {
    /// Create a query over `field` of `index` (an index name or alias).
    pub fn new(client: OpenSearch, index: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            client,
            index: index.into(),
            field: field.into(),
            filters: Vec::new(),
            direction: SortDirection::Asc,
            window: None,
        }
    }

    fn query_clause(&self) -> Value {
        let mut clauses = vec![json!({ "exists": { "field": self.field } })];

        for filter in &self.filters {
            let op = match filter.comparison {
                Comparison::Lt => "lt",
                Comparison::Lte => "lte",
                Comparison::Gt => "gt",
                Comparison::Gte => "gte",
            };
            let mut range = Map::new();
            range.insert(op.to_string(), json!(filter.bound));
            clauses.push(json!({ "range": { self.field.as_str(): range } }));
        }

        json!({ "bool": { "filter": clauses } })
    }

    /// Body of the `_count` request.
    pub fn count_body(&self) -> Value {
        json!({ "query": self.query_clause() })
    }

    /// Body of the `_search` request.
    pub fn search_body(&self) -> Value {
        let order = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        let (size, from) = self.window.unwrap_or((DEFAULT_FETCH_SIZE, 0));

        json!({
            "query": self.query_clause(),
            "sort": [ { self.field.as_str(): { "order": order } } ],
            "from": from,
            "size": size,
            "_source": [ self.field ]
        })
    }

    /// Read the value field out of a hit's `_source`; dotted fields walk
    /// nested objects.
    fn hit_value(&self, hit: &Value) -> Option<f64> {
        let mut value = &hit["_source"];
        for part in self.field.split('.') {
            value = value.get(part)?;
        }
        value.as_f64()
    }

    async fn read_response(
        &self,
        response: Result<Response, opensearch::Error>,
    ) -> Result<Value, IntervalError> {
        let response = response.map_err(|e| IntervalError::query(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, index = %self.index, "Interval query failed");
            return Err(IntervalError::query(format!(
                "Request failed with status {}: {}",
                status, error_body
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| IntervalError::query(e.to_string()))
    }
}

#[async_trait]
impl IntervalQuery for OpenSearchIntervalQuery {
    fn filter(&mut self, filter: ValueFilter) -> &mut Self {
        self.filters.push(filter);
        self
    }

    fn order(&mut self, direction: SortDirection) -> &mut Self {
        self.direction = direction;
        self
    }

    fn limit(&mut self, limit: usize, offset: usize) -> &mut Self {
        self.window = Some((limit, offset));
        self
    }

    async fn count(&self) -> Result<usize, IntervalError> {
        let response = self
            .client
            .count(CountParts::Index(&[self.index.as_str()]))
            .body(self.count_body())
            .send()
            .await;
        let body = self.read_response(response).await?;

        body["count"]
            .as_u64()
            .map(|count| count as usize)
            .ok_or_else(|| IntervalError::query("count response has no count"))
    }

    async fn values(&self) -> Result<Vec<f64>, IntervalError> {
        if matches!(self.window, Some((0, _))) {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .search(SearchParts::Index(&[self.index.as_str()]))
            .body(self.search_body())
            .send()
            .await;
        let body = self.read_response(response).await?;

        let hits = body["hits"]["hits"]
            .as_array()
            .ok_or_else(|| IntervalError::query("search response has no hits"))?;
        let values: Vec<f64> = hits.iter().filter_map(|hit| self.hit_value(hit)).collect();

        debug!(index = %self.index, value_count = values.len(), "Fetched interval values");
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opensearch::http::transport::Transport;

    fn query() -> OpenSearchIntervalQuery {
        let transport = Transport::single_node("http://localhost:9200").unwrap();
        OpenSearchIntervalQuery::new(OpenSearch::new(transport), "catalog_product", "price.final")
    }

    #[test]
    fn test_count_body_renders_filters() {
        let mut query = query();
        query
            .filter(ValueFilter::gte(9.995))
            .filter(ValueFilter::lt(19.995));

        assert_eq!(
            query.count_body(),
            json!({
                "query": {
                    "bool": {
                        "filter": [
                            { "exists": { "field": "price.final" } },
                            { "range": { "price.final": { "gte": 9.995 } } },
                            { "range": { "price.final": { "lt": 19.995 } } }
                        ]
                    }
                }
            })
        );
    }

    #[test]
    fn test_search_body_renders_order_and_window() {
        let mut query = query();
        query.order(SortDirection::Desc).limit(2, 3);
        let body = query.search_body();

        assert_eq!(body["sort"], json!([{ "price.final": { "order": "desc" } }]));
        assert_eq!(body["from"], 3);
        assert_eq!(body["size"], 2);
        assert_eq!(body["_source"], json!(["price.final"]));
    }

    #[test]
    fn test_search_body_default_window() {
        let body = query().search_body();
        assert_eq!(body["from"], 0);
        assert_eq!(body["size"], DEFAULT_FETCH_SIZE);
        assert_eq!(body["sort"], json!([{ "price.final": { "order": "asc" } }]));
    }

    #[test]
    fn test_clones_do_not_share_filters() {
        let base = query();
        let mut narrowed = base.clone();
        narrowed.filter(ValueFilter::gt(1.0));

        assert_eq!(base.count_body()["query"]["bool"]["filter"].as_array().unwrap().len(), 1);
        assert_eq!(narrowed.count_body()["query"]["bool"]["filter"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_hit_value_reads_nested_field() {
        let query = query();
        let hit = json!({ "_source": { "price": { "final": 12.5 } } });
        assert_eq!(query.hit_value(&hit), Some(12.5));
        assert_eq!(query.hit_value(&json!({ "_source": {} })), None);
    }
}
