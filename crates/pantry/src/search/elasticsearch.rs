use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::config::SearchConfig;
use crate::record::ProductRecord;
use crate::sanitize;

use super::{HealthStatus, SearchDocument, SearchError, SearchHit, SearchIndexer, SearchResults};

/// Builds the newline-delimited body of a `_bulk` request.
///
/// Each record contributes an action line `{"index":{"_id":<code>}}` followed
/// by its document. The body always ends with a newline.
pub fn bulk_body(records: &[ProductRecord]) -> Result<String, serde_json::Error> {
    let mut body = String::new();
    for record in records {
        let action = json!({ "index": { "_id": record.code } });
        body.push_str(&serde_json::to_string(&action)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(&SearchDocument::from(record))?);
        body.push('\n');
    }
    Ok(body)
}

fn index_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "code": { "type": "keyword" },
                "status": { "type": "keyword" },
                "product_name": { "type": "text" },
                "brands": { "type": "text" },
                "categories": { "type": "text" },
                "labels": { "type": "text" },
                "ingredients_text": { "type": "text" },
                "quantity": { "type": "text" },
                "stores": { "type": "text" },
                "nutriscore_grade": { "type": "keyword" },
                "imported_t": { "type": "date" }
            }
        }
    })
}

fn search_query(query: &str, from: u64, size: u64) -> Value {
    json!({
        "from": from,
        "size": size,
        "query": {
            "bool": {
                "must": {
                    "multi_match": {
                        "query": query,
                        "fields": [
                            "product_name^3",
                            "brands^2",
                            "categories",
                            "labels",
                            "ingredients_text"
                        ],
                        "fuzziness": "AUTO"
                    }
                },
                "must_not": [
                    { "term": { "status": "trash" } }
                ]
            }
        }
    })
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: ResponseHits,
}

#[derive(Deserialize)]
struct ResponseHits {
    total: ResponseTotal,
    hits: Vec<ResponseHit>,
}

#[derive(Deserialize)]
struct ResponseTotal {
    value: u64,
}

#[derive(Deserialize)]
struct ResponseHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f64>,
    #[serde(rename = "_source")]
    source: SearchDocument,
}

#[derive(Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
}

#[derive(Deserialize)]
struct ClusterHealth {
    status: String,
}

/// [`SearchIndexer`] speaking the Elasticsearch REST API.
pub struct ElasticsearchIndexer {
    client: Client,
    base_url: Url,
    index: String,
    health_timeout: Duration,
}

impl ElasticsearchIndexer {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SearchError::Client(e.to_string()))?;

        info!(
            url = %sanitize::redact_url(&config.url),
            index = %config.index,
            "Created search indexer"
        );

        Ok(Self {
            client,
            base_url: Url::parse(&config.url).map_err(|e| SearchError::Client(e.to_string()))?,
            index: config.index.clone(),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        })
    }

    /// Appends `segments` to the cluster URL, each percent-encoded as a
    /// single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SearchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SearchError::Client(format!(
                    "'{}' cannot be a base URL",
                    sanitize::redact_url(self.base_url.as_str())
                ))
            })?
            .pop_if_empty()
            .extend(segments.iter().copied());
        Ok(url)
    }

    fn index_url(&self, suffix: Option<&str>) -> Result<Url, SearchError> {
        match suffix {
            Some(suffix) => self.endpoint(&[self.index.as_str(), suffix]),
            None => self.endpoint(&[self.index.as_str()]),
        }
    }

    /// URL of one document. `.` and `..` would be dropped as path segments
    /// and are refused.
    fn doc_url(&self, code: &str) -> Result<Url, SearchError> {
        if code.is_empty() || code == "." || code == ".." {
            return Err(SearchError::InvalidDocumentId(code.to_string()));
        }
        self.endpoint(&[self.index.as_str(), "_doc", code])
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, SearchError> {
        request.send().await.map_err(|e| SearchError::Request {
            operation,
            reason: e.to_string(),
        })
    }

    async fn expect_success(
        operation: &'static str,
        response: Response,
    ) -> Result<Response, SearchError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SearchError::Status {
            operation,
            status: status.as_u16(),
            body,
        })
    }

    async fn try_ensure_index(&self) -> Result<bool, SearchError> {
        let operation = "create index";
        let response = self
            .send(
                operation,
                self.client.put(self.index_url(None)?).json(&index_mapping()),
            )
            .await?;

        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            if body.contains("resource_already_exists_exception") {
                return Ok(false);
            }
            return Err(SearchError::Status {
                operation,
                status: StatusCode::BAD_REQUEST.as_u16(),
                body,
            });
        }
        Self::expect_success(operation, response).await?;
        Ok(true)
    }

    async fn try_index_one(&self, record: &ProductRecord) -> Result<(), SearchError> {
        let operation = "index document";
        let url = self.doc_url(&record.code)?;
        let response = self
            .send(
                operation,
                self.client.put(url).json(&SearchDocument::from(record)),
            )
            .await?;
        Self::expect_success(operation, response).await?;
        Ok(())
    }

    async fn try_bulk_index(&self, records: &[ProductRecord]) -> Result<(), SearchError> {
        let operation = "bulk index";
        let body = bulk_body(records).map_err(|e| SearchError::Decode {
            operation,
            reason: e.to_string(),
        })?;

        let request = self
            .client
            .post(self.index_url(Some("_bulk"))?)
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body);
        let response = self.send(operation, request).await?;
        let response = Self::expect_success(operation, response).await?;

        let result: BulkResponse = response.json().await.map_err(|e| SearchError::Decode {
            operation,
            reason: e.to_string(),
        })?;
        if result.errors {
            return Err(SearchError::BulkItems);
        }
        Ok(())
    }

    async fn try_delete(&self, code: &str) -> Result<(), SearchError> {
        let operation = "delete document";
        let url = self.doc_url(code)?;
        let response = self.send(operation, self.client.delete(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(code = %code, "Document was not indexed");
            return Ok(());
        }
        Self::expect_success(operation, response).await?;
        Ok(())
    }

    async fn try_search(
        &self,
        query: &str,
        from: u64,
        size: u64,
    ) -> Result<SearchResults, SearchError> {
        let operation = "search";
        let request = self
            .client
            .post(self.index_url(Some("_search"))?)
            .json(&search_query(query, from, size));
        let response = self.send(operation, request).await?;
        let response = Self::expect_success(operation, response).await?;

        let parsed: SearchResponse = response.json().await.map_err(|e| SearchError::Decode {
            operation,
            reason: e.to_string(),
        })?;

        Ok(SearchResults {
            total: parsed.hits.total.value,
            hits: parsed
                .hits
                .hits
                .into_iter()
                .map(|hit| SearchHit {
                    id: hit.id,
                    score: hit.score,
                    document: hit.source,
                })
                .collect(),
        })
    }

    async fn try_health_check(&self) -> Result<HealthStatus, SearchError> {
        let operation = "cluster health";
        let request = self
            .client
            .get(self.endpoint(&["_cluster", "health"])?)
            .timeout(self.health_timeout);
        let response = self.send(operation, request).await?;
        let response = Self::expect_success(operation, response).await?;

        let health: ClusterHealth = response.json().await.map_err(|e| SearchError::Decode {
            operation,
            reason: e.to_string(),
        })?;
        Ok(HealthStatus {
            available: true,
            status: health.status,
        })
    }
}

#[async_trait]
impl SearchIndexer for ElasticsearchIndexer {
    async fn ensure_index(&self) -> bool {
        match self.try_ensure_index().await {
            Ok(true) => {
                info!(index = %self.index, "Search index created");
                true
            }
            Ok(false) => {
                warn!(index = %self.index, "Search index already exists");
                true
            }
            Err(e) => {
                error!(index = %self.index, error = %e, "Failed to create search index");
                false
            }
        }
    }

    async fn index_one(&self, record: &ProductRecord) -> bool {
        match self.try_index_one(record).await {
            Ok(()) => true,
            Err(e) => {
                error!(code = %record.code, error = %e, "Failed to index product");
                false
            }
        }
    }

    async fn bulk_index(&self, records: &[ProductRecord]) -> bool {
        if records.is_empty() {
            return true;
        }
        match self.try_bulk_index(records).await {
            Ok(()) => {
                debug!(count = records.len(), "Bulk indexed products");
                true
            }
            Err(SearchError::BulkItems) => {
                warn!(count = records.len(), "Bulk index partially failed");
                false
            }
            Err(e) => {
                error!(count = records.len(), error = %e, "Failed to bulk index products");
                false
            }
        }
    }

    async fn delete(&self, code: &str) -> bool {
        match self.try_delete(code).await {
            Ok(()) => true,
            Err(e) => {
                error!(code = %code, error = %e, "Failed to delete product from index");
                false
            }
        }
    }

    async fn search(&self, query: &str, from: u64, size: u64) -> SearchResults {
        match self.try_search(query, from, size).await {
            Ok(results) => results,
            Err(e) => {
                error!(query = %query, error = %e, "Search failed");
                SearchResults::empty()
            }
        }
    }

    async fn health_check(&self) -> HealthStatus {
        match self.try_health_check().await {
            Ok(health) => health,
            Err(e) => {
                debug!(error = %e, "Search cluster unavailable");
                HealthStatus::unavailable()
            }
        }
    }
}
