//! REST client for the external search service
//!
//! Maps the `SearchServiceClient` port onto the service's HTTP surface.
//! Idempotent calls retry transient failures (connect errors, 429, 5xx)
//! with exponential backoff and jitter; other 4xx responses surface
//! unmodified as typed errors.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use mcs_domain::error::{Error, Result};
use mcs_domain::ports::{
    BatchResult, DataSource, DocumentAction, DocumentBatch, IndexStats, IndexerRunState,
    IndexerStatus, SearchHit, SearchRequest, SearchResults, SearchServiceClient, Skillset,
};
use mcs_domain::value_objects::IndexSchema;

use crate::constants::{SEARCH_MAX_RETRIES, SEARCH_RETRY_BASE_MS, SEARCH_RETRY_JITTER_MS};

/// REST client bound to one `(endpoint, api_key)` pair
pub struct RestSearchClient {
    endpoint: String,
    api_key: String,
    api_version: String,
    timeout: Duration,
    http: Client,
}

impl RestSearchClient {
    /// Create a client for an endpoint
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let endpoint = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_version: api_version.into(),
            timeout,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}?api-version={}",
            self.endpoint, path, self.api_version
        )
    }

    fn classify_status(status: StatusCode, body: &Value) -> Option<Error> {
        let message = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        match status {
            s if s.is_success() => None,
            StatusCode::UNAUTHORIZED => Some(Error::unauthorized(message)),
            StatusCode::FORBIDDEN => Some(Error::forbidden(message)),
            StatusCode::NOT_FOUND => Some(Error::not_found(message)),
            StatusCode::CONFLICT => Some(Error::conflict(message)),
            s if s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error() => Some(
                Error::dependency("search", format!("service returned {s}: {message}")),
            ),
            s => Some(Error::validation(format!(
                "service rejected the request ({s}): {message}"
            ))),
        }
    }

    fn is_transient(error: &Error) -> bool {
        matches!(error, Error::DependencyUnavailable { .. } | Error::Timeout { .. })
    }

    /// Issue one request, retrying transient failures when idempotent
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        idempotent: bool,
    ) -> Result<Value> {
        let max_attempts = if idempotent { SEARCH_MAX_RETRIES } else { 1 };
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send_once(method.clone(), path, body).await {
                Ok(value) => return Ok(value),
                Err(e) if Self::is_transient(&e) && attempt < max_attempts => {
                    let backoff = SEARCH_RETRY_BASE_MS * (1u64 << (attempt - 1));
                    let jitter = rand::thread_rng().gen_range(0..=SEARCH_RETRY_JITTER_MS);
                    warn!(path, attempt, backoff_ms = backoff + jitter, error = %e, "retrying");
                    tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let mut request = self
            .http
            .request(method, self.url(path))
            .header("api-key", &self.api_key)
            .timeout(self.timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(path.to_string(), self.timeout.as_millis() as u64)
            } else {
                Error::dependency_with_source("search", "request failed", e)
            }
        })?;

        let status = response.status();
        let body: Value = if status == StatusCode::NO_CONTENT {
            Value::Null
        } else {
            response.json().await.unwrap_or(Value::Null)
        };

        match Self::classify_status(status, &body) {
            Some(error) => Err(error),
            None => Ok(body),
        }
    }

    fn parse_hit(raw: &Value) -> SearchHit {
        let mut document = Map::new();
        let mut highlights = HashMap::new();
        let mut captions = Vec::new();
        let mut score = 0.0;
        let mut reranker_score = None;

        if let Some(object) = raw.as_object() {
            for (key, value) in object {
                match key.as_str() {
                    "@search.score" => score = value.as_f64().unwrap_or(0.0),
                    "@search.rerankerScore" => reranker_score = value.as_f64(),
                    "@search.highlights" => {
                        if let Some(fields) = value.as_object() {
                            for (field, snippets) in fields {
                                let list = snippets
                                    .as_array()
                                    .map(|a| {
                                        a.iter()
                                            .filter_map(Value::as_str)
                                            .map(str::to_string)
                                            .collect()
                                    })
                                    .unwrap_or_default();
                                highlights.insert(field.clone(), list);
                            }
                        }
                    }
                    "@search.captions" => {
                        if let Some(items) = value.as_array() {
                            captions.extend(
                                items
                                    .iter()
                                    .filter_map(|c| c.get("text").and_then(Value::as_str))
                                    .map(str::to_string),
                            );
                        }
                    }
                    k if k.starts_with("@search.") => {}
                    _ => {
                        document.insert(key.clone(), value.clone());
                    }
                }
            }
        }

        SearchHit {
            document: Value::Object(document),
            score,
            reranker_score,
            highlights,
            captions,
        }
    }

    fn batch_payload(batch: &DocumentBatch) -> Value {
        let actions: Vec<Value> = batch
            .actions
            .iter()
            .map(|(action, document)| {
                let mut object = document.as_object().cloned().unwrap_or_default();
                let verb = match action {
                    DocumentAction::Upload => "upload",
                    DocumentAction::Merge => "merge",
                    DocumentAction::MergeOrUpload => "mergeOrUpload",
                    DocumentAction::Delete => "delete",
                };
                object.insert("@search.action".to_string(), json!(verb));
                Value::Object(object)
            })
            .collect();
        json!({ "value": actions })
    }

    fn parse_batch_result(value: &Value) -> BatchResult {
        let mut result = BatchResult::default();
        if let Some(items) = value.get("value").and_then(Value::as_array) {
            for item in items {
                let ok = item
                    .get("status")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if ok {
                    result.succeeded += 1;
                } else {
                    result.failed += 1;
                    if let Some(message) = item.get("errorMessage").and_then(Value::as_str) {
                        let key = item.get("key").and_then(Value::as_str).unwrap_or("?");
                        result.errors.push(format!("{key}: {message}"));
                    }
                }
            }
        }
        result
    }

    fn parse_indexer_status(name: &str, value: &Value) -> IndexerStatus {
        let running = value.get("status").and_then(Value::as_str) == Some("running");
        let last = value.get("lastResult");
        let state = if running {
            IndexerRunState::Running
        } else {
            match last
                .and_then(|r| r.get("status"))
                .and_then(Value::as_str)
            {
                Some("success") => IndexerRunState::Success,
                Some("transientFailure") => IndexerRunState::TransientError,
                Some("persistentFailure") => IndexerRunState::TerminalError,
                _ => IndexerRunState::Idle,
            }
        };
        IndexerStatus {
            name: name.to_string(),
            state,
            last_run_start: last
                .and_then(|r| r.get("startTime"))
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
            items_processed: last
                .and_then(|r| r.get("itemsProcessed"))
                .and_then(Value::as_u64)
                .unwrap_or(0),
            items_failed: last
                .and_then(|r| r.get("itemsFailed"))
                .and_then(Value::as_u64)
                .unwrap_or(0),
            error_message: last
                .and_then(|r| r.get("errorMessage"))
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    fn search_payload(request: &SearchRequest) -> Value {
        let mut payload = Map::new();
        if let Some(text) = &request.search_text {
            payload.insert("search".to_string(), json!(text));
        }
        if let Some(filter) = &request.filter {
            payload.insert("filter".to_string(), json!(filter));
        }
        payload.insert("top".to_string(), json!(request.top));
        payload.insert("skip".to_string(), json!(request.skip));
        if let Some(orderby) = &request.orderby {
            payload.insert("orderby".to_string(), json!(orderby));
        }
        if let Some(fields) = &request.search_fields {
            payload.insert("searchFields".to_string(), json!(fields.join(",")));
        }
        if let Some(highlight) = &request.highlight_fields {
            payload.insert("highlight".to_string(), json!(highlight));
        }
        if let Some(select) = &request.select {
            payload.insert("select".to_string(), json!(select.join(",")));
        }
        if let Some(vector) = &request.vector {
            payload.insert(
                "vectorQueries".to_string(),
                json!([{
                    "kind": "vector",
                    "vector": vector.vector,
                    "k": vector.k,
                    "fields": vector.fields,
                }]),
            );
        }
        if let Some(semantic) = &request.semantic_configuration {
            payload.insert("queryType".to_string(), json!("semantic"));
            payload.insert("semanticConfiguration".to_string(), json!(semantic));
            payload.insert("captions".to_string(), json!("extractive"));
        }
        payload.insert("count".to_string(), json!(request.include_total_count));
        Value::Object(payload)
    }
}

#[async_trait]
impl SearchServiceClient for RestSearchClient {
    async fn list_indexes(&self) -> Result<Vec<IndexSchema>> {
        let value = self.send(Method::GET, "indexes", None, true).await?;
        let items = value
            .get("value")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        items
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(Error::from))
            .collect()
    }

    async fn get_index(&self, name: &str) -> Result<IndexSchema> {
        let value = self
            .send(Method::GET, &format!("indexes/{name}"), None, true)
            .await?;
        serde_json::from_value(value).map_err(Error::from)
    }

    async fn create_or_update_index(&self, schema: &IndexSchema) -> Result<()> {
        let body = serde_json::to_value(schema)?;
        self.send(
            Method::PUT,
            &format!("indexes/{}", schema.name),
            Some(&body),
            true,
        )
        .await?;
        debug!(index = %schema.name, "index created or updated");
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<()> {
        self.send(Method::DELETE, &format!("indexes/{name}"), None, true)
            .await?;
        Ok(())
    }

    async fn get_index_stats(&self, name: &str) -> Result<IndexStats> {
        let value = self
            .send(Method::GET, &format!("indexes/{name}/stats"), None, true)
            .await?;
        Ok(IndexStats {
            document_count: value
                .get("documentCount")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            storage_size_bytes: value
                .get("storageSize")
                .and_then(Value::as_u64)
                .unwrap_or(0),
        })
    }

    async fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchResults> {
        let payload = Self::search_payload(request);
        // POST search is a read: safe to retry.
        let value = self
            .send(
                Method::POST,
                &format!("indexes/{index}/docs/search"),
                Some(&payload),
                true,
            )
            .await?;

        let hits = value
            .get("value")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Self::parse_hit).collect())
            .unwrap_or_default();
        Ok(SearchResults {
            hits,
            total: value.get("@odata.count").and_then(Value::as_u64),
        })
    }

    async fn index_documents(&self, index: &str, batch: &DocumentBatch) -> Result<BatchResult> {
        let payload = Self::batch_payload(batch);
        // Document writes are not retried blindly: a replayed batch after an
        // ambiguous failure could double-apply merge actions.
        let value = self
            .send(
                Method::POST,
                &format!("indexes/{index}/docs/index"),
                Some(&payload),
                false,
            )
            .await?;
        Ok(Self::parse_batch_result(&value))
    }

    async fn delete_documents(&self, index: &str, keys: &[String]) -> Result<BatchResult> {
        let documents = keys.iter().map(|k| json!({ "id": k })).collect::<Vec<_>>();
        let batch = DocumentBatch {
            actions: documents
                .into_iter()
                .map(|d| (DocumentAction::Delete, d))
                .collect(),
        };
        let payload = Self::batch_payload(&batch);
        let value = self
            .send(
                Method::POST,
                &format!("indexes/{index}/docs/index"),
                Some(&payload),
                true,
            )
            .await?;
        Ok(Self::parse_batch_result(&value))
    }

    async fn list_indexers(&self) -> Result<Vec<String>> {
        let value = self.send(Method::GET, "indexers", None, true).await?;
        Ok(value
            .get("value")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_indexer_status(&self, name: &str) -> Result<IndexerStatus> {
        let value = self
            .send(Method::GET, &format!("indexers/{name}/status"), None, true)
            .await?;
        Ok(Self::parse_indexer_status(name, &value))
    }

    async fn run_indexer(&self, name: &str) -> Result<()> {
        self.send(Method::POST, &format!("indexers/{name}/run"), None, false)
            .await?;
        Ok(())
    }

    async fn reset_indexer(&self, name: &str) -> Result<()> {
        self.send(Method::POST, &format!("indexers/{name}/reset"), None, true)
            .await?;
        Ok(())
    }

    async fn create_or_update_indexer(&self, definition: &Value) -> Result<()> {
        let name = definition
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::validation_field("name", "indexer definition needs a name"))?;
        self.send(
            Method::PUT,
            &format!("indexers/{name}"),
            Some(definition),
            true,
        )
        .await?;
        Ok(())
    }

    async fn delete_indexer(&self, name: &str) -> Result<()> {
        self.send(Method::DELETE, &format!("indexers/{name}"), None, true)
            .await?;
        Ok(())
    }

    async fn create_or_update_datasource(&self, datasource: &DataSource) -> Result<()> {
        let body = json!({
            "name": datasource.name,
            "type": datasource.source_type,
            "description": datasource.description,
            "credentials": { "connectionString": datasource.connection_string },
            "container": { "name": datasource.container },
        });
        self.send(
            Method::PUT,
            &format!("datasources/{}", datasource.name),
            Some(&body),
            true,
        )
        .await?;
        Ok(())
    }

    async fn get_datasource(&self, name: &str) -> Result<DataSource> {
        let value = self
            .send(Method::GET, &format!("datasources/{name}"), None, true)
            .await?;
        Ok(DataSource {
            name: value
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(name)
                .to_string(),
            source_type: value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            connection_string: value
                .pointer("/credentials/connectionString")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            container: value
                .pointer("/container/name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            description: value
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    async fn create_or_update_skillset(&self, skillset: &Skillset) -> Result<()> {
        let body = serde_json::to_value(skillset)?;
        self.send(
            Method::PUT,
            &format!("skillsets/{}", skillset.name),
            Some(&body),
            true,
        )
        .await?;
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "rest"
    }
}
