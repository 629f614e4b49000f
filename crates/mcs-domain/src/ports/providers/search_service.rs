//! Search service client port
//!
//! Typed contract for the external search service's REST API. The client is
//! a thin wrapper: it retries idempotent calls on transient failures and
//! surfaces other 4xx responses unmodified, but never embeds business logic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::Result;
use crate::value_objects::IndexSchema;

/// A k-NN sub-query over a vector field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorQuery {
    /// Query embedding
    pub vector: Vec<f32>,
    /// Number of nearest neighbours to retrieve
    pub k: usize,
    /// Vector field to search
    pub fields: String,
}

/// One search request against an index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Full-text query; `None` means match-all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
    /// Filter expression in the service's filter DSL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Page size
    pub top: usize,
    /// Pagination offset
    pub skip: usize,
    /// Order expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orderby: Option<String>,
    /// Restrict lexical matching to these fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<Vec<String>>,
    /// Comma-separated fields to highlight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_fields: Option<String>,
    /// Optional k-NN sub-query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<VectorQuery>,
    /// Semantic configuration to apply, when any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_configuration: Option<String>,
    /// Request an exact total count
    pub include_total_count: bool,
    /// Fields to select; `None` selects all retrievable fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
}

/// One hit returned by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The stored document
    pub document: Value,
    /// Raw relevance score from the service
    pub score: f64,
    /// Semantic reranker score, when semantic ranking ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reranker_score: Option<f64>,
    /// Per-field highlight snippets
    #[serde(default)]
    pub highlights: HashMap<String, Vec<String>>,
    /// Semantic captions, when semantic ranking ran
    #[serde(default)]
    pub captions: Vec<String>,
}

/// A page of hits plus the total count
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    /// Hits in service order
    pub hits: Vec<SearchHit>,
    /// Exact total when requested, otherwise `None`
    pub total: Option<u64>,
}

/// Document count and storage statistics of an index
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of documents
    pub document_count: u64,
    /// Storage size in bytes
    pub storage_size_bytes: u64,
}

/// Indexer run states, as exposed by the service.
///
/// `idle → running → (success | transient-error → idle | terminal-error)`;
/// reset forces `idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexerRunState {
    /// Not currently running
    Idle,
    /// A run is in progress
    Running,
    /// Last run completed successfully
    Success,
    /// Last run hit a retryable error
    TransientError,
    /// Indexer needs intervention
    TerminalError,
}

/// Status report of an indexer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerStatus {
    /// Indexer name
    pub name: String,
    /// Current state
    pub state: IndexerRunState,
    /// Last run start time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_start: Option<DateTime<Utc>>,
    /// Items processed in the last run
    pub items_processed: u64,
    /// Items failed in the last run
    pub items_failed: u64,
    /// Error message of the last run, when any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// A data source connecting an indexer to external storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSource {
    /// Data source name
    pub name: String,
    /// Source type, e.g. `azureblob`, `github`
    #[serde(rename = "type")]
    pub source_type: String,
    /// Connection string
    pub connection_string: String,
    /// Container or path within the source
    pub container: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A skillset attached to an indexer pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Skillset {
    /// Skillset name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Opaque skill definitions
    #[serde(default)]
    pub skills: Vec<Value>,
}

/// Action applied to one document in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentAction {
    /// Insert or replace
    Upload,
    /// Merge into an existing document
    Merge,
    /// Merge, or insert when absent
    MergeOrUpload,
    /// Delete by key
    Delete,
}

/// A batch of document operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentBatch {
    /// `(action, document)` pairs; delete actions need only the key field
    pub actions: Vec<(DocumentAction, Value)>,
}

impl DocumentBatch {
    /// Build an upload batch from documents
    pub fn upload(documents: Vec<Value>) -> Self {
        Self {
            actions: documents
                .into_iter()
                .map(|d| (DocumentAction::Upload, d))
                .collect(),
        }
    }

    /// Build a merge-or-upload batch from documents
    pub fn merge_or_upload(documents: Vec<Value>) -> Self {
        Self {
            actions: documents
                .into_iter()
                .map(|d| (DocumentAction::MergeOrUpload, d))
                .collect(),
        }
    }
}

/// Outcome of a document batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    /// Documents accepted
    pub succeeded: usize,
    /// Documents rejected
    pub failed: usize,
    /// Per-document error messages, keyed by document key
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Port: Search Service Client
///
/// One implementation exists per `(endpoint, api_key, index)` triple; the
/// provider layer maintains the process-wide pool.
#[async_trait]
pub trait SearchServiceClient: Send + Sync {
    /// List all index schemas
    async fn list_indexes(&self) -> Result<Vec<IndexSchema>>;

    /// Fetch one index schema
    async fn get_index(&self, name: &str) -> Result<IndexSchema>;

    /// Create the index, or update it in place when it exists
    async fn create_or_update_index(&self, schema: &IndexSchema) -> Result<()>;

    /// Delete an index and all its documents
    async fn delete_index(&self, name: &str) -> Result<()>;

    /// Document count and storage statistics
    async fn get_index_stats(&self, name: &str) -> Result<IndexStats>;

    /// Execute a search request against an index
    async fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchResults>;

    /// Apply a document batch to an index
    async fn index_documents(&self, index: &str, batch: &DocumentBatch) -> Result<BatchResult>;

    /// Delete documents by key
    async fn delete_documents(&self, index: &str, keys: &[String]) -> Result<BatchResult>;

    /// List indexer names
    async fn list_indexers(&self) -> Result<Vec<String>>;

    /// Fetch an indexer's status
    async fn get_indexer_status(&self, name: &str) -> Result<IndexerStatus>;

    /// Trigger an indexer run
    async fn run_indexer(&self, name: &str) -> Result<()>;

    /// Reset an indexer to `idle`
    async fn reset_indexer(&self, name: &str) -> Result<()>;

    /// Create or update an indexer from its raw definition
    async fn create_or_update_indexer(&self, definition: &Value) -> Result<()>;

    /// Delete an indexer
    async fn delete_indexer(&self, name: &str) -> Result<()>;

    /// Create or update a data source
    async fn create_or_update_datasource(&self, datasource: &DataSource) -> Result<()>;

    /// Fetch a data source definition
    async fn get_datasource(&self, name: &str) -> Result<DataSource>;

    /// Create or update a skillset
    async fn create_or_update_skillset(&self, skillset: &Skillset) -> Result<()>;

    /// Identifier of this client implementation
    fn provider_name(&self) -> &str;
}
