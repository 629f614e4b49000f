//! Tool argument structs
//!
//! One explicit parameter struct per tool. Unknown fields are rejected at
//! deserialization, numeric bounds are enforced by `validator`, and the
//! schemas published over `tools/list` derive from these types.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use mcs_domain::value_objects::{DetailLevel, SearchIntent};

fn default_max_results() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    100
}

fn default_sample_size() -> usize {
    100
}

fn default_depth() -> usize {
    2
}

fn default_language() -> String {
    "python".to_string()
}

fn default_scope() -> String {
    "all".to_string()
}

fn default_mode() -> String {
    "enhanced".to_string()
}

/// Arguments for `search_code`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct SearchCodeArgs {
    /// Free-text code query
    #[validate(length(min = 1, max = 1000))]
    pub query: String,
    /// Task intent; classified from the query when omitted
    #[serde(default)]
    pub intent: Option<SearchIntent>,
    /// Restrict to one language
    #[serde(default)]
    pub language: Option<String>,
    /// Restrict to one repository
    #[serde(default)]
    pub repository: Option<String>,
    /// Page size (1..=30)
    #[serde(default = "default_max_results")]
    #[validate(range(min = 1, max = 30))]
    pub max_results: usize,
    /// Pagination offset (0..=10000)
    #[serde(default)]
    #[validate(range(max = 10_000))]
    pub skip: usize,
    /// Server-side order expression
    #[serde(default)]
    pub orderby: Option<String>,
    /// Terms that must match exactly; auto-extracted when omitted
    #[serde(default)]
    pub exact_terms: Option<Vec<String>>,
    /// Skip vector and semantic stages
    #[serde(default)]
    pub bm25_only: bool,
    /// Pull in dependency chunks
    #[serde(default)]
    pub include_dependencies: bool,
    /// Bypass the result cache
    #[serde(default)]
    pub disable_cache: bool,
    /// Include per-stage timings in the response
    #[serde(default)]
    pub include_timings: bool,
    /// Result verbosity
    #[serde(default)]
    pub detail_level: DetailLevel,
    /// Snippet truncation; 0 disables
    #[serde(default)]
    #[validate(range(max = 50))]
    pub snippet_lines: usize,
    /// File the caller is editing, for context boosts
    #[serde(default)]
    pub current_file: Option<String>,
    /// Workspace root of the caller
    #[serde(default)]
    pub workspace_root: Option<String>,
}

/// Arguments for `search_code_raw`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct SearchCodeRawArgs {
    /// Free-text code query
    #[validate(length(min = 1, max = 1000))]
    pub query: String,
    /// Task intent
    #[serde(default)]
    pub intent: Option<SearchIntent>,
    /// Restrict to one language
    #[serde(default)]
    pub language: Option<String>,
    /// Restrict to one repository
    #[serde(default)]
    pub repository: Option<String>,
    /// Page size (1..=30)
    #[serde(default = "default_max_results")]
    #[validate(range(min = 1, max = 30))]
    pub max_results: usize,
}

/// Arguments for `explain_ranking`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct ExplainRankingArgs {
    /// Query to search and explain
    #[validate(length(min = 1, max = 1000))]
    pub query: String,
    /// `basic` or `enhanced`
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Results to explain (1..=30)
    #[serde(default = "default_max_results")]
    #[validate(range(min = 1, max = 30))]
    pub max_results: usize,
    /// Task intent
    #[serde(default)]
    pub intent: Option<SearchIntent>,
    /// Restrict to one language
    #[serde(default)]
    pub language: Option<String>,
    /// Restrict to one repository
    #[serde(default)]
    pub repository: Option<String>,
}

/// Arguments for `preview_query_processing`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct PreviewQueryArgs {
    /// Query to preview
    #[validate(length(min = 1, max = 1000))]
    pub query: String,
    /// Intent override
    #[serde(default)]
    pub intent: Option<SearchIntent>,
    /// Language filter that would apply
    #[serde(default)]
    pub language: Option<String>,
    /// Repository filter that would apply
    #[serde(default)]
    pub repository: Option<String>,
}

/// Arguments for `generate_code`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct GenerateCodeArgs {
    /// What to generate
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    /// Target language
    #[serde(default = "default_language")]
    pub language: String,
    /// Also generate a test skeleton
    #[serde(default)]
    pub include_tests: bool,
}

/// Arguments for `analyze_context`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct AnalyzeContextArgs {
    /// File to analyze
    #[validate(length(min = 1))]
    pub file_path: String,
    /// Pull related chunks from the index
    #[serde(default = "default_true")]
    pub include_dependencies: bool,
    /// Dependency lookup depth (1..=3)
    #[serde(default = "default_depth")]
    #[validate(range(min = 1, max = 3))]
    pub depth: usize,
}

/// Arguments for `submit_feedback`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct SubmitFeedbackArgs {
    /// Query or result the rating refers to
    #[validate(length(min = 1))]
    pub target_id: String,
    /// Rating in 1..=5
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Caller context
    #[serde(default)]
    pub context: Option<Value>,
}

/// Arguments for `track_search_click`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct TrackClickArgs {
    /// Query the click belongs to
    #[validate(length(min = 1))]
    pub query_id: String,
    /// Clicked document
    #[validate(length(min = 1))]
    pub doc_id: String,
    /// Rank of the clicked document
    #[validate(range(min = 1))]
    pub rank: usize,
    /// Query intent recorded at search time
    #[serde(default)]
    pub intent: Option<SearchIntent>,
    /// Caller context (e.g. matched field)
    #[serde(default)]
    pub context: Option<Value>,
}

/// Arguments for `track_search_outcome`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct TrackOutcomeArgs {
    /// Query the outcome belongs to
    #[validate(length(min = 1))]
    pub query_id: String,
    /// `success`, `partial` or `failure`
    #[validate(length(min = 1))]
    pub outcome: String,
    /// Optional outcome confidence
    #[serde(default)]
    pub score: Option<f64>,
    /// Query intent recorded at search time
    #[serde(default)]
    pub intent: Option<SearchIntent>,
    /// Caller context
    #[serde(default)]
    pub context: Option<Value>,
}

/// Arguments for `cache_clear`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct CacheClearArgs {
    /// `all`, `search`, `embeddings` or `results`
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Optional glob refining the scope
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Arguments for `manage_index`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct ManageIndexArgs {
    /// `ensure`, `recreate`, `delete`, `validate` or `list`
    #[validate(length(min = 1))]
    pub action: String,
    /// Index definition for ensure/recreate
    #[serde(default)]
    pub index_definition: Option<Value>,
    /// Index name for delete/validate
    #[serde(default)]
    pub index_name: Option<String>,
    /// Update the live schema when it differs (ensure)
    #[serde(default = "default_true")]
    pub update_if_different: bool,
    /// Export documents before recreate
    #[serde(default)]
    pub backup_documents: bool,
    /// Confirmation for destructive actions
    #[serde(default)]
    pub confirm: bool,
}

/// Arguments for `manage_documents`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct ManageDocumentsArgs {
    /// `upload`, `delete`, `cleanup` or `count`
    #[validate(length(min = 1))]
    pub action: String,
    /// Target index
    #[validate(length(min = 1))]
    pub index_name: String,
    /// Documents for upload
    #[serde(default)]
    pub documents: Option<Vec<Value>>,
    /// Keys for delete
    #[serde(default)]
    pub document_keys: Option<Vec<String>>,
    /// Merge instead of replace on upload
    #[serde(default)]
    pub merge: bool,
    /// Age threshold for cleanup
    #[serde(default)]
    pub days_old: Option<u32>,
    /// Date field for cleanup
    #[serde(default)]
    pub date_field: Option<String>,
    /// Report without deleting
    #[serde(default)]
    pub dry_run: bool,
    /// Confirmation for destructive actions
    #[serde(default)]
    pub confirm: bool,
}

/// Arguments for `manage_indexer`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct ManageIndexerArgs {
    /// `list`, `status`, `run`, `reset`, `create` or `delete`
    #[validate(length(min = 1))]
    pub action: String,
    /// Indexer name (all actions but list/create)
    #[serde(default)]
    pub name: Option<String>,
    /// Indexer definition for create
    #[serde(default)]
    pub definition: Option<Value>,
    /// Confirmation for destructive actions
    #[serde(default)]
    pub confirm: bool,
}

/// Arguments for `create_datasource`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateDatasourceArgs {
    /// Data source name
    #[validate(length(min = 1))]
    pub name: String,
    /// Source type
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub source_type: String,
    /// Connection string
    #[validate(length(min = 1))]
    pub connection_string: String,
    /// Container or path within the source
    #[validate(length(min = 1))]
    pub container: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Arguments for `create_skillset`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateSkillsetArgs {
    /// Skillset name
    #[validate(length(min = 1))]
    pub name: String,
    /// Skill definitions
    #[serde(default)]
    pub skills: Vec<Value>,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Arguments for `rebuild_index`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct RebuildIndexArgs {
    /// Repository to re-index after the rebuild
    #[serde(default)]
    pub repository: Option<String>,
    /// Export documents before dropping the index
    #[serde(default)]
    pub backup: bool,
    /// Confirmation: a first call without it performs nothing
    #[serde(default)]
    pub confirm: bool,
}

/// Arguments for `index_repository`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct IndexRepositoryArgs {
    /// Path to the repository on disk
    #[validate(length(min = 1))]
    pub repo_path: String,
    /// Repository name stored on each chunk; directory name when omitted
    #[serde(default)]
    pub repo_name: Option<String>,
}

/// Arguments for `index_changed_files`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct IndexChangedFilesArgs {
    /// Path to the repository on disk
    #[validate(length(min = 1))]
    pub repo_path: String,
    /// Changed files, relative to the repository root
    #[validate(length(min = 1))]
    pub files: Vec<String>,
    /// Repository name stored on each chunk
    #[serde(default)]
    pub repo_name: Option<String>,
}

/// Arguments for `backfill_embeddings`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct BackfillEmbeddingsArgs {
    /// Target index; the default index when omitted
    #[serde(default)]
    pub index_name: Option<String>,
    /// Embedding batch size (1..=256)
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1, max = 256))]
    pub batch_size: usize,
    /// Prefix repository and path into the embedded text
    #[serde(default)]
    pub include_context: bool,
    /// Stop after this many documents
    #[serde(default)]
    pub max_docs: Option<usize>,
    /// Report without merging vectors
    #[serde(default)]
    pub dry_run: bool,
    /// Resume cursor from a previous partial run
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Arguments for `validate_embeddings`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct ValidateEmbeddingsArgs {
    /// Target index; the default index when omitted
    #[serde(default)]
    pub index_name: Option<String>,
    /// Documents to sample (1..=1000)
    #[serde(default = "default_sample_size")]
    #[validate(range(min = 1, max = 1000))]
    pub sample_size: usize,
}

/// Arguments for `validate_index_schema`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct ValidateIndexSchemaArgs {
    /// Index to validate; the default index when omitted
    #[serde(default)]
    pub index_name: Option<String>,
    /// Expected schema; built-in required fields when omitted
    #[serde(default)]
    pub expected: Option<Value>,
}

/// Arguments for `backup_index_schema`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct BackupIndexSchemaArgs {
    /// Index to back up; the default index when omitted
    #[serde(default)]
    pub index_name: Option<String>,
}

/// Arguments for `clear_repository_documents`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct ClearRepositoryDocumentsArgs {
    /// Repository whose documents are removed
    #[validate(length(min = 1))]
    pub repository: String,
    /// Report without deleting
    #[serde(default)]
    pub dry_run: bool,
    /// Confirmation: a first call without it performs nothing
    #[serde(default)]
    pub confirm: bool,
}

/// Arguments for `configure_semantic_search`
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct ConfigureSemanticSearchArgs {
    /// Semantic configuration name
    #[validate(length(min = 1))]
    pub configuration_name: String,
    /// Title field
    #[serde(default)]
    pub title_field: Option<String>,
    /// Content fields
    #[serde(default)]
    pub content_fields: Vec<String>,
    /// Keyword fields
    #[serde(default)]
    pub keywords_fields: Vec<String>,
}

/// Empty argument set for tools that take none
#[derive(Debug, Clone, Default, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct NoArgs {}
