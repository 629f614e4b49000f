//! Tool registry
//!
//! Every tool's name, tier, destructiveness and parameter schema. The
//! dispatcher's tier check is authoritative; nothing else grants or denies
//! access.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::Tool;
use rmcp::ErrorData as McpError;

use mcs_domain::value_objects::Tier;

use crate::args::*;

/// One registered tool
pub struct ToolSpec {
    /// Tool name as exposed over MCP and HTTP
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Minimum tier allowed to invoke the tool
    pub tier: Tier,
    /// Destructive tools require the `confirm=true` two-call pattern
    pub destructive: bool,
    schema: fn() -> schemars::Schema,
}

impl ToolSpec {
    /// The tool's parameter schema
    pub fn schema(&self) -> schemars::Schema {
        (self.schema)()
    }
}

/// The complete tool surface, grouped by concern
pub static ALL_TOOLS: &[ToolSpec] = &[
    // Search
    ToolSpec {
        name: "search_code",
        description: "Search indexed code with the hybrid retrieval pipeline",
        tier: Tier::Public,
        destructive: false,
        schema: || schemars::schema_for!(SearchCodeArgs),
    },
    ToolSpec {
        name: "search_code_raw",
        description: "Search indexed code and return unformatted items",
        tier: Tier::Public,
        destructive: false,
        schema: || schemars::schema_for!(SearchCodeRawArgs),
    },
    // Analysis
    ToolSpec {
        name: "explain_ranking",
        description: "Explain the ranking factors behind a query's results",
        tier: Tier::Public,
        destructive: false,
        schema: || schemars::schema_for!(ExplainRankingArgs),
    },
    ToolSpec {
        name: "preview_query_processing",
        description: "Show intent classification, rewrites and filters for a query",
        tier: Tier::Public,
        destructive: false,
        schema: || schemars::schema_for!(PreviewQueryArgs),
    },
    ToolSpec {
        name: "health_check",
        description: "Report component availability",
        tier: Tier::Public,
        destructive: false,
        schema: || schemars::schema_for!(NoArgs),
    },
    ToolSpec {
        name: "index_status",
        description: "Report document count and storage statistics of the index",
        tier: Tier::Public,
        destructive: false,
        schema: || schemars::schema_for!(NoArgs),
    },
    ToolSpec {
        name: "cache_stats",
        description: "Report cache statistics",
        tier: Tier::Public,
        destructive: false,
        schema: || schemars::schema_for!(NoArgs),
    },
    // Generation
    ToolSpec {
        name: "generate_code",
        description: "Generate a code skeleton grounded in retrieved examples",
        tier: Tier::Developer,
        destructive: false,
        schema: || schemars::schema_for!(GenerateCodeArgs),
    },
    ToolSpec {
        name: "analyze_context",
        description: "Analyze a file's imports, definitions and related chunks",
        tier: Tier::Developer,
        destructive: false,
        schema: || schemars::schema_for!(AnalyzeContextArgs),
    },
    // Feedback
    ToolSpec {
        name: "submit_feedback",
        description: "Submit an explicit 1-5 rating",
        tier: Tier::Developer,
        destructive: false,
        schema: || schemars::schema_for!(SubmitFeedbackArgs),
    },
    ToolSpec {
        name: "track_search_click",
        description: "Record a click on a search result",
        tier: Tier::Developer,
        destructive: false,
        schema: || schemars::schema_for!(TrackClickArgs),
    },
    ToolSpec {
        name: "track_search_outcome",
        description: "Record the outcome of a search session",
        tier: Tier::Developer,
        destructive: false,
        schema: || schemars::schema_for!(TrackOutcomeArgs),
    },
    // Cache
    ToolSpec {
        name: "cache_clear",
        description: "Clear the cache by scope or pattern",
        tier: Tier::Admin,
        destructive: false,
        schema: || schemars::schema_for!(CacheClearArgs),
    },
    // Index administration
    ToolSpec {
        name: "manage_index",
        description: "Ensure, recreate, validate, list or delete indexes",
        tier: Tier::Admin,
        destructive: false,
        schema: || schemars::schema_for!(ManageIndexArgs),
    },
    ToolSpec {
        name: "manage_documents",
        description: "Upload, delete, clean up or count documents",
        tier: Tier::Admin,
        destructive: false,
        schema: || schemars::schema_for!(ManageDocumentsArgs),
    },
    ToolSpec {
        name: "manage_indexer",
        description: "List, run, reset, create or delete indexers",
        tier: Tier::Admin,
        destructive: false,
        schema: || schemars::schema_for!(ManageIndexerArgs),
    },
    ToolSpec {
        name: "create_datasource",
        description: "Create or update a data source",
        tier: Tier::Admin,
        destructive: false,
        schema: || schemars::schema_for!(CreateDatasourceArgs),
    },
    ToolSpec {
        name: "create_skillset",
        description: "Create or update a skillset",
        tier: Tier::Admin,
        destructive: false,
        schema: || schemars::schema_for!(CreateSkillsetArgs),
    },
    ToolSpec {
        name: "rebuild_index",
        description: "Drop and recreate the index from the canonical schema",
        tier: Tier::Admin,
        destructive: true,
        schema: || schemars::schema_for!(RebuildIndexArgs),
    },
    ToolSpec {
        name: "index_repository",
        description: "Walk and index a repository from disk",
        tier: Tier::Admin,
        destructive: false,
        schema: || schemars::schema_for!(IndexRepositoryArgs),
    },
    ToolSpec {
        name: "index_changed_files",
        description: "Re-index an explicit list of changed files",
        tier: Tier::Admin,
        destructive: false,
        schema: || schemars::schema_for!(IndexChangedFilesArgs),
    },
    ToolSpec {
        name: "backfill_embeddings",
        description: "Fill missing content vectors in batches",
        tier: Tier::Admin,
        destructive: false,
        schema: || schemars::schema_for!(BackfillEmbeddingsArgs),
    },
    ToolSpec {
        name: "validate_embeddings",
        description: "Sample documents and report vector coverage",
        tier: Tier::Admin,
        destructive: false,
        schema: || schemars::schema_for!(ValidateEmbeddingsArgs),
    },
    ToolSpec {
        name: "validate_index_schema",
        description: "Validate the live index schema against expectations",
        tier: Tier::Admin,
        destructive: false,
        schema: || schemars::schema_for!(ValidateIndexSchemaArgs),
    },
    ToolSpec {
        name: "backup_index_schema",
        description: "Write the live index schema to a backup file",
        tier: Tier::Admin,
        destructive: false,
        schema: || schemars::schema_for!(BackupIndexSchemaArgs),
    },
    ToolSpec {
        name: "clear_repository_documents",
        description: "Delete every indexed document of one repository",
        tier: Tier::Admin,
        destructive: true,
        schema: || schemars::schema_for!(ClearRepositoryDocumentsArgs),
    },
    ToolSpec {
        name: "configure_semantic_search",
        description: "Configure the semantic ranker's prioritized fields",
        tier: Tier::Admin,
        destructive: false,
        schema: || schemars::schema_for!(ConfigureSemanticSearchArgs),
    },
    // Service management
    ToolSpec {
        name: "get_service_info",
        description: "Report service configuration and component versions",
        tier: Tier::Admin,
        destructive: false,
        schema: || schemars::schema_for!(NoArgs),
    },
];

/// Look up a tool by name
pub fn find_tool(name: &str) -> Option<&'static ToolSpec> {
    ALL_TOOLS.iter().find(|t| t.name == name)
}

/// Tools a principal of `tier` may invoke
pub fn tools_for_tier(tier: Tier) -> Vec<&'static ToolSpec> {
    ALL_TOOLS.iter().filter(|t| tier.meets(t.tier)).collect()
}

/// The MCP `tools/list` payload
pub fn create_tool_list() -> Result<Vec<Tool>, McpError> {
    ALL_TOOLS.iter().map(to_mcp_tool).collect()
}

fn to_mcp_tool(spec: &ToolSpec) -> Result<Tool, McpError> {
    let schema_value = serde_json::to_value(spec.schema())
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    let input_schema = schema_value
        .as_object()
        .ok_or_else(|| {
            McpError::internal_error(format!("schema for {} is not an object", spec.name), None)
        })?
        .clone();

    Ok(Tool {
        name: Cow::Borrowed(spec.name),
        title: None,
        description: Some(Cow::Borrowed(spec.description)),
        input_schema: Arc::new(input_schema),
        output_schema: None,
        annotations: None,
        icons: None,
        meta: Default::default(),
    })
}
