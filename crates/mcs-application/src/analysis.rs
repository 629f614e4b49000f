//! File context analysis
//!
//! Backs the `analyze_context` tool: chunk the file, summarize its imports
//! and definitions, and optionally pull related indexed chunks through the
//! search client.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mcs_domain::constants::language_from_extension;
use mcs_domain::error::{Error, Result};
use mcs_domain::ports::{CodeChunker, SearchRequest, SearchServiceClient};

/// One definition found in the analyzed file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionSummary {
    /// Function or class name
    pub name: String,
    /// `function` or `class`
    pub kind: String,
    /// First line of the definition
    pub start_line: u32,
    /// Last line of the definition
    pub end_line: u32,
    /// Declaration signature, when extracted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// A related chunk retrieved from the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedChunk {
    /// Document id
    pub id: String,
    /// Repository the chunk came from
    pub repository: String,
    /// File path of the chunk
    pub file_path: String,
    /// Raw relevance score from the service
    pub score: f64,
}

/// Full context report for one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextReport {
    /// Analyzed file path
    pub file_path: String,
    /// Detected language ("" when unknown)
    pub language: String,
    /// Lines in the file
    pub line_count: usize,
    /// File-level imports
    pub imports: Vec<String>,
    /// Definitions in source order
    pub definitions: Vec<DefinitionSummary>,
    /// Related indexed chunks, when dependency lookup was requested
    #[serde(default)]
    pub related: Vec<RelatedChunk>,
}

/// File context analyzer
pub struct ContextAnalyzer {
    chunker: Arc<dyn CodeChunker>,
    client: Arc<dyn SearchServiceClient>,
    index_name: String,
}

impl ContextAnalyzer {
    /// Create an analyzer querying `index_name` for related chunks
    pub fn new(
        chunker: Arc<dyn CodeChunker>,
        client: Arc<dyn SearchServiceClient>,
        index_name: impl Into<String>,
    ) -> Self {
        Self {
            chunker,
            client,
            index_name: index_name.into(),
        }
    }

    /// Analyze a file on disk
    pub async fn analyze(
        &self,
        file_path: &Path,
        include_dependencies: bool,
        depth: usize,
    ) -> Result<ContextReport> {
        let content = tokio::fs::read_to_string(file_path)
            .await
            .map_err(|_| Error::not_found(format!("file {}", file_path.display())))?;
        let path_str = file_path.to_string_lossy().replace('\\', "/");

        let chunker = Arc::clone(&self.chunker);
        let chunk_path = path_str.clone();
        let chunks = tokio::task::spawn_blocking(move || {
            chunker.chunk(&content, "workspace", &chunk_path)
        })
        .await
        .map_err(|e| Error::internal(format!("chunking task failed: {e}")))?;

        let imports = chunks
            .first()
            .map(|c| c.imports.clone())
            .unwrap_or_default();

        let mut definitions: Vec<DefinitionSummary> = chunks
            .iter()
            .filter_map(|c| {
                let (name, kind) = match (&c.function_name, &c.class_name) {
                    (Some(function), _) => (function.clone(), "function"),
                    (None, Some(class)) => (class.clone(), "class"),
                    (None, None) => return None,
                };
                Some(DefinitionSummary {
                    name,
                    kind: kind.to_string(),
                    start_line: c.start_line,
                    end_line: c.end_line,
                    signature: c.signature.clone(),
                })
            })
            .collect();
        definitions.sort_by_key(|d| d.start_line);

        let related = if include_dependencies && !imports.is_empty() {
            self.related_chunks(&path_str, &imports, depth).await
        } else {
            Vec::new()
        };

        Ok(ContextReport {
            file_path: path_str,
            language: language_from_extension(&file_path.to_string_lossy())
                .unwrap_or_default()
                .to_string(),
            line_count: chunks.iter().map(|c| c.end_line as usize).max().unwrap_or(0),
            imports,
            definitions,
            related,
        })
    }

    /// Look up indexed chunks related through the import graph
    async fn related_chunks(
        &self,
        own_path: &str,
        imports: &[String],
        depth: usize,
    ) -> Vec<RelatedChunk> {
        let limit = (depth.clamp(1, 3)) * 5;
        let terms: Vec<&str> = imports
            .iter()
            .take(5)
            .map(|i| i.as_str())
            .collect();
        let request = SearchRequest {
            search_text: Some(terms.join(" ")),
            top: limit,
            skip: 0,
            include_total_count: false,
            ..SearchRequest::default()
        };
        let Ok(results) = self.client.search(&self.index_name, &request).await else {
            return Vec::new();
        };
        results
            .hits
            .into_iter()
            .filter_map(|hit| {
                let doc = hit.document.as_object()?;
                let file_path = doc.get("file_path")?.as_str()?.to_string();
                if file_path == own_path {
                    return None;
                }
                Some(RelatedChunk {
                    id: doc.get("id")?.as_str()?.to_string(),
                    repository: doc
                        .get("repository")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    file_path,
                    score: hit.score,
                })
            })
            .collect()
    }
}
