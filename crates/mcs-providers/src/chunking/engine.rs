//! Chunking engine
//!
//! Dispatches a file to its language's tree-sitter extractor, falling back
//! to pattern-based splitting and finally to a single whole-file chunk.

use chrono::{DateTime, Utc};
use tracing::debug;
use tree_sitter::Parser;

use mcs_domain::constants::language_from_extension;
use mcs_domain::entities::CodeChunk;
use mcs_domain::ports::CodeChunker;

use super::extractor::extract_chunks;
use super::fallback::{chunk_by_patterns, whole_file_chunk};
use super::spec::LanguageSpec;

/// AST-aware chunking engine
#[derive(Default)]
pub struct ChunkingEngine;

impl ChunkingEngine {
    /// Create a new engine
    pub fn new() -> Self {
        Self
    }

    fn chunk_with_grammar(
        spec: &LanguageSpec,
        content: &str,
        repository: &str,
        file_path: &str,
        last_modified: DateTime<Utc>,
    ) -> Vec<CodeChunk> {
        let mut parser = Parser::new();
        if parser.set_language(&spec.language()).is_err() {
            return Vec::new();
        }
        match parser.parse(content, None) {
            Some(tree) => extract_chunks(spec, &tree, content, repository, file_path, last_modified),
            None => Vec::new(),
        }
    }
}

impl CodeChunker for ChunkingEngine {
    fn chunk(&self, content: &str, repository: &str, file_path: &str) -> Vec<CodeChunk> {
        let last_modified = Utc::now();
        let language = language_from_extension(file_path).unwrap_or_default();

        if let Some(spec) = LanguageSpec::for_language(language) {
            let chunks =
                Self::chunk_with_grammar(spec, content, repository, file_path, last_modified);
            if !chunks.is_empty() {
                return chunks;
            }
            let chunks = chunk_by_patterns(
                spec.fallback_patterns,
                content,
                repository,
                file_path,
                language,
                last_modified,
            );
            if !chunks.is_empty() {
                debug!(file_path, "grammar extraction empty; used pattern fallback");
                return chunks;
            }
        }

        whole_file_chunk(content, repository, file_path, last_modified)
            .map(|c| vec![c])
            .unwrap_or_default()
    }

    fn supported_languages(&self) -> &[&'static str] {
        LanguageSpec::supported()
    }
}
