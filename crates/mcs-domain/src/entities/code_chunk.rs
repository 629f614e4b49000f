//! Code chunk entity
//!
//! A coherent code fragment (function, class or whole file) indexed as a
//! single document in the external search service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::language_from_extension;

/// Entity: Indexed Code Chunk
///
/// Identity is a stable hash of `(repository, file_path, start_line)` so that
/// re-indexing the same location updates the existing document instead of
/// duplicating it.
///
/// Invariants:
/// - `end_line >= start_line >= 1`
/// - when `content_vector` is present its length equals the index's declared
///   dimensionality
/// - `language` is inferred from the file extension when not supplied
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeChunk {
    /// Stable document key
    pub id: String,
    /// Repository the chunk was indexed from
    pub repository: String,
    /// Path of the source file within the repository
    pub file_path: String,
    /// Programming language identifier ("" when unknown)
    #[serde(default)]
    pub language: String,
    /// First line of the chunk (1-based)
    pub start_line: u32,
    /// Last line of the chunk (inclusive, `>= start_line`)
    pub end_line: u32,
    /// The chunk source text
    pub content: String,
    /// Declaration signature, when the chunker could extract one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Imports declared in the containing file
    #[serde(default)]
    pub imports: Vec<String>,
    /// Function names called inside the chunk
    #[serde(default)]
    pub called_functions: Vec<String>,
    /// Enclosing or defined function name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    /// Enclosing or defined class name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Documentation comment attached to the declaration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    /// Free-form tags used by scoring profiles
    #[serde(default)]
    pub tags: Vec<String>,
    /// Last modification time of the source file
    pub last_modified: DateTime<Utc>,
    /// Embedding of `content`, populated by the backfill or indexing path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_vector: Option<Vec<f32>>,
}

impl CodeChunk {
    /// Compute the stable document id for a chunk location.
    ///
    /// The same `(repository, file_path, start_line)` always yields the same
    /// id across re-indexing runs.
    pub fn stable_id(repository: &str, file_path: &str, start_line: u32) -> String {
        let mut hasher = Sha256::new();
        hasher.update(repository.as_bytes());
        hasher.update(b"|");
        hasher.update(file_path.as_bytes());
        hasher.update(b"|");
        hasher.update(start_line.to_string().as_bytes());
        let digest = hasher.finalize();
        hex::encode(&digest[..16])
    }

    /// Create a chunk with a computed id and inferred language.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository: impl Into<String>,
        file_path: impl Into<String>,
        start_line: u32,
        end_line: u32,
        content: impl Into<String>,
        last_modified: DateTime<Utc>,
    ) -> Self {
        let repository = repository.into();
        let file_path = file_path.into();
        let language = language_from_extension(&file_path)
            .unwrap_or_default()
            .to_string();
        Self {
            id: Self::stable_id(&repository, &file_path, start_line),
            repository,
            file_path,
            language,
            start_line: start_line.max(1),
            end_line: end_line.max(start_line.max(1)),
            content: content.into(),
            signature: None,
            imports: Vec::new(),
            called_functions: Vec::new(),
            function_name: None,
            class_name: None,
            docstring: None,
            tags: Vec::new(),
            last_modified,
            content_vector: None,
        }
    }

    /// Whether the line invariant holds
    pub fn lines_valid(&self) -> bool {
        self.start_line >= 1 && self.end_line >= self.start_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_id_is_deterministic() {
        let a = CodeChunk::stable_id("repo", "src/lib.rs", 42);
        let b = CodeChunk::stable_id("repo", "src/lib.rs", 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn stable_id_differs_per_location() {
        let a = CodeChunk::stable_id("repo", "src/lib.rs", 42);
        let b = CodeChunk::stable_id("repo", "src/lib.rs", 43);
        let c = CodeChunk::stable_id("other", "src/lib.rs", 42);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn new_infers_language_and_clamps_lines() {
        let chunk = CodeChunk::new("repo", "src/main.rs", 0, 0, "fn main() {}", Utc::now());
        assert_eq!(chunk.language, "rust");
        assert!(chunk.lines_valid());
        assert_eq!(chunk.start_line, 1);
        assert_eq!(chunk.end_line, 1);
    }

    #[test]
    fn unknown_extension_indexes_with_empty_language() {
        let chunk = CodeChunk::new("repo", "notes.txt", 1, 3, "text", Utc::now());
        assert_eq!(chunk.language, "");
    }
}
