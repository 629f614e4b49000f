//! Domain-wide constants
//!
//! Limits and defaults shared across layers. Values mirror the invariants of
//! the search query contract and the external index schema.

/// Maximum accepted query length in characters (after trimming)
pub const MAX_QUERY_CHARS: usize = 1000;

/// Maximum accepted query length in words
pub const MAX_QUERY_WORDS: usize = 100;

/// Upper bound for `max_results` on a single search request
pub const MAX_RESULTS_LIMIT: usize = 30;

/// Default `max_results` when the caller does not specify one
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Upper bound for the pagination `skip` parameter
pub const MAX_SKIP: usize = 10_000;

/// Reciprocal-rank-fusion constant (standard RRF k)
pub const RRF_K: f64 = 60.0;

/// Default embedding batch size
pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 16;

/// Default dimensionality of the content vector field
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

/// Default search deadline in seconds
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;

/// Default embedding deadline in seconds (shorter than search)
pub const DEFAULT_EMBEDDING_TIMEOUT_SECS: u64 = 10;

/// Default cache TTL in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default maximum cache entry count
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1000;

/// Upper bound for a document upload batch
pub const MAX_UPLOAD_BATCH: usize = 1000;

/// Truncation length for whole-file fallback chunks
pub const FALLBACK_CHUNK_MAX_CHARS: usize = 8000;

/// Languages the chunker and index recognise; anything else indexes as ""
pub const KNOWN_LANGUAGES: &[&str] = &[
    "rust",
    "python",
    "javascript",
    "typescript",
    "go",
    "java",
    "c",
    "cpp",
    "csharp",
    "ruby",
    "php",
    "swift",
    "kotlin",
];

/// Infer a language identifier from a file extension
pub fn language_from_extension(path: &str) -> Option<&'static str> {
    let ext = path.rsplit('.').next()?;
    match ext {
        "rs" => Some("rust"),
        "py" | "pyi" => Some("python"),
        "js" | "mjs" | "cjs" | "jsx" => Some("javascript"),
        "ts" | "tsx" | "mts" => Some("typescript"),
        "go" => Some("go"),
        "java" => Some("java"),
        "c" | "h" => Some("c"),
        "cc" | "cpp" | "cxx" | "hpp" => Some("cpp"),
        "cs" => Some("csharp"),
        "rb" => Some("ruby"),
        "php" => Some("php"),
        "swift" => Some("swift"),
        "kt" | "kts" => Some("kotlin"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_mapping_covers_known_languages() {
        assert_eq!(language_from_extension("src/main.rs"), Some("rust"));
        assert_eq!(language_from_extension("app/views.py"), Some("python"));
        assert_eq!(language_from_extension("index.tsx"), Some("typescript"));
        assert_eq!(language_from_extension("README.md"), None);
        assert_eq!(language_from_extension("Makefile"), None);
    }

    #[test]
    fn inferred_languages_are_known() {
        for ext in ["rs", "py", "js", "ts", "go", "java", "rb"] {
            let lang = language_from_extension(&format!("f.{ext}")).unwrap();
            assert!(KNOWN_LANGUAGES.contains(&lang));
        }
    }
}
