//! Pattern and whole-file fallback chunking
//!
//! Used when no grammar is available or parsing produced nothing: split at
//! declaration-looking line starts, or index the whole file as one truncated
//! chunk with empty structural metadata.

use chrono::{DateTime, Utc};
use regex::Regex;

use mcs_domain::constants::FALLBACK_CHUNK_MAX_CHARS;
use mcs_domain::entities::CodeChunk;

use crate::constants::{MAX_CHUNKS_PER_FILE, MIN_CHUNK_CHARS};

/// Split content at lines matching any of the given patterns
pub fn chunk_by_patterns(
    patterns: &[&str],
    content: &str,
    repository: &str,
    file_path: &str,
    language: &str,
    last_modified: DateTime<Utc>,
) -> Vec<CodeChunk> {
    let regexes: Vec<Regex> = patterns.iter().filter_map(|p| Regex::new(p).ok()).collect();
    if regexes.is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = content.lines().collect();
    let mut boundaries: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| regexes.iter().any(|r| r.is_match(line)))
        .map(|(i, _)| i)
        .collect();
    if boundaries.is_empty() {
        return Vec::new();
    }
    boundaries.push(lines.len());

    let mut chunks = Vec::new();
    for window in boundaries.windows(2) {
        let (start, end) = (window[0], window[1]);
        let text = lines[start..end].join("\n");
        let trimmed = text.trim();
        if trimmed.len() < MIN_CHUNK_CHARS {
            continue;
        }
        let mut chunk = CodeChunk::new(
            repository,
            file_path,
            start as u32 + 1,
            end as u32,
            trimmed,
            last_modified,
        );
        chunk.language = language.to_string();
        chunks.push(chunk);
        if chunks.len() >= MAX_CHUNKS_PER_FILE {
            break;
        }
    }
    chunks
}

/// Index the whole file as a single chunk with truncated content
pub fn whole_file_chunk(
    content: &str,
    repository: &str,
    file_path: &str,
    last_modified: DateTime<Utc>,
) -> Option<CodeChunk> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    let truncated: String = trimmed.chars().take(FALLBACK_CHUNK_MAX_CHARS).collect();
    let end_line = content.lines().count().max(1) as u32;
    Some(CodeChunk::new(
        repository,
        file_path,
        1,
        end_line,
        truncated,
        last_modified,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_chunking_splits_at_declarations() {
        let source = "def first():\n    return 1 + 2 + 3 + 4\n\ndef second():\n    return 'a longer body here'\n";
        let chunks = chunk_by_patterns(
            &[r"^def "],
            source,
            "repo",
            "script.py",
            "python",
            Utc::now(),
        );
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].start_line, 1);
        assert!(chunks[0].content.starts_with("def first"));
        assert!(chunks[1].content.starts_with("def second"));
    }

    #[test]
    fn no_matches_yields_nothing() {
        let chunks = chunk_by_patterns(
            &[r"^def "],
            "plain text without declarations",
            "repo",
            "notes.txt",
            "",
            Utc::now(),
        );
        assert!(chunks.is_empty());
    }

    #[test]
    fn whole_file_chunk_truncates_and_spans_all_lines() {
        let content = "x\n".repeat(100);
        let chunk = whole_file_chunk(&content, "repo", "data.txt", Utc::now()).unwrap();
        assert_eq!(chunk.start_line, 1);
        assert_eq!(chunk.end_line, 100);
        assert!(chunk.content.len() <= FALLBACK_CHUNK_MAX_CHARS);
        assert!(chunk.imports.is_empty());
        assert!(chunk.function_name.is_none());
    }

    #[test]
    fn empty_files_produce_no_chunk() {
        assert!(whole_file_chunk("   \n  ", "repo", "empty.txt", Utc::now()).is_none());
    }
}
