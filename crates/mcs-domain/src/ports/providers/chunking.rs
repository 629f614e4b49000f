//! Code chunker port

use crate::entities::CodeChunk;

/// Port: Code Chunker
///
/// Splits a source file into semantic chunks. For languages with an
/// available grammar, one chunk per top-level function/class (and methods);
/// for everything else, a single whole-file chunk with truncated content and
/// empty structural metadata.
///
/// Chunking is pure CPU work: implementations are synchronous and callers
/// offload to a blocking thread when running inside the event loop. The
/// produced stream is finite and not restartable; chunk ids are stable for
/// the same `(repository, path, start_line)`.
pub trait CodeChunker: Send + Sync {
    /// Chunk one file's content
    fn chunk(&self, content: &str, repository: &str, file_path: &str) -> Vec<CodeChunk>;

    /// Language identifiers this chunker has grammars for
    fn supported_languages(&self) -> &[&'static str];
}
