//! Provider-level constants

/// Content type for JSON payloads
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Maximum retry attempts for idempotent search-service calls
pub const SEARCH_MAX_RETRIES: u32 = 3;

/// Base backoff between retries in milliseconds (doubled per attempt)
pub const SEARCH_RETRY_BASE_MS: u64 = 200;

/// Maximum random jitter added to each backoff in milliseconds
pub const SEARCH_RETRY_JITTER_MS: u64 = 100;

/// Maximum chunks extracted from a single file
pub const MAX_CHUNKS_PER_FILE: usize = 50;

/// Minimum characters for an extracted chunk to be worth indexing
pub const MIN_CHUNK_CHARS: usize = 30;

/// Maximum called functions recorded per chunk
pub const MAX_CALLED_FUNCTIONS: usize = 20;

/// Maximum imports recorded per file
pub const MAX_IMPORTS_PER_FILE: usize = 50;

/// AST depth to descend when extracting chunks. Methods sit below their
/// class body, which itself may sit inside an export wrapper, so three
/// levels are needed to reach them.
pub const CHUNK_MAX_DEPTH: usize = 3;
