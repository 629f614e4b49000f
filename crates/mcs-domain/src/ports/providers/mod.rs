//! Provider ports
//!
//! Contracts for systems external to the process: the search service REST
//! API, the embedding model, the query cache and the code chunker.

mod cache;
mod chunking;
mod embedding;
mod search_service;

pub use cache::{CacheProvider, CacheStats};
pub use chunking::CodeChunker;
pub use embedding::EmbeddingProvider;
pub use search_service::{
    BatchResult, DataSource, DocumentAction, DocumentBatch, IndexStats, IndexerRunState,
    IndexerStatus, SearchHit, SearchRequest, SearchResults, SearchServiceClient, Skillset,
    VectorQuery,
};
