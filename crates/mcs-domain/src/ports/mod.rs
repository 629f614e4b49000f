//! Domain Ports
//!
//! Contracts implemented by the outer layers. Provider ports wrap external
//! systems (search service, embedding model, cache, parser); infrastructure
//! ports wrap cross-cutting services (auth, sessions, feedback).

pub mod infrastructure;
pub mod providers;

pub use infrastructure::{AuthProvider, FeedbackSink, MagicLinkTicket, SessionStore, WeightsSource};
pub use providers::{
    BatchResult, CacheProvider, CacheStats, CodeChunker, DataSource, DocumentAction,
    DocumentBatch, EmbeddingProvider, IndexStats, IndexerRunState, IndexerStatus,
    SearchHit, SearchRequest, SearchResults, SearchServiceClient, Skillset, VectorQuery,
};
