//! External search service client
//!
//! Thin, typed wrapper over the search service's REST API plus the
//! process-wide client pool. No business logic lives here: retries,
//! status-code mapping and wire-format translation only.

mod client;
mod in_memory;
mod pool;

pub use client::RestSearchClient;
pub use in_memory::InMemorySearchService;
pub use pool::ClientPool;
