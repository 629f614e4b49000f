//! MCP Code Search - Provider Layer
//!
//! Concrete implementations of the domain's provider ports: the external
//! search service REST client, the TTL/LRU query cache, embedding providers
//! and the tree-sitter chunking engine.

pub mod cache;
pub mod chunking;
pub mod constants;
pub mod embedding;
pub mod search;
