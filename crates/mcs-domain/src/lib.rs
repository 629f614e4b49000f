//! MCP Code Search - Domain Layer
//!
//! Core business types and contracts for the code search and retrieval
//! service. This crate has no knowledge of transports, configuration
//! sources or concrete providers; it defines the entities, value objects
//! and port traits the outer layers implement.

pub mod constants;
pub mod entities;
pub mod error;
pub mod ports;
pub mod value_objects;

pub use error::{Error, ErrorCode, Result};
