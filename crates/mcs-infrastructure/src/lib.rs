//! MCP Code Search - Infrastructure Layer
//!
//! Cross-cutting concerns: configuration loading, logging setup,
//! authentication services and the request-scoped execution context.

pub mod auth;
pub mod config;
pub mod context;
pub mod logging;

pub use config::{AppConfig, ConfigLoader};
pub use context::RequestContext;
