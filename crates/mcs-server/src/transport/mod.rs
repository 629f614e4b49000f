//! Transports
//!
//! Local stdio (MCP framing via the SDK) and remote HTTP + SSE. Both
//! present the same tool surface and the same response envelope.

pub mod http;
pub mod stdio;
