//! Tool registry and dispatch
//!
//! The registry is the single source of truth for tool names, tiers,
//! schemas and destructiveness; the router enforces the access rules and
//! produces the response envelope.

mod registry;
mod router;

pub use registry::{create_tool_list, find_tool, tools_for_tier, ToolSpec, ALL_TOOLS};
pub use router::dispatch_tool;
