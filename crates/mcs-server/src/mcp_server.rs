//! MCP protocol server
//!
//! Implements the MCP `ServerHandler` over the shared dispatcher. Tool
//! responses carry the standard envelope as JSON text content, so stdio and
//! HTTP callers see identical payloads.

use std::sync::Arc;

use rmcp::model::{
    CallToolResult, Content, Implementation, ListToolsResult, PaginatedRequestParam,
    ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::ErrorData as McpError;
use rmcp::ServerHandler;
use serde_json::Value;

use mcs_domain::value_objects::Principal;

use crate::init::AppState;
use crate::tools::{create_tool_list, dispatch_tool};

/// Core MCP server implementation
#[derive(Clone)]
pub struct McpServer {
    state: Arc<AppState>,
}

impl McpServer {
    /// Create a server over the shared application state
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Shared application state (for transports)
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "MCP Code Search".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "MCP Code Search - Retrieval-augmented code search\n\n\
                 Search indexed repositories, explain rankings, generate\n\
                 grounded code and manage the search index.\n\n\
                 Local stdio callers run at the public tier; enable\n\
                 server.dev_mode for local admin access, or connect over\n\
                 HTTP with credentials.\n"
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _pagination: Option<PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = create_tool_list()?;
        Ok(ListToolsResult {
            tools,
            meta: Default::default(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: rmcp::model::CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let args = Value::Object(request.arguments.clone().unwrap_or_default());
        // Stdio carries no credentials: callers are public unless dev mode
        // substitutes the synthetic admin inside the dispatcher.
        let envelope =
            dispatch_tool(&self.state, request.name.as_ref(), args, Principal::anonymous()).await;
        let text = serde_json::to_string(&envelope)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}
