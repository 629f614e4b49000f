//! Stdio transport
//!
//! Serves the MCP protocol over stdin/stdout. One in-flight request at a
//! time is typical for editor integrations, but the handler is safe under
//! concurrency.

use std::sync::Arc;

use rmcp::transport::stdio;
use rmcp::ServiceExt;
use tracing::info;

use crate::init::AppState;
use crate::mcp_server::McpServer;

/// Serve MCP over stdio until the client disconnects
pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    info!("stdio transport starting");
    let server = McpServer::new(state);
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    info!("stdio transport stopped");
    Ok(())
}
