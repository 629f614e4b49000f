//! MCP Code Search - Server Layer
//!
//! The tool surface and its transports: a tier-checked dispatcher, the MCP
//! stdio server and the HTTP/SSE server, all returning the same response
//! envelope.

pub mod args;
pub mod envelope;
pub mod formatter;
pub mod handlers;
pub mod init;
pub mod mcp_server;
pub mod tools;
pub mod transport;

pub use init::{AppState, ServerRuntime};
pub use mcp_server::McpServer;

use std::path::Path;

use mcs_infrastructure::config::ConfigLoader;
use mcs_infrastructure::logging;

/// Load configuration, start the runtime and serve the selected transport
pub async fn run(config_path: Option<&Path>, server_mode: bool) -> anyhow::Result<()> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = config_path {
        loader = loader.with_config_path(path);
    }
    let config = loader.load()?;
    logging::init(&config.logging);

    let mut runtime = ServerRuntime::start(config).await?;
    let state = runtime.state.clone();
    let served = if server_mode {
        transport::http::serve(state).await
    } else {
        transport::stdio::serve(state).await
    };
    runtime.shutdown().await;
    served
}
