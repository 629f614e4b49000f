//! MCP Code Search server binary
//!
//! Runs the MCP tool surface over stdio (default) or as an HTTP daemon
//! (`--server`). Configuration merges defaults, an optional TOML file and
//! `MCS__`-prefixed environment variables.

use clap::Parser;

/// Command line interface for MCP Code Search
#[derive(Parser, Debug)]
#[command(name = "mcs")]
#[command(about = "MCP Code Search - Retrieval-augmented code search server")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<std::path::PathBuf>,

    /// Run as an HTTP daemon instead of serving MCP over stdio
    #[arg(long, help = "Run the HTTP + SSE transport")]
    pub server: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    mcs_server::run(cli.config.as_deref(), cli.server).await
}
