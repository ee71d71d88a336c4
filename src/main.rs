//! gmail-bridge server binary
//!
//! Runs the stdio tool-protocol server. Credentials are resolved per
//! tool call, so the process starts without any; see the library docs
//! for the supported credential sources.

use clap::Parser;

use gmail_bridge::error::Result;
use gmail_bridge::mcp::server::McpServer;

/// Gmail tool-protocol server
#[derive(Parser)]
#[command(name = "gmail-bridge")]
#[command(author, version, about = "Gmail tool server speaking the Model Context Protocol over stdio")]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout carries protocol frames; all logging goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let _cli = Cli::parse();

    let mut server = McpServer::new();
    server.run_stdio().await?;

    Ok(())
}
