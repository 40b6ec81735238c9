/// SeeClickFix MCP Server Entry Point
///
/// Reads configuration from environment variables (see `core::config`), builds
/// the Open311 client and tool registry, then serves MCP over the selected
/// transport until stdin closes or the process is interrupted.

mod core;
mod open311;
mod tools;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::core::config::{ServerConfig, TransportMode};
use crate::core::server::{self, McpServer};
use crate::open311::client::SeeClickFixClient;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // stdout carries the STDIO protocol, so logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let client = SeeClickFixClient::new(&config.open311).map_err(std::io::Error::other)?;
    let server = McpServer::new(
        config.name.clone(),
        config.version.clone(),
        server::initialize_tools(Arc::new(client)),
    );

    tracing::info!("Hello from See Click Fix!");

    let result = match config.transport {
        TransportMode::Stdio => {
            tokio::select! {
                result = server::run_server_stdio(server) => result,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupt received, shutting down");
                    Ok(())
                }
            }
        }
        TransportMode::Http => server::run_server_http(server, &config).await,
        TransportMode::Both => {
            // STDIO in the background, HTTP in the foreground
            let stdio_server = server.clone();
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_server_stdio(stdio_server).await {
                    tracing::error!(error = %e, "STDIO server error");
                }
            });

            let http_result = server::run_server_http(server, &config).await;
            stdio_handle.abort();
            http_result
        }
    };

    // Exit explicitly: a pending stdin read would keep the runtime from shutting down
    if let Err(e) = result {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
    std::process::exit(0)
}
