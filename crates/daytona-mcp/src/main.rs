//! Daytona MCP Server entry point.
//!
//! Starts the MCP server on stdio and HTTP by default.
//!
//! ## Transport Modes
//!
//! - **both** (default): Runs stdio + HTTP simultaneously
//! - **stdio**: Only stdio transport
//! - **http**: Only HTTP transport

use daytona_mcp::{http, DaytonaConfig, DaytonaServer, TransportMode};
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use tokio::signal;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout is the MCP stdio transport
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("daytona_mcp=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Daytona MCP Server");

    let config = DaytonaConfig::from_env();
    tracing::info!(?config, "Configuration loaded");

    config.validate()?;
    config.validate_warn();

    let server = DaytonaServer::new(&config)?;

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let mut handles = Vec::new();

    if config.transport_mode.http_enabled() {
        let http_server = server.clone();
        let http_addr = config.http_addr;
        let mut shutdown_rx = shutdown_tx.subscribe();

        handles.push(tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.recv().await;
            };

            if let Err(e) = http::serve(http_server, http_addr, shutdown).await {
                tracing::error!(error = %e, "HTTP server error");
            }
        }));
        tracing::info!(addr = %config.http_addr, "HTTP transport enabled");
    }

    if config.transport_mode.stdio_enabled() {
        let stdio_server = server.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();

        handles.push(tokio::spawn(async move {
            match stdio_server.serve(stdio()).await {
                Ok(service) => {
                    tokio::select! {
                        result = service.waiting() => {
                            if let Err(e) = result {
                                tracing::error!(error = %e, "Stdio service error");
                            }
                        }
                        _ = async { shutdown_rx.recv().await } => {
                            tracing::info!("Stdio transport shutting down");
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to start stdio transport");
                }
            }
        }));
        tracing::info!("Stdio transport enabled");
    }

    match config.transport_mode {
        TransportMode::Both => {
            tracing::info!(http_addr = %config.http_addr, "Server ready (stdio + HTTP)");
        }
        TransportMode::Http => {
            tracing::info!(http_addr = %config.http_addr, "Server ready (HTTP only)");
        }
        TransportMode::Stdio => {
            tracing::info!("Server ready (stdio only)");
        }
    }

    signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal");

    let _ = shutdown_tx.send(());

    for handle in handles {
        let _ = handle.await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}
