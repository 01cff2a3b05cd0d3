//! HTTP transport for remote AI agents.
//!
//! Exposes the MCP protocol via rmcp's StreamableHttpService.
//!
//! ## Endpoints
//!
//! - `POST /mcp` - JSON-RPC requests
//! - `GET /mcp` - SSE stream for server-initiated messages
//! - `GET /health` - Health check
//! - `GET /` - Server info

use crate::server::DaytonaServer;
use axum::{
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the HTTP router for the MCP server.
pub fn build_router(server: DaytonaServer) -> Router {
    let session_manager = Arc::new(LocalSessionManager::default());

    let mcp_service = StreamableHttpService::new(
        move || Ok(server.clone()),
        session_manager,
        StreamableHttpServerConfig::default(),
    );

    Router::new()
        .route("/health", get(health_handler))
        .route("/", get(root_handler))
        .fallback_service(mcp_service)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> impl IntoResponse {
    tracing::trace!("Health check request");
    Json(serde_json::json!({
        "status": "healthy",
        "service": "daytona-mcp",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn root_handler() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Daytona MCP Server</title>
    <style>
        body { font-family: system-ui; max-width: 800px; margin: 50px auto; padding: 20px; }
        code { background: #f4f4f4; padding: 2px 6px; border-radius: 3px; }
        pre { background: #f4f4f4; padding: 16px; border-radius: 6px; overflow-x: auto; }
    </style>
</head>
<body>
    <h1>Daytona MCP Server</h1>
    <p>Model Context Protocol server for remote Daytona sandboxes.</p>

    <h2>Endpoints</h2>
    <ul>
        <li><code>POST /mcp</code> - MCP JSON-RPC requests</li>
        <li><code>GET /mcp</code> - SSE stream for server messages</li>
        <li><code>GET /health</code> - Health check</li>
    </ul>

    <h2>Example</h2>
    <pre>curl -X POST http://localhost:8080/mcp \
  -H "Content-Type: application/json" \
  -d '{"jsonrpc":"2.0","id":1,"method":"tools/list"}'</pre>

    <h2>Tool Groups</h2>
    <ul>
        <li>Sandboxes: <code>list_sandboxes</code>, <code>create_sandbox</code>, <code>start_sandbox</code>, <code>stop_sandbox</code>, ...</li>
        <li>Commands: <code>execute_command</code>, <code>create_session</code>, <code>execute_session_command</code>, <code>get_session_command</code>, ...</li>
        <li>Files: <code>list_files</code>, <code>download_file</code>, <code>upload_file</code>, <code>find_in_files</code>, ...</li>
    </ul>
</body>
</html>"#,
    )
}

/// Start the HTTP server.
///
/// Runs until `shutdown` resolves.
pub async fn serve(
    server: DaytonaServer,
    addr: std::net::SocketAddr,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let router = build_router(server);

    tracing::info!(%addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
