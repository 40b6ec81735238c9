/// MCP Server Implementation
///
/// This module contains the core MCP server implementation including:
/// - Tool registry for managing available tools
/// - Request dispatch for the MCP protocol methods
/// - HTTP server setup with Actix Web
/// - STDIO server implementation for line-based communication

use actix_web::{
    App, HttpResponse, HttpServer, Result,
    middleware::{Compress, DefaultHeaders, Logger},
    web,
};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::{Value, json};
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::config::ServerConfig;
use crate::core::protocol::{ErrorCode, McpError, McpRequest, McpResponse, PROTOCOL_VERSION, ToolError};
use crate::open311::client::RequestSource;
use crate::tools;

/// MCP tool definition structure.
///
/// Serialized as-is in `tools/list` responses.
#[derive(Serialize, Debug, Clone)]
pub struct McpTool {
    /// Unique tool identifier (e.g., "get_requests")
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema defining the tool's input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Tool handler function type definition.
///
/// Handlers take the JSON arguments of a `tools/call` and resolve to the text
/// payload or a [`ToolError`]. They must be Send + Sync to be shared across
/// HTTP workers.
pub type ToolHandler = Box<dyn Fn(Value) -> BoxFuture<'static, Result<String, ToolError>> + Send + Sync>;

/// Registry of available MCP tools.
///
/// Keeps the tool definitions for discovery and a map of tool names to their
/// handlers for execution.
pub struct ToolRegistry {
    /// List of all registered tools (for tools/list method)
    pub tools: Vec<McpTool>,
    /// Map of tool names to their handler functions (for tools/call method)
    pub handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Add the tool definition to the list and store its handler.
    pub fn register(&mut self, tool: McpTool, handler: ToolHandler) {
        let name = tool.name.clone();
        self.tools.push(tool);
        self.handlers.insert(name, handler);
    }
}

/// Create the tool registry with every tool this server offers.
pub fn initialize_tools(source: Arc<dyn RequestSource>) -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    tools::get_requests::register(&mut registry, source);
    Arc::new(registry)
}

/// Server context shared by both transports.
///
/// Holds no mutable state: every call is handled independently.
#[derive(Clone)]
pub struct McpServer {
    /// Server name as reported in MCP initialize responses
    pub name: String,
    /// Server version string as reported in MCP initialize responses
    pub version: String,
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            registry,
        }
    }

    /// Route one JSON-RPC message. Notifications yield no response.
    pub async fn handle(&self, req: McpRequest) -> Option<McpResponse> {
        if req.is_notification() {
            tracing::debug!(method = %req.method, "Notification received");
            return None;
        }

        let id = req.id;
        let response = match req.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => McpResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, req.params).await,
            other => McpResponse::failure(
                id,
                McpError::new(ErrorCode::MethodNotFound, format!("Method not found: {}", other)),
            ),
        };
        Some(response)
    }

    /// Handle MCP initialize method.
    ///
    /// Returns the protocol version, server capabilities, and server information.
    fn handle_initialize(&self, id: Option<Value>) -> McpResponse {
        McpResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": self.name,
                    "version": self.version
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Option<Value>) -> McpResponse {
        McpResponse::success(id, json!({ "tools": self.registry.tools }))
    }

    /// Handle MCP tools/call method.
    ///
    /// Tool failures become JSON-RPC errors carrying the code of their kind.
    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> McpResponse {
        let Some(params) = params else {
            return McpResponse::failure(id, McpError::new(ErrorCode::InvalidParams, "Invalid params"));
        };

        let tool_name = params.get("name").and_then(Value::as_str).unwrap_or("");
        // Arguments default to an empty object if not provided
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        match self.call_tool(tool_name, arguments).await {
            Ok(text) => McpResponse::success(
                id,
                json!({
                    "content": [
                        {
                            "type": "text",
                            "text": text
                        }
                    ]
                }),
            ),
            Err(e) => {
                tracing::warn!(tool = tool_name, error = %e, "Tool call failed");
                McpResponse::failure(id, e.into())
            }
        }
    }

    /// Look up and run a tool. A panicking tool is reported as
    /// [`ToolError::Unexpected`] instead of taking the server down.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        let handler = self
            .registry
            .handlers
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        match AssertUnwindSafe(async move { handler(arguments).await }).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(tool = name, panic = ?message, "Tool panicked");
                Err(ToolError::Unexpected(message))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
}

/// Health check endpoint handler.
async fn health(server: web::Data<McpServer>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": server.name
    })))
}

/// Metrics endpoint handler: JSON-RPC requests served since start.
async fn metrics_handler(counter: web::Data<AtomicU64>) -> Result<HttpResponse> {
    let count = counter.load(Ordering::Relaxed);
    Ok(HttpResponse::Ok().json(json!({
        "requests_total": count,
        "status": "ok"
    })))
}

/// MCP JSON-RPC request handler for HTTP mode.
async fn mcp_handler(
    server: web::Data<McpServer>,
    counter: web::Data<AtomicU64>,
    req: web::Json<McpRequest>,
) -> Result<HttpResponse> {
    // Only atomicity is needed, not ordering with other operations
    counter.fetch_add(1, Ordering::Relaxed);

    Ok(match server.handle(req.into_inner()).await {
        Some(response) => HttpResponse::Ok().json(response),
        None => HttpResponse::Accepted().finish(),
    })
}

/// Route table for HTTP mode.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics_handler))
        .route("/mcp", web::post().to(mcp_handler))
        .route("/", web::post().to(mcp_handler))
        .route("/", web::get().to(health));
}

/// Run the MCP server in HTTP mode.
///
/// # Configuration
/// - Worker threads: from config (CPU count, max 16, by default)
/// - Max connections: 10,000 concurrent connections
/// - Connection rate limit: 1,000 connections per second
/// - Keep-alive and client request timeout: 30 seconds
/// - Shutdown timeout: 10 seconds
///
/// Actix installs its own signal handling; the future resolves once the
/// server has stopped.
pub async fn run_server_http(server: McpServer, config: &ServerConfig) -> std::io::Result<()> {
    use std::time::Duration;

    let bind_addr = format!("{}:{}", config.host, config.port);

    tracing::info!(
        name = %server.name,
        version = %server.version,
        bind = %bind_addr,
        workers = config.workers,
        "MCP Server Starting (HTTP mode)"
    );

    let server = web::Data::new(server);
    let request_count = web::Data::new(AtomicU64::new(0));

    HttpServer::new(move || {
        App::new()
            .app_data(server.clone())
            .app_data(request_count.clone())
            // Enable compression for JSON responses (gzip/brotli)
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
            )
            // %r = request line, %s = status, %Dms = duration in milliseconds
            .wrap(Logger::new("%r %s %Dms"))
            .configure(routes)
    })
    .workers(config.workers)
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}

/// Handle one line of the STDIO stream.
///
/// A line that is not a valid request gets a parse error response only when
/// an id can be recovered from it.
pub async fn handle_line(server: &McpServer, line: &str) -> Option<McpResponse> {
    if line.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<McpRequest>(line) {
        Ok(req) => server.handle(req).await,
        Err(e) => {
            tracing::warn!(error = %e, "Parse error");
            let id = serde_json::from_str::<Value>(line).ok()?.get("id")?.clone();
            Some(McpResponse::failure(
                Some(id),
                McpError::new(ErrorCode::ParseError, format!("Parse error: {}", e)),
            ))
        }
    }
}

/// Run the MCP server in STDIO mode.
///
/// Reads JSON-RPC requests line-by-line from stdin and writes one response
/// line per request to stdout. Requests are processed one at a time and stdout
/// is flushed after each response. Returns when stdin is closed.
pub async fn run_server_stdio(server: McpServer) -> std::io::Result<()> {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

    tracing::info!(
        name = %server.name,
        version = %server.version,
        "MCP Server Starting (STDIO mode)"
    );

    let mut stdin = BufReader::with_capacity(8192, tokio::io::stdin()).lines();
    let mut stdout = BufWriter::with_capacity(8192, tokio::io::stdout());

    while let Some(line) = stdin.next_line().await? {
        let Some(response) = handle_line(&server, &line).await else {
            continue;
        };

        let response_json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Error serializing response");
                continue;
            }
        };

        // Each response must be on a single line followed by newline
        stdout.write_all(response_json.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    tracing::info!("stdin closed, STDIO server stopping");
    Ok(())
}
