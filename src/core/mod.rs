/// Core Server Framework Module
///
/// - config.rs: configuration from environment variables
/// - protocol.rs: JSON-RPC structures, error codes and tool errors
/// - server.rs: MCP server implementation with HTTP and STDIO transport

pub mod config;
pub mod protocol;
pub mod server;
