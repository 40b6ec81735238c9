/// Tools Module
///
/// MCP tool implementations. Each tool module exports a `register` function
/// that adds the tool to the registry during server initialization.

pub mod get_requests;
