/// MCP Protocol Types
///
/// JSON-RPC 2.0 request/response structures used by both transports, the
/// error codes this server emits, and the error taxonomy of tool execution.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// MCP protocol revision announced in `initialize` responses.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 request structure for MCP protocol.
///
/// The jsonrpc field must be "2.0", id is optional (None for notifications),
/// method specifies the MCP method to call, and params contains
/// method-specific parameters.
#[derive(Deserialize, Debug, Clone)]
pub struct McpRequest {
    /// JSON-RPC version identifier, must be "2.0"
    #[allow(dead_code)]
    pub jsonrpc: String,
    /// Request ID for correlating responses. None indicates a notification.
    #[serde(default)]
    pub id: Option<Value>,
    /// MCP method name (e.g., "initialize", "tools/list", "tools/call")
    pub method: String,
    /// Method-specific parameters as JSON value
    #[serde(default)]
    pub params: Option<Value>,
}

impl McpRequest {
    /// Requests without an id are notifications and never get a response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response structure for MCP protocol.
///
/// Responses carry the request id and either a result or an error, never both.
#[derive(Serialize, Debug)]
pub struct McpResponse {
    /// JSON-RPC version identifier, always "2.0"
    pub jsonrpc: String,
    /// Request ID from the original request
    pub id: Option<Value>,
    /// Response result, present when request succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error information, present when request failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

impl McpResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, error: McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC error codes emitted by this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError = -32700,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
}

/// JSON-RPC 2.0 error structure.
#[derive(Serialize, Debug, Clone)]
pub struct McpError {
    /// JSON-RPC error code (e.g., -32601 for method not found)
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Optional additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl McpError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: None,
        }
    }
}

/// Failure of a single `tools/call` invocation.
///
/// Every variant is terminal for the call; the server keeps serving.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The caller omitted or mistyped a required argument.
    #[error("{0}")]
    InvalidParams(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The upstream API returned nothing usable. The cause is only logged.
    #[error("Failed to fetch requests from SeeClickFix API")]
    UpstreamUnavailable,

    #[error("Tool execution failed: {}", .0.as_deref().unwrap_or("Unknown error"))]
    Unexpected(Option<String>),
}

impl ToolError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ToolError::InvalidParams(_) => ErrorCode::InvalidParams,
            ToolError::UnknownTool(_) => ErrorCode::MethodNotFound,
            ToolError::UpstreamUnavailable | ToolError::Unexpected(_) => ErrorCode::InternalError,
        }
    }
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        McpError::new(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_errors_map_to_jsonrpc_codes() {
        let invalid: McpError = ToolError::InvalidParams("missing".into()).into();
        assert_eq!(invalid.code, -32602);
        assert_eq!(invalid.message, "missing");

        let unknown: McpError = ToolError::UnknownTool("get_weather".into()).into();
        assert_eq!(unknown.code, -32601);
        assert_eq!(unknown.message, "Unknown tool: get_weather");

        let upstream: McpError = ToolError::UpstreamUnavailable.into();
        assert_eq!(upstream.code, -32603);
        assert_eq!(upstream.message, "Failed to fetch requests from SeeClickFix API");
    }

    #[test]
    fn unexpected_error_falls_back_to_generic_message() {
        assert_eq!(
            ToolError::Unexpected(Some("boom".into())).to_string(),
            "Tool execution failed: boom"
        );
        assert_eq!(
            ToolError::Unexpected(None).to_string(),
            "Tool execution failed: Unknown error"
        );
    }

    #[test]
    fn response_omits_absent_members() {
        let ok = McpResponse::success(Some(json!(1)), json!({}));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"jsonrpc": "2.0", "id": 1, "result": {}})
        );

        let err = McpResponse::failure(Some(json!("a")), McpError::new(ErrorCode::ParseError, "bad"));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"jsonrpc": "2.0", "id": "a", "error": {"code": -32700, "message": "bad"}})
        );
    }

    #[test]
    fn request_without_id_is_notification() {
        let req: McpRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
                .unwrap();
        assert!(req.is_notification());
        assert!(req.params.is_none());
    }
}
