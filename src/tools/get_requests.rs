/// get_requests Tool Implementation
///
/// Looks up SeeClickFix civic requests near a latitude/longitude pair and
/// returns them as formatted text blocks.

use futures_util::FutureExt;
use serde_json::Value;
use std::sync::Arc;

use crate::core::protocol::ToolError;
use crate::core::server::{McpTool, ToolHandler, ToolRegistry};
use crate::open311::client::{Coordinates, RequestSource};
use crate::open311::format;

pub const NAME: &str = "get_requests";

/// Tool descriptor advertised by `tools/list`.
pub fn descriptor() -> McpTool {
    McpTool {
        name: NAME.to_string(),
        description: "Get requests near a point of interest".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "latitude": {
                    "type": "string",
                    "description": "latitude of the coordinate pair for the point of interest"
                },
                "longitude": {
                    "type": "string",
                    "description": "longitude of the coordinate pair for the point of interest"
                }
            },
            "required": ["latitude", "longitude"]
        }),
    }
}

/// Register the get_requests tool, backed by `source`.
pub fn register(registry: &mut ToolRegistry, source: Arc<dyn RequestSource>) {
    let handler: ToolHandler = Box::new(move |args: Value| {
        let source = Arc::clone(&source);
        async move { get_requests(source.as_ref(), &args).await }.boxed()
    });

    registry.register(descriptor(), handler);
}

/// Validate the arguments, fetch, and format.
///
/// Arguments are checked before any network call is made.
pub async fn get_requests(source: &dyn RequestSource, args: &Value) -> Result<String, ToolError> {
    let coordinates = match (coordinate(args, "latitude"), coordinate(args, "longitude")) {
        (Some(latitude), Some(longitude)) => Coordinates { latitude, longitude },
        _ => {
            return Err(ToolError::InvalidParams(
                "Both latitude and longitude are required".to_string(),
            ));
        }
    };

    let requests = source
        .requests_near(&coordinates)
        .await
        .ok_or(ToolError::UpstreamUnavailable)?;

    Ok(format::format_requests(&requests))
}

/// Non-empty string (or number) argument.
fn coordinate(args: &Value, key: &str) -> Option<String> {
    match args.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
