/// SeeClickFix Open311 Integration
///
/// - client.rs: builds the requests URL and fetches civic requests
/// - format.rs: renders civic requests as human-readable text blocks

pub mod client;
pub mod format;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One upstream-reported civic issue (pothole, graffiti, ...).
///
/// Every field is optional. Unknown fields are ignored.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CivicRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub service_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub updated_datetime: Option<String>,
}

/// Accept strings as-is and render other non-null values with their JSON text.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
