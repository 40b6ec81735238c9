/// SeeClickFix Open311 Client
///
/// Issues a single GET per lookup. Any failure (transport, timeout, non-2xx
/// status, unparseable body) is logged and reported to the caller as `None`,
/// which keeps "fetch failed" distinct from "zero requests found".

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::CivicRequest;
use crate::core::config::{self, Open311Config};

/// Reasons a fetch produced no data. Only ever logged.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Caller-supplied point of interest. Values are passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub latitude: String,
    pub longitude: String,
}

/// Source of civic requests near a point.
///
/// `None` means no data could be obtained; `Some(vec![])` means the upstream
/// answered with zero requests.
#[async_trait]
pub trait RequestSource: Send + Sync {
    async fn requests_near(&self, coordinates: &Coordinates) -> Option<Vec<CivicRequest>>;
}

pub struct SeeClickFixClient {
    http: Client,
    base_url: String,
}

impl SeeClickFixClient {
    /// Build a client with the fixed User-Agent/Accept headers and the
    /// configured timeout.
    pub fn new(config: &Open311Config) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(config::USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    pub fn requests_url(&self, coordinates: &Coordinates) -> String {
        format!(
            "{}/open311/v2/requests.json?lat={}&long={}",
            self.base_url, coordinates.latitude, coordinates.longitude
        )
    }

    async fn fetch(&self, url: &str) -> Result<Vec<CivicRequest>, UpstreamError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let body = response.bytes().await?;
        tracing::debug!(bytes = body.len(), "Open311 response received");
        parse_requests(&body)
    }
}

#[async_trait]
impl RequestSource for SeeClickFixClient {
    async fn requests_near(&self, coordinates: &Coordinates) -> Option<Vec<CivicRequest>> {
        let url = self.requests_url(coordinates);
        tracing::debug!(%url, "Fetching civic requests");

        match self.fetch(&url).await {
            Ok(requests) => {
                tracing::info!(count = requests.len(), "Fetched civic requests");
                Some(requests)
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "Error making SeeClickFix request");
                None
            }
        }
    }
}

/// Parse an Open311 requests body. An empty body or a JSON `null` is an empty
/// list; anything other than an array of objects is an error.
pub fn parse_requests(body: &[u8]) -> Result<Vec<CivicRequest>, UpstreamError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let requests: Option<Vec<CivicRequest>> = serde_json::from_slice(body)?;
    Ok(requests.unwrap_or_default())
}
