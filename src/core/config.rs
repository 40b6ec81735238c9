/// Configuration from Environment Variables
///
/// Server metadata, transport selection and the Open311 upstream settings are
/// all read once at startup. Every value has a default; numeric values that
/// fail to parse fall back to their default.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SERVER_NAME: &str = "SeeClickFix";
pub const DEFAULT_SERVER_VERSION: &str = "0.1.0";
pub const DEFAULT_API_BASE: &str = "https://seeclickfix.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const USER_AGENT: &str = "civic-mcp/0.1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid transport mode '{0}'. Must be 'stdio', 'http', or 'both'")]
    InvalidTransport(String),
}

/// Which inbound transport(s) the server listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// JSON-RPC over HTTP with Actix Web
    Http,
    /// STDIO in the background, HTTP in the foreground
    Both,
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(TransportMode::Stdio),
            "http" => Ok(TransportMode::Http),
            "both" => Ok(TransportMode::Both),
            _ => Err(ConfigError::InvalidTransport(s.to_string())),
        }
    }
}

/// Settings for the SeeClickFix Open311 client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Open311Config {
    /// Scheme and host, without trailing slash
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for Open311Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server name as reported in MCP initialize responses
    pub name: String,
    /// Server version string as reported in MCP initialize responses
    pub version: String,
    pub transport: TransportMode,
    /// Bind address for HTTP mode
    pub host: String,
    /// Port number for HTTP mode
    pub port: u16,
    /// Actix worker threads for HTTP mode
    pub workers: usize,
    pub open311: Open311Config,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// Environment Variables:
    /// - SERVER_NAME: Name of the server (default: "SeeClickFix")
    /// - SERVER_VERSION: Version string (default: "0.1.0")
    /// - MCP_TRANSPORT_MODE: "stdio", "http", or "both" (default: "stdio")
    /// - HOST: Bind address for HTTP mode (default: "0.0.0.0")
    /// - PORT: Port number for HTTP mode (default: 3000)
    /// - WORKER_THREADS: HTTP worker count (default: CPU count, max 16)
    /// - SEECLICKFIX_API_BASE: Upstream base URL (default: "https://seeclickfix.com")
    /// - SEECLICKFIX_TIMEOUT_SECS: Upstream request timeout (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let transport = get("MCP_TRANSPORT_MODE", "stdio").parse()?;

        let port = get("PORT", "3000").parse::<u16>().unwrap_or(3000);

        // Defaults to CPU count but capped at 16 to avoid excessive context switching
        let workers = lookup("WORKER_THREADS")
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or_else(|| num_cpus::get().clamp(1, 16));

        let timeout_secs = lookup("SEECLICKFIX_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            name: get("SERVER_NAME", DEFAULT_SERVER_NAME),
            version: get("SERVER_VERSION", DEFAULT_SERVER_VERSION),
            transport,
            host: get("HOST", "0.0.0.0"),
            port,
            workers,
            open311: Open311Config {
                base_url: get("SEECLICKFIX_API_BASE", DEFAULT_API_BASE)
                    .trim_end_matches('/')
                    .to_string(),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_match_seeclickfix_server() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.name, "SeeClickFix");
        assert_eq!(config.version, "0.1.0");
        assert_eq!(config.transport, TransportMode::Stdio);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert!((1..=16).contains(&config.workers));
        assert_eq!(config.open311, Open311Config::default());
        assert_eq!(config.open311.timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("SERVER_NAME", "civic"),
            ("MCP_TRANSPORT_MODE", "HTTP"),
            ("PORT", "8080"),
            ("WORKER_THREADS", "3"),
            ("SEECLICKFIX_API_BASE", "http://127.0.0.1:9000/"),
            ("SEECLICKFIX_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.name, "civic");
        assert_eq!(config.transport, TransportMode::Http);
        assert_eq!(config.port, 8080);
        assert_eq!(config.workers, 3);
        assert_eq!(config.open311.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.open311.timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_numbers_fall_back_to_defaults() {
        let config = config_from(&[("PORT", "eighty"), ("SEECLICKFIX_TIMEOUT_SECS", "-1")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.open311.timeout, Duration::from_secs(30));
    }

    #[test]
    fn unknown_transport_is_rejected() {
        assert_eq!(
            config_from(&[("MCP_TRANSPORT_MODE", "websocket")]),
            Err(ConfigError::InvalidTransport("websocket".into()))
        );
    }
}
