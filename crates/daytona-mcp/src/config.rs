//! Configuration for the MCP server.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use daytona_core::{DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Maximum size for uploaded file content in bytes (10 MB).
pub const MAX_INPUT_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Maximum command length in bytes.
pub const MAX_COMMAND_LENGTH: usize = 1024 * 1024; // 1 MB

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Stdio only (for local AI tools)
    Stdio,
    /// HTTP only (for remote AI agents)
    Http,
    /// Both stdio and HTTP (default)
    #[default]
    Both,
}

impl TransportMode {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "stdio" => Self::Stdio,
            "http" | "sse" | "remote" => Self::Http,
            _ => Self::Both,
        }
    }

    pub fn stdio_enabled(&self) -> bool {
        matches!(self, Self::Stdio | Self::Both)
    }

    pub fn http_enabled(&self) -> bool {
        matches!(self, Self::Http | Self::Both)
    }
}

/// Configuration for the Daytona MCP server.
#[derive(Clone)]
pub struct DaytonaConfig {
    /// API key sent as a bearer token. Required.
    pub api_key: String,

    /// Base URL of the Daytona API.
    pub api_url: String,

    /// Default organization; the header is omitted when `None`.
    pub organization_id: Option<String>,

    /// Per-request timeout applied by the HTTP client.
    pub request_timeout: Duration,

    /// Transport mode (default: both stdio and HTTP).
    pub transport_mode: TransportMode,

    /// HTTP server bind address.
    pub http_addr: SocketAddr,
}

/// Configuration validation error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DAYTONA_API_KEY is not set")]
    MissingApiKey,

    #[error("invalid API URL '{0}': must start with http:// or https://")]
    InvalidApiUrl(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

impl Default for DaytonaConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            organization_id: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            transport_mode: TransportMode::Both,
            http_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 8080),
        }
    }
}

impl std::fmt::Debug for DaytonaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaytonaConfig")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("api_url", &self.api_url)
            .field("organization_id", &self.organization_id)
            .field("request_timeout", &self.request_timeout)
            .field("transport_mode", &self.transport_mode)
            .field("http_addr", &self.http_addr)
            .finish()
    }
}

impl DaytonaConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `DAYTONA_API_KEY` | (required) |
    /// | `DAYTONA_API_URL` | `https://app.daytona.io/api` |
    /// | `DAYTONA_ORGANIZATION_ID` | unset |
    /// | `DAYTONA_REQUEST_TIMEOUT_SECS` | `120` |
    /// | `DAYTONA_TRANSPORT` | `both` (stdio, http, both) |
    /// | `DAYTONA_HTTP_HOST` | `0.0.0.0` |
    /// | `DAYTONA_HTTP_PORT` | `8080` |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();

        let http_host: IpAddr = lookup("DAYTONA_HTTP_HOST")
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.http_addr.ip());

        let http_port: u16 = lookup("DAYTONA_HTTP_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.http_addr.port());

        Self {
            api_key: lookup("DAYTONA_API_KEY")
                .map(|v| v.trim().to_string())
                .unwrap_or(default.api_key),
            api_url: lookup("DAYTONA_API_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default.api_url),
            organization_id: lookup("DAYTONA_ORGANIZATION_ID").filter(|v| !v.is_empty()),
            request_timeout: lookup("DAYTONA_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.request_timeout),
            transport_mode: lookup("DAYTONA_TRANSPORT")
                .map(|v| TransportMode::parse(&v))
                .unwrap_or(default.transport_mode),
            http_addr: SocketAddr::new(http_host, http_port),
        }
    }

    /// Validate the configuration.
    ///
    /// Call this at startup to fail with a clear message before serving.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(self.api_url.clone()));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }

    /// Log warnings for settings that are valid but probably unintended.
    pub fn validate_warn(&self) {
        if self.api_url.starts_with("http://") {
            tracing::warn!(api_url = %self.api_url, "API URL is not using TLS");
        }

        if self.transport_mode.http_enabled() && self.http_addr.ip().is_unspecified() {
            tracing::warn!(addr = %self.http_addr, "HTTP transport listens on all interfaces");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = DaytonaConfig::default();
        assert_eq!(config.api_url, "https://app.daytona.io/api");
        assert_eq!(config.organization_id, None);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.transport_mode, TransportMode::Both);
        assert_eq!(config.http_addr.port(), 8080);
    }

    #[test]
    fn test_from_lookup_reads_all_keys() {
        let config = DaytonaConfig::from_lookup(lookup(&[
            ("DAYTONA_API_KEY", "  dtn_123 "),
            ("DAYTONA_API_URL", "http://localhost:3000/api"),
            ("DAYTONA_ORGANIZATION_ID", "org-7"),
            ("DAYTONA_REQUEST_TIMEOUT_SECS", "30"),
            ("DAYTONA_TRANSPORT", "stdio"),
            ("DAYTONA_HTTP_HOST", "127.0.0.1"),
            ("DAYTONA_HTTP_PORT", "9090"),
        ]));

        assert_eq!(config.api_key, "dtn_123");
        assert_eq!(config.api_url, "http://localhost:3000/api");
        assert_eq!(config.organization_id.as_deref(), Some("org-7"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.transport_mode, TransportMode::Stdio);
        assert_eq!(config.http_addr, "127.0.0.1:9090".parse().unwrap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_uses_defaults() {
        let config = DaytonaConfig::from_lookup(lookup(&[
            ("DAYTONA_ORGANIZATION_ID", ""),
            ("DAYTONA_HTTP_PORT", "not-a-port"),
        ]));
        let default = DaytonaConfig::default();

        assert_eq!(config.api_url, default.api_url);
        assert_eq!(config.organization_id, None);
        assert_eq!(config.http_addr, default.http_addr);
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = DaytonaConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_validate_rejects_bad_url_and_zero_timeout() {
        let config = DaytonaConfig {
            api_key: "k".into(),
            api_url: "app.daytona.io".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidApiUrl(_))));

        let config = DaytonaConfig {
            api_key: "k".into(),
            request_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = DaytonaConfig {
            api_key: "dtn_secret".into(),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("dtn_secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_transport_mode_parsing() {
        assert_eq!(TransportMode::parse("stdio"), TransportMode::Stdio);
        assert_eq!(TransportMode::parse("HTTP"), TransportMode::Http);
        assert_eq!(TransportMode::parse("both"), TransportMode::Both);
        assert_eq!(TransportMode::parse("anything"), TransportMode::Both);
    }

    #[test]
    fn test_transport_mode_flags() {
        assert!(TransportMode::Stdio.stdio_enabled());
        assert!(!TransportMode::Stdio.http_enabled());
        assert!(!TransportMode::Http.stdio_enabled());
        assert!(TransportMode::Both.http_enabled());
    }
}
