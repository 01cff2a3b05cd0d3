//! Transport client for the Daytona REST API.
//!
//! The core decides *what* to send through [`HttpRequest`] and interprets
//! what comes back; the [`Transport`] implementation only moves bytes.
//! [`HttpTransport`] is the reqwest-backed implementation used in
//! production. It attaches the bearer token and never retries.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::error::ApiError;

/// Default Daytona API endpoint.
pub const DEFAULT_API_URL: &str = "https://app.daytona.io/api";

/// Default timeout applied by [`HttpTransport`] to each request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP method of a resolved request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// JSON document.
    Json(serde_json::Value),
    /// Single file sent as the multipart field `file`.
    File {
        /// File name reported in the multipart part
        file_name: String,
        /// Raw file bytes
        content: Vec<u8>,
    },
}

/// A fully resolved outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path relative to the API base URL, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Look up a query parameter value.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw status/body pair returned by the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    /// Check for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A transport-level failure. No response is available in any variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    /// The request went out but nothing came back.
    #[error("no response: {0}")]
    NoResponse(String),

    /// The request could not be built or handed to the network.
    #[error("request not sent: {0}")]
    NotSent(String),

    /// Anything the transport cannot place in the two cases above.
    #[error("{0}")]
    Other(String),
}

/// Performs a single network exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the raw outcome.
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportFailure>;
}

/// reqwest-backed [`Transport`] that authenticates with a bearer token.
pub struct HttpTransport {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::LocalInvalid`] if the underlying client cannot be
    /// constructed.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::LocalInvalid(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn classify(err: reqwest::Error) -> TransportFailure {
        if err.is_builder() {
            TransportFailure::NotSent(err.to_string())
        } else if err.is_timeout() || err.is_connect() || err.is_request() {
            TransportFailure::NoResponse(err.to_string())
        } else {
            TransportFailure::Other(err.to_string())
        }
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportFailure> {
        let url = format!("{}{}", self.base_url, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .http
            .request(method, &url)
            .bearer_auth(&self.api_key)
            .query(&request.query);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::File { file_name, content }) => {
                let part = reqwest::multipart::Part::bytes(content).file_name(file_name);
                builder.multipart(reqwest::multipart::Form::new().part("file", part))
            }
            None => builder,
        };

        let start = std::time::Instant::now();
        tracing::debug!(method = %request.method, path = %request.path, "Sending API request");

        let resp = builder.send().await.map_err(|e| {
            let failure = Self::classify(e);
            tracing::warn!(
                method = %request.method,
                path = %request.path,
                error = %failure,
                "API request failed without response"
            );
            failure
        })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| {
            let failure = Self::classify(e);
            tracing::warn!(
                method = %request.method,
                path = %request.path,
                status,
                error = %failure,
                "API response body could not be read"
            );
            failure
        })?;

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "API response received"
        );
        tracing::trace!(body = %body, "API response body");

        Ok(RawResponse { status, body })
    }
}
