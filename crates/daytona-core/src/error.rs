//! Error types for daytona-core.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias for daytona-core operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Classified failure kind reported to callers.
///
/// The set is closed: every [`ApiError`] maps to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A response arrived with a non-success status.
    RemoteRejected,
    /// The request was sent but no response came back.
    Unreachable,
    /// The request could not be built or its arguments are inconsistent.
    LocalInvalid,
    /// Anything else. The message is passed through verbatim.
    Unknown,
}

impl ErrorKind {
    /// Stable snake_case name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RemoteRejected => "remote_rejected",
            Self::Unreachable => "unreachable",
            Self::LocalInvalid => "local_invalid",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while resolving, sending or decoding a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Remote service answered with a failure status.
    #[error("remote rejected request with status {status}: {message}")]
    RemoteRejected {
        /// HTTP status code
        status: u16,
        /// Detail supplied by the remote, or the raw body
        message: String,
    },

    /// Request was sent but no response arrived (connect error, timeout).
    #[error("remote unreachable: {0}")]
    Unreachable(String),

    /// An identifier is unsafe to place in a URL path.
    #[error("invalid identifier for {field}: {reason}")]
    InvalidIdentifier {
        /// Argument name the identifier came from
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Arguments are locally inconsistent or the request could not be built.
    #[error("invalid request: {0}")]
    LocalInvalid(String),

    /// Unclassifiable failure.
    #[error("{0}")]
    Unknown(String),
}

impl ApiError {
    /// Kind reported in the failure envelope.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RemoteRejected { .. } => ErrorKind::RemoteRejected,
            Self::Unreachable(_) => ErrorKind::Unreachable,
            Self::InvalidIdentifier { .. } | Self::LocalInvalid(_) => ErrorKind::LocalInvalid,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Remote status code, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the remote reported the addressed resource as absent.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
