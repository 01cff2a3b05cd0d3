//! Response normalization and error classification.
//!
//! Raw outcomes fall into three disjoint cases which are never collapsed:
//! a failure status (remote rejected), no response (unreachable), and a
//! request that was never sent (locally invalid).

use crate::error::{ApiError, Result};
use crate::transport::{RawResponse, TransportFailure};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Upper bound on remote detail copied into error messages.
const MAX_DETAIL_CHARS: usize = 1024;

/// Treat an explicit `null` field the same as a missing one.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Classify a response that arrived with a non-success status.
pub fn classify_status(status: u16, body: &str) -> ApiError {
    ApiError::RemoteRejected {
        status,
        message: remote_detail(body),
    }
}

/// Classify a transport failure where no response is available.
pub fn classify_failure(failure: TransportFailure) -> ApiError {
    match failure {
        TransportFailure::NoResponse(msg) => ApiError::Unreachable(msg),
        TransportFailure::NotSent(msg) => ApiError::LocalInvalid(msg),
        TransportFailure::Other(msg) => ApiError::Unknown(msg),
    }
}

/// Turn a raw outcome into a successful response or a classified error.
pub fn check(outcome: std::result::Result<RawResponse, TransportFailure>) -> Result<RawResponse> {
    match outcome {
        Ok(resp) if resp.is_success() => Ok(resp),
        Ok(resp) => Err(classify_status(resp.status, &resp.body)),
        Err(failure) => Err(classify_failure(failure)),
    }
}

/// Decode a successful response body as JSON.
///
/// A body that does not match `T` means the remote broke its contract and is
/// reported as [`ApiError::Unknown`].
pub fn decode_json<T: DeserializeOwned>(response: &RawResponse) -> Result<T> {
    let body = if response.body.trim().is_empty() {
        "null"
    } else {
        response.body.as_str()
    };
    serde_json::from_str(body).map_err(|e| {
        ApiError::Unknown(format!(
            "unexpected response body (status {}): {e}: {}",
            response.status,
            truncate(&response.body)
        ))
    })
}

/// Decode a successful response body as an arbitrary value.
///
/// Empty bodies become `null`; non-JSON bodies are kept as a string.
pub fn decode_value(response: &RawResponse) -> serde_json::Value {
    let body = response.body.trim();
    if body.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(response.body.clone()))
}

/// Extract the human-readable detail from an error body.
///
/// Looks at a JSON `message` (string or list of strings) and then `error`,
/// falling back to the raw body.
pub fn remote_detail(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no detail provided".to_string();
    }

    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let message = match map.get("message") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Array(items)) => Some(
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        };
        if let Some(message) = message.filter(|m| !m.is_empty()) {
            return truncate(&message);
        }
        if let Some(serde_json::Value::String(error)) = map.get("error") {
            return truncate(error);
        }
    }

    truncate(trimmed)
}

fn truncate(s: &str) -> String {
    match s.char_indices().nth(MAX_DETAIL_CHARS) {
        Some((idx, _)) => format!("{}... ({} bytes total)", &s[..idx], s.len()),
        None => s.to_string(),
    }
}
