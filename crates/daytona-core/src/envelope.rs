//! Uniform result envelopes.
//!
//! Every operation ends in either a [`ToolOutput`] (title plus a body from a
//! closed set of content variants) or a [`ToolFailure`] (classified kind plus
//! message).

use crate::error::{ApiError, ErrorKind};
use serde::Serialize;

/// Body of a successful result.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultBody {
    /// Pre-formatted text such as logs, file content or command output.
    PlainText(String),
    /// Structured value rendered as pretty-printed JSON.
    Record(serde_json::Value),
}

/// Success envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub title: String,
    pub body: ResultBody,
}

impl ToolOutput {
    /// Text result.
    pub fn text(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: ResultBody::PlainText(text.into()),
        }
    }

    /// Structured result.
    ///
    /// Serialization failures become an [`ErrorKind::Unknown`] failure.
    pub fn record<T: Serialize>(title: impl Into<String>, value: &T) -> Result<Self, ToolFailure> {
        let value = serde_json::to_value(value).map_err(|e| ToolFailure {
            kind: ErrorKind::Unknown,
            message: format!("failed to serialize result: {e}"),
        })?;
        Ok(Self {
            title: title.into(),
            body: ResultBody::Record(value),
        })
    }

    /// Render as a title line, a blank line, then the body.
    ///
    /// Plain text is wrapped in a fenced block; records are pretty-printed.
    pub fn render(&self) -> String {
        match &self.body {
            ResultBody::PlainText(text) => {
                let text = text.strip_suffix('\n').unwrap_or(text);
                let fence = "`".repeat(fence_len(text));
                format!("{}\n\n{fence}\n{}\n{fence}", self.title, text)
            }
            ResultBody::Record(value) => {
                let dump = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                format!("{}\n\n{}", self.title, dump)
            }
        }
    }
}

/// Shortest fence that no backtick run inside `text` can close early.
fn fence_len(text: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for c in text.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    (longest + 1).max(3)
}

/// Failure envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl ToolFailure {
    /// Failure for arguments that did not pass decoding or local checks.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::LocalInvalid,
            message: message.into(),
        }
    }

    /// Render as `Error [kind]: message`.
    pub fn render(&self) -> String {
        format!("Error [{}]: {}", self.kind, self.message)
    }
}

impl From<ApiError> for ToolFailure {
    fn from(err: ApiError) -> Self {
        let kind = err.kind();
        let message = match err {
            ApiError::Unknown(message) => message,
            other => other.to_string(),
        };
        Self { kind, message }
    }
}

/// Outcome of a single tool invocation.
pub type ToolResponse = std::result::Result<ToolOutput, ToolFailure>;
