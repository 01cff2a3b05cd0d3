//! Sandbox records and the lifecycle controller.

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::normalize::{decode_json, decode_value};
use crate::resolver::Operation;
use crate::transport::RequestBody;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;

/// Caller-defined sandbox labels.
pub type Labels = BTreeMap<String, String>;

/// Lifecycle state of a sandbox as reported by the remote.
///
/// ```text
/// creating ──▶ started ◀──▶ stopped ──▶ archived
///    │
///    └──▶ error            (any non-deleting state) ──▶ deleting
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SandboxState {
    Creating,
    Started,
    Stopped,
    Archived,
    Deleting,
    Error,
    /// Any state string this crate does not model.
    Unknown,
}

impl SandboxState {
    /// Parse a remote state string (case-insensitive).
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "creating" => Self::Creating,
            "started" => Self::Started,
            "stopped" => Self::Stopped,
            "archived" => Self::Archived,
            "deleting" => Self::Deleting,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }

    /// Check whether the remote state machine allows `self -> next`.
    pub fn can_transition_to(self, next: SandboxState) -> bool {
        use SandboxState::*;
        match (self, next) {
            (Creating, Started) | (Creating, Error) => true,
            (Started, Stopped) | (Stopped, Started) | (Stopped, Archived) => true,
            (Archived, Started) => true,
            (Deleting, _) | (Unknown, _) | (_, Unknown) => false,
            (_, Deleting) => true,
            _ => false,
        }
    }

    /// Sessions can only be created or addressed in a started sandbox.
    pub fn accepts_sessions(self) -> bool {
        self == Self::Started
    }
}

impl fmt::Display for SandboxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Creating => "creating",
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::Archived => "archived",
            Self::Deleting => "deleting",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// State in a transition response that is neither `target` nor able to reach it.
///
/// Responses without a `state` field yield `None`.
fn stray_state(response: &serde_json::Value, target: SandboxState) -> Option<SandboxState> {
    let reported = SandboxState::parse(response.get("state")?.as_str()?);
    (reported != target && !reported.can_transition_to(target)).then_some(reported)
}

/// A sandbox record.
///
/// Fields this crate does not interpret are kept in `extra` so the record
/// renders exactly as the remote described it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sandbox {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<serde_json::Number>,
    #[serde(default, deserialize_with = "crate::normalize::null_as_default")]
    pub labels: Labels,
    #[serde(default, deserialize_with = "crate::normalize::null_as_default")]
    pub public: bool,
    /// Minutes; 0 disables auto-stop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_stop_interval: Option<u32>,
    /// Minutes; 0 selects the maximum interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_archive_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Sandbox {
    /// Parsed lifecycle state.
    pub fn lifecycle_state(&self) -> SandboxState {
        self.state
            .as_deref()
            .map(SandboxState::parse)
            .unwrap_or(SandboxState::Unknown)
    }

    /// Check whether every `filter` entry appears with the same value.
    pub fn matches_labels(&self, filter: &Labels) -> bool {
        filter
            .iter()
            .all(|(k, v)| self.labels.get(k).is_some_and(|own| own == v))
    }
}

/// Decode a JSON-encoded label filter.
///
/// # Errors
///
/// Returns [`ApiError::LocalInvalid`] unless `encoded` is a JSON object whose
/// values are all strings.
pub fn parse_label_filter(encoded: &str) -> Result<Labels> {
    serde_json::from_str::<Labels>(encoded).map_err(|e| {
        ApiError::LocalInvalid(format!(
            "labels must be a JSON object of string values: {e}"
        ))
    })
}

/// Auto-stop policy. Zero minutes on the wire means disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoStopPolicy {
    Disabled,
    After(NonZeroU32),
}

impl AutoStopPolicy {
    pub fn from_minutes(minutes: u32) -> Self {
        NonZeroU32::new(minutes).map_or(Self::Disabled, Self::After)
    }

    pub fn minutes(self) -> u32 {
        match self {
            Self::Disabled => 0,
            Self::After(m) => m.get(),
        }
    }
}

/// Auto-archive policy. Zero minutes on the wire selects the maximum
/// interval, not "disabled".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoArchivePolicy {
    Maximum,
    After(NonZeroU32),
}

impl AutoArchivePolicy {
    pub fn from_minutes(minutes: u32) -> Self {
        NonZeroU32::new(minutes).map_or(Self::Maximum, Self::After)
    }

    pub fn minutes(self) -> u32 {
        match self {
            Self::Maximum => 0,
            Self::After(m) => m.get(),
        }
    }
}

/// Body of a sandbox creation request. Absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSandbox {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_stop_interval: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_archive_interval: Option<i64>,
}

impl CreateSandbox {
    /// All numeric fields must be non-negative when present.
    pub fn validate(&self) -> Result<()> {
        let numeric = [
            ("cpu", self.cpu),
            ("gpu", self.gpu),
            ("memory", self.memory),
            ("disk", self.disk),
            ("autoStopInterval", self.auto_stop_interval),
            ("autoArchiveInterval", self.auto_archive_interval),
        ];
        for (field, value) in numeric {
            if let Some(v) = value.filter(|v| *v < 0) {
                return Err(ApiError::LocalInvalid(format!(
                    "{field} must be >= 0, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Externally reachable URL for a sandbox port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortPreview {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct LabelsResponse {
    #[serde(default, deserialize_with = "crate::normalize::null_as_default")]
    labels: Labels,
}

/// Lifecycle operations on sandboxes.
///
/// Holds no state beyond the client; every method issues exactly one
/// request and transitions are never special-cased locally.
#[derive(Debug, Clone)]
pub struct SandboxController {
    client: ApiClient,
}

impl SandboxController {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Same controller with a per-call organization override.
    pub fn scoped(&self, organization_id: Option<&str>) -> Self {
        Self {
            client: self.client.scoped(organization_id),
        }
    }

    /// List sandboxes whose labels contain every entry of `filter`.
    ///
    /// The filter is sent to the remote and re-applied to the response.
    pub async fn list(&self, filter: Option<&Labels>, verbose: bool) -> Result<Vec<Sandbox>> {
        tracing::debug!(filter = ?filter, verbose, "Listing sandboxes");
        let resp = self
            .client
            .call(
                &Operation::ListSandboxes {
                    labels: filter,
                    verbose,
                },
                None,
            )
            .await?;
        let mut sandboxes: Vec<Sandbox> = decode_json(&resp)?;
        if let Some(filter) = filter {
            sandboxes.retain(|sb| sb.matches_labels(filter));
        }
        tracing::trace!(count = sandboxes.len(), "Sandboxes listed");
        Ok(sandboxes)
    }

    pub async fn get(&self, sandbox_id: &str, verbose: bool) -> Result<Sandbox> {
        tracing::debug!(sandbox_id = %sandbox_id, "Fetching sandbox");
        let resp = self
            .client
            .call(
                &Operation::GetSandbox {
                    sandbox_id,
                    verbose,
                },
                None,
            )
            .await?;
        let sandbox: Sandbox = decode_json(&resp)?;
        let state = sandbox.lifecycle_state();
        tracing::debug!(
            sandbox_id = %sandbox_id,
            %state,
            accepts_sessions = state.accepts_sessions(),
            "Fetched sandbox"
        );
        Ok(sandbox)
    }

    /// Create a sandbox. The returned record is usually still `creating`.
    pub async fn create(&self, request: &CreateSandbox) -> Result<Sandbox> {
        request.validate()?;
        let body = serde_json::to_value(request)
            .map_err(|e| ApiError::LocalInvalid(format!("cannot encode request: {e}")))?;

        let start = std::time::Instant::now();
        tracing::info!(snapshot = ?request.snapshot, "Creating sandbox");
        let resp = self
            .client
            .call(&Operation::CreateSandbox, Some(RequestBody::Json(body)))
            .await?;
        let sandbox: Sandbox = decode_json(&resp)?;
        tracing::info!(
            sandbox_id = %sandbox.id,
            state = %sandbox.lifecycle_state(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Sandbox created"
        );
        Ok(sandbox)
    }

    /// Delete a sandbox. `force` has no default.
    pub async fn delete(&self, sandbox_id: &str, force: bool) -> Result<serde_json::Value> {
        tracing::info!(sandbox_id = %sandbox_id, force, "Deleting sandbox");
        let resp = self
            .client
            .call(&Operation::DeleteSandbox { sandbox_id, force }, None)
            .await?;
        Ok(decode_value(&resp))
    }

    pub async fn start(&self, sandbox_id: &str) -> Result<serde_json::Value> {
        self.transition(Operation::StartSandbox { sandbox_id }, sandbox_id, SandboxState::Started)
            .await
    }

    pub async fn stop(&self, sandbox_id: &str) -> Result<serde_json::Value> {
        self.transition(Operation::StopSandbox { sandbox_id }, sandbox_id, SandboxState::Stopped)
            .await
    }

    pub async fn archive(&self, sandbox_id: &str) -> Result<serde_json::Value> {
        self.transition(Operation::ArchiveSandbox { sandbox_id }, sandbox_id, SandboxState::Archived)
            .await
    }

    async fn transition(
        &self,
        op: Operation<'_>,
        sandbox_id: &str,
        target: SandboxState,
    ) -> Result<serde_json::Value> {
        tracing::info!(sandbox_id = %sandbox_id, operation = op.name(), %target, "Requesting state transition");
        let resp = self.client.call(&op, None).await?;
        let value = decode_value(&resp);
        if let Some(reported) = stray_state(&value, target) {
            tracing::debug!(
                sandbox_id = %sandbox_id,
                %reported,
                %target,
                "Remote reported a state that cannot reach the requested one"
            );
        }
        Ok(value)
    }

    /// Replace the whole label set. Labels not in `labels` are dropped.
    pub async fn replace_labels(&self, sandbox_id: &str, labels: &Labels) -> Result<Labels> {
        tracing::info!(sandbox_id = %sandbox_id, count = labels.len(), "Replacing sandbox labels");
        let body = serde_json::json!({ "labels": labels });
        let resp = self
            .client
            .call(
                &Operation::ReplaceLabels { sandbox_id },
                Some(RequestBody::Json(body)),
            )
            .await?;
        let decoded: LabelsResponse = decode_json(&resp)?;
        Ok(decoded.labels)
    }

    pub async fn set_public(&self, sandbox_id: &str, public: bool) -> Result<serde_json::Value> {
        tracing::info!(sandbox_id = %sandbox_id, public, "Updating public preview flag");
        let resp = self
            .client
            .call(&Operation::SetPublic { sandbox_id, public }, None)
            .await?;
        Ok(decode_value(&resp))
    }

    /// Trigger a backup. Returns the acknowledgment, not completion.
    pub async fn create_backup(&self, sandbox_id: &str) -> Result<serde_json::Value> {
        tracing::info!(sandbox_id = %sandbox_id, "Requesting backup");
        let resp = self
            .client
            .call(&Operation::CreateBackup { sandbox_id }, None)
            .await?;
        Ok(decode_value(&resp))
    }

    pub async fn set_auto_stop(
        &self,
        sandbox_id: &str,
        policy: AutoStopPolicy,
    ) -> Result<serde_json::Value> {
        tracing::info!(sandbox_id = %sandbox_id, ?policy, "Updating auto-stop policy");
        let resp = self
            .client
            .call(&Operation::SetAutoStop { sandbox_id, policy }, None)
            .await?;
        Ok(decode_value(&resp))
    }

    pub async fn set_auto_archive(
        &self,
        sandbox_id: &str,
        policy: AutoArchivePolicy,
    ) -> Result<serde_json::Value> {
        tracing::info!(sandbox_id = %sandbox_id, ?policy, "Updating auto-archive policy");
        let resp = self
            .client
            .call(&Operation::SetAutoArchive { sandbox_id, policy }, None)
            .await?;
        Ok(decode_value(&resp))
    }

    pub async fn port_preview_url(&self, sandbox_id: &str, port: u32) -> Result<PortPreview> {
        tracing::debug!(sandbox_id = %sandbox_id, port, "Fetching port preview URL");
        let resp = self
            .client
            .call(&Operation::PortPreviewUrl { sandbox_id, port }, None)
            .await?;
        decode_json(&resp)
    }

    /// Fetch build logs in a single request. `follow` is passed through.
    pub async fn build_logs(&self, sandbox_id: &str, follow: bool) -> Result<String> {
        tracing::debug!(sandbox_id = %sandbox_id, follow, "Fetching build logs");
        let resp = self
            .client
            .call(&Operation::BuildLogs { sandbox_id, follow }, None)
            .await?;
        Ok(resp.body)
    }
}
