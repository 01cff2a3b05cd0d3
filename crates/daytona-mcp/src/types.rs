//! Tool parameter types for MCP tools.
//!
//! Argument names are camelCase on the wire. Every tool accepts an optional
//! `organizationId` that overrides the configured default for that call.
//! schemars derives the JSON Schema advertised in `tools/list`.

use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::BTreeMap;

// ============================================================================
// Sandbox Lifecycle
// ============================================================================

/// Parameters for listing sandboxes.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListSandboxesParams {
    /// JSON-encoded object of labels; only sandboxes carrying all of them
    /// are returned, e.g. `{"env":"dev"}`.
    #[serde(default)]
    pub labels: Option<String>,

    /// Include verbose details (default: false).
    #[serde(default)]
    pub verbose: bool,

    /// Organization to scope the request to.
    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters for fetching one sandbox.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetSandboxParams {
    /// ID of the sandbox.
    pub sandbox_id: String,

    /// Include verbose details (default: false).
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters for operations addressed only by sandbox ID
/// (start, stop, archive, backup, list sessions).
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SandboxParams {
    /// ID of the sandbox.
    pub sandbox_id: String,

    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters for creating a sandbox. Omitted fields use remote defaults.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSandboxParams {
    /// Snapshot to create the sandbox from.
    #[serde(default)]
    pub snapshot: Option<String>,

    /// OS user inside the sandbox.
    #[serde(default)]
    pub user: Option<String>,

    /// Environment variables.
    #[serde(default)]
    pub env: Option<BTreeMap<String, String>>,

    /// Labels to attach.
    #[serde(default)]
    pub labels: Option<BTreeMap<String, String>>,

    /// Whether port previews are publicly accessible.
    #[serde(default)]
    pub public: Option<bool>,

    /// Target region.
    #[serde(default)]
    pub target: Option<String>,

    /// CPU cores.
    #[serde(default)]
    pub cpu: Option<i64>,

    /// GPU units.
    #[serde(default)]
    pub gpu: Option<i64>,

    /// Memory in GiB.
    #[serde(default)]
    pub memory: Option<i64>,

    /// Disk in GiB.
    #[serde(default)]
    pub disk: Option<i64>,

    /// Minutes of inactivity before auto-stop (0 disables).
    #[serde(default)]
    pub auto_stop_interval: Option<i64>,

    /// Minutes stopped before auto-archive (0 selects the maximum).
    #[serde(default)]
    pub auto_archive_interval: Option<i64>,

    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters for deleting a sandbox.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSandboxParams {
    /// ID of the sandbox to delete.
    pub sandbox_id: String,

    /// Force deletion even if the sandbox is running. Required.
    pub force: bool,

    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters for replacing a sandbox's labels.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetLabelsParams {
    pub sandbox_id: String,

    /// Complete new label set. Existing labels not listed are removed.
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters for toggling public port previews.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetPublicParams {
    pub sandbox_id: String,
    pub public: bool,

    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters for auto-stop and auto-archive intervals.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntervalParams {
    pub sandbox_id: String,

    /// Interval in minutes. For auto-stop 0 disables it; for auto-archive
    /// 0 selects the maximum interval.
    pub interval: u32,

    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters for a port preview URL.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortPreviewParams {
    pub sandbox_id: String,

    /// Port inside the sandbox.
    pub port: u32,

    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters for fetching build logs.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildLogsParams {
    pub sandbox_id: String,

    /// Ask the remote to stream until the build finishes (default: false).
    #[serde(default)]
    pub follow: bool,

    #[serde(default)]
    pub organization_id: Option<String>,
}

// ============================================================================
// Process & Sessions
// ============================================================================

/// Parameters for one-shot command execution.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteCommandParams {
    pub sandbox_id: String,

    /// Shell command to run.
    pub command: String,

    /// Working directory.
    #[serde(default)]
    pub cwd: Option<String>,

    /// Timeout in seconds enforced by the remote (default: 10).
    #[serde(default)]
    pub timeout: Option<u32>,

    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters addressing a session.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionParams {
    pub sandbox_id: String,

    /// Caller-chosen session identifier.
    pub session_id: String,

    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters for running a command in a session.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteSessionCommandParams {
    pub sandbox_id: String,
    pub session_id: String,

    /// Shell command to run.
    pub command: String,

    /// Return a command ID immediately instead of waiting (default: false).
    #[serde(default)]
    pub run_async: bool,

    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters addressing a session command.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCommandParams {
    pub sandbox_id: String,
    pub session_id: String,
    pub command_id: String,

    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters for session command logs.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommandLogsParams {
    pub sandbox_id: String,
    pub session_id: String,
    pub command_id: String,

    #[serde(default)]
    pub follow: bool,

    #[serde(default)]
    pub organization_id: Option<String>,
}

// ============================================================================
// File Operations
// ============================================================================

/// Parameters addressing a path in the sandbox filesystem.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilePathParams {
    pub sandbox_id: String,

    /// Absolute path, or relative to the sandbox user's home.
    pub path: String,

    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters for uploading a text file.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileParams {
    pub sandbox_id: String,

    /// Destination path.
    pub path: String,

    /// File content.
    pub content: String,

    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters for creating a folder.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderParams {
    pub sandbox_id: String,
    pub path: String,

    /// Octal permissions (default: "755").
    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Parameters for content and name searches.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub sandbox_id: String,

    /// Directory to search under.
    pub path: String,

    /// Text pattern (find_in_files) or glob (search_files).
    pub pattern: String,

    #[serde(default)]
    pub organization_id: Option<String>,
}
