//! DaytonaServer - MCP server that exposes Daytona sandbox operations as tools.
//!
//! This module implements ServerHandler manually, dispatching each tool call
//! to the matching controller in daytona-core and rendering the resulting
//! envelope as MCP content.

use crate::config::{DaytonaConfig, MAX_COMMAND_LENGTH, MAX_INPUT_SIZE_BYTES};
use crate::types::*;

use daytona_core::{
    parse_label_filter, ApiClient, ApiError, AutoArchivePolicy, AutoStopPolicy, CreateSandbox,
    ExecuteRequest, ExecutionOutcome, FileController, HttpTransport, RequestScope,
    SandboxController, SessionController, ToolFailure, ToolOutput, ToolResponse, Transport,
};
use rmcp::{
    handler::server::ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
    ErrorData,
};
use schemars::schema_for;
use serde::de::DeserializeOwned;
use std::sync::Arc;

type Arguments = Option<serde_json::Map<String, serde_json::Value>>;

/// MCP server for Daytona sandbox operations.
///
/// Holds no per-call state: every tool call becomes one request against the
/// remote API, so clones can serve any number of transports concurrently.
#[derive(Debug, Clone)]
pub struct DaytonaServer {
    sandboxes: SandboxController,
    sessions: SessionController,
    files: FileController,
}

impl DaytonaServer {
    /// Create a server talking to the API described by `config`.
    pub fn new(config: &DaytonaConfig) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(
            config.api_url.clone(),
            config.api_key.clone(),
            config.request_timeout,
        )?;
        let scope = match &config.organization_id {
            Some(org) => RequestScope::organization(org.clone()),
            None => RequestScope::none(),
        };
        Ok(Self::with_transport(Arc::new(transport), scope))
    }

    /// Create a server over an arbitrary transport.
    pub fn with_transport(transport: Arc<dyn Transport>, scope: RequestScope) -> Self {
        let client = ApiClient::new(transport, scope);
        Self {
            sandboxes: SandboxController::new(client.clone()),
            sessions: SessionController::new(client.clone()),
            files: FileController::new(client),
        }
    }

    /// Truncate sensitive content for logging.
    fn truncate_for_log(s: &str, max_chars: usize) -> String {
        match s.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}... ({} bytes total)", &s[..idx], s.len()),
            None => s.to_string(),
        }
    }

    /// Validate input size.
    fn validate_size(content: &str, max_bytes: usize, field_name: &str) -> Result<(), ToolFailure> {
        if content.len() > max_bytes {
            Err(ToolFailure::invalid(format!(
                "{} exceeds maximum size ({} bytes > {} bytes)",
                field_name,
                content.len(),
                max_bytes
            )))
        } else {
            Ok(())
        }
    }

    /// Decode tool arguments. Missing arguments decode as an empty object.
    fn parse_args<T: DeserializeOwned>(args: Arguments) -> Result<T, ToolFailure> {
        let value = serde_json::Value::Object(args.unwrap_or_default());
        serde_json::from_value(value)
            .map_err(|e| ToolFailure::invalid(format!("Invalid arguments: {e}")))
    }

    /// Render an envelope as MCP content.
    fn to_call_result(response: ToolResponse) -> CallToolResult {
        match response {
            Ok(output) => CallToolResult::success(vec![Content::text(output.render())]),
            Err(failure) => CallToolResult::error(vec![Content::text(failure.render())]),
        }
    }

    /// Convert schemars RootSchema to rmcp JsonObject
    fn schema_to_json_object<T: schemars::JsonSchema>(
    ) -> Arc<serde_json::Map<String, serde_json::Value>> {
        let schema = schema_for!(T);
        let json = serde_json::to_value(&schema.schema).unwrap_or_else(|_| serde_json::json!({}));
        match json {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::new()),
        }
    }

    // ========================================================================
    // Sandbox Lifecycle
    // ========================================================================

    async fn handle_list_sandboxes(&self, args: Arguments) -> ToolResponse {
        let params: ListSandboxesParams = Self::parse_args(args)?;
        let filter = params
            .labels
            .as_deref()
            .map(parse_label_filter)
            .transpose()?;

        let sandboxes = self
            .sandboxes
            .scoped(params.organization_id.as_deref())
            .list(filter.as_ref(), params.verbose)
            .await?;
        ToolOutput::record(format!("Found {} sandbox(es)", sandboxes.len()), &sandboxes)
    }

    async fn handle_get_sandbox(&self, args: Arguments) -> ToolResponse {
        let params: GetSandboxParams = Self::parse_args(args)?;
        let sandbox = self
            .sandboxes
            .scoped(params.organization_id.as_deref())
            .get(&params.sandbox_id, params.verbose)
            .await?;
        ToolOutput::record(format!("Sandbox {}", sandbox.id), &sandbox)
    }

    async fn handle_create_sandbox(&self, args: Arguments) -> ToolResponse {
        let params: CreateSandboxParams = Self::parse_args(args)?;
        let request = CreateSandbox {
            snapshot: params.snapshot,
            user: params.user,
            env: params.env,
            labels: params.labels,
            public: params.public,
            target: params.target,
            cpu: params.cpu,
            gpu: params.gpu,
            memory: params.memory,
            disk: params.disk,
            auto_stop_interval: params.auto_stop_interval,
            auto_archive_interval: params.auto_archive_interval,
        };

        let sandbox = self
            .sandboxes
            .scoped(params.organization_id.as_deref())
            .create(&request)
            .await?;
        ToolOutput::record(format!("Created sandbox {}", sandbox.id), &sandbox)
    }

    async fn handle_delete_sandbox(&self, args: Arguments) -> ToolResponse {
        let params: DeleteSandboxParams = Self::parse_args(args)?;
        let ack = self
            .sandboxes
            .scoped(params.organization_id.as_deref())
            .delete(&params.sandbox_id, params.force)
            .await?;
        ToolOutput::record(format!("Deleted sandbox {}", params.sandbox_id), &ack)
    }

    async fn handle_start_sandbox(&self, args: Arguments) -> ToolResponse {
        let params: SandboxParams = Self::parse_args(args)?;
        let resp = self
            .sandboxes
            .scoped(params.organization_id.as_deref())
            .start(&params.sandbox_id)
            .await?;
        ToolOutput::record(format!("Started sandbox {}", params.sandbox_id), &resp)
    }

    async fn handle_stop_sandbox(&self, args: Arguments) -> ToolResponse {
        let params: SandboxParams = Self::parse_args(args)?;
        let resp = self
            .sandboxes
            .scoped(params.organization_id.as_deref())
            .stop(&params.sandbox_id)
            .await?;
        ToolOutput::record(format!("Stopped sandbox {}", params.sandbox_id), &resp)
    }

    async fn handle_archive_sandbox(&self, args: Arguments) -> ToolResponse {
        let params: SandboxParams = Self::parse_args(args)?;
        let resp = self
            .sandboxes
            .scoped(params.organization_id.as_deref())
            .archive(&params.sandbox_id)
            .await?;
        ToolOutput::record(format!("Archived sandbox {}", params.sandbox_id), &resp)
    }

    async fn handle_set_sandbox_labels(&self, args: Arguments) -> ToolResponse {
        let params: SetLabelsParams = Self::parse_args(args)?;
        let labels = self
            .sandboxes
            .scoped(params.organization_id.as_deref())
            .replace_labels(&params.sandbox_id, &params.labels)
            .await?;
        ToolOutput::record(format!("Labels of sandbox {}", params.sandbox_id), &labels)
    }

    async fn handle_set_sandbox_public(&self, args: Arguments) -> ToolResponse {
        let params: SetPublicParams = Self::parse_args(args)?;
        let resp = self
            .sandboxes
            .scoped(params.organization_id.as_deref())
            .set_public(&params.sandbox_id, params.public)
            .await?;
        ToolOutput::record(
            format!("Sandbox {} public = {}", params.sandbox_id, params.public),
            &resp,
        )
    }

    async fn handle_create_backup(&self, args: Arguments) -> ToolResponse {
        let params: SandboxParams = Self::parse_args(args)?;
        let resp = self
            .sandboxes
            .scoped(params.organization_id.as_deref())
            .create_backup(&params.sandbox_id)
            .await?;
        ToolOutput::record(
            format!("Backup requested for sandbox {}", params.sandbox_id),
            &resp,
        )
    }

    async fn handle_set_auto_stop_interval(&self, args: Arguments) -> ToolResponse {
        let params: IntervalParams = Self::parse_args(args)?;
        let policy = AutoStopPolicy::from_minutes(params.interval);
        let resp = self
            .sandboxes
            .scoped(params.organization_id.as_deref())
            .set_auto_stop(&params.sandbox_id, policy)
            .await?;
        let title = match policy {
            AutoStopPolicy::Disabled => format!("Auto-stop disabled for sandbox {}", params.sandbox_id),
            AutoStopPolicy::After(m) => {
                format!("Sandbox {} auto-stops after {m} minute(s)", params.sandbox_id)
            }
        };
        ToolOutput::record(title, &resp)
    }

    async fn handle_set_auto_archive_interval(&self, args: Arguments) -> ToolResponse {
        let params: IntervalParams = Self::parse_args(args)?;
        let policy = AutoArchivePolicy::from_minutes(params.interval);
        let resp = self
            .sandboxes
            .scoped(params.organization_id.as_deref())
            .set_auto_archive(&params.sandbox_id, policy)
            .await?;
        let title = match policy {
            AutoArchivePolicy::Maximum => format!(
                "Sandbox {} auto-archives after the maximum interval",
                params.sandbox_id
            ),
            AutoArchivePolicy::After(m) => {
                format!("Sandbox {} auto-archives after {m} minute(s)", params.sandbox_id)
            }
        };
        ToolOutput::record(title, &resp)
    }

    async fn handle_get_port_preview_url(&self, args: Arguments) -> ToolResponse {
        let params: PortPreviewParams = Self::parse_args(args)?;
        let preview = self
            .sandboxes
            .scoped(params.organization_id.as_deref())
            .port_preview_url(&params.sandbox_id, params.port)
            .await?;
        ToolOutput::record(
            format!("Preview URL for port {} of sandbox {}", params.port, params.sandbox_id),
            &preview,
        )
    }

    async fn handle_get_build_logs(&self, args: Arguments) -> ToolResponse {
        let params: BuildLogsParams = Self::parse_args(args)?;
        let logs = self
            .sandboxes
            .scoped(params.organization_id.as_deref())
            .build_logs(&params.sandbox_id, params.follow)
            .await?;
        Ok(ToolOutput::text(
            format!("Build logs for sandbox {}", params.sandbox_id),
            logs,
        ))
    }

    // ========================================================================
    // Process & Sessions
    // ========================================================================

    fn outcome_title(outcome: &ExecutionOutcome) -> String {
        match outcome {
            ExecutionOutcome::Completed { exit_code, .. } => {
                format!("Command exited with code {exit_code}")
            }
            ExecutionOutcome::Started { command_id } => {
                format!("Command {command_id} started")
            }
        }
    }

    async fn handle_execute_command(&self, args: Arguments) -> ToolResponse {
        let params: ExecuteCommandParams = Self::parse_args(args)?;
        Self::validate_size(&params.command, MAX_COMMAND_LENGTH, "command")?;

        tracing::info!(
            sandbox_id = %params.sandbox_id,
            command = %Self::truncate_for_log(&params.command, 100),
            "Running one-shot command"
        );

        let request = ExecuteRequest {
            command: params.command,
            cwd: params.cwd,
            timeout: params.timeout,
        };
        let outcome = self
            .sessions
            .scoped(params.organization_id.as_deref())
            .execute_command(&params.sandbox_id, &request)
            .await?;
        ToolOutput::record(Self::outcome_title(&outcome), &outcome)
    }

    async fn handle_create_session(&self, args: Arguments) -> ToolResponse {
        let params: SessionParams = Self::parse_args(args)?;
        self.sessions
            .scoped(params.organization_id.as_deref())
            .create_session(&params.sandbox_id, &params.session_id)
            .await?;
        ToolOutput::record(
            format!("Created session {}", params.session_id),
            &serde_json::json!({
                "sandboxId": params.sandbox_id,
                "sessionId": params.session_id,
            }),
        )
    }

    async fn handle_get_session(&self, args: Arguments) -> ToolResponse {
        let params: SessionParams = Self::parse_args(args)?;
        let session = self
            .sessions
            .scoped(params.organization_id.as_deref())
            .get_session(&params.sandbox_id, &params.session_id)
            .await?;
        ToolOutput::record(format!("Session {}", session.session_id), &session)
    }

    async fn handle_list_sessions(&self, args: Arguments) -> ToolResponse {
        let params: SandboxParams = Self::parse_args(args)?;
        let sessions = self
            .sessions
            .scoped(params.organization_id.as_deref())
            .list_sessions(&params.sandbox_id)
            .await?;
        ToolOutput::record(
            format!("Found {} session(s) in sandbox {}", sessions.len(), params.sandbox_id),
            &sessions,
        )
    }

    async fn handle_delete_session(&self, args: Arguments) -> ToolResponse {
        let params: SessionParams = Self::parse_args(args)?;
        self.sessions
            .scoped(params.organization_id.as_deref())
            .delete_session(&params.sandbox_id, &params.session_id)
            .await?;
        ToolOutput::record(
            format!("Deleted session {}", params.session_id),
            &serde_json::json!({
                "sandboxId": params.sandbox_id,
                "sessionId": params.session_id,
            }),
        )
    }

    async fn handle_execute_session_command(&self, args: Arguments) -> ToolResponse {
        let params: ExecuteSessionCommandParams = Self::parse_args(args)?;
        Self::validate_size(&params.command, MAX_COMMAND_LENGTH, "command")?;

        tracing::info!(
            sandbox_id = %params.sandbox_id,
            session_id = %params.session_id,
            run_async = params.run_async,
            command = %Self::truncate_for_log(&params.command, 100),
            "Running session command"
        );

        let outcome = self
            .sessions
            .scoped(params.organization_id.as_deref())
            .execute_session_command(
                &params.sandbox_id,
                &params.session_id,
                &params.command,
                params.run_async,
            )
            .await?;
        ToolOutput::record(Self::outcome_title(&outcome), &outcome)
    }

    async fn handle_get_session_command(&self, args: Arguments) -> ToolResponse {
        let params: SessionCommandParams = Self::parse_args(args)?;
        let command = self
            .sessions
            .scoped(params.organization_id.as_deref())
            .get_session_command(&params.sandbox_id, &params.session_id, &params.command_id)
            .await?;
        let title = match command.exit_code {
            Some(code) => format!("Command {} exited with code {code}", command.id),
            None => format!("Command {} is still running", command.id),
        };
        ToolOutput::record(title, &command)
    }

    async fn handle_get_session_command_logs(&self, args: Arguments) -> ToolResponse {
        let params: CommandLogsParams = Self::parse_args(args)?;
        let logs = self
            .sessions
            .scoped(params.organization_id.as_deref())
            .session_command_logs(
                &params.sandbox_id,
                &params.session_id,
                &params.command_id,
                params.follow,
            )
            .await?;
        Ok(ToolOutput::text(
            format!("Logs for command {}", params.command_id),
            logs,
        ))
    }

    // ========================================================================
    // File Operations
    // ========================================================================

    async fn handle_list_files(&self, args: Arguments) -> ToolResponse {
        let params: FilePathParams = Self::parse_args(args)?;
        let entries = self
            .files
            .scoped(params.organization_id.as_deref())
            .list_files(&params.sandbox_id, &params.path)
            .await?;
        ToolOutput::record(format!("Contents of {}", params.path), &entries)
    }

    async fn handle_download_file(&self, args: Arguments) -> ToolResponse {
        let params: FilePathParams = Self::parse_args(args)?;
        let content = self
            .files
            .scoped(params.organization_id.as_deref())
            .download_file(&params.sandbox_id, &params.path)
            .await?;
        Ok(ToolOutput::text(params.path, content))
    }

    async fn handle_upload_file(&self, args: Arguments) -> ToolResponse {
        let params: UploadFileParams = Self::parse_args(args)?;
        Self::validate_size(&params.content, MAX_INPUT_SIZE_BYTES, "content")?;
        self.files
            .scoped(params.organization_id.as_deref())
            .upload_file(&params.sandbox_id, &params.path, &params.content)
            .await?;
        ToolOutput::record(
            format!("Uploaded {}", params.path),
            &serde_json::json!({ "path": params.path, "size": params.content.len() }),
        )
    }

    async fn handle_create_folder(&self, args: Arguments) -> ToolResponse {
        let params: CreateFolderParams = Self::parse_args(args)?;
        self.files
            .scoped(params.organization_id.as_deref())
            .create_folder(&params.sandbox_id, &params.path, params.mode.as_deref())
            .await?;
        ToolOutput::record(
            format!("Created folder {}", params.path),
            &serde_json::json!({ "path": params.path }),
        )
    }

    async fn handle_delete_file(&self, args: Arguments) -> ToolResponse {
        let params: FilePathParams = Self::parse_args(args)?;
        let resp = self
            .files
            .scoped(params.organization_id.as_deref())
            .delete_file(&params.sandbox_id, &params.path)
            .await?;
        ToolOutput::record(format!("Deleted {}", params.path), &resp)
    }

    async fn handle_get_file_info(&self, args: Arguments) -> ToolResponse {
        let params: FilePathParams = Self::parse_args(args)?;
        let info = self
            .files
            .scoped(params.organization_id.as_deref())
            .get_file_info(&params.sandbox_id, &params.path)
            .await?;
        ToolOutput::record(format!("File info for {}", params.path), &info)
    }

    async fn handle_find_in_files(&self, args: Arguments) -> ToolResponse {
        let params: SearchParams = Self::parse_args(args)?;
        let matches = self
            .files
            .scoped(params.organization_id.as_deref())
            .find_in_files(&params.sandbox_id, &params.path, &params.pattern)
            .await?;
        ToolOutput::record(
            format!("{} match(es) for '{}'", matches.len(), params.pattern),
            &matches,
        )
    }

    async fn handle_search_files(&self, args: Arguments) -> ToolResponse {
        let params: SearchParams = Self::parse_args(args)?;
        let files = self
            .files
            .scoped(params.organization_id.as_deref())
            .search_files(&params.sandbox_id, &params.path, &params.pattern)
            .await?;
        ToolOutput::record(
            format!("{} file(s) matching '{}'", files.len(), params.pattern),
            &files,
        )
    }

    /// Route a tool call to its handler.
    pub async fn dispatch(&self, name: &str, args: Arguments) -> ToolResponse {
        match name {
            "list_sandboxes" => self.handle_list_sandboxes(args).await,
            "get_sandbox" => self.handle_get_sandbox(args).await,
            "create_sandbox" => self.handle_create_sandbox(args).await,
            "delete_sandbox" => self.handle_delete_sandbox(args).await,
            "start_sandbox" => self.handle_start_sandbox(args).await,
            "stop_sandbox" => self.handle_stop_sandbox(args).await,
            "archive_sandbox" => self.handle_archive_sandbox(args).await,
            "set_sandbox_labels" => self.handle_set_sandbox_labels(args).await,
            "set_sandbox_public" => self.handle_set_sandbox_public(args).await,
            "create_backup" => self.handle_create_backup(args).await,
            "set_auto_stop_interval" => self.handle_set_auto_stop_interval(args).await,
            "set_auto_archive_interval" => self.handle_set_auto_archive_interval(args).await,
            "get_port_preview_url" => self.handle_get_port_preview_url(args).await,
            "get_build_logs" => self.handle_get_build_logs(args).await,
            "execute_command" => self.handle_execute_command(args).await,
            "create_session" => self.handle_create_session(args).await,
            "get_session" => self.handle_get_session(args).await,
            "list_sessions" => self.handle_list_sessions(args).await,
            "delete_session" => self.handle_delete_session(args).await,
            "execute_session_command" => self.handle_execute_session_command(args).await,
            "get_session_command" => self.handle_get_session_command(args).await,
            "get_session_command_logs" => self.handle_get_session_command_logs(args).await,
            "list_files" => self.handle_list_files(args).await,
            "download_file" => self.handle_download_file(args).await,
            "upload_file" => self.handle_upload_file(args).await,
            "create_folder" => self.handle_create_folder(args).await,
            "delete_file" => self.handle_delete_file(args).await,
            "get_file_info" => self.handle_get_file_info(args).await,
            "find_in_files" => self.handle_find_in_files(args).await,
            "search_files" => self.handle_search_files(args).await,
            _ => Err(ToolFailure::invalid(format!("Unknown tool: {name}"))),
        }
    }

    /// Build the list of available tools
    fn build_tools_list() -> Vec<Tool> {
        vec![
            // Sandbox lifecycle
            Tool::new(
                "list_sandboxes",
                "List sandboxes, optionally filtered by labels (all given labels must match).",
                Self::schema_to_json_object::<ListSandboxesParams>(),
            ),
            Tool::new(
                "get_sandbox",
                "Get a sandbox's full record including state, resources and labels.",
                Self::schema_to_json_object::<GetSandboxParams>(),
            ),
            Tool::new(
                "create_sandbox",
                "Create a new sandbox. Omitted fields use the remote defaults.",
                Self::schema_to_json_object::<CreateSandboxParams>(),
            ),
            Tool::new(
                "delete_sandbox",
                "Delete a sandbox. The force flag must be given explicitly.",
                Self::schema_to_json_object::<DeleteSandboxParams>(),
            ),
            Tool::new(
                "start_sandbox",
                "Start a stopped or archived sandbox.",
                Self::schema_to_json_object::<SandboxParams>(),
            ),
            Tool::new(
                "stop_sandbox",
                "Stop a running sandbox.",
                Self::schema_to_json_object::<SandboxParams>(),
            ),
            Tool::new(
                "archive_sandbox",
                "Archive a stopped sandbox to cold storage.",
                Self::schema_to_json_object::<SandboxParams>(),
            ),
            Tool::new(
                "set_sandbox_labels",
                "Replace all labels of a sandbox with the given set.",
                Self::schema_to_json_object::<SetLabelsParams>(),
            ),
            Tool::new(
                "set_sandbox_public",
                "Make a sandbox's port previews public or private.",
                Self::schema_to_json_object::<SetPublicParams>(),
            ),
            Tool::new(
                "create_backup",
                "Request a backup of a sandbox. Returns once the request is accepted.",
                Self::schema_to_json_object::<SandboxParams>(),
            ),
            Tool::new(
                "set_auto_stop_interval",
                "Set minutes of inactivity before auto-stop. 0 disables auto-stop.",
                Self::schema_to_json_object::<IntervalParams>(),
            ),
            Tool::new(
                "set_auto_archive_interval",
                "Set minutes stopped before auto-archive. 0 selects the maximum interval.",
                Self::schema_to_json_object::<IntervalParams>(),
            ),
            Tool::new(
                "get_port_preview_url",
                "Get the externally reachable URL for a port inside a sandbox.",
                Self::schema_to_json_object::<PortPreviewParams>(),
            ),
            Tool::new(
                "get_build_logs",
                "Get the build logs of a sandbox.",
                Self::schema_to_json_object::<BuildLogsParams>(),
            ),
            // Process & sessions
            Tool::new(
                "execute_command",
                "Run a shell command and wait for it. Returns exit code and output.",
                Self::schema_to_json_object::<ExecuteCommandParams>(),
            ),
            Tool::new(
                "create_session",
                "Create a named session for running commands that share state.",
                Self::schema_to_json_object::<SessionParams>(),
            ),
            Tool::new(
                "get_session",
                "Get a session and the commands it has run.",
                Self::schema_to_json_object::<SessionParams>(),
            ),
            Tool::new(
                "list_sessions",
                "List sessions in a sandbox.",
                Self::schema_to_json_object::<SandboxParams>(),
            ),
            Tool::new(
                "delete_session",
                "Delete a session.",
                Self::schema_to_json_object::<SessionParams>(),
            ),
            Tool::new(
                "execute_session_command",
                "Run a command in an existing session. With runAsync a command ID is \
                 returned immediately; poll get_session_command for the exit code.",
                Self::schema_to_json_object::<ExecuteSessionCommandParams>(),
            ),
            Tool::new(
                "get_session_command",
                "Get a session command. A missing exit code means it is still running.",
                Self::schema_to_json_object::<SessionCommandParams>(),
            ),
            Tool::new(
                "get_session_command_logs",
                "Get the output of a session command.",
                Self::schema_to_json_object::<CommandLogsParams>(),
            ),
            // Files
            Tool::new(
                "list_files",
                "List the contents of a directory in the sandbox.",
                Self::schema_to_json_object::<FilePathParams>(),
            ),
            Tool::new(
                "download_file",
                "Read a text file from the sandbox.",
                Self::schema_to_json_object::<FilePathParams>(),
            ),
            Tool::new(
                "upload_file",
                "Write a text file to the sandbox, replacing any existing file.",
                Self::schema_to_json_object::<UploadFileParams>(),
            ),
            Tool::new(
                "create_folder",
                "Create a folder in the sandbox.",
                Self::schema_to_json_object::<CreateFolderParams>(),
            ),
            Tool::new(
                "delete_file",
                "Delete a file or folder in the sandbox.",
                Self::schema_to_json_object::<FilePathParams>(),
            ),
            Tool::new(
                "get_file_info",
                "Get size, mode and ownership of a file.",
                Self::schema_to_json_object::<FilePathParams>(),
            ),
            Tool::new(
                "find_in_files",
                "Find lines matching a text pattern in files under a path.",
                Self::schema_to_json_object::<SearchParams>(),
            ),
            Tool::new(
                "search_files",
                "Find files whose names match a glob pattern under a path.",
                Self::schema_to_json_object::<SearchParams>(),
            ),
        ]
    }
}

// ============================================================================
// ServerHandler Implementation
// ============================================================================

impl ServerHandler for DaytonaServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Daytona MCP Server - Manage remote Daytona sandboxes. \
                 Use create_sandbox or list_sandboxes to get a sandbox ID, then \
                 execute_command for one-off commands or create_session and \
                 execute_session_command for stateful work. Async session commands \
                 return a command ID; poll get_session_command until it has an exit code. \
                 Failures are reported as 'Error [kind]: message'."
                    .into(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: Self::build_tools_list(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let start = std::time::Instant::now();
        let response = self.dispatch(request.name.as_ref(), request.arguments).await;

        match &response {
            Ok(_) => tracing::debug!(
                tool = %request.name,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Tool call succeeded"
            ),
            Err(failure) => tracing::warn!(
                tool = %request.name,
                kind = %failure.kind,
                error = %failure.message,
                "Tool call failed"
            ),
        }

        Ok(Self::to_call_result(response))
    }
}
