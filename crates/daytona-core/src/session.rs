//! Sessions, commands and the execution contract.
//!
//! Two execution modes exist:
//!
//! - **One-shot** ([`SessionController::execute_command`]): no session, blocks
//!   until the command completes or the remote-side timeout fires, always
//!   returns exit code and output together.
//! - **Session-scoped** ([`SessionController::execute_session_command`]):
//!   requires an existing session. With `run_async = false` it behaves like
//!   one-shot inside the session; with `run_async = true` it returns a
//!   command id immediately and the caller polls
//!   [`SessionController::get_session_command`] and
//!   [`SessionController::session_command_logs`].
//!
//! Nothing here polls, waits or times out on the caller's behalf, and no
//! session or command existence is cached: every lookup goes to the remote.

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::normalize::decode_json;
use crate::resolver::Operation;
use crate::transport::RequestBody;
use serde::{Deserialize, Serialize};

/// Remote-side timeout for one-shot execution when the caller gives none.
pub const DEFAULT_EXECUTE_TIMEOUT: u32 = 10;

/// A command recorded in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub id: String,
    #[serde(default)]
    pub command: String,
    /// Absent while the command is still running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl Command {
    pub fn status(&self) -> CommandStatus {
        match self.exit_code {
            Some(exit_code) => CommandStatus::Finished { exit_code },
            None => CommandStatus::Running,
        }
    }
}

/// Completion status of a session command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum CommandStatus {
    Running,
    Finished { exit_code: i32 },
}

/// A session and the commands it has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    #[serde(default, deserialize_with = "crate::normalize::null_as_default")]
    pub commands: Vec<Command>,
}

/// One-shot command request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteRequest {
    pub command: String,
    pub cwd: Option<String>,
    /// Remote-side timeout; [`DEFAULT_EXECUTE_TIMEOUT`] when `None`.
    pub timeout: Option<u32>,
}

impl ExecuteRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            cwd: None,
            timeout: None,
        }
    }

    fn body(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "command": self.command,
            "timeout": self.timeout.unwrap_or(DEFAULT_EXECUTE_TIMEOUT),
        });
        if let Some(cwd) = &self.cwd {
            body["cwd"] = serde_json::Value::String(cwd.clone());
        }
        body
    }
}

/// Result of an execution request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ExecutionOutcome {
    /// Synchronous result: exit code and output arrive together.
    Completed {
        exit_code: i32,
        output: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        command_id: Option<String>,
    },
    /// Asynchronous start: only an id, no exit code yet.
    Started { command_id: String },
}

impl ExecutionOutcome {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Completed { exit_code, .. } => Some(*exit_code),
            Self::Started { .. } => None,
        }
    }

    pub fn command_id(&self) -> Option<&str> {
        match self {
            Self::Completed { command_id, .. } => command_id.as_deref(),
            Self::Started { command_id } => Some(command_id),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteResponse {
    exit_code: Option<i32>,
    #[serde(default)]
    result: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionExecuteResponse {
    #[serde(default)]
    cmd_id: Option<String>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    exit_code: Option<i32>,
}

/// Session and command operations inside a sandbox.
#[derive(Debug, Clone)]
pub struct SessionController {
    client: ApiClient,
}

impl SessionController {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Same controller with a per-call organization override.
    pub fn scoped(&self, organization_id: Option<&str>) -> Self {
        Self {
            client: self.client.scoped(organization_id),
        }
    }

    /// Run a one-shot command and block until it completes.
    ///
    /// # Errors
    ///
    /// Besides transport and remote failures, a response without an exit
    /// code is reported as [`ApiError::Unknown`].
    pub async fn execute_command(
        &self,
        sandbox_id: &str,
        request: &ExecuteRequest,
    ) -> Result<ExecutionOutcome> {
        let start = std::time::Instant::now();
        tracing::info!(
            sandbox_id = %sandbox_id,
            timeout = request.timeout.unwrap_or(DEFAULT_EXECUTE_TIMEOUT),
            "Executing one-shot command"
        );
        let resp = self
            .client
            .call(
                &Operation::ExecuteCommand { sandbox_id },
                Some(RequestBody::Json(request.body())),
            )
            .await?;
        let decoded: ExecuteResponse = decode_json(&resp)?;
        let exit_code = decoded.exit_code.ok_or_else(|| {
            ApiError::Unknown("synchronous execution returned no exit code".into())
        })?;
        let output = decoded.result.unwrap_or_default();
        tracing::debug!(
            sandbox_id = %sandbox_id,
            exit_code,
            output_len = output.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "One-shot command completed"
        );
        Ok(ExecutionOutcome::Completed {
            exit_code,
            output,
            command_id: None,
        })
    }

    pub async fn list_sessions(&self, sandbox_id: &str) -> Result<Vec<Session>> {
        tracing::debug!(sandbox_id = %sandbox_id, "Listing sessions");
        let resp = self
            .client
            .call(&Operation::ListSessions { sandbox_id }, None)
            .await?;
        decode_json(&resp)
    }

    /// Create a session with a caller-chosen id.
    pub async fn create_session(&self, sandbox_id: &str, session_id: &str) -> Result<()> {
        // The id travels in the body but is used in paths afterwards.
        crate::resolver::validate_identifier("sessionId", session_id)?;
        tracing::info!(sandbox_id = %sandbox_id, session_id = %session_id, "Creating session");
        self.client
            .call(
                &Operation::CreateSession { sandbox_id },
                Some(RequestBody::Json(
                    serde_json::json!({ "sessionId": session_id }),
                )),
            )
            .await?;
        Ok(())
    }

    pub async fn get_session(&self, sandbox_id: &str, session_id: &str) -> Result<Session> {
        tracing::debug!(sandbox_id = %sandbox_id, session_id = %session_id, "Fetching session");
        let resp = self
            .client
            .call(
                &Operation::GetSession {
                    sandbox_id,
                    session_id,
                },
                None,
            )
            .await?;
        decode_json(&resp)
    }

    pub async fn delete_session(&self, sandbox_id: &str, session_id: &str) -> Result<()> {
        tracing::info!(sandbox_id = %sandbox_id, session_id = %session_id, "Deleting session");
        self.client
            .call(
                &Operation::DeleteSession {
                    sandbox_id,
                    session_id,
                },
                None,
            )
            .await?;
        Ok(())
    }

    /// Run a command inside an existing session.
    ///
    /// A missing session is the remote's not-found error; no session is
    /// ever created implicitly.
    ///
    /// # Errors
    ///
    /// A synchronous response without exit code, or an asynchronous one
    /// without command id, is reported as [`ApiError::Unknown`].
    pub async fn execute_session_command(
        &self,
        sandbox_id: &str,
        session_id: &str,
        command: &str,
        run_async: bool,
    ) -> Result<ExecutionOutcome> {
        tracing::info!(
            sandbox_id = %sandbox_id,
            session_id = %session_id,
            run_async,
            "Executing session command"
        );
        let resp = self
            .client
            .call(
                &Operation::ExecuteSessionCommand {
                    sandbox_id,
                    session_id,
                },
                Some(RequestBody::Json(serde_json::json!({
                    "command": command,
                    "runAsync": run_async,
                }))),
            )
            .await?;
        let decoded: SessionExecuteResponse = decode_json(&resp)?;

        let outcome = if run_async {
            let command_id = decoded.cmd_id.ok_or_else(|| {
                ApiError::Unknown("asynchronous execution returned no command id".into())
            })?;
            ExecutionOutcome::Started { command_id }
        } else {
            let exit_code = decoded.exit_code.ok_or_else(|| {
                ApiError::Unknown("synchronous execution returned no exit code".into())
            })?;
            ExecutionOutcome::Completed {
                exit_code,
                output: decoded.output.unwrap_or_default(),
                command_id: decoded.cmd_id,
            }
        };

        tracing::debug!(
            sandbox_id = %sandbox_id,
            session_id = %session_id,
            command_id = ?outcome.command_id(),
            exit_code = ?outcome.exit_code(),
            "Session command accepted"
        );
        Ok(outcome)
    }

    /// Current state of a session command. A missing exit code means the
    /// command is still running, which is not an error.
    pub async fn get_session_command(
        &self,
        sandbox_id: &str,
        session_id: &str,
        command_id: &str,
    ) -> Result<Command> {
        tracing::debug!(
            sandbox_id = %sandbox_id,
            session_id = %session_id,
            command_id = %command_id,
            "Polling session command"
        );
        let resp = self
            .client
            .call(
                &Operation::GetSessionCommand {
                    sandbox_id,
                    session_id,
                    command_id,
                },
                None,
            )
            .await?;
        decode_json(&resp)
    }

    /// Accumulated output of a session command. `follow` is passed through.
    pub async fn session_command_logs(
        &self,
        sandbox_id: &str,
        session_id: &str,
        command_id: &str,
        follow: bool,
    ) -> Result<String> {
        tracing::debug!(
            sandbox_id = %sandbox_id,
            session_id = %session_id,
            command_id = %command_id,
            follow,
            "Fetching command logs"
        );
        let resp = self
            .client
            .call(
                &Operation::SessionCommandLogs {
                    sandbox_id,
                    session_id,
                    command_id,
                    follow,
                },
                None,
            )
            .await?;
        Ok(resp.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::resolver::RequestScope;
    use crate::sandbox::SandboxController;
    use crate::testing::{FakeRemote, RecordingTransport};
    use crate::transport::TransportFailure;
    use serde_json::json;
    use std::sync::Arc;

    fn controller(transport: Arc<dyn crate::transport::Transport>) -> SessionController {
        SessionController::new(ApiClient::new(transport, RequestScope::none()))
    }

    fn remote_with_session() -> (Arc<FakeRemote>, SessionController) {
        let remote = FakeRemote::new();
        remote.add_sandbox("sb-1", &[]);
        let sessions = controller(remote.clone());
        (remote, sessions)
    }

    #[test]
    fn test_command_status() {
        let running = Command {
            id: "c1".into(),
            command: "sleep 5".into(),
            exit_code: None,
        };
        let done = Command {
            exit_code: Some(2),
            ..running.clone()
        };
        assert_eq!(running.status(), CommandStatus::Running);
        assert_eq!(done.status(), CommandStatus::Finished { exit_code: 2 });
    }

    #[test]
    fn test_outcome_serialization() {
        let started = ExecutionOutcome::Started {
            command_id: "c1".into(),
        };
        assert_eq!(
            serde_json::to_value(&started).unwrap(),
            json!({ "status": "started", "commandId": "c1" })
        );
        let done = ExecutionOutcome::Completed {
            exit_code: 0,
            output: "hi".into(),
            command_id: None,
        };
        assert_eq!(
            serde_json::to_value(&done).unwrap(),
            json!({ "status": "completed", "exitCode": 0, "output": "hi" })
        );
    }

    #[tokio::test]
    async fn test_one_shot_defaults_timeout_and_returns_both() {
        let transport = RecordingTransport::new();
        transport.respond(200, r#"{"exitCode":0,"result":"hello\n"}"#);
        let sessions = controller(transport.clone());

        let outcome = sessions
            .execute_command("sb-1", &ExecuteRequest::new("echo hello"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ExecutionOutcome::Completed {
                exit_code: 0,
                output: "hello\n".into(),
                command_id: None,
            }
        );
        let request = transport.last_request();
        assert_eq!(request.path, "/toolbox/sb-1/toolbox/process/execute");
        assert_eq!(
            request.body,
            Some(RequestBody::Json(json!({ "command": "echo hello", "timeout": 10 })))
        );
    }

    #[tokio::test]
    async fn test_one_shot_passes_cwd_and_timeout() {
        let transport = RecordingTransport::new();
        transport.respond(200, r#"{"exitCode":1,"result":""}"#);
        let request = ExecuteRequest {
            command: "make".into(),
            cwd: Some("/work".into()),
            timeout: Some(60),
        };
        let outcome = controller(transport.clone())
            .execute_command("sb-1", &request)
            .await
            .unwrap();
        assert_eq!(outcome.exit_code(), Some(1));
        assert_eq!(
            transport.last_request().body,
            Some(RequestBody::Json(
                json!({ "command": "make", "timeout": 60, "cwd": "/work" })
            ))
        );
    }

    #[tokio::test]
    async fn test_one_shot_missing_exit_code_is_unknown() {
        let transport = RecordingTransport::new();
        transport.respond(200, r#"{"result":"partial"}"#);
        let err = controller(transport)
            .execute_command("sb-1", &ExecuteRequest::new("true"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[tokio::test]
    async fn test_sync_session_command_returns_exit_code_and_output() {
        let (_remote, sessions) = remote_with_session();
        sessions.create_session("sb-1", "dev").await.unwrap();

        let outcome = sessions
            .execute_session_command("sb-1", "dev", "ls", false)
            .await
            .unwrap();
        match outcome {
            ExecutionOutcome::Completed {
                exit_code, output, ..
            } => {
                assert_eq!(exit_code, 0);
                assert_eq!(output, "ran: ls\n");
            }
            other => panic!("expected completed outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_async_command_polling_lifecycle() {
        let (remote, sessions) = remote_with_session();
        sessions.create_session("sb-1", "dev").await.unwrap();

        let outcome = sessions
            .execute_session_command("sb-1", "dev", "npm test", true)
            .await
            .unwrap();
        assert_eq!(outcome.exit_code(), None);
        let command_id = outcome.command_id().expect("async returns an id").to_string();

        let polled = sessions
            .get_session_command("sb-1", "dev", &command_id)
            .await
            .unwrap();
        assert_eq!(polled.status(), CommandStatus::Running);

        remote.finish_command("sb-1", "dev", &command_id, 3, "1 failing\n");

        for _ in 0..3 {
            let polled = sessions
                .get_session_command("sb-1", "dev", &command_id)
                .await
                .unwrap();
            assert_eq!(polled.status(), CommandStatus::Finished { exit_code: 3 });
        }

        let logs = sessions
            .session_command_logs("sb-1", "dev", &command_id, false)
            .await
            .unwrap();
        assert_eq!(logs, "1 failing\n");
    }

    #[tokio::test]
    async fn test_exec_against_absent_session_is_not_found() {
        let (_remote, sessions) = remote_with_session();

        let err = sessions
            .execute_session_command("sb-1", "ghost", "ls", false)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteRejected);
        assert!(err.is_not_found());

        let err = sessions.get_session("sb-1", "ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_exec_after_delete_session_is_not_found() {
        let (_remote, sessions) = remote_with_session();
        sessions.create_session("sb-1", "dev").await.unwrap();
        sessions.delete_session("sb-1", "dev").await.unwrap();

        let err = sessions
            .execute_session_command("sb-1", "dev", "ls", true)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_sessions_vanish_with_their_sandbox() {
        let (remote, sessions) = remote_with_session();
        sessions.create_session("sb-1", "dev").await.unwrap();

        let sandboxes = SandboxController::new(ApiClient::new(remote.clone(), RequestScope::none()));
        sandboxes.delete("sb-1", true).await.unwrap();

        let err = sessions
            .execute_session_command("sb-1", "dev", "ls", false)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = sessions.get_session("sb-1", "dev").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_dropped_connection_is_unreachable() {
        let transport = RecordingTransport::new();
        transport.fail(TransportFailure::NoResponse("connection reset by peer".into()));
        let err = controller(transport.clone())
            .execute_session_command("sb-1", "dev", "make build", false)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unreachable);
        assert!(!err.is_not_found());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_command_is_not_found_not_running() {
        let (_remote, sessions) = remote_with_session();
        sessions.create_session("sb-1", "dev").await.unwrap();
        let err = sessions
            .get_session_command("sb-1", "dev", "cmd-404")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_session_lists_commands() {
        let (_remote, sessions) = remote_with_session();
        sessions.create_session("sb-1", "dev").await.unwrap();
        sessions
            .execute_session_command("sb-1", "dev", "pwd", false)
            .await
            .unwrap();

        let session = sessions.get_session("sb-1", "dev").await.unwrap();
        assert_eq!(session.session_id, "dev");
        assert_eq!(session.commands.len(), 1);
        assert_eq!(session.commands[0].command, "pwd");
        assert_eq!(session.commands[0].exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_async_without_command_id_is_unknown() {
        let transport = RecordingTransport::new();
        transport.respond(200, "{}");
        let err = controller(transport)
            .execute_session_command("sb-1", "dev", "sleep 1", true)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[tokio::test]
    async fn test_create_session_rejects_unsafe_id_locally() {
        let transport = RecordingTransport::new();
        let err = controller(transport.clone())
            .create_session("sb-1", "../evil")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocalInvalid);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_no_state() {
        let (_remote, sessions) = remote_with_session();
        sessions.create_session("sb-1", "a").await.unwrap();
        sessions.create_session("sb-1", "b").await.unwrap();

        let (a, b) = futures::future::join(
            sessions.execute_session_command("sb-1", "a", "echo a", false),
            sessions.execute_session_command("sb-1", "b", "echo b", false),
        )
        .await;
        assert_eq!(a.unwrap().exit_code(), Some(0));
        assert_eq!(b.unwrap().exit_code(), Some(0));
    }
}
