//! Test transports.
//!
//! [`RecordingTransport`] replays scripted responses and records every
//! request. [`FakeRemote`] is a small in-memory stand-in for the remote
//! service, used to check behavior that spans several calls.

use crate::transport::{HttpRequest, Method, RawResponse, RequestBody, Transport, TransportFailure};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

pub(crate) struct RecordingTransport {
    responses: Mutex<VecDeque<Result<RawResponse, TransportFailure>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn respond(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(Ok(RawResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub(crate) fn fail(&self, failure: TransportFailure) {
        self.responses.lock().unwrap().push_back(Err(failure));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("at least one request was sent")
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportFailure> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportFailure::Other("no scripted response".into())))
    }
}

#[derive(Debug, Clone)]
struct FakeCommand {
    id: String,
    command: String,
    exit_code: Option<i32>,
    output: String,
}

#[derive(Default)]
struct RemoteState {
    sandboxes: BTreeMap<String, Value>,
    sessions: BTreeMap<(String, String), Vec<FakeCommand>>,
    next_command: u32,
}

pub(crate) struct FakeRemote {
    state: Mutex<RemoteState>,
}

impl FakeRemote {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(RemoteState::default()),
        })
    }

    pub(crate) fn add_sandbox(&self, id: &str, labels: &[(&str, &str)]) {
        let labels: BTreeMap<&str, &str> = labels.iter().copied().collect();
        self.state.lock().unwrap().sandboxes.insert(
            id.to_string(),
            json!({ "id": id, "state": "started", "labels": labels, "public": false }),
        );
    }

    /// Mark an async command as finished.
    pub(crate) fn finish_command(&self, sandbox: &str, session: &str, command_id: &str, exit_code: i32, output: &str) {
        let mut state = self.state.lock().unwrap();
        let commands = state
            .sessions
            .get_mut(&(sandbox.to_string(), session.to_string()))
            .expect("session exists");
        let cmd = commands
            .iter_mut()
            .find(|c| c.id == command_id)
            .expect("command exists");
        cmd.exit_code = Some(exit_code);
        cmd.output = output.to_string();
    }

    fn not_found(what: &str) -> RawResponse {
        RawResponse {
            status: 404,
            body: json!({ "statusCode": 404, "message": format!("{what} not found") }).to_string(),
        }
    }

    fn ok(value: Value) -> RawResponse {
        RawResponse {
            status: 200,
            body: value.to_string(),
        }
    }

    fn text(body: &str) -> RawResponse {
        RawResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    fn json_body(request: &HttpRequest) -> Value {
        match &request.body {
            Some(RequestBody::Json(v)) => v.clone(),
            _ => Value::Null,
        }
    }

    fn handle(&self, request: &HttpRequest) -> RawResponse {
        let mut state = self.state.lock().unwrap();
        let segments: Vec<&str> = request.path.trim_start_matches('/').split('/').collect();

        match (request.method, segments.as_slice()) {
            (Method::Get, ["sandbox"]) => {
                Self::ok(Value::Array(state.sandboxes.values().cloned().collect()))
            }
            (Method::Get, ["sandbox", id]) => match state.sandboxes.get(*id) {
                Some(sb) => Self::ok(sb.clone()),
                None => Self::not_found("sandbox"),
            },
            (Method::Delete, ["sandbox", id]) => {
                if state.sandboxes.remove(*id).is_none() {
                    return Self::not_found("sandbox");
                }
                state.sessions.retain(|(sb, _), _| sb.as_str() != *id);
                Self::text("")
            }
            (Method::Put, ["sandbox", id, "labels"]) => {
                let labels = Self::json_body(request)["labels"].clone();
                match state.sandboxes.get_mut(*id) {
                    Some(sb) => {
                        sb["labels"] = labels.clone();
                        Self::ok(json!({ "labels": labels }))
                    }
                    None => Self::not_found("sandbox"),
                }
            }
            (Method::Post, ["toolbox", id, "toolbox", "process", "session"]) => {
                if !state.sandboxes.contains_key(*id) {
                    return Self::not_found("sandbox");
                }
                let session = Self::json_body(request)["sessionId"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                state.sessions.insert((id.to_string(), session), Vec::new());
                Self::text("")
            }
            (Method::Get, ["toolbox", id, "toolbox", "process", "session", session]) => {
                match state.sessions.get(&(id.to_string(), session.to_string())) {
                    Some(commands) => Self::ok(json!({
                        "sessionId": session,
                        "commands": commands
                            .iter()
                            .map(|c| json!({ "id": c.id, "command": c.command, "exitCode": c.exit_code }))
                            .collect::<Vec<_>>(),
                    })),
                    None => Self::not_found("session"),
                }
            }
            (Method::Delete, ["toolbox", id, "toolbox", "process", "session", session]) => {
                match state.sessions.remove(&(id.to_string(), session.to_string())) {
                    Some(_) => Self::text(""),
                    None => Self::not_found("session"),
                }
            }
            (Method::Post, ["toolbox", id, "toolbox", "process", "session", session, "exec"]) => {
                let body = Self::json_body(request);
                let command = body["command"].as_str().unwrap_or_default().to_string();
                let run_async = body["runAsync"].as_bool().unwrap_or(false);
                state.next_command += 1;
                let cmd_id = format!("cmd-{}", state.next_command);
                let Some(commands) = state.sessions.get_mut(&(id.to_string(), session.to_string()))
                else {
                    return Self::not_found("session");
                };
                if run_async {
                    commands.push(FakeCommand {
                        id: cmd_id.clone(),
                        command,
                        exit_code: None,
                        output: String::new(),
                    });
                    Self::ok(json!({ "cmdId": cmd_id }))
                } else {
                    let output = format!("ran: {command}\n");
                    commands.push(FakeCommand {
                        id: cmd_id.clone(),
                        command,
                        exit_code: Some(0),
                        output: output.clone(),
                    });
                    Self::ok(json!({ "cmdId": cmd_id, "output": output, "exitCode": 0 }))
                }
            }
            (Method::Get, ["toolbox", id, "toolbox", "process", "session", session, "command", cmd, rest @ ..]) => {
                let Some(commands) = state.sessions.get(&(id.to_string(), session.to_string())) else {
                    return Self::not_found("session");
                };
                let Some(found) = commands.iter().find(|c| c.id == *cmd) else {
                    return Self::not_found("command");
                };
                match rest {
                    [] => Self::ok(json!({
                        "id": found.id,
                        "command": found.command,
                        "exitCode": found.exit_code,
                    })),
                    ["logs"] => Self::text(&found.output),
                    _ => Self::not_found("route"),
                }
            }
            (Method::Post, ["toolbox", id, "toolbox", "process", "execute"]) => {
                if !state.sandboxes.contains_key(*id) {
                    return Self::not_found("sandbox");
                }
                let command = Self::json_body(request)["command"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                Self::ok(json!({ "exitCode": 0, "result": format!("ran: {command}") }))
            }
            _ => Self::not_found("route"),
        }
    }
}

#[async_trait]
impl Transport for FakeRemote {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportFailure> {
        Ok(self.handle(&request))
    }
}
