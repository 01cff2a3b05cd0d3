//! Resource address resolution.
//!
//! Maps an [`Operation`] to the concrete [`Endpoint`] it targets: method,
//! path with interpolated identifiers, query parameters and scoping headers.
//! Resolution is pure. Every identifier placed into a path goes through
//! [`validate_identifier`] here and nowhere else.

use crate::error::{ApiError, Result};
use crate::sandbox::{AutoArchivePolicy, AutoStopPolicy, Labels};
use crate::transport::{HttpRequest, Method, RequestBody};

/// Header selecting the organization a request applies to.
pub const ORGANIZATION_HEADER: &str = "X-Daytona-Organization-ID";

/// Organization scope of a single request.
///
/// `None` means the header is omitted and the remote falls back to the
/// credential's default organization. `Some("")` is sent as an empty header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestScope {
    pub organization_id: Option<String>,
}

impl RequestScope {
    /// Scope with no organization override.
    pub fn none() -> Self {
        Self::default()
    }

    /// Scope for an explicit organization.
    pub fn organization(id: impl Into<String>) -> Self {
        Self {
            organization_id: Some(id.into()),
        }
    }

    /// Per-call override wins over `self`; an absent override keeps `self`.
    pub fn overridden_by(&self, organization_id: Option<&str>) -> Self {
        match organization_id {
            Some(id) => Self::organization(id),
            None => self.clone(),
        }
    }
}

/// A remote operation with the arguments that shape its address.
///
/// Request bodies are not part of the address; controllers attach them.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation<'a> {
    ListSandboxes {
        labels: Option<&'a Labels>,
        verbose: bool,
    },
    GetSandbox {
        sandbox_id: &'a str,
        verbose: bool,
    },
    CreateSandbox,
    DeleteSandbox {
        sandbox_id: &'a str,
        force: bool,
    },
    StartSandbox {
        sandbox_id: &'a str,
    },
    StopSandbox {
        sandbox_id: &'a str,
    },
    ArchiveSandbox {
        sandbox_id: &'a str,
    },
    ReplaceLabels {
        sandbox_id: &'a str,
    },
    SetPublic {
        sandbox_id: &'a str,
        public: bool,
    },
    CreateBackup {
        sandbox_id: &'a str,
    },
    SetAutoStop {
        sandbox_id: &'a str,
        policy: AutoStopPolicy,
    },
    SetAutoArchive {
        sandbox_id: &'a str,
        policy: AutoArchivePolicy,
    },
    PortPreviewUrl {
        sandbox_id: &'a str,
        port: u32,
    },
    BuildLogs {
        sandbox_id: &'a str,
        follow: bool,
    },
    ExecuteCommand {
        sandbox_id: &'a str,
    },
    ListSessions {
        sandbox_id: &'a str,
    },
    CreateSession {
        sandbox_id: &'a str,
    },
    GetSession {
        sandbox_id: &'a str,
        session_id: &'a str,
    },
    DeleteSession {
        sandbox_id: &'a str,
        session_id: &'a str,
    },
    ExecuteSessionCommand {
        sandbox_id: &'a str,
        session_id: &'a str,
    },
    GetSessionCommand {
        sandbox_id: &'a str,
        session_id: &'a str,
        command_id: &'a str,
    },
    SessionCommandLogs {
        sandbox_id: &'a str,
        session_id: &'a str,
        command_id: &'a str,
        follow: bool,
    },
    ListFiles {
        sandbox_id: &'a str,
        path: &'a str,
    },
    DownloadFile {
        sandbox_id: &'a str,
        path: &'a str,
    },
    UploadFile {
        sandbox_id: &'a str,
        path: &'a str,
    },
    CreateFolder {
        sandbox_id: &'a str,
        path: &'a str,
        mode: &'a str,
    },
    DeleteFile {
        sandbox_id: &'a str,
        path: &'a str,
    },
    FileInfo {
        sandbox_id: &'a str,
        path: &'a str,
    },
    FindInFiles {
        sandbox_id: &'a str,
        path: &'a str,
        pattern: &'a str,
    },
    SearchFiles {
        sandbox_id: &'a str,
        path: &'a str,
        pattern: &'a str,
    },
}

impl Operation<'_> {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListSandboxes { .. } => "list_sandboxes",
            Self::GetSandbox { .. } => "get_sandbox",
            Self::CreateSandbox => "create_sandbox",
            Self::DeleteSandbox { .. } => "delete_sandbox",
            Self::StartSandbox { .. } => "start_sandbox",
            Self::StopSandbox { .. } => "stop_sandbox",
            Self::ArchiveSandbox { .. } => "archive_sandbox",
            Self::ReplaceLabels { .. } => "set_sandbox_labels",
            Self::SetPublic { .. } => "set_sandbox_public",
            Self::CreateBackup { .. } => "create_backup",
            Self::SetAutoStop { .. } => "set_auto_stop_interval",
            Self::SetAutoArchive { .. } => "set_auto_archive_interval",
            Self::PortPreviewUrl { .. } => "get_port_preview_url",
            Self::BuildLogs { .. } => "get_build_logs",
            Self::ExecuteCommand { .. } => "execute_command",
            Self::ListSessions { .. } => "list_sessions",
            Self::CreateSession { .. } => "create_session",
            Self::GetSession { .. } => "get_session",
            Self::DeleteSession { .. } => "delete_session",
            Self::ExecuteSessionCommand { .. } => "execute_session_command",
            Self::GetSessionCommand { .. } => "get_session_command",
            Self::SessionCommandLogs { .. } => "get_session_command_logs",
            Self::ListFiles { .. } => "list_files",
            Self::DownloadFile { .. } => "download_file",
            Self::UploadFile { .. } => "upload_file",
            Self::CreateFolder { .. } => "create_folder",
            Self::DeleteFile { .. } => "delete_file",
            Self::FileInfo { .. } => "get_file_info",
            Self::FindInFiles { .. } => "find_in_files",
            Self::SearchFiles { .. } => "search_files",
        }
    }
}

/// Concrete request target produced by [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl Endpoint {
    fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Attach a body and produce the outbound request.
    pub fn into_request(self, body: Option<RequestBody>) -> HttpRequest {
        HttpRequest {
            method: self.method,
            path: self.path,
            query: self.query,
            headers: self.headers,
            body,
        }
    }
}

/// Check that `value` can be placed verbatim into a URL path segment.
///
/// Rejects empty values, `.` and `..`, path separators, URL delimiters,
/// percent signs and control characters.
pub fn validate_identifier<'v>(field: &'static str, value: &'v str) -> Result<&'v str> {
    let reject = |reason: String| ApiError::InvalidIdentifier { field, reason };

    if value.is_empty() {
        return Err(reject("must not be empty".into()));
    }
    if value == "." || value == ".." {
        return Err(reject(format!("'{value}' is not a valid identifier")));
    }
    if let Some(c) = value
        .chars()
        .find(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_control())
    {
        return Err(reject(format!("contains forbidden character {c:?}")));
    }
    Ok(value)
}

fn require_path<'v>(field: &'static str, value: &'v str) -> Result<&'v str> {
    if value.is_empty() {
        return Err(ApiError::LocalInvalid(format!("{field} must not be empty")));
    }
    Ok(value)
}

fn sandbox_path(sandbox_id: &str, suffix: &str) -> Result<String> {
    let id = validate_identifier("sandboxId", sandbox_id)?;
    Ok(format!("/sandbox/{id}{suffix}"))
}

fn process_path(sandbox_id: &str, suffix: &str) -> Result<String> {
    let id = validate_identifier("sandboxId", sandbox_id)?;
    Ok(format!("/toolbox/{id}/toolbox/process{suffix}"))
}

fn session_path(sandbox_id: &str, session_id: &str, suffix: &str) -> Result<String> {
    let session = validate_identifier("sessionId", session_id)?;
    process_path(sandbox_id, &format!("/session/{session}{suffix}"))
}

fn command_path(sandbox_id: &str, session_id: &str, command_id: &str, suffix: &str) -> Result<String> {
    let command = validate_identifier("commandId", command_id)?;
    session_path(sandbox_id, session_id, &format!("/command/{command}{suffix}"))
}

fn files_endpoint(method: Method, sandbox_id: &str, suffix: &str, path: &str) -> Result<Endpoint> {
    let id = validate_identifier("sandboxId", sandbox_id)?;
    let path = require_path("path", path)?;
    Ok(Endpoint::new(method, format!("/toolbox/{id}/toolbox/files{suffix}")).query("path", path))
}

/// Resolve `operation` under `scope` into a request target.
///
/// # Errors
///
/// Returns [`ApiError::InvalidIdentifier`] for an unsafe path identifier or
/// organization id, and [`ApiError::LocalInvalid`] for an empty file path.
pub fn resolve(operation: &Operation<'_>, scope: &RequestScope) -> Result<Endpoint> {
    use Operation as Op;

    let mut endpoint = match *operation {
        Op::ListSandboxes { labels, verbose } => {
            let mut endpoint = Endpoint::new(Method::Get, "/sandbox".into()).query("verbose", verbose);
            if let Some(labels) = labels {
                let encoded = serde_json::to_string(labels)
                    .map_err(|e| ApiError::LocalInvalid(format!("cannot encode labels: {e}")))?;
                endpoint = endpoint.query("labels", encoded);
            }
            endpoint
        }
        Op::GetSandbox { sandbox_id, verbose } => {
            Endpoint::new(Method::Get, sandbox_path(sandbox_id, "")?).query("verbose", verbose)
        }
        Op::CreateSandbox => Endpoint::new(Method::Post, "/sandbox".into()),
        Op::DeleteSandbox { sandbox_id, force } => {
            Endpoint::new(Method::Delete, sandbox_path(sandbox_id, "")?).query("force", force)
        }
        Op::StartSandbox { sandbox_id } => Endpoint::new(Method::Post, sandbox_path(sandbox_id, "/start")?),
        Op::StopSandbox { sandbox_id } => Endpoint::new(Method::Post, sandbox_path(sandbox_id, "/stop")?),
        Op::ArchiveSandbox { sandbox_id } => {
            Endpoint::new(Method::Post, sandbox_path(sandbox_id, "/archive")?)
        }
        Op::ReplaceLabels { sandbox_id } => Endpoint::new(Method::Put, sandbox_path(sandbox_id, "/labels")?),
        Op::SetPublic { sandbox_id, public } => {
            Endpoint::new(Method::Post, sandbox_path(sandbox_id, &format!("/public/{public}"))?)
        }
        Op::CreateBackup { sandbox_id } => Endpoint::new(Method::Post, sandbox_path(sandbox_id, "/backup")?),
        Op::SetAutoStop { sandbox_id, policy } => Endpoint::new(
            Method::Post,
            sandbox_path(sandbox_id, &format!("/autostop/{}", policy.minutes()))?,
        ),
        Op::SetAutoArchive { sandbox_id, policy } => Endpoint::new(
            Method::Post,
            sandbox_path(sandbox_id, &format!("/autoarchive/{}", policy.minutes()))?,
        ),
        Op::PortPreviewUrl { sandbox_id, port } => Endpoint::new(
            Method::Get,
            sandbox_path(sandbox_id, &format!("/ports/{port}/preview-url"))?,
        ),
        Op::BuildLogs { sandbox_id, follow } => {
            Endpoint::new(Method::Get, sandbox_path(sandbox_id, "/build-logs")?).query("follow", follow)
        }
        Op::ExecuteCommand { sandbox_id } => Endpoint::new(Method::Post, process_path(sandbox_id, "/execute")?),
        Op::ListSessions { sandbox_id } => Endpoint::new(Method::Get, process_path(sandbox_id, "/session")?),
        Op::CreateSession { sandbox_id } => Endpoint::new(Method::Post, process_path(sandbox_id, "/session")?),
        Op::GetSession {
            sandbox_id,
            session_id,
        } => Endpoint::new(Method::Get, session_path(sandbox_id, session_id, "")?),
        Op::DeleteSession {
            sandbox_id,
            session_id,
        } => Endpoint::new(Method::Delete, session_path(sandbox_id, session_id, "")?),
        Op::ExecuteSessionCommand {
            sandbox_id,
            session_id,
        } => Endpoint::new(Method::Post, session_path(sandbox_id, session_id, "/exec")?),
        Op::GetSessionCommand {
            sandbox_id,
            session_id,
            command_id,
        } => Endpoint::new(Method::Get, command_path(sandbox_id, session_id, command_id, "")?),
        Op::SessionCommandLogs {
            sandbox_id,
            session_id,
            command_id,
            follow,
        } => Endpoint::new(
            Method::Get,
            command_path(sandbox_id, session_id, command_id, "/logs")?,
        )
        .query("follow", follow),
        Op::ListFiles { sandbox_id, path } => files_endpoint(Method::Get, sandbox_id, "", path)?,
        Op::DownloadFile { sandbox_id, path } => {
            files_endpoint(Method::Get, sandbox_id, "/download", path)?
        }
        Op::UploadFile { sandbox_id, path } => files_endpoint(Method::Post, sandbox_id, "/upload", path)?,
        Op::CreateFolder {
            sandbox_id,
            path,
            mode,
        } => files_endpoint(Method::Post, sandbox_id, "/folder", path)?.query("mode", mode),
        Op::DeleteFile { sandbox_id, path } => files_endpoint(Method::Delete, sandbox_id, "", path)?,
        Op::FileInfo { sandbox_id, path } => files_endpoint(Method::Get, sandbox_id, "/info", path)?,
        Op::FindInFiles {
            sandbox_id,
            path,
            pattern,
        } => files_endpoint(Method::Get, sandbox_id, "/find", path)?.query("pattern", pattern),
        Op::SearchFiles {
            sandbox_id,
            path,
            pattern,
        } => files_endpoint(Method::Get, sandbox_id, "/search", path)?.query("pattern", pattern),
    };

    if let Some(org) = &scope.organization_id {
        if let Some(c) = org.chars().find(|c| c.is_control()) {
            return Err(ApiError::InvalidIdentifier {
                field: "organizationId",
                reason: format!("contains forbidden character {c:?}"),
            });
        }
        endpoint
            .headers
            .push((ORGANIZATION_HEADER.to_string(), org.clone()));
    }

    Ok(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::num::NonZeroU32;

    #[test]
    fn test_validate_identifier_accepts_opaque_ids() {
        assert!(validate_identifier("sandboxId", "4f1c2a9e-sbx").is_ok());
        assert!(validate_identifier("sessionId", "build.session_01").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_traversal() {
        let err = validate_identifier("sandboxId", "abc/../x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocalInvalid);
        assert!(err.to_string().contains("sandboxId"));
    }

    #[test]
    fn test_validate_identifier_rejects_unsafe_values() {
        for bad in ["", ".", "..", "a\\b", "a?b=1", "a#frag", "a%2Fb", "a\nb", "a\u{0}"] {
            assert!(
                validate_identifier("sandboxId", bad).is_err(),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_resolve_get_sandbox() {
        let endpoint = resolve(
            &Operation::GetSandbox {
                sandbox_id: "sb-1",
                verbose: false,
            },
            &RequestScope::none(),
        )
        .unwrap();
        assert_eq!(endpoint.method, Method::Get);
        assert_eq!(endpoint.path, "/sandbox/sb-1");
        assert_eq!(endpoint.query, vec![("verbose".to_string(), "false".to_string())]);
        assert!(endpoint.headers.is_empty());
    }

    #[test]
    fn test_resolve_rejects_bad_session_id() {
        let err = resolve(
            &Operation::GetSession {
                sandbox_id: "sb-1",
                session_id: "s/../../sandbox",
            },
            &RequestScope::none(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::InvalidIdentifier {
                field: "sessionId",
                ..
            }
        ));
    }

    #[test]
    fn test_resolve_command_logs_path() {
        let endpoint = resolve(
            &Operation::SessionCommandLogs {
                sandbox_id: "sb-1",
                session_id: "dev",
                command_id: "cmd-9",
                follow: true,
            },
            &RequestScope::none(),
        )
        .unwrap();
        assert_eq!(
            endpoint.path,
            "/toolbox/sb-1/toolbox/process/session/dev/command/cmd-9/logs"
        );
        assert_eq!(endpoint.query, vec![("follow".to_string(), "true".to_string())]);
    }

    #[test]
    fn test_resolve_delete_carries_force() {
        let endpoint = resolve(
            &Operation::DeleteSandbox {
                sandbox_id: "sb-1",
                force: true,
            },
            &RequestScope::none(),
        )
        .unwrap();
        assert_eq!(endpoint.method, Method::Delete);
        assert_eq!(endpoint.query, vec![("force".to_string(), "true".to_string())]);
    }

    #[test]
    fn test_resolve_auto_policies_zero_paths() {
        let stop = resolve(
            &Operation::SetAutoStop {
                sandbox_id: "sb-1",
                policy: AutoStopPolicy::Disabled,
            },
            &RequestScope::none(),
        )
        .unwrap();
        let archive = resolve(
            &Operation::SetAutoArchive {
                sandbox_id: "sb-1",
                policy: AutoArchivePolicy::Maximum,
            },
            &RequestScope::none(),
        )
        .unwrap();
        assert_eq!(stop.path, "/sandbox/sb-1/autostop/0");
        assert_eq!(archive.path, "/sandbox/sb-1/autoarchive/0");

        let after = resolve(
            &Operation::SetAutoStop {
                sandbox_id: "sb-1",
                policy: AutoStopPolicy::After(NonZeroU32::new(15).unwrap()),
            },
            &RequestScope::none(),
        )
        .unwrap();
        assert_eq!(after.path, "/sandbox/sb-1/autostop/15");
    }

    #[test]
    fn test_resolve_port_is_not_range_checked() {
        let endpoint = resolve(
            &Operation::PortPreviewUrl {
                sandbox_id: "sb-1",
                port: 70000,
            },
            &RequestScope::none(),
        )
        .unwrap();
        assert_eq!(endpoint.path, "/sandbox/sb-1/ports/70000/preview-url");
    }

    #[test]
    fn test_resolve_labels_query_is_json() {
        let labels: Labels = [("env".to_string(), "dev".to_string())].into_iter().collect();
        let endpoint = resolve(
            &Operation::ListSandboxes {
                labels: Some(&labels),
                verbose: true,
            },
            &RequestScope::none(),
        )
        .unwrap();
        assert_eq!(
            endpoint.query,
            vec![
                ("verbose".to_string(), "true".to_string()),
                ("labels".to_string(), r#"{"env":"dev"}"#.to_string()),
            ]
        );
    }

    #[test]
    fn test_organization_header_only_when_supplied() {
        let op = Operation::ListSandboxes {
            labels: None,
            verbose: false,
        };

        let without = resolve(&op, &RequestScope::none()).unwrap();
        assert!(without.headers.is_empty());

        let with = resolve(&op, &RequestScope::organization("org-42")).unwrap();
        assert_eq!(
            with.headers,
            vec![(ORGANIZATION_HEADER.to_string(), "org-42".to_string())]
        );

        let empty = resolve(&op, &RequestScope::organization("")).unwrap();
        assert_eq!(
            empty.headers,
            vec![(ORGANIZATION_HEADER.to_string(), String::new())]
        );
    }

    #[test]
    fn test_scope_override() {
        let default = RequestScope::organization("org-default");
        assert_eq!(default.overridden_by(None), default);
        assert_eq!(
            default.overridden_by(Some("org-call")),
            RequestScope::organization("org-call")
        );
        assert_eq!(
            RequestScope::none().overridden_by(None).organization_id,
            None
        );
    }

    #[test]
    fn test_organization_rejects_control_chars() {
        let err = resolve(
            &Operation::CreateSandbox,
            &RequestScope::organization("org\r\nX-Injected: 1"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocalInvalid);
    }

    #[test]
    fn test_file_path_goes_to_query() {
        let endpoint = resolve(
            &Operation::CreateFolder {
                sandbox_id: "sb-1",
                path: "/home/daytona/src app",
                mode: "755",
            },
            &RequestScope::none(),
        )
        .unwrap();
        assert_eq!(endpoint.path, "/toolbox/sb-1/toolbox/files/folder");
        assert_eq!(
            endpoint.query,
            vec![
                ("path".to_string(), "/home/daytona/src app".to_string()),
                ("mode".to_string(), "755".to_string()),
            ]
        );
    }

    #[test]
    fn test_file_path_must_be_present() {
        let err = resolve(
            &Operation::DownloadFile {
                sandbox_id: "sb-1",
                path: "",
            },
            &RequestScope::none(),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::LocalInvalid(_)));
    }
}
