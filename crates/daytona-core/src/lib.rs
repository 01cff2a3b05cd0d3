//! # daytona-core
//!
//! Stateless client layer for remote Daytona sandboxes.
//!
//! Every operation is a single request/response exchange against the remote
//! API. Nothing is cached between calls: sandbox, session and command state
//! live on the remote side only.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   daytona-core (client)                  │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  ┌───────────────────┐  ┌──────────────────┐             │
//! │  │ SandboxController │  │ SessionController│  FileCtrl   │
//! │  └─────────┬─────────┘  └────────┬─────────┘             │
//! │            └──────────┬──────────┘                       │
//! │                       ▼                                  │
//! │  ┌────────────────────────────────────┐                  │
//! │  │ ApiClient                          │                  │
//! │  │  resolve() ─▶ Transport ─▶ check() │                  │
//! │  └────────────────────────────────────┘                  │
//! │                       │ HTTPS (bearer + org header)      │
//! └───────────────────────┼──────────────────────────────────┘
//!                         ▼
//!               ┌───────────────────┐
//!               │  Daytona API      │
//!               └───────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use daytona_core::{ApiClient, ExecuteRequest, HttpTransport, RequestScope, SessionController};
//! use std::sync::Arc;
//!
//! # async fn example() -> daytona_core::Result<()> {
//! let transport = HttpTransport::new(
//!     daytona_core::DEFAULT_API_URL,
//!     "dtn_api_key",
//!     daytona_core::DEFAULT_REQUEST_TIMEOUT,
//! )?;
//! let client = ApiClient::new(Arc::new(transport), RequestScope::none());
//! let sessions = SessionController::new(client);
//!
//! let outcome = sessions
//!     .execute_command("sandbox-id", &ExecuteRequest::new("uname -a"))
//!     .await?;
//! println!("exit code: {:?}", outcome.exit_code());
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Failures are classified into four kinds (see [`ErrorKind`]): the remote
//! rejected the request, the remote was unreachable, the request was invalid
//! before it was sent, or something else went wrong.

mod client;
mod envelope;
mod error;
mod files;
mod normalize;
mod resolver;
mod sandbox;
mod session;
mod transport;

#[cfg(test)]
mod testing;

pub use client::ApiClient;
pub use envelope::{ResultBody, ToolFailure, ToolOutput, ToolResponse};
pub use error::{ApiError, ErrorKind, Result};
pub use files::{FileController, FileInfo, Match, DEFAULT_FOLDER_MODE};
pub use normalize::{classify_failure, classify_status, remote_detail};
pub use resolver::{
    resolve, validate_identifier, Endpoint, Operation, RequestScope, ORGANIZATION_HEADER,
};
pub use sandbox::{
    parse_label_filter, AutoArchivePolicy, AutoStopPolicy, CreateSandbox, Labels, PortPreview,
    Sandbox, SandboxController, SandboxState,
};
pub use session::{
    Command, CommandStatus, ExecuteRequest, ExecutionOutcome, Session, SessionController,
    DEFAULT_EXECUTE_TIMEOUT,
};
pub use transport::{
    HttpRequest, HttpTransport, Method, RawResponse, RequestBody, Transport, TransportFailure,
    DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT,
};
