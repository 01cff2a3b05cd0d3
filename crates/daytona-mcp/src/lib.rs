//! # daytona-mcp
//!
//! MCP (Model Context Protocol) server exposing Daytona sandboxes to AI agents.
//!
//! The server is stateless: each tool call is translated into one request
//! against the Daytona API and the response is rendered as a titled text
//! block or a pretty-printed JSON record.
//!
//! ## Quick Start
//!
//! ```bash
//! export DAYTONA_API_KEY=dtn_...
//! export DAYTONA_ORGANIZATION_ID=org-...   # optional
//! cargo run -p daytona-mcp
//! ```
//!
//! ## MCP Tools
//!
//! | Tool | Description |
//! |------|-------------|
//! | `list_sandboxes` | List sandboxes, filtered by labels |
//! | `get_sandbox` | Full sandbox record |
//! | `create_sandbox` | Create a sandbox |
//! | `delete_sandbox` | Delete a sandbox (explicit `force`) |
//! | `start_sandbox` / `stop_sandbox` / `archive_sandbox` | Lifecycle transitions |
//! | `set_sandbox_labels` | Replace labels |
//! | `set_sandbox_public` | Toggle public previews |
//! | `create_backup` | Request a backup |
//! | `set_auto_stop_interval` | Auto-stop minutes (0 disables) |
//! | `set_auto_archive_interval` | Auto-archive minutes (0 = maximum) |
//! | `get_port_preview_url` | Public URL for a sandbox port |
//! | `get_build_logs` | Build logs |
//! | `execute_command` | One-shot command, waits for completion |
//! | `create_session` / `get_session` / `list_sessions` / `delete_session` | Sessions |
//! | `execute_session_command` | Run a command in a session (sync or async) |
//! | `get_session_command` | Poll a session command |
//! | `get_session_command_logs` | Session command output |
//! | `list_files` / `get_file_info` | Inspect the filesystem |
//! | `download_file` / `upload_file` | Read and write text files |
//! | `create_folder` / `delete_file` | Create and remove paths |
//! | `find_in_files` / `search_files` | Content and name search |

mod config;
pub mod http;
mod server;
mod types;

pub use config::{ConfigError, DaytonaConfig, TransportMode, MAX_COMMAND_LENGTH, MAX_INPUT_SIZE_BYTES};
pub use server::DaytonaServer;
pub use types::*;
