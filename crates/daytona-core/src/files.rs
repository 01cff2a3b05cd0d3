//! Filesystem operations inside a sandbox.
//!
//! Paths are absolute or relative to the sandbox user's home and travel in
//! the `path` query parameter, so they are never interpolated into the URL
//! path. Contents are text; binary transfer is out of scope.

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::normalize::{decode_json, decode_value};
use crate::resolver::Operation;
use crate::transport::RequestBody;
use serde::{Deserialize, Serialize};

/// Mode applied to new folders when the caller gives none.
pub const DEFAULT_FOLDER_MODE: &str = "755";

/// Metadata for a single file or directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub name: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mod_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// A line matching a content search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub file: String,
    pub line: u64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    files: Vec<String>,
}

/// File operations against a sandbox's toolbox API.
#[derive(Debug, Clone)]
pub struct FileController {
    client: ApiClient,
}

impl FileController {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn scoped(&self, organization_id: Option<&str>) -> Self {
        Self {
            client: self.client.scoped(organization_id),
        }
    }

    /// Directory entries under `path`.
    pub async fn list_files(&self, sandbox_id: &str, path: &str) -> Result<Vec<FileInfo>> {
        tracing::debug!(sandbox_id = %sandbox_id, path = %path, "Listing files");
        let resp = self
            .client
            .call(&Operation::ListFiles { sandbox_id, path }, None)
            .await?;
        decode_json(&resp)
    }

    /// File contents as text.
    pub async fn download_file(&self, sandbox_id: &str, path: &str) -> Result<String> {
        tracing::debug!(sandbox_id = %sandbox_id, path = %path, "Downloading file");
        let resp = self
            .client
            .call(&Operation::DownloadFile { sandbox_id, path }, None)
            .await?;
        tracing::debug!(path = %path, size = resp.body.len(), "File downloaded");
        Ok(resp.body)
    }

    /// Write `content` to `path`, replacing any existing file.
    pub async fn upload_file(&self, sandbox_id: &str, path: &str, content: &str) -> Result<()> {
        let file_name = path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .ok_or_else(|| ApiError::LocalInvalid(format!("path '{path}' has no file name")))?
            .to_string();
        tracing::info!(sandbox_id = %sandbox_id, path = %path, size = content.len(), "Uploading file");
        self.client
            .call(
                &Operation::UploadFile { sandbox_id, path },
                Some(RequestBody::File {
                    file_name,
                    content: content.as_bytes().to_vec(),
                }),
            )
            .await?;
        Ok(())
    }

    /// Create a folder; `mode` defaults to [`DEFAULT_FOLDER_MODE`].
    pub async fn create_folder(&self, sandbox_id: &str, path: &str, mode: Option<&str>) -> Result<()> {
        let mode = mode.unwrap_or(DEFAULT_FOLDER_MODE);
        if mode.is_empty() || !mode.chars().all(|c| ('0'..='7').contains(&c)) {
            return Err(ApiError::LocalInvalid(format!(
                "mode '{mode}' must be an octal permission string such as 755"
            )));
        }
        tracing::info!(sandbox_id = %sandbox_id, path = %path, mode = %mode, "Creating folder");
        self.client
            .call(&Operation::CreateFolder { sandbox_id, path, mode }, None)
            .await?;
        Ok(())
    }

    pub async fn delete_file(&self, sandbox_id: &str, path: &str) -> Result<serde_json::Value> {
        tracing::info!(sandbox_id = %sandbox_id, path = %path, "Deleting file");
        let resp = self
            .client
            .call(&Operation::DeleteFile { sandbox_id, path }, None)
            .await?;
        Ok(decode_value(&resp))
    }

    pub async fn get_file_info(&self, sandbox_id: &str, path: &str) -> Result<FileInfo> {
        let resp = self
            .client
            .call(&Operation::FileInfo { sandbox_id, path }, None)
            .await?;
        decode_json(&resp)
    }

    /// Lines under `path` whose content matches `pattern`.
    pub async fn find_in_files(&self, sandbox_id: &str, path: &str, pattern: &str) -> Result<Vec<Match>> {
        tracing::debug!(sandbox_id = %sandbox_id, path = %path, pattern = %pattern, "Searching file contents");
        let resp = self
            .client
            .call(
                &Operation::FindInFiles {
                    sandbox_id,
                    path,
                    pattern,
                },
                None,
            )
            .await?;
        decode_json(&resp)
    }

    /// File paths under `path` whose names match the glob `pattern`.
    pub async fn search_files(&self, sandbox_id: &str, path: &str, pattern: &str) -> Result<Vec<String>> {
        tracing::debug!(sandbox_id = %sandbox_id, path = %path, pattern = %pattern, "Searching file names");
        let resp = self
            .client
            .call(
                &Operation::SearchFiles {
                    sandbox_id,
                    path,
                    pattern,
                },
                None,
            )
            .await?;
        let decoded: SearchResponse = decode_json(&resp)?;
        Ok(decoded.files)
    }
}
