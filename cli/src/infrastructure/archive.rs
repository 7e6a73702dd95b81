//! Backup archive retrieval
//!
//! After `backup.sh` has dumped the database on the host, the dump directory
//! is copied back with `scp -r`.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::info;

use crate::domain::Host;
use crate::error::ArchiveError;
use crate::services::ports::ArchiveRetriever;
use crate::tools::{get_tool_path, tools};

use super::ssh::SshOptions;

/// Dump directory written by `backup.sh`, relative to the login home
pub const DEFAULT_REMOTE_PATH: &str = "dump";

/// Copies the remote dump from the first database host
#[derive(Debug, Clone)]
pub struct ScpArchiveRetriever {
    options: SshOptions,
    remote_path: String,
    local_path: PathBuf,
}

impl ScpArchiveRetriever {
    pub fn new(options: SshOptions) -> Self {
        Self {
            options,
            remote_path: DEFAULT_REMOTE_PATH.to_string(),
            local_path: PathBuf::from(DEFAULT_REMOTE_PATH),
        }
    }

    /// Builder: set the remote dump path
    pub fn with_remote_path(mut self, remote_path: impl Into<String>) -> Self {
        self.remote_path = remote_path.into();
        self
    }

    /// Builder: set the local destination
    pub fn with_local_path(mut self, local_path: impl Into<PathBuf>) -> Self {
        self.local_path = local_path.into();
        self
    }
}

#[async_trait]
impl ArchiveRetriever for ScpArchiveRetriever {
    async fn retrieve(&self, hosts: &[Host]) -> Result<PathBuf, ArchiveError> {
        let host = hosts.first().ok_or(ArchiveError::NoSourceHost)?;
        let source_path = format!("{}:{}", host.destination(), self.remote_path);
        let local_path = self.local_path.display().to_string();

        info!("Copying backup {} -> {}", source_path, local_path);

        let copy_failed = |message: String| ArchiveError::CopyFailed {
            source_path: source_path.clone(),
            local_path: local_path.clone(),
            message,
        };

        let scp = get_tool_path(tools::SCP);
        let output = Command::new(&scp)
            .args(
                self.options
                    .scp_download_args(host, &self.remote_path, &self.local_path),
            )
            .output()
            .await
            .map_err(|e| copy_failed(format!("failed to spawn {}: {}", scp, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(copy_failed(stderr.trim().to_string()));
        }

        Ok(self.local_path.clone())
    }
}
