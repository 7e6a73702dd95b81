//! Collaborator interfaces consumed by the lifecycle orchestrator
//!
//! Concrete implementations live in `infrastructure`; tests provide fakes.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::config::DeployConfig;
use crate::domain::{Host, OperationSequence, Role};
use crate::error::{ArchiveError, ExecutionError};

/// Options forwarded to the execution engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Stream remote output instead of showing a spinner
    pub verbose: bool,
}

/// Read-only access to the deployment configuration
pub trait ConfigStore: Send + Sync {
    fn config(&self) -> &DeployConfig;
}

/// Resolves role tags to the hosts carrying them
pub trait SessionProvider: Send + Sync {
    fn sessions(&self, roles: &[Role]) -> Vec<Host>;
}

/// Runs an operation sequence on a set of hosts
///
/// Operations must run strictly in order, stopping at the first failure.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn run(
        &self,
        sequence: &OperationSequence,
        hosts: &[Host],
        options: RunOptions,
    ) -> Result<(), ExecutionError>;
}

/// Streams a container's logs from the given hosts
#[async_trait]
pub trait LogStreamer: Send + Sync {
    async fn stream_logs(
        &self,
        service: &str,
        hosts: &[Host],
        extra_args: &[String],
    ) -> Result<(), ExecutionError>;
}

/// Copies a finished backup from the database host to local storage
#[async_trait]
pub trait ArchiveRetriever: Send + Sync {
    /// Returns the local path the archive was written to
    async fn retrieve(&self, hosts: &[Host]) -> Result<PathBuf, ArchiveError>;
}
