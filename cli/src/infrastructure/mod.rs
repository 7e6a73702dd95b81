//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that interacts with external systems:
//! - Remote script execution over ssh/scp
//! - Container log streaming
//! - Backup archive retrieval
//! - Host inventory from deploy.yaml

pub mod archive;
pub mod inventory;
pub mod logs;
pub mod ssh;

// Re-export commonly used types
pub use archive::ScpArchiveRetriever;
pub use inventory::Inventory;
pub use logs::DockerLogStreamer;
pub use ssh::{SshExecutor, SshOptions};
