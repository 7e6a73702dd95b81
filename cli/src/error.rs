//! Centralized error types for mongo-deploy
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use thiserror::Error;

/// Top-level error type for lifecycle operations
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("No `{section}` configuration found in deploy.yaml")]
    ConfigMissing { section: &'static str },

    #[error("Remote execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Backup archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Invalid operation variables: {0}")]
    InvalidVariables(#[from] VarsError),
}

/// Failures reported by an execution engine or log streamer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("'{operation}' failed on {host}: {message}")]
    OperationFailed {
        operation: String,
        host: String,
        message: String,
    },

    #[error("Failed to spawn {tool}: {message}")]
    Spawn { tool: String, message: String },

    #[error("Asset not found: {path}")]
    AssetNotFound { path: String },

    #[error("No hosts to run '{sequence}' against")]
    NoHosts { sequence: String },
}

/// Post-backup archive retrieval errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("No database host to retrieve the backup from")]
    NoSourceHost,

    #[error("Copying {source_path} to {local_path} failed: {message}")]
    CopyFailed {
        source_path: String,
        local_path: String,
        message: String,
    },
}

/// Rejected input while building typed operation variables
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VarsError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must not contain whitespace: '{value}'")]
    Whitespace { field: &'static str, value: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("{section} references unknown server '{server}'")]
    UnknownServer { section: String, server: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_missing_display() {
        let err = LifecycleError::ConfigMissing { section: "mongo" };
        assert!(err.to_string().contains("mongo"));
    }

    #[test]
    fn test_error_conversion() {
        let exec_err = ExecutionError::OperationFailed {
            operation: "Start Mongo".to_string(),
            host: "one".to_string(),
            message: "exit status 1".to_string(),
        };
        let err: LifecycleError = exec_err.into();
        assert!(matches!(err, LifecycleError::Execution(_)));
        assert!(err.to_string().contains("Start Mongo"));
    }
}
