//! Server inventory and SSH connection settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A remote server entry from the top-level `servers` map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Hostname or IP address
    pub host: String,

    /// SSH login user
    #[serde(default = "default_username")]
    pub username: String,

    /// Private key used for authentication (falls back to the ssh agent)
    #[serde(default)]
    pub pem: Option<PathBuf>,

    /// SSH port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_username() -> String {
    "root".to_string()
}

fn default_port() -> u16 {
    22
}

/// Options passed through to the `ssh`/`scp` binaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    /// ConnectTimeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// StrictHostKeyChecking value ("yes", "no", "accept-new")
    #[serde(default = "default_host_key_checking")]
    pub strict_host_key_checking: String,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_host_key_checking() -> String {
    "accept-new".to_string()
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            strict_host_key_checking: default_host_key_checking(),
        }
    }
}
