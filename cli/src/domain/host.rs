//! Hosts and the roles that group them into sessions.

use std::fmt;
use std::path::PathBuf;

use crate::config::ServerConfig;

/// Role tag selecting a session group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Hosts running the built-in mongo
    Database,
    /// Hosts running the application container
    App,
}

impl Role {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::App => "appserver",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A remote host reachable over SSH
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    /// Inventory name (key in `servers`)
    pub name: String,
    /// Hostname or IP; colocation is decided on this
    pub address: String,
    pub username: String,
    pub pem: Option<PathBuf>,
    pub port: u16,
}

impl Host {
    /// Create a host with default login settings
    #[cfg(test)]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            username: "root".to_string(),
            pem: None,
            port: 22,
        }
    }

    /// Build a host from an inventory entry
    pub fn from_server(name: &str, server: &ServerConfig) -> Self {
        Self {
            name: name.to_string(),
            address: server.host.clone(),
            username: server.username.clone(),
            pem: server.pem.clone(),
            port: server.port,
        }
    }

    /// `user@address` destination for ssh/scp
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.address)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}
