//! # Deployment Configuration
//!
//! A single `deploy.yaml` describes the servers, the app and the optional
//! built-in mongo:
//!
//! ```yaml
//! servers:
//!   one:
//!     host: 203.0.113.10
//!     username: root
//!     pem: ~/.ssh/id_rsa
//!
//! app:
//!   name: shop
//!   servers:
//!     one: {}
//!   ssl:
//!     autogenerate:
//!       email: ops@shop.io
//!       domains: shop.io
//!
//! mongo:
//!   version: 3.4.1
//!   oplog: true
//!   ipwhitelist: [198.51.100.7]
//!   servers:
//!     one: {}
//! ```
//!
//! The `mongo` section is optional. Commands decide for themselves whether
//! its absence is a no-op or an error.

mod app;
mod database;
mod servers;

pub use app::{AppConfig, SslMode};
pub use database::DatabaseConfig;
pub use servers::{ServerConfig, SshConfig};

#[cfg(test)]
pub use app::{AutogenerateConfig, SslConfig};
#[cfg(test)]
pub use database::IpWhitelist;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;
use crate::services::ports::ConfigStore;

/// Complete deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Server inventory keyed by name
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,

    /// SSH options shared by every server
    #[serde(default)]
    pub ssh: SshConfig,

    /// Application server configuration
    #[serde(alias = "meteor")]
    pub app: AppConfig,

    /// Built-in mongo configuration
    #[serde(default)]
    pub mongo: Option<DatabaseConfig>,
}

impl DeployConfig {
    /// Load and validate configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path).with_context(|| {
            format!(
                "Failed to read config file: {}\n  Ensure the file is readable.",
                path.display()
            )
        })?;

        let config = Self::from_yaml(&content).with_context(|| {
            format!(
                "Invalid configuration in {}\n  Check YAML syntax and server references.",
                path.display()
            )
        })?;

        Ok(config)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "app.name".to_string(),
                value: self.app.name.clone(),
            });
        }

        for (name, server) in &self.servers {
            if server.host.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("servers.{}.host", name),
                    value: server.host.clone(),
                });
            }
        }

        let mut references: Vec<(&str, &String)> =
            self.app.servers.keys().map(|k| ("app", k)).collect();
        if let Some(mongo) = &self.mongo {
            references.extend(mongo.servers.keys().map(|k| ("mongo", k)));
        }

        for (section, server) in references {
            if !self.servers.contains_key(server) {
                return Err(ConfigError::UnknownServer {
                    section: section.to_string(),
                    server: server.clone(),
                });
            }
        }

        Ok(())
    }
}

impl ConfigStore for DeployConfig {
    fn config(&self) -> &DeployConfig {
        self
    }
}
