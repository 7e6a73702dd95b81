//! Application server configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How TLS is terminated in front of the app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslMode {
    /// No TLS; the app container talks to mongo directly
    None,
    /// Let's Encrypt certificates issued by the nginx companion containers
    Autogenerate,
    /// User-provided certificate served by a frontend proxy
    Custom,
}

/// Let's Encrypt settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutogenerateConfig {
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub domains: Option<String>,
}

/// The `app.ssl` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SslConfig {
    #[serde(default)]
    pub autogenerate: Option<AutogenerateConfig>,

    /// Certificate path for custom TLS
    #[serde(default)]
    pub crt: Option<String>,

    /// Key path for custom TLS
    #[serde(default)]
    pub key: Option<String>,
}

/// The `app` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// App name; also the container name on the host
    pub name: String,

    /// Servers (keys into the top-level `servers` map) running the app
    #[serde(default)]
    pub servers: BTreeMap<String, serde_yaml::Value>,

    #[serde(default)]
    pub ssl: Option<SslConfig>,
}

impl AppConfig {
    /// Create an app config without servers or TLS
    #[cfg(test)]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            servers: BTreeMap::new(),
            ssl: None,
        }
    }

    /// Builder: set TLS settings
    #[cfg(test)]
    pub fn with_ssl(mut self, ssl: SslConfig) -> Self {
        self.ssl = Some(ssl);
        self
    }

    /// Derive the TLS mode from the `ssl` section
    pub fn ssl_mode(&self) -> SslMode {
        match &self.ssl {
            None => SslMode::None,
            Some(ssl) if ssl.autogenerate.is_some() => SslMode::Autogenerate,
            Some(_) => SslMode::Custom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssl_mode_derivation() {
        let plain: AppConfig = serde_yaml::from_str("name: shop").unwrap();
        assert_eq!(plain.ssl_mode(), SslMode::None);

        let auto: AppConfig = serde_yaml::from_str(
            "name: shop\nssl:\n  autogenerate:\n    email: ops@shop.io\n    domains: shop.io",
        )
        .unwrap();
        assert_eq!(auto.ssl_mode(), SslMode::Autogenerate);

        let custom: AppConfig =
            serde_yaml::from_str("name: shop\nssl:\n  crt: ./bundle.crt\n  key: ./private.key")
                .unwrap();
        assert_eq!(custom.ssl_mode(), SslMode::Custom);
    }
}
