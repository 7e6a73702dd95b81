//! Built-in MongoDB configuration (the `mongo` section).

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Addresses allowed through the firewall to mongo
///
/// Accepts either a YAML list or a single string separated by commas
/// and/or whitespace. Blank entries are dropped, so `""` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IpWhitelist(Vec<String>);

impl IpWhitelist {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|s| {
                    let s: String = s.into();
                    s.trim().to_string()
                })
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    /// Parse a comma/whitespace separated list
    pub fn parse(joined: &str) -> Self {
        Self::new(joined.split(|c: char| c == ',' || c.is_whitespace()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    /// Comma-joined form passed to the start script
    pub fn joined(&self) -> String {
        self.0.join(",")
    }
}

impl<'de> Deserialize<'de> for IpWhitelist {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            List(Vec<String>),
            Joined(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::List(list)) => Self::new(list),
            Some(Raw::Joined(joined)) => Self::parse(&joined),
            None => Self::default(),
        })
    }
}

/// The `mongo` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// mongo image version; the start sequence defaults it
    #[serde(default)]
    pub version: Option<String>,

    /// Run as a single-node replica set so the app can tail the oplog
    #[serde(default)]
    pub oplog: bool,

    #[serde(default, rename = "ipwhitelist", alias = "ip_whitelist")]
    pub ip_whitelist: IpWhitelist,

    /// Servers (keys into the top-level `servers` map) running mongo
    #[serde(default)]
    pub servers: BTreeMap<String, serde_yaml::Value>,
}

#[cfg(test)]
impl DatabaseConfig {
    /// Builder: set version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Builder: enable oplog
    pub fn with_oplog(mut self) -> Self {
        self.oplog = true;
        self
    }

    /// Builder: set whitelist
    pub fn with_whitelist(mut self, whitelist: IpWhitelist) -> Self {
        self.ip_whitelist = whitelist;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelist_from_list() {
        let config: DatabaseConfig =
            serde_yaml::from_str("ipwhitelist:\n  - 10.0.0.1\n  - ' 10.0.0.2 '\n  - ''").unwrap();
        assert_eq!(config.ip_whitelist.entries(), ["10.0.0.1", "10.0.0.2"]);
        assert_eq!(config.ip_whitelist.joined(), "10.0.0.1,10.0.0.2");
    }

    #[test]
    fn test_whitelist_from_string() {
        let config: DatabaseConfig =
            serde_yaml::from_str("ipwhitelist: '10.0.0.1, 10.0.0.2 10.0.0.3'").unwrap();
        assert_eq!(
            config.ip_whitelist.entries(),
            ["10.0.0.1", "10.0.0.2", "10.0.0.3"]
        );
    }

    #[test]
    fn test_empty_and_missing_whitelist() {
        let blank: DatabaseConfig = serde_yaml::from_str("ipwhitelist: ''").unwrap();
        assert!(blank.ip_whitelist.is_empty());
        assert_eq!(blank.ip_whitelist.joined(), "");

        let null: DatabaseConfig = serde_yaml::from_str("ipwhitelist: ~").unwrap();
        assert!(null.ip_whitelist.is_empty());

        let missing: DatabaseConfig = serde_yaml::from_str("oplog: true").unwrap();
        assert!(missing.ip_whitelist.is_empty());
        assert!(missing.version.is_none());
        assert!(missing.oplog);
    }
}
