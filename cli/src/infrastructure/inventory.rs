//! Session groups resolved from the `servers` inventory.

use crate::config::DeployConfig;
use crate::domain::{Host, Role};
use crate::services::ports::SessionProvider;

/// Hosts per role, derived once from the configuration
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    database: Vec<Host>,
    app: Vec<Host>,
}

impl Inventory {
    /// Resolve each section's server references against `servers`
    ///
    /// References are validated when the config is loaded; unknown names
    /// are skipped here.
    pub fn from_config(config: &DeployConfig) -> Self {
        let resolve = |names: Vec<&String>| -> Vec<Host> {
            names
                .into_iter()
                .filter_map(|name| {
                    config
                        .servers
                        .get(name)
                        .map(|server| Host::from_server(name, server))
                })
                .collect()
        };

        let database = config
            .mongo
            .as_ref()
            .map(|mongo| resolve(mongo.servers.keys().collect()))
            .unwrap_or_default();
        let app = resolve(config.app.servers.keys().collect());

        Self { database, app }
    }
}

impl SessionProvider for Inventory {
    fn sessions(&self, roles: &[Role]) -> Vec<Host> {
        let mut hosts: Vec<Host> = Vec::new();
        for role in roles {
            let group = match role {
                Role::Database => &self.database,
                Role::App => &self.app,
            };
            for host in group {
                if !hosts.contains(host) {
                    hosts.push(host.clone());
                }
            }
        }
        hosts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
servers:
  one:
    host: 10.0.0.5
  two:
    host: 10.0.0.6
    username: deploy
    port: 2222
app:
  name: shop
  servers:
    one: {}
    two: {}
mongo:
  servers:
    one: {}
"#;

    #[test]
    fn test_sessions_by_role() {
        let config = DeployConfig::from_yaml(CONFIG).unwrap();
        let inventory = Inventory::from_config(&config);

        let db = inventory.sessions(&[Role::Database]);
        assert_eq!(db.len(), 1);
        assert_eq!(db[0].address, "10.0.0.5");

        let app = inventory.sessions(&[Role::App]);
        assert_eq!(app.len(), 2);
        assert_eq!(app[1].destination(), "deploy@10.0.0.6");
        assert_eq!(app[1].port, 2222);
    }

    #[test]
    fn test_combined_roles_deduplicate() {
        let config = DeployConfig::from_yaml(CONFIG).unwrap();
        let inventory = Inventory::from_config(&config);
        assert_eq!(inventory.sessions(&[Role::Database, Role::App]).len(), 2);
    }

    #[test]
    fn test_no_mongo_section_has_no_database_hosts() {
        let config = DeployConfig::from_yaml("app:\n  name: shop").unwrap();
        let inventory = Inventory::from_config(&config);
        assert!(inventory.sessions(&[Role::Database]).is_empty());
    }
}
