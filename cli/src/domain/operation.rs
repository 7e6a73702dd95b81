//! Remote operations and their typed variables.
//!
//! Scripts receive their parameters as named variables. Each operation kind
//! has a fixed key set, so the variables are modelled as a closed enum and
//! validated when constructed rather than passed around as loose maps.

use std::collections::BTreeMap;

use crate::error::VarsError;

/// Reference to a script or template in the assets directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRef(&'static str);

impl ScriptRef {
    pub const fn new(file_name: &'static str) -> Self {
        Self(file_name)
    }

    pub fn file_name(&self) -> &'static str {
        self.0
    }
}

/// Variable value as seen by a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarValue {
    Str(String),
    List(Vec<String>),
}

/// Typed parameters bound to a script execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationVars {
    None,
    Start {
        version: String,
        ip_whitelist: String,
    },
    Backup {
        name: String,
    },
    RestrictAccess {
        allowed_ips: Vec<String>,
        app_name: String,
        local_peers: Vec<String>,
    },
}

fn check_name(field: &'static str, value: &str) -> Result<(), VarsError> {
    if value.is_empty() {
        return Err(VarsError::Empty { field });
    }
    if value.chars().any(char::is_whitespace) {
        return Err(VarsError::Whitespace {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

impl OperationVars {
    pub fn start(version: &str, ip_whitelist: &str) -> Result<Self, VarsError> {
        check_name("mongoVersion", version)?;
        Ok(Self::Start {
            version: version.to_string(),
            ip_whitelist: ip_whitelist.to_string(),
        })
    }

    pub fn backup(name: &str) -> Result<Self, VarsError> {
        check_name("name", name)?;
        Ok(Self::Backup {
            name: name.to_string(),
        })
    }

    pub fn restrict_access(
        allowed_ips: &[String],
        app_name: &str,
        local_peers: Vec<String>,
    ) -> Result<Self, VarsError> {
        check_name("name", app_name)?;
        for peer in &local_peers {
            check_name("localServers", peer)?;
        }
        Ok(Self::RestrictAccess {
            allowed_ips: allowed_ips.to_vec(),
            app_name: app_name.to_string(),
            local_peers,
        })
    }

    /// Render to the names the scripts read
    pub fn to_map(&self) -> BTreeMap<&'static str, VarValue> {
        let mut vars = BTreeMap::new();
        match self {
            Self::None => {}
            Self::Start {
                version,
                ip_whitelist,
            } => {
                vars.insert("mongoVersion", VarValue::Str(version.clone()));
                vars.insert("ipwhitelist", VarValue::Str(ip_whitelist.clone()));
            }
            Self::Backup { name } => {
                vars.insert("name", VarValue::Str(name.clone()));
            }
            Self::RestrictAccess {
                allowed_ips,
                app_name,
                local_peers,
            } => {
                vars.insert("ips", VarValue::List(allowed_ips.clone()));
                vars.insert("name", VarValue::Str(app_name.clone()));
                vars.insert("localServers", VarValue::List(local_peers.clone()));
            }
        }
        vars
    }
}

/// What an operation does on the remote host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationAction {
    /// Run a script with bound variables
    ExecuteScript {
        script: ScriptRef,
        vars: OperationVars,
    },
    /// Upload a file to a fixed destination
    Copy { src: ScriptRef, dest: String },
}

/// A named step executed on every target host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOperation {
    pub name: String,
    pub action: OperationAction,
}

impl RemoteOperation {
    pub fn execute_script(name: impl Into<String>, script: ScriptRef, vars: OperationVars) -> Self {
        Self {
            name: name.into(),
            action: OperationAction::ExecuteScript { script, vars },
        }
    }

    pub fn copy(name: impl Into<String>, src: ScriptRef, dest: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: OperationAction::Copy {
                src,
                dest: dest.into(),
            },
        }
    }

    /// Variables bound to this operation (empty for copies)
    #[cfg(test)]
    pub fn vars(&self) -> Option<&OperationVars> {
        match &self.action {
            OperationAction::ExecuteScript { vars, .. } => Some(vars),
            OperationAction::Copy { .. } => None,
        }
    }
}

/// Ordered, fail-fast list of operations dispatched as one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSequence {
    pub title: String,
    pub operations: Vec<RemoteOperation>,
}

impl OperationSequence {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            operations: Vec::new(),
        }
    }

    /// Builder: append an operation
    pub fn then(mut self, operation: RemoteOperation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[cfg(test)]
    pub fn names(&self) -> Vec<&str> {
        self.operations.iter().map(|op| op.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_vars_map() {
        let vars = OperationVars::start("3.4.1", "").unwrap();
        let map = vars.to_map();
        assert_eq!(map["mongoVersion"], VarValue::Str("3.4.1".to_string()));
        assert_eq!(map["ipwhitelist"], VarValue::Str(String::new()));
    }

    #[test]
    fn test_restrict_access_vars_map() {
        let vars = OperationVars::restrict_access(
            &["10.0.0.1".to_string()],
            "shop",
            vec!["shop-frontend".to_string()],
        )
        .unwrap();
        let map = vars.to_map();
        assert_eq!(map.len(), 3);
        assert_eq!(map["ips"], VarValue::List(vec!["10.0.0.1".to_string()]));
        assert_eq!(
            map["localServers"],
            VarValue::List(vec!["shop-frontend".to_string()])
        );
    }

    #[test]
    fn test_vars_validation() {
        assert_eq!(
            OperationVars::backup("").unwrap_err(),
            VarsError::Empty { field: "name" }
        );
        assert!(matches!(
            OperationVars::start("3.4 .1", ""),
            Err(VarsError::Whitespace { .. })
        ));
        assert!(OperationVars::restrict_access(&[], "shop", vec![String::new()]).is_err());
    }

    #[test]
    fn test_none_vars_render_empty() {
        assert!(OperationVars::None.to_map().is_empty());
    }
}
