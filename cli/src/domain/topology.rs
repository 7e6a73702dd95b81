//! Placement checks for the built-in mongo.
//!
//! The built-in setup only supports colocated mode: exactly one app server,
//! on the same address as the database host.

use std::fmt;

use super::host::Host;

/// Why an operation was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Zero or several app servers
    AppServerCount,
    /// App server and database on different hosts
    NotColocated,
}

impl SkipReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::AppServerCount => {
                "requires exactly one application server; use an external database for multi-server deployments."
            }
            Self::NotColocated => "database and application server must be colocated.",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of a topology check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyCheck {
    Ok,
    Skip(SkipReason),
}

/// Check that the hosts form a colocated deployment
pub fn validate(database_hosts: &[Host], app_hosts: &[Host]) -> TopologyCheck {
    if app_hosts.len() != 1 {
        return TopologyCheck::Skip(SkipReason::AppServerCount);
    }

    match database_hosts.first() {
        Some(db) if db.address == app_hosts[0].address => TopologyCheck::Ok,
        _ => TopologyCheck::Skip(SkipReason::NotColocated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(name: &str, address: &str) -> Host {
        Host::new(name, address)
    }

    #[test]
    fn test_colocated_single_host() {
        let db = [host("one", "10.0.0.5")];
        let app = [host("one", "10.0.0.5")];
        assert_eq!(validate(&db, &app), TopologyCheck::Ok);
    }

    #[test]
    fn test_app_count_skips_regardless_of_hosts() {
        let db = [host("one", "10.0.0.5")];
        let cases: Vec<Vec<Host>> = vec![
            vec![],
            vec![host("one", "10.0.0.5"), host("two", "10.0.0.6")],
            vec![host("one", "10.0.0.5"), host("one", "10.0.0.5")],
            vec![host("a", "x"), host("b", "y"), host("c", "z")],
        ];

        for app in cases {
            assert_eq!(
                validate(&db, &app),
                TopologyCheck::Skip(SkipReason::AppServerCount)
            );
            assert_eq!(
                validate(&[], &app),
                TopologyCheck::Skip(SkipReason::AppServerCount)
            );
        }
    }

    #[test]
    fn test_different_address_not_colocated() {
        let db = [host("db", "10.0.0.5")];
        let app = [host("db", "10.0.0.6")];
        assert_eq!(
            validate(&db, &app),
            TopologyCheck::Skip(SkipReason::NotColocated)
        );
    }

    #[test]
    fn test_missing_database_host_not_colocated() {
        let app = [host("one", "10.0.0.5")];
        assert_eq!(
            validate(&[], &app),
            TopologyCheck::Skip(SkipReason::NotColocated)
        );
    }

    #[test]
    fn test_skip_messages() {
        assert!(SkipReason::AppServerCount
            .to_string()
            .contains("exactly one application server"));
        assert!(SkipReason::NotColocated.to_string().contains("colocated"));
    }
}
