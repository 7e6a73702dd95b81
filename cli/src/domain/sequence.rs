//! Operation sequences for each lifecycle command.
//!
//! Defaults for omitted config values are substituted here.

use crate::config::{AppConfig, DatabaseConfig};
use crate::error::VarsError;

use super::access;
use super::operation::{OperationSequence, OperationVars, RemoteOperation, ScriptRef};

/// mongo version used when the config omits one
pub const DEFAULT_MONGO_VERSION: &str = "3.4.1";

/// Where the mongod config lands on the host
pub const MONGO_CONF_DEST: &str = "/opt/mongodb/mongodb.conf";

pub const SETUP_SCRIPT: ScriptRef = ScriptRef::new("mongo-setup.sh");
pub const STANDALONE_CONF: ScriptRef = ScriptRef::new("mongodb.conf");
pub const REPLICA_CONF: ScriptRef = ScriptRef::new("mongodbReplica.conf");
pub const START_SCRIPT: ScriptRef = ScriptRef::new("mongo-start.sh");
pub const REPLICA_START_SCRIPT: ScriptRef = ScriptRef::new("mongoReplica-start.sh");
pub const STOP_SCRIPT: ScriptRef = ScriptRef::new("mongo-stop.sh");
pub const BACKUP_SCRIPT: ScriptRef = ScriptRef::new("backup.sh");
pub const FIREWALL_SCRIPT: ScriptRef = ScriptRef::new("iptables.sh");

/// Name of the replication step appended to the start sequence
pub const START_REPLICA: &str = "Start Replica";

pub fn setup(mongo: &DatabaseConfig) -> OperationSequence {
    let conf = if mongo.oplog {
        REPLICA_CONF
    } else {
        STANDALONE_CONF
    };

    OperationSequence::new("Setup Mongo")
        .then(RemoteOperation::execute_script(
            "Setup Environment",
            SETUP_SCRIPT,
            OperationVars::None,
        ))
        .then(RemoteOperation::copy(
            "Copying mongodb.conf",
            conf,
            MONGO_CONF_DEST,
        ))
}

/// Start mongo, then the replica set when oplog is on.
///
/// Restricting access afterwards is chained by the orchestrator, not here.
pub fn start(mongo: &DatabaseConfig) -> Result<OperationSequence, VarsError> {
    let version = mongo
        .version
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(DEFAULT_MONGO_VERSION);
    let vars = OperationVars::start(version, &mongo.ip_whitelist.joined())?;

    let mut sequence = OperationSequence::new("Start Mongo").then(
        RemoteOperation::execute_script("Start Mongo", START_SCRIPT, vars),
    );

    if mongo.oplog {
        sequence = sequence.then(RemoteOperation::execute_script(
            START_REPLICA,
            REPLICA_START_SCRIPT,
            OperationVars::None,
        ));
    }

    Ok(sequence)
}

pub fn stop() -> OperationSequence {
    OperationSequence::new("Stop Mongo").then(RemoteOperation::execute_script(
        "Stop Mongo",
        STOP_SCRIPT,
        OperationVars::None,
    ))
}

pub fn backup(app: &AppConfig) -> Result<OperationSequence, VarsError> {
    Ok(
        OperationSequence::new("Backup Mongo").then(RemoteOperation::execute_script(
            "Backup Mongo",
            BACKUP_SCRIPT,
            OperationVars::backup(&app.name)?,
        )),
    )
}

pub fn restrict_access(
    mongo: &DatabaseConfig,
    app: &AppConfig,
) -> Result<OperationSequence, VarsError> {
    let vars = OperationVars::restrict_access(
        mongo.ip_whitelist.entries(),
        &app.name,
        access::plan(app),
    )?;

    Ok(
        OperationSequence::new("Whitelist Mongo").then(RemoteOperation::execute_script(
            "Whitelist Mongo",
            FIREWALL_SCRIPT,
            vars,
        )),
    )
}
