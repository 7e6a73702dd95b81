//! Lifecycle service - orchestrates the built-in mongo
//!
//! Each command checks its preconditions (config present, colocated
//! topology), builds its operation sequence and hands it to the execution
//! engine against the database hosts. `start` chains into
//! `restrict_access` once the service is up and a whitelist is configured.

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::domain::{sequence, topology, OperationSequence, Role, SkipReason, TopologyCheck};
use crate::error::LifecycleError;
use crate::ui;

use super::ports::{
    ArchiveRetriever, ConfigStore, ExecutionEngine, LogStreamer, RunOptions, SessionProvider,
};

/// Container name used for log streaming
pub const MONGO_SERVICE: &str = "mongodb";

/// Result of a lifecycle command that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Sequence executed successfully
    Completed,
    /// Topology does not support the built-in mongo
    Skipped(SkipReason),
    /// No mongo config; nothing to do
    NothingToDo,
}

/// Service for the built-in mongo lifecycle
pub struct LifecycleService {
    config: Arc<dyn ConfigStore>,
    sessions: Arc<dyn SessionProvider>,
    engine: Arc<dyn ExecutionEngine>,
    logs: Arc<dyn LogStreamer>,
    archive: Arc<dyn ArchiveRetriever>,
    options: RunOptions,
}

impl LifecycleService {
    /// Create a new lifecycle service
    pub fn new(
        config: Arc<dyn ConfigStore>,
        sessions: Arc<dyn SessionProvider>,
        engine: Arc<dyn ExecutionEngine>,
        logs: Arc<dyn LogStreamer>,
        archive: Arc<dyn ArchiveRetriever>,
    ) -> Self {
        Self {
            config,
            sessions,
            engine,
            logs,
            archive,
            options: RunOptions::default(),
        }
    }

    /// Builder: set run options
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Prepare the host and copy the mongod config
    pub async fn setup(&self) -> Result<Outcome, LifecycleError> {
        debug!("exec => mongo setup");

        let Some(mongo) = self.mongo_config() else {
            ui::print_warning("Not setting up built-in mongodb since there is no mongo config");
            return Ok(Outcome::NothingToDo);
        };

        if let Some(reason) = self.colocation_skip("setup") {
            return Ok(Outcome::Skipped(reason));
        }

        self.execute(&sequence::setup(mongo)).await?;
        Ok(Outcome::Completed)
    }

    /// Start mongo, then restrict access when a whitelist is configured
    pub async fn start(&self) -> Result<Outcome, LifecycleError> {
        debug!("exec => mongo start");

        let Some(mongo) = self.mongo_config() else {
            ui::print_warning("Not starting built-in mongodb since there is no mongo config");
            return Ok(Outcome::NothingToDo);
        };

        if let Some(reason) = self.colocation_skip("start") {
            return Ok(Outcome::Skipped(reason));
        }

        self.execute(&sequence::start(mongo)?).await?;

        if !mongo.ip_whitelist.is_empty() {
            info!(
                "Whitelist configured ({} entries), restricting access",
                mongo.ip_whitelist.entries().len()
            );
            return self.restrict_access().await;
        }

        Ok(Outcome::Completed)
    }

    /// Stop mongo; runs whatever the topology looks like
    ///
    /// With no database hosts there is nothing to stop.
    pub async fn stop(&self) -> Result<Outcome, LifecycleError> {
        debug!("exec => mongo stop");

        if self.sessions.sessions(&[Role::Database]).is_empty() {
            ui::print_warning("Not stopping built-in mongodb since no servers run it");
            return Ok(Outcome::NothingToDo);
        }

        self.execute(&sequence::stop()).await?;
        Ok(Outcome::Completed)
    }

    /// Dump the database on the host, then pull the dump locally
    pub async fn backup(&self) -> Result<Outcome, LifecycleError> {
        debug!("exec => mongo backup");

        if self.mongo_config().is_none() {
            return Err(LifecycleError::ConfigMissing { section: "mongo" });
        }

        let app = &self.config.config().app;
        self.execute(&sequence::backup(app)?).await?;

        let hosts = self.sessions.sessions(&[Role::Database]);
        let local = self.archive.retrieve(&hosts).await?;
        ui::print_success(&format!("Backup copied to {}", local.display()));

        Ok(Outcome::Completed)
    }

    /// Firewall mongo down to the whitelist and the app's local containers
    pub async fn restrict_access(&self) -> Result<Outcome, LifecycleError> {
        debug!("exec => mongo restrict-access");

        let Some(mongo) = self.mongo_config() else {
            return Err(LifecycleError::ConfigMissing { section: "mongo" });
        };

        if let Some(reason) = self.colocation_skip("restrict-access") {
            return Ok(Outcome::Skipped(reason));
        }

        let app = &self.config.config().app;
        self.execute(&sequence::restrict_access(mongo, app)?).await?;
        Ok(Outcome::Completed)
    }

    /// Stream mongo logs; `args[0]` is the command name and is dropped
    pub async fn tail_logs(&self, args: &[String]) -> Result<(), LifecycleError> {
        debug!("exec => mongo logs");

        let extra_args = args.get(1..).unwrap_or_default();
        let hosts = self.sessions.sessions(&[Role::Database]);
        self.logs
            .stream_logs(MONGO_SERVICE, &hosts, extra_args)
            .await?;
        Ok(())
    }

    fn mongo_config(&self) -> Option<&DatabaseConfig> {
        self.config.config().mongo.as_ref()
    }

    /// Reason to skip `command`, if the hosts are not colocated
    fn colocation_skip(&self, command: &str) -> Option<SkipReason> {
        let database_hosts = self.sessions.sessions(&[Role::Database]);
        let app_hosts = self.sessions.sessions(&[Role::App]);

        match topology::validate(&database_hosts, &app_hosts) {
            TopologyCheck::Ok => None,
            TopologyCheck::Skip(reason) => {
                info!("Skipping mongo {}: incompatible topology", command);
                ui::print_warning(&format!("Skipping built-in mongodb {}: {}", command, reason));
                Some(reason)
            }
        }
    }

    async fn execute(&self, sequence: &OperationSequence) -> Result<(), LifecycleError> {
        let hosts = self.sessions.sessions(&[Role::Database]);
        info!(
            "{}: {} operation(s) on {} host(s)",
            sequence.title,
            sequence.len(),
            hosts.len()
        );

        self.engine.run(sequence, &hosts, self.options).await?;
        Ok(())
    }
}
