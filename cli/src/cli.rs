//! CLI definitions for mongo-deploy
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mongo-deploy",
    version,
    about = "Lifecycle orchestrator for a built-in MongoDB",
    long_about = "Sets up, starts, stops, backs up and firewalls a MongoDB instance\ncolocated with a single application server."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging and stream remote output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to deploy.yaml
    #[arg(
        long,
        global = true,
        env = "MONGO_DEPLOY_CONFIG",
        default_value = "deploy.yaml"
    )]
    pub config: PathBuf,

    /// Directory holding the mongo scripts and config templates
    #[arg(
        long,
        global = true,
        env = "MONGO_DEPLOY_ASSETS",
        default_value = "assets"
    )]
    pub assets_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Prepare the host and copy the mongod config
    Setup,

    /// Start mongo (and the replica set with oplog); restrict access if whitelisted
    Start,

    /// Stop mongo
    Stop,

    /// Dump the database on the host and copy it locally
    Backup {
        /// Dump directory on the database host
        #[arg(long, default_value = "dump")]
        remote_path: String,

        /// Local destination for the dump
        #[arg(long, default_value = "dump")]
        local_path: PathBuf,
    },

    /// Firewall mongo to the whitelist and the app's local containers
    #[command(name = "restrict-access", alias = "whitelist")]
    RestrictAccess,

    /// Show mongo container logs (arguments go to `docker logs`)
    Logs {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

impl Commands {
    /// Command name as typed on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Backup { .. } => "backup",
            Self::RestrictAccess => "restrict-access",
            Self::Logs { .. } => "logs",
        }
    }
}
