use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

mod cli;
mod config;
mod domain;
mod error;
mod infrastructure;
mod services;
mod tools;
mod ui;

use cli::{Cli, Commands};
use config::DeployConfig;
use infrastructure::{DockerLogStreamer, Inventory, ScpArchiveRetriever, SshExecutor, SshOptions};
use services::{LifecycleService, Outcome, RunOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .init();

    let config = Arc::new(DeployConfig::load(&cli.config)?);
    let inventory = Arc::new(Inventory::from_config(&config));
    let ssh = SshOptions::from_config(&config.ssh);

    let archive = match &cli.command {
        Commands::Backup {
            remote_path,
            local_path,
        } => ScpArchiveRetriever::new(ssh.clone())
            .with_remote_path(remote_path.clone())
            .with_local_path(local_path.clone()),
        _ => ScpArchiveRetriever::new(ssh.clone()),
    };

    let service = LifecycleService::new(
        config,
        inventory,
        Arc::new(SshExecutor::new(ssh.clone(), &cli.assets_dir)),
        Arc::new(DockerLogStreamer::new(ssh)),
        Arc::new(archive),
    )
    .with_options(RunOptions {
        verbose: cli.verbose,
    });

    let command = cli.command.name();
    ui::print_header(&format!("mongo {}", command));

    let result = match cli.command {
        Commands::Setup => service.setup().await,
        Commands::Start => service.start().await,
        Commands::Stop => service.stop().await,
        Commands::Backup { .. } => service.backup().await,
        Commands::RestrictAccess => service.restrict_access().await,
        Commands::Logs { args } => {
            let mut forwarded = vec![command.to_string()];
            forwarded.extend(args);
            service
                .tail_logs(&forwarded)
                .await
                .map(|()| Outcome::Completed)
        }
    };

    match result {
        Ok(Outcome::Completed) => {
            ui::print_success(&format!("mongo {} completed", command));
            Ok(())
        }
        Ok(Outcome::Skipped(_)) => Ok(()),
        Ok(Outcome::NothingToDo) => {
            ui::print_info(&format!("mongo {}: nothing to do", command));
            Ok(())
        }
        Err(e) => {
            ui::print_error(&format!("mongo {} failed", command));
            Err(e.into())
        }
    }
}
