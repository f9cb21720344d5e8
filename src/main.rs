//! l2backup - backup compliance reconciler
//!
//! Checks that the servers named in incident tickets have a fresh Rubrik
//! snapshot, requests on-demand backups for stale ones, and writes the
//! outcome back to ServiceNow.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use l2backup::cli::{self, CheckOptions, ConfigSubcommand};
use l2backup::config::ConfigLoader;

/// Backup compliance reconciler for Rubrik and ServiceNow
#[derive(Parser, Debug)]
#[command(name = "l2backup")]
#[command(
    about = "Reconcile backup-compliance tickets against Rubrik snapshots",
    long_about = None
)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    /// Configuration file (defaults to the platform config dir)
    #[arg(long, short = 'c', global = true, env = "L2BACKUP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Check backup freshness and write the combined report
    Check {
        /// Inline server list or path to a server list file
        #[arg(long, short = 's')]
        servers: Option<String>,

        /// Report output path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Never request on-demand backups
        #[arg(long)]
        no_remediation: bool,

        /// Concurrent snapshot queries
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Fetch incidents and write tickets.json and servicenow_servers.json
    Tickets,
    /// Update incidents from the combined report
    Sync {
        /// Report to read
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_file = cli::init_logging(args.debug);
    if let Some(ref log_path) = log_file {
        eprintln!(
            "Debug logging enabled. Logs written to: {}",
            log_path.display()
        );
    }

    let config_path = args.config.as_deref();
    match args.command {
        Command::Config { subcommand } => cli::handle_config_command(subcommand, config_path),
        Command::Version => {
            cli::display_version();
            Ok(())
        }
        command => {
            let config = ConfigLoader::load(config_path).context("Failed to load configuration")?;
            tracing::debug!("Configuration loaded: {:?}", config);

            match command {
                Command::Check {
                    servers,
                    report,
                    no_remediation,
                    workers,
                } => {
                    let options = CheckOptions {
                        servers,
                        report,
                        no_remediation,
                        workers,
                    };
                    cli::run_check(&config, options).await
                }
                Command::Tickets => cli::run_fetch_tickets(&config).await,
                Command::Sync { report } => cli::run_sync(&config, report).await,
                Command::Config { .. } | Command::Version => Ok(()),
            }
        }
    }
}
