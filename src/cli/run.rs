//! Handlers for the pipeline commands: check, tickets, sync

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;

use crate::config::{Config, RubrikCredentials, ServiceNowCredentials};
use crate::models::build_ticket_index;
use crate::platform::{ClusterSet, RubrikClient};
use crate::reconcile::{Reconciler, Report};
use crate::servers::{self, ServerArtifact};
use crate::tickets::{ServiceNowClient, TicketStore, TicketSynchronizer};

/// Overrides for `check`
#[derive(Debug, Default)]
pub struct CheckOptions {
    pub servers: Option<String>,
    pub report: Option<PathBuf>,
    pub no_remediation: bool,
    pub workers: Option<usize>,
}

/// Reconcile the requested servers and write the report
pub async fn run_check(config: &Config, options: CheckOptions) -> Result<()> {
    let report_path = options.report.unwrap_or_else(|| config.paths.report.clone());
    let (names, source) = servers::resolve(
        options.servers.as_deref(),
        config.server_list.as_deref(),
        &config.paths.tickets,
    )?;
    tracing::info!("Checking {} server(s) from {}", names.len(), source);

    let policy = config.policy.evaluation_policy();
    let generated_at = Utc::now();

    let results = if names.is_empty() {
        tracing::warn!("Server list is empty, nothing to check");
        Vec::new()
    } else {
        let credentials = RubrikCredentials::from_env()?;
        let mut members = Vec::new();
        for endpoint in config.rubrik.cluster_endpoints() {
            let settings = config.rubrik.for_cluster(&endpoint);
            let client = RubrikClient::connect(&settings, &credentials)
                .await
                .with_context(|| format!("Failed to authenticate against {}", endpoint))?;
            members.push((endpoint, client));
        }
        let platform = ClusterSet::new(members);
        tracing::info!("Checking {} cluster(s)", platform.len());

        let mut remediation = config.remediation.clone();
        if options.no_remediation {
            remediation.enabled = false;
        }

        Reconciler::new(&platform, &platform, policy)
            .with_remediation(remediation)
            .with_workers(options.workers.unwrap_or(config.workers))
            .at(generated_at)
            .reconcile(&names)
            .await
            .context("Failed to fetch the backup catalog")?
    };

    let report = Report::new(generated_at, policy, results);
    report.write(&report_path)?;

    print!("{}", report.render_table());
    println!("\n{}", report.summary());
    Ok(())
}

/// Fetch incidents and write the ticket and server artifacts
pub async fn run_fetch_tickets(config: &Config) -> Result<()> {
    if config.service_now.url.is_none() {
        anyhow::bail!("SERVICENOW_URL is not set");
    }
    let credentials = ServiceNowCredentials::from_env()?;
    let client = ServiceNowClient::new(&config.service_now, credentials)?;

    let tickets = client
        .fetch_tickets()
        .await
        .context("Failed to query ServiceNow")?;

    servers::write_json(&config.paths.tickets, &tickets)?;
    let artifact = ServerArtifact::from_tickets(&tickets);
    servers::write_json(&config.paths.servers, &artifact)?;

    println!(
        "Saved {} incident(s) to {} and {} server(s) to {}",
        tickets.len(),
        config.paths.tickets.display(),
        artifact.servers.len(),
        config.paths.servers.display()
    );
    Ok(())
}

/// Push report results to their tickets
pub async fn run_sync(config: &Config, report: Option<PathBuf>) -> Result<()> {
    let report_path = report.unwrap_or_else(|| config.paths.report.clone());
    if !report_path.exists() {
        anyhow::bail!("Report not found: {}", report_path.display());
    }
    if !config.paths.tickets.exists() {
        anyhow::bail!("Tickets file not found: {}", config.paths.tickets.display());
    }
    let credentials = ServiceNowCredentials::from_env()?;

    let report = Report::load(&report_path)?;
    if report.results.is_empty() {
        println!("No results found to update ServiceNow");
        return Ok(());
    }

    let tickets = servers::read_tickets(&config.paths.tickets)?;
    let index = build_ticket_index(&tickets);
    let client = ServiceNowClient::new(&config.service_now, credentials)?;

    let summary = TicketSynchronizer::new(&client)
        .with_allowed_closer(config.service_now.allowed_closer.clone())
        .sync(&report.results, &index)
        .await;

    println!(
        "Updated: {} | Failed: {} | Skipped: {}",
        summary.updated, summary.failed, summary.skipped
    );
    Ok(())
}
