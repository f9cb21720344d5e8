//! Report artifact and run summary

use crate::evaluator::EvaluationPolicy;
use crate::models::{CatalogPresence, NOT_AVAILABLE, Remediation, ResultRecord, display_timestamp};
use crate::servers::write_json;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use std::path::Path;

/// `combined_backup_report.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub window_config: EvaluationPolicy,
    #[serde(default)]
    pub results: Vec<ResultRecord>,
}

/// Counts printed at the end of every run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub compliant: usize,
    /// In the catalog but not compliant, including unqueryable objects
    pub non_compliant: usize,
    pub not_found: usize,
    pub remediation_triggered: usize,
}

impl Report {
    pub fn new(
        generated_at: DateTime<Utc>,
        window_config: EvaluationPolicy,
        results: Vec<ResultRecord>,
    ) -> Self {
        Self {
            generated_at,
            window_config,
            results,
        }
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            total: self.results.len(),
            ..Default::default()
        };
        for record in &self.results {
            match (record.in_catalog, record.compliant) {
                (CatalogPresence::NotFound, _) => summary.not_found += 1,
                (_, true) => summary.compliant += 1,
                (_, false) => summary.non_compliant += 1,
            }
            if record.remediation == Remediation::Triggered {
                summary.remediation_triggered += 1;
            }
        }
        summary
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_json(path, self)?;
        tracing::info!("Wrote {} result(s) to {}", self.results.len(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse report: {}", path.display()))
    }

    /// Fixed-width table of all results
    pub fn render_table(&self) -> String {
        let width = self
            .results
            .iter()
            .map(|r| r.server.len())
            .max()
            .unwrap_or(0)
            .max("SERVER".len());

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<width$}  {:<16}  {:<11}  {:<9}  {:<23}  {:>8}  {:<16}  REMEDIATION",
            "SERVER", "TYPE", "CATALOG", "COMPLIANT", "LAST BACKUP", "RETAINED", "POLICY",
        );
        for r in &self.results {
            let object_type = r
                .object_type
                .map(|t| t.as_str().to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            let _ = writeln!(
                out,
                "{:<width$}  {:<16}  {:<11}  {:<9}  {:<23}  {:>8}  {:<16}  {}",
                r.server,
                object_type,
                r.in_catalog.as_str(),
                if r.compliant { "YES" } else { "NO" },
                display_timestamp(r.last_backup_at),
                r.retention_window_count,
                r.policy_name,
                r.remediation,
            );
        }
        out
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {} | Compliant: {} | Non-compliant: {} | Not found: {} | Backups triggered: {}",
            self.total,
            self.compliant,
            self.non_compliant,
            self.not_found,
            self.remediation_triggered
        )
    }
}
