//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.
//! Credentials are deliberately absent: they only come from the environment.

use crate::evaluator::{EvaluationPolicy, FreshnessPolicy};
use crate::models::ObjectType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Backup platform connection
    #[serde(default)]
    pub rubrik: RubrikConfig,

    /// Freshness / retention policy
    #[serde(default)]
    pub policy: PolicyConfig,

    /// On-demand backup behaviour for stale objects
    #[serde(default)]
    pub remediation: RemediationConfig,

    /// Ticket store connection
    #[serde(default)]
    pub service_now: ServiceNowConfig,

    /// Artifact locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Inline server list or path to a server list file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_list: Option<String>,

    /// Concurrent snapshot evaluations
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Where VM catalog objects come from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum VmSource {
    /// vSphere VM inventory listing
    #[default]
    Inventory,
    /// Objects protected by each SLA domain
    SlaIndex,
}

/// Backup platform configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RubrikConfig {
    /// Platform FQDN or base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Cluster FQDNs checked in one run; empty means just `endpoint`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<String>,

    /// Token URL template, `{cluster}` / `{fqdn}` are substituted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,

    /// Timeout for auth, catalog and snapshot queries
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for on-demand backup requests
    #[serde(default = "default_remediation_timeout")]
    pub remediation_timeout_secs: u64,

    /// Skip TLS certificate validation (self-signed internal clusters)
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,

    /// Explicit proxy, otherwise the standard proxy variables apply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Page size for catalog listings
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Page size for snapshot listings
    #[serde(default = "default_snapshot_page_size")]
    pub snapshot_page_size: u32,

    /// Safety bound on snapshot pages fetched per object. Paging normally
    /// stops once the retention window is covered.
    #[serde(default = "default_snapshot_max_pages")]
    pub snapshot_max_pages: u32,

    #[serde(default)]
    pub vm_source: VmSource,
}

impl RubrikConfig {
    /// Endpoints to authenticate against, in order
    pub fn cluster_endpoints(&self) -> Vec<String> {
        let clusters: Vec<String> = self
            .clusters
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        if clusters.is_empty() {
            vec![self.endpoint.trim().to_string()]
        } else {
            clusters
        }
    }

    /// Settings for one member of [`cluster_endpoints`](Self::cluster_endpoints)
    pub fn for_cluster(&self, endpoint: &str) -> RubrikConfig {
        RubrikConfig {
            endpoint: endpoint.to_string(),
            clusters: Vec::new(),
            ..self.clone()
        }
    }
}

/// Freshness mode as written in config files
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessMode {
    CalendarDay,
    #[default]
    Rolling,
}

impl std::str::FromStr for FreshnessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "calendar_day" | "calendar" | "day" => Ok(FreshnessMode::CalendarDay),
            "rolling" | "hours" => Ok(FreshnessMode::Rolling),
            other => Err(format!("Unknown freshness mode: {}", other)),
        }
    }
}

/// Policy configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    #[serde(default)]
    pub mode: FreshnessMode,

    /// Rolling window length, ignored in calendar-day mode
    #[serde(default = "default_freshness_hours")]
    pub freshness_hours: u32,

    /// Window for the audit snapshot count
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    #[serde(default = "default_true")]
    pub count_on_demand_as_compliant: bool,
}

impl PolicyConfig {
    pub fn evaluation_policy(&self) -> EvaluationPolicy {
        let freshness = match self.mode {
            FreshnessMode::CalendarDay => FreshnessPolicy::CalendarDay,
            FreshnessMode::Rolling => FreshnessPolicy::Rolling {
                hours: self.freshness_hours,
            },
        };
        EvaluationPolicy {
            freshness,
            retention_days: self.retention_days,
            count_on_demand_as_compliant: self.count_on_demand_as_compliant,
        }
    }
}

/// Remediation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemediationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Object types an on-demand backup may be requested for
    #[serde(default = "default_remediation_types")]
    pub object_types: Vec<ObjectType>,
}

impl RemediationConfig {
    pub fn allows(&self, object_type: ObjectType) -> bool {
        self.enabled && self.object_types.contains(&object_type)
    }
}

/// Ticket store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceNowConfig {
    /// Incident query URL; its scheme+host is the API base
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Legacy instance name, used when no URL is configured
    #[serde(default = "default_instance")]
    pub instance: String,

    /// Incident field holding the server name
    #[serde(default = "default_node_field")]
    pub node_field: String,

    /// Identity recorded as resolver when closing tickets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_closer: Option<String>,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_update_timeout")]
    pub update_timeout_secs: u64,
}

/// Artifact paths
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PathsConfig {
    #[serde(default = "default_tickets_path")]
    pub tickets: PathBuf,

    #[serde(default = "default_servers_path")]
    pub servers: PathBuf,

    #[serde(default = "default_report_path")]
    pub report: PathBuf,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_workers() -> usize {
    4
}

fn default_endpoint() -> String {
    "kohls.my.rubrik.com".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_remediation_timeout() -> u64 {
    60
}

fn default_page_size() -> u32 {
    500
}

fn default_snapshot_page_size() -> u32 {
    50
}

fn default_snapshot_max_pages() -> u32 {
    100
}

fn default_freshness_hours() -> u32 {
    24
}

fn default_retention_days() -> u32 {
    60
}

fn default_remediation_types() -> Vec<ObjectType> {
    ObjectType::all().to_vec()
}

fn default_instance() -> String {
    "kohls".to_string()
}

fn default_node_field() -> String {
    "u_node".to_string()
}

fn default_fetch_timeout() -> u64 {
    60
}

fn default_update_timeout() -> u64 {
    30
}

fn default_tickets_path() -> PathBuf {
    PathBuf::from("tickets.json")
}

fn default_servers_path() -> PathBuf {
    PathBuf::from("servicenow_servers.json")
}

fn default_report_path() -> PathBuf {
    PathBuf::from("L2Backup").join("combined_backup_report.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rubrik: RubrikConfig::default(),
            policy: PolicyConfig::default(),
            remediation: RemediationConfig::default(),
            service_now: ServiceNowConfig::default(),
            paths: PathsConfig::default(),
            server_list: None,
            workers: default_workers(),
        }
    }
}

impl Default for RubrikConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            clusters: Vec::new(),
            token_url: None,
            request_timeout_secs: default_request_timeout(),
            remediation_timeout_secs: default_remediation_timeout(),
            accept_invalid_certs: default_true(),
            proxy: None,
            page_size: default_page_size(),
            snapshot_page_size: default_snapshot_page_size(),
            snapshot_max_pages: default_snapshot_max_pages(),
            vm_source: VmSource::default(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            mode: FreshnessMode::default(),
            freshness_hours: default_freshness_hours(),
            retention_days: default_retention_days(),
            count_on_demand_as_compliant: default_true(),
        }
    }
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            object_types: default_remediation_types(),
        }
    }
}

impl Default for ServiceNowConfig {
    fn default() -> Self {
        Self {
            url: None,
            instance: default_instance(),
            node_field: default_node_field(),
            allowed_closer: None,
            fetch_timeout_secs: default_fetch_timeout(),
            update_timeout_secs: default_update_timeout(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tickets: default_tickets_path(),
            servers: default_servers_path(),
            report: default_report_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(config.rubrik.accept_invalid_certs);
        assert_eq!(config.rubrik.request_timeout_secs, 10);
        assert_eq!(config.policy.mode, FreshnessMode::Rolling);
        assert_eq!(config.service_now.node_field, "u_node");
        assert!(config.remediation.allows(ObjectType::VirtualMachine));
    }

    #[test]
    fn test_cluster_endpoints() {
        let mut rubrik = RubrikConfig {
            endpoint: "rsc.example.com".into(),
            ..Default::default()
        };
        assert_eq!(rubrik.cluster_endpoints(), vec!["rsc.example.com"]);

        rubrik.clusters = vec![" cdm-east.corp ".into(), "".into(), "cdm-west.corp".into()];
        assert_eq!(rubrik.cluster_endpoints(), vec!["cdm-east.corp", "cdm-west.corp"]);

        let west = rubrik.for_cluster("cdm-west.corp");
        assert_eq!(west.endpoint, "cdm-west.corp");
        assert!(west.clusters.is_empty());
        assert_eq!(west.page_size, rubrik.page_size);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("acceptInvalidCerts"));
        assert!(yaml.contains("countOnDemandAsCompliant"));
        assert!(yaml.contains("serviceNow"));
    }

    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
rubrik:
  endpoint: cdm01.corp.local
  vmSource: slaIndex
policy:
  mode: calendar_day
  retentionDays: 30
remediation:
  objectTypes: [VIRTUAL_MACHINE]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.rubrik.endpoint, "cdm01.corp.local");
        assert_eq!(config.rubrik.vm_source, VmSource::SlaIndex);
        assert_eq!(config.rubrik.page_size, 500);
        assert!(config.remediation.allows(ObjectType::VirtualMachine));
        assert!(!config.remediation.allows(ObjectType::LinuxFileset));

        let policy = config.policy.evaluation_policy();
        assert_eq!(policy.freshness, FreshnessPolicy::CalendarDay);
        assert_eq!(policy.retention_days, 30);
    }

    #[test]
    fn test_remediation_disabled_allows_nothing() {
        let remediation = RemediationConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(ObjectType::all().iter().all(|t| !remediation.allows(*t)));
    }

    #[test]
    fn test_freshness_mode_parse() {
        assert_eq!(
            "calendar-day".parse::<FreshnessMode>().unwrap(),
            FreshnessMode::CalendarDay
        );
        assert_eq!(
            "ROLLING".parse::<FreshnessMode>().unwrap(),
            FreshnessMode::Rolling
        );
        assert!("weekly".parse::<FreshnessMode>().is_err());
    }
}
