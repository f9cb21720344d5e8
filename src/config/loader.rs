//! Configuration loading and merging logic
//!
//! Handles loading configuration from the config file and overlaying the
//! environment variables the backup pipeline has always used.

use super::credentials::ConfigError;
use super::paths;
use super::schema::{Config, FreshnessMode};
use crate::models::ObjectType;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Longest accepted retention window, ten years
pub const MAX_RETENTION_DAYS: u32 = 3650;
/// Longest accepted rolling freshness window, one year
pub const MAX_FRESHNESS_HOURS: u32 = 8760;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Config file (`path`, or the root config file)
    /// 3. Built-in defaults
    ///
    /// An explicitly given file must exist; the root config file is optional.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let config = match path {
            Some(path) => Self::load_file(path)?,
            None => {
                let root = paths::root_config_path();
                if root.exists() {
                    Self::load_file(&root)?
                } else {
                    Self::load_defaults()
                }
            }
        };

        let config = Self::apply_env_overrides(config)?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration by loading it and checking value ranges
    pub fn validate(path: Option<&Path>) -> Result<Config> {
        let config = Self::load(path).context("Failed to load configuration")?;

        if config.rubrik.endpoint.trim().is_empty() {
            anyhow::bail!("rubrik.endpoint must not be empty");
        }
        if config.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        if config.rubrik.page_size == 0 || config.rubrik.snapshot_page_size == 0 {
            anyhow::bail!("page sizes must be at least 1");
        }
        if config.policy.mode == FreshnessMode::Rolling && config.policy.freshness_hours == 0 {
            anyhow::bail!("policy.freshnessHours must be at least 1 in rolling mode");
        }
        if let Some(url) = &config.service_now.url {
            url::Url::parse(url)
                .with_context(|| format!("serviceNow.url is not a valid URL: {}", url))?;
        }

        Ok(config)
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        Config::default()
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(config: Config) -> Result<Config, ConfigError> {
        Self::apply_overrides(config, |key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides(
        mut config: Config,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Config, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = get("RSC_FQDN").or_else(|| get("RUBRIK_CLUSTER_ADDRESS")) {
            config.rubrik.endpoint = endpoint.trim().to_string();
        }
        if let Some(v) = get("RUBRIK_CLUSTERS") {
            config.rubrik.clusters = v
                .split([',', '\n'])
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(token_url) = get("RUBRIK_TOKEN_URL") {
            config.rubrik.token_url = Some(token_url);
        }
        if let Some(v) = get("RUBRIK_REQUEST_TIMEOUT") {
            config.rubrik.request_timeout_secs = parse_value("RUBRIK_REQUEST_TIMEOUT", &v)?;
        }
        if let Some(v) = get("RUBRIK_INSECURE_TLS") {
            config.rubrik.accept_invalid_certs = parse_bool("RUBRIK_INSECURE_TLS", &v)?;
        }

        if let Some(v) = get("BACKUP_FRESHNESS_MODE") {
            config.policy.mode = FreshnessMode::from_str(&v).map_err(|reason| {
                ConfigError::InvalidValue {
                    key: "BACKUP_FRESHNESS_MODE".into(),
                    value: v.clone(),
                    reason,
                }
            })?;
        }
        if let Some(v) = get("BACKUP_FRESHNESS_HOURS") {
            let hours = parse_value("BACKUP_FRESHNESS_HOURS", &v)?;
            config.policy.freshness_hours =
                check_at_most("BACKUP_FRESHNESS_HOURS", hours, MAX_FRESHNESS_HOURS)?;
        }
        if let Some(v) = get("BACKUP_RETENTION_DAYS") {
            let days = parse_value("BACKUP_RETENTION_DAYS", &v)?;
            config.policy.retention_days =
                check_at_most("BACKUP_RETENTION_DAYS", days, MAX_RETENTION_DAYS)?;
        }
        if let Some(v) = get("BACKUP_COUNT_ON_DEMAND") {
            config.policy.count_on_demand_as_compliant = parse_bool("BACKUP_COUNT_ON_DEMAND", &v)?;
        }
        if let Some(v) = get("BACKUP_REMEDIATION") {
            config.remediation.enabled = parse_bool("BACKUP_REMEDIATION", &v)?;
        }
        if let Some(v) = get("BACKUP_REMEDIATION_TYPES") {
            config.remediation.object_types = v
                .split(',')
                .filter(|t| !t.trim().is_empty())
                .map(|t| parse_value::<ObjectType>("BACKUP_REMEDIATION_TYPES", t))
                .collect::<Result<_, _>>()?;
        }

        if let Some(list) = get("SERVER_NAMES").or_else(|| get("serverlist")) {
            config.server_list = Some(list);
        }
        if let Some(v) = get("SERVICENOW_TICKETS_JSON") {
            config.paths.tickets = PathBuf::from(v);
        }
        if let Some(v) = get("SERVICENOW_SERVERS_JSON") {
            config.paths.servers = PathBuf::from(v);
        }
        if let Some(v) = get("COMBINED_REPORT_JSON") {
            config.paths.report = PathBuf::from(v);
        }

        if let Some(v) = get("SERVICENOW_URL") {
            config.service_now.url = Some(v.trim().to_string());
        }
        if let Some(v) = get("SERVICENOW_INSTANCE") {
            config.service_now.instance = v.trim().to_string();
        }
        if let Some(v) = get("NODE_FIELD") {
            config.service_now.node_field = v.trim().to_string();
        }
        if let Some(v) = get("ALLOWED_CLOSER") {
            config.service_now.allowed_closer = Some(v.trim().to_string());
        }

        // File values get the same bounds as the environment
        check_at_most(
            "policy.freshnessHours",
            config.policy.freshness_hours,
            MAX_FRESHNESS_HOURS,
        )?;
        check_at_most(
            "policy.retentionDays",
            config.policy.retention_days,
            MAX_RETENTION_DAYS,
        )?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        let yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;

        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

fn check_at_most(key: &str, value: u32, max: u32) -> Result<u32, ConfigError> {
    if value > max {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: format!("must be at most {}", max),
        });
    }
    Ok(value)
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Accepts the spellings shell pipelines tend to use
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
