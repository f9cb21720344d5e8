//! Configuration system for l2backup
//!
//! One YAML file plus the environment variables the backup pipeline has
//! always been driven by. Credentials are environment-only.

pub mod credentials;
pub mod loader;
pub mod paths;
pub mod schema;

pub use credentials::{ConfigError, RubrikCredentials, ServiceNowCredentials};
pub use loader::ConfigLoader;
pub use schema::{
    Config, FreshnessMode, PathsConfig, PolicyConfig, RemediationConfig, RubrikConfig,
    ServiceNowConfig, VmSource,
};
