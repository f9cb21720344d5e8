//! Credentials for the remote systems
//!
//! Credentials never live in the config file; they are read from the
//! environment right before a client is built.

use std::fmt;

/// Configuration errors surfaced before any remote call is made
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// OAuth client credentials for the backup platform
#[derive(Clone)]
pub struct RubrikCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Basic-auth credentials for the ticket store
#[derive(Clone)]
pub struct ServiceNowCredentials {
    pub user: String,
    pub password: String,
}

impl RubrikCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: required(&lookup, "RUBRIK_CLIENT_ID")?,
            client_secret: required(&lookup, "RUBRIK_CLIENT_SECRET")?,
        })
    }
}

impl ServiceNowCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            user: required(&lookup, "SN_USER")?,
            password: required(&lookup, "SN_PASS")?,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingCredential(key))
}

// Secrets stay out of debug logs
impl fmt::Debug for RubrikCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RubrikCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

impl fmt::Debug for ServiceNowCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceNowCredentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_rubrik_credentials() {
        let creds = RubrikCredentials::from_lookup(lookup(&[
            ("RUBRIK_CLIENT_ID", "client|abc"),
            ("RUBRIK_CLIENT_SECRET", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(creds.client_id, "client|abc");
        assert!(!format!("{:?}", creds).contains("s3cret"));
    }

    #[test]
    fn test_blank_credential_is_missing() {
        let err =
            ServiceNowCredentials::from_lookup(lookup(&[("SN_USER", "svc"), ("SN_PASS", "  ")]))
                .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("SN_PASS")));
    }
}
