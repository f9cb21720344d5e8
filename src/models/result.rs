//! Per-server reconciliation results

use super::{NOT_AVAILABLE, ObjectType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the requested server was found in the backup catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogPresence {
    Found,
    NotFound,
    /// Known to the catalog but snapshots could not be queried
    FoundNoId,
}

impl CatalogPresence {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogPresence::Found => "FOUND",
            CatalogPresence::NotFound => "NOT_FOUND",
            CatalogPresence::FoundNoId => "FOUND_NO_ID",
        }
    }
}

impl fmt::Display for CatalogPresence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the run did about a non-compliant object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Remediation {
    #[default]
    NotAttempted,
    Triggered,
    AlreadyRunning,
    TriggerFailed,
}

impl Remediation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Remediation::NotAttempted => "NOT_ATTEMPTED",
            Remediation::Triggered => "TRIGGERED",
            Remediation::AlreadyRunning => "ALREADY_RUNNING",
            Remediation::TriggerFailed => "TRIGGER_FAILED",
        }
    }
}

impl fmt::Display for Remediation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One report row, keyed by requested server name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Requested name, lowercase
    pub server: String,
    pub in_catalog: CatalogPresence,
    pub compliant: bool,
    /// Newest snapshot across the matched object, independent of any window
    pub last_backup_at: Option<DateTime<Utc>>,
    pub retention_window_count: u32,
    pub policy_name: String,
    /// "N/A" unless the object was found and queried
    #[serde(with = "reported_type")]
    pub object_type: Option<ObjectType>,
    pub cluster_name: String,
    /// Display name of the catalog object that won the match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_object: Option<String>,
    #[serde(default)]
    pub remediation: Remediation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl ResultRecord {
    /// Row for a requested name with no positive-weight match
    pub fn not_found(server: impl Into<String>, checked_at: DateTime<Utc>) -> Self {
        Self {
            server: server.into(),
            in_catalog: CatalogPresence::NotFound,
            compliant: false,
            last_backup_at: None,
            retention_window_count: 0,
            policy_name: NOT_AVAILABLE.to_string(),
            object_type: None,
            cluster_name: NOT_AVAILABLE.to_string(),
            matched_object: None,
            remediation: Remediation::NotAttempted,
            detail: None,
            checked_at,
        }
    }

    /// Ticket-facing status, OK only when compliant
    pub fn status_label(&self) -> &'static str {
        if self.compliant { "OK" } else { "FAILED" }
    }
}

/// Serializes `Option<ObjectType>` as the type name or "N/A"
mod reported_type {
    use super::{NOT_AVAILABLE, ObjectType};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<ObjectType>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(kind) => serializer.serialize_str(kind.as_str()),
            None => serializer.serialize_str(NOT_AVAILABLE),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<ObjectType>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| ObjectType::parse_optional(&s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn checked_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_not_found_row() {
        let rec = ResultRecord::not_found("srv-b", checked_at());
        assert_eq!(rec.in_catalog, CatalogPresence::NotFound);
        assert!(!rec.compliant);
        assert_eq!(rec.remediation, Remediation::NotAttempted);
        assert_eq!(rec.status_label(), "FAILED");
    }

    #[test]
    fn test_object_type_serializes_na() {
        let rec = ResultRecord::not_found("srv-b", checked_at());
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["object_type"], "N/A");
        assert_eq!(json["in_catalog"], "NOT_FOUND");
        assert_eq!(json["remediation"], "NOT_ATTEMPTED");
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn test_record_deserializes_back() {
        let mut rec = ResultRecord::not_found("srv-a", checked_at());
        rec.in_catalog = CatalogPresence::Found;
        rec.object_type = Some(ObjectType::VirtualMachine);
        rec.compliant = true;

        let json = serde_json::to_string(&rec).unwrap();
        let back: ResultRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }
}
