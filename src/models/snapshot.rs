//! Snapshot records and timestamp parsing

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point-in-time backup of a catalog object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub timestamp: DateTime<Utc>,
    /// Policy attached to this snapshot, may differ from the object's current one
    pub policy_name_at_snapshot: Option<String>,
    pub is_on_demand: bool,
}

impl SnapshotRecord {
    pub fn scheduled(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            policy_name_at_snapshot: None,
            is_on_demand: false,
        }
    }

    pub fn on_demand(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            policy_name_at_snapshot: None,
            is_on_demand: true,
        }
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy_name_at_snapshot = Some(policy.into());
        self
    }
}

/// Snapshots listed for one object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotHistory {
    pub snapshots: Vec<SnapshotRecord>,
    /// Listing stopped before reaching the requested cutoff
    pub truncated: bool,
}

impl SnapshotHistory {
    pub fn complete(snapshots: Vec<SnapshotRecord>) -> Self {
        Self {
            snapshots,
            truncated: false,
        }
    }

    pub fn truncated(snapshots: Vec<SnapshotRecord>) -> Self {
        Self {
            snapshots,
            truncated: true,
        }
    }
}

impl From<Vec<SnapshotRecord>> for SnapshotHistory {
    fn from(snapshots: Vec<SnapshotRecord>) -> Self {
        Self::complete(snapshots)
    }
}

/// Parse a platform timestamp as UTC.
///
/// Accepts RFC 3339 (`2024-01-02T00:05:00Z`, offsets converted to UTC) and
/// offset-less ISO-8601, which is taken to already be UTC. Returns None for
/// anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Format a timestamp the way reports and ticket notes display it
pub fn display_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| super::NOT_AVAILABLE.to_string())
}
