//! Snapshot evaluator
//!
//! Turns a snapshot list into a compliance verdict. The core is
//! [`evaluate_snapshots`], a pure function over an unordered list;
//! [`evaluate`] wraps it with the platform query.

pub mod policy;

pub use policy::{EvaluationPolicy, FreshnessPolicy, window_start};

use crate::models::SnapshotRecord;
use crate::platform::{CatalogSource, PlatformError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verdict for one catalog object
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub compliant: bool,
    /// Newest non-future snapshot, regardless of any window
    pub last_backup_at: Option<DateTime<Utc>>,
    pub retention_window_count: u32,
    /// Policy attached to the newest snapshot, if the platform reported one
    pub latest_policy_name: Option<String>,
    /// The platform stopped listing early; the retention count is a lower bound
    #[serde(default)]
    pub history_truncated: bool,
}

/// Evaluate `snapshots` at instant `now`.
///
/// Order is not assumed. Snapshots later than `now` (clock skew) are
/// ignored everywhere, including for `last_backup_at`.
pub fn evaluate_snapshots(
    snapshots: &[SnapshotRecord],
    policy: &EvaluationPolicy,
    now: DateTime<Utc>,
) -> EvaluationResult {
    let retention_cutoff = policy.retention_cutoff(now);
    let mut result = EvaluationResult::default();
    let mut latest: Option<&SnapshotRecord> = None;

    for snapshot in snapshots.iter().filter(|s| s.timestamp <= now) {
        if latest.is_none_or(|l| snapshot.timestamp > l.timestamp) {
            latest = Some(snapshot);
        }

        if snapshot.timestamp >= retention_cutoff {
            result.retention_window_count += 1;
        }

        let qualifies = !snapshot.is_on_demand || policy.count_on_demand_as_compliant;
        if qualifies && policy.freshness.is_fresh(snapshot.timestamp, now) {
            result.compliant = true;
        }
    }

    if let Some(latest) = latest {
        result.last_backup_at = Some(latest.timestamp);
        result.latest_policy_name = latest.policy_name_at_snapshot.clone();
    }

    result
}

/// Query the snapshots of `object_id` and evaluate them.
///
/// Errors are per-object and non-fatal; the caller records the object as
/// unqueryable and keeps going.
pub async fn evaluate(
    source: &dyn CatalogSource,
    object_id: &str,
    policy: &EvaluationPolicy,
    now: DateTime<Utc>,
) -> Result<EvaluationResult, PlatformError> {
    let not_before = policy
        .retention_cutoff(now)
        .min(window_start(now, policy.freshness.nominal_window()));

    let history = source
        .list_snapshots(object_id, not_before)
        .await
        .map_err(|e| match e {
            PlatformError::SnapshotQuery { .. } => e,
            other => PlatformError::SnapshotQuery {
                object_id: object_id.to_string(),
                reason: other.to_string(),
            },
        })?;

    let mut result = evaluate_snapshots(&history.snapshots, policy, now);
    result.history_truncated = history.truncated;
    tracing::debug!(
        "Evaluated {}: {} snapshot(s), compliant={}, last={:?}, retained={}",
        object_id,
        history.snapshots.len(),
        result.compliant,
        result.last_backup_at,
        result.retention_window_count
    );

    Ok(result)
}
