//! Freshness and retention policy definitions

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How "recent enough" is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FreshnessPolicy {
    /// Snapshot taken today or yesterday, in UTC calendar days
    CalendarDay,
    /// Snapshot taken within the last `hours` hours
    Rolling { hours: u32 },
}

impl FreshnessPolicy {
    /// Whether a snapshot at `taken` satisfies the policy at `now`.
    /// Callers exclude snapshots from the future before asking.
    pub fn is_fresh(&self, taken: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            FreshnessPolicy::CalendarDay => {
                let day_delta = (now.date_naive() - taken.date_naive()).num_days();
                matches!(day_delta, 0 | 1)
            }
            FreshnessPolicy::Rolling { hours } => {
                taken >= window_start(now, Duration::hours(i64::from(*hours)))
            }
        }
    }

    /// Approximate window length, used to sanity check the retention window
    pub fn nominal_window(&self) -> Duration {
        match self {
            FreshnessPolicy::CalendarDay => Duration::days(2),
            FreshnessPolicy::Rolling { hours } => Duration::hours(i64::from(*hours)),
        }
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        FreshnessPolicy::Rolling { hours: 24 }
    }
}

/// Full evaluation configuration, persisted in the report as `window_config`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationPolicy {
    pub freshness: FreshnessPolicy,
    /// Reporting window for `retention_window_count`
    pub retention_days: u32,
    /// Whether on-demand snapshots may satisfy the compliance verdict
    pub count_on_demand_as_compliant: bool,
}

impl EvaluationPolicy {
    pub fn retention_window(&self) -> Duration {
        Duration::days(i64::from(self.retention_days))
    }

    pub fn retention_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        window_start(now, self.retention_window())
    }
}

/// `now - window`, clamped to the earliest representable instant
pub fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl Default for EvaluationPolicy {
    fn default() -> Self {
        Self {
            freshness: FreshnessPolicy::default(),
            retention_days: 60,
            count_on_demand_as_compliant: true,
        }
    }
}
