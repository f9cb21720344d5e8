//! Freshness policy behaviour of the snapshot evaluator

use chrono::{DateTime, Duration, TimeZone, Utc};
use l2backup::evaluator::{EvaluationPolicy, FreshnessPolicy, evaluate_snapshots};
use l2backup::models::SnapshotRecord;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn calendar_day() -> EvaluationPolicy {
    EvaluationPolicy {
        freshness: FreshnessPolicy::CalendarDay,
        retention_days: 60,
        count_on_demand_as_compliant: true,
    }
}

fn rolling(hours: u32, count_on_demand: bool) -> EvaluationPolicy {
    EvaluationPolicy {
        freshness: FreshnessPolicy::Rolling { hours },
        retention_days: 60,
        count_on_demand_as_compliant: count_on_demand,
    }
}

#[test]
fn test_calendar_day_uses_date_delta() {
    let snaps = vec![SnapshotRecord::scheduled(at(2024, 1, 2, 0, 5))];
    let policy = calendar_day();

    assert!(evaluate_snapshots(&snaps, &policy, at(2024, 1, 2, 23, 59)).compliant);
    assert!(evaluate_snapshots(&snaps, &policy, at(2024, 1, 3, 0, 10)).compliant);
    assert!(!evaluate_snapshots(&snaps, &policy, at(2024, 1, 4, 0, 10)).compliant);
}

#[test]
fn test_calendar_day_is_not_a_rolling_window() {
    // 47h apart but still "yesterday"
    let snaps = vec![SnapshotRecord::scheduled(at(2024, 1, 2, 0, 1))];
    assert!(evaluate_snapshots(&snaps, &calendar_day(), at(2024, 1, 3, 23, 1)).compliant);

    // 25h under a 24h rolling window is stale
    assert!(!evaluate_snapshots(&snaps, &rolling(24, true), at(2024, 1, 3, 1, 1)).compliant);
}

#[test]
fn test_rolling_on_demand_flag() {
    let now = at(2024, 3, 1, 12, 0);
    let snaps = vec![SnapshotRecord::on_demand(now - Duration::hours(2))];

    assert!(evaluate_snapshots(&snaps, &rolling(24, true), now).compliant);
    assert!(!evaluate_snapshots(&snaps, &rolling(24, false), now).compliant);
}

#[test]
fn test_scheduled_snapshot_satisfies_strict_policy() {
    let now = at(2024, 3, 1, 12, 0);
    let snaps = vec![
        SnapshotRecord::on_demand(now - Duration::hours(1)),
        SnapshotRecord::scheduled(now - Duration::hours(20)),
    ];
    let result = evaluate_snapshots(&snaps, &rolling(24, false), now);
    assert!(result.compliant);
    assert_eq!(result.last_backup_at, Some(now - Duration::hours(1)));
}

#[test]
fn test_rolling_boundary_is_inclusive() {
    let now = at(2024, 3, 1, 12, 0);
    let snaps = vec![SnapshotRecord::scheduled(now - Duration::hours(24))];
    assert!(evaluate_snapshots(&snaps, &rolling(24, true), now).compliant);
}

#[test]
fn test_compliant_implies_retained() {
    let now = at(2024, 3, 1, 12, 0);
    let histories = [
        vec![SnapshotRecord::scheduled(now - Duration::hours(3))],
        vec![
            SnapshotRecord::on_demand(now - Duration::minutes(5)),
            SnapshotRecord::scheduled(now - Duration::days(59)),
        ],
        vec![
            SnapshotRecord::scheduled(now + Duration::hours(1)),
            SnapshotRecord::scheduled(now - Duration::hours(23)),
        ],
    ];

    for policy in [calendar_day(), rolling(24, true), rolling(48, false)] {
        for snaps in &histories {
            let result = evaluate_snapshots(snaps, &policy, now);
            if result.compliant {
                assert!(result.retention_window_count >= 1);
            }
        }
    }
}

#[test]
fn test_retention_count_ignores_on_demand_flag() {
    let now = at(2024, 3, 1, 12, 0);
    let snaps = vec![
        SnapshotRecord::on_demand(now - Duration::days(1)),
        SnapshotRecord::scheduled(now - Duration::days(30)),
        SnapshotRecord::scheduled(now - Duration::days(61)),
    ];
    let result = evaluate_snapshots(&snaps, &rolling(24, false), now);
    assert_eq!(result.retention_window_count, 2);
}

#[test]
fn test_future_snapshot_is_not_latest() {
    let now = at(2024, 3, 1, 12, 0);
    let snaps = vec![
        SnapshotRecord::scheduled(now + Duration::days(1)),
        SnapshotRecord::scheduled(now - Duration::days(10)),
    ];
    let result = evaluate_snapshots(&snaps, &calendar_day(), now);
    assert!(!result.compliant);
    assert_eq!(result.last_backup_at, Some(now - Duration::days(10)));
}
