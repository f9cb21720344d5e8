//! Reconciliation driver
//!
//! Per requested name: match, pick a winner per object type, evaluate,
//! and remediate stale objects. Snapshot queries for distinct objects run
//! on a bounded worker pool; everything else is sequential.

use crate::config::RemediationConfig;
use crate::evaluator::{self, EvaluationPolicy, EvaluationResult};
use crate::matcher::{self, MatchCandidate};
use crate::models::{
    CatalogObject, CatalogPresence, NOT_AVAILABLE, ObjectType, Remediation, ResultRecord,
};
use crate::platform::{CatalogSource, PlatformError, RemediationTrigger, TriggerOutcome};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap, HashSet};

type Evaluations = HashMap<String, Result<EvaluationResult, PlatformError>>;

/// Drives one reconciliation run against a catalog source
pub struct Reconciler<'a> {
    source: &'a dyn CatalogSource,
    trigger: &'a dyn RemediationTrigger,
    policy: EvaluationPolicy,
    remediation: RemediationConfig,
    workers: usize,
    now: Option<DateTime<Utc>>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        source: &'a dyn CatalogSource,
        trigger: &'a dyn RemediationTrigger,
        policy: EvaluationPolicy,
    ) -> Self {
        Self {
            source,
            trigger,
            policy,
            remediation: RemediationConfig::default(),
            workers: 4,
            now: None,
        }
    }

    pub fn with_remediation(mut self, remediation: RemediationConfig) -> Self {
        self.remediation = remediation;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Evaluate at a fixed instant instead of the wall clock
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn policy(&self) -> &EvaluationPolicy {
        &self.policy
    }

    /// Fetch the catalog and reconcile `requested_names` against it.
    ///
    /// Only the catalog fetch can fail; per-object problems end up in the
    /// affected records.
    pub async fn reconcile(
        &self,
        requested_names: &[String],
    ) -> Result<Vec<ResultRecord>, PlatformError> {
        let catalog = self.source.fetch_catalog().await?;
        Ok(self.reconcile_catalog(requested_names, &catalog).await)
    }

    /// Reconcile against an already fetched catalog
    pub async fn reconcile_catalog(
        &self,
        requested_names: &[String],
        catalog: &[CatalogObject],
    ) -> Vec<ResultRecord> {
        let now = self.now.unwrap_or_else(Utc::now);

        let mut seen = HashSet::new();
        let plans: Vec<(String, BTreeMap<ObjectType, Vec<MatchCandidate<'_>>>)> = requested_names
            .iter()
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty() && seen.insert(name.clone()))
            .map(|name| {
                let candidates = matcher::match_candidates(&name, catalog);
                (name, matcher::top_candidates_by_type(candidates))
            })
            .collect();

        // Every tied candidate is evaluated so the tie-break can compare them
        let object_ids: HashSet<&str> = plans
            .iter()
            .flat_map(|(_, groups)| groups.values().flatten())
            .filter_map(|candidate| candidate.object.id())
            .collect();

        let evaluations = self.evaluate_all(object_ids, now).await;

        let mut remediations: HashMap<String, Remediation> = HashMap::new();
        let mut records = Vec::new();

        for (server, groups) in &plans {
            if groups.is_empty() {
                tracing::info!("{}: not found in catalog", server);
                records.push(ResultRecord::not_found(server.clone(), now));
                continue;
            }

            for candidates in groups.values() {
                let Some(winner) = pick_winner(candidates, &evaluations) else {
                    continue;
                };
                let record = self
                    .build_record(server, winner, &evaluations, &mut remediations, now)
                    .await;
                records.push(record);
            }
        }

        records.sort_by(|a, b| {
            a.server
                .cmp(&b.server)
                .then_with(|| a.object_type.cmp(&b.object_type))
        });
        records
    }

    async fn evaluate_all(&self, object_ids: HashSet<&str>, now: DateTime<Utc>) -> Evaluations {
        let source = self.source;
        let policy = &self.policy;

        stream::iter(object_ids)
            .map(|id| async move {
                let result = evaluator::evaluate(source, id, policy, now).await;
                (id.to_string(), result)
            })
            .buffer_unordered(self.workers)
            .collect()
            .await
    }

    async fn build_record(
        &self,
        server: &str,
        object: &CatalogObject,
        evaluations: &Evaluations,
        remediations: &mut HashMap<String, Remediation>,
        now: DateTime<Utc>,
    ) -> ResultRecord {
        let mut record = ResultRecord {
            server: server.to_string(),
            in_catalog: CatalogPresence::FoundNoId,
            compliant: false,
            last_backup_at: None,
            retention_window_count: 0,
            policy_name: object.policy_name().to_string(),
            object_type: None,
            cluster_name: object.cluster_name().to_string(),
            matched_object: Some(object.display_name().to_string()),
            remediation: Remediation::NotAttempted,
            detail: None,
            checked_at: now,
        };

        let Some(id) = object.id() else {
            tracing::warn!("{}: matched {} has no id", server, object.display_name());
            record.detail = Some("catalog object has no id".to_string());
            return record;
        };

        let evaluation = match evaluations.get(id) {
            Some(Ok(evaluation)) => evaluation,
            Some(Err(e)) => {
                tracing::warn!("{}: {}", server, e);
                record.detail = Some(e.to_string());
                return record;
            }
            None => {
                record.detail = Some("object was not evaluated".to_string());
                return record;
            }
        };

        record.in_catalog = CatalogPresence::Found;
        record.object_type = Some(object.object_type());
        record.compliant = evaluation.compliant;
        record.last_backup_at = evaluation.last_backup_at;
        record.retention_window_count = evaluation.retention_window_count;
        if evaluation.history_truncated {
            tracing::warn!("{}: snapshot history of {} is truncated", server, id);
            record.detail = Some(format!(
                "snapshot history truncated; retention count of {} is a lower bound",
                evaluation.retention_window_count
            ));
        }
        if !object.has_policy() {
            record.policy_name = evaluation
                .latest_policy_name
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        }

        if !record.compliant && self.remediation.allows(object.object_type()) {
            record.remediation = match remediations.get(id) {
                Some(previous) => *previous,
                None => {
                    let outcome = self.remediate(id).await;
                    remediations.insert(id.to_string(), outcome);
                    outcome
                }
            };
        }

        tracing::info!(
            "{} [{}]: compliant={} last={:?} remediation={}",
            server,
            object.object_type(),
            record.compliant,
            record.last_backup_at,
            record.remediation
        );

        record
    }

    async fn remediate(&self, object_id: &str) -> Remediation {
        if self.trigger.is_backup_running(object_id).await == Some(true) {
            tracing::info!("Backup already running for {}, not triggering", object_id);
            return Remediation::AlreadyRunning;
        }

        match self.trigger.trigger_backup(object_id).await {
            TriggerOutcome::Triggered => Remediation::Triggered,
            TriggerOutcome::AlreadyRunning => Remediation::AlreadyRunning,
            TriggerOutcome::Failed(_) => Remediation::TriggerFailed,
        }
    }
}

/// Tie-break among equal-weight candidates of one type.
///
/// The candidate with the latest snapshot wins, earlier catalog position
/// breaking exact ties. Without any snapshot the first candidate wins.
fn pick_winner<'c>(
    candidates: &[MatchCandidate<'c>],
    evaluations: &Evaluations,
) -> Option<&'c CatalogObject> {
    let latest = |candidate: &MatchCandidate<'c>| {
        let id = candidate.object.id()?;
        evaluations.get(id)?.as_ref().ok()?.last_backup_at
    };

    let mut best: Option<(&'c CatalogObject, DateTime<Utc>)> = None;
    for candidate in candidates {
        if let Some(ts) = latest(candidate) {
            if best.is_none_or(|(_, best_ts)| ts > best_ts) {
                best = Some((candidate.object, ts));
            }
        }
    }

    best.map(|(object, _)| object)
        .or_else(|| candidates.first().map(|c| c.object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SnapshotHistory, SnapshotRecord};
    use crate::platform::{MockCatalogSource, MockRemediationTrigger};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn vm(id: &str, name: &str) -> CatalogObject {
        CatalogObject::new(Some(id.to_string()), name, ObjectType::VirtualMachine)
            .with_policy(Some("Gold"))
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_stale_object_triggers_once() {
        let catalog = vec![vm("vm-1", "srv-a")];

        let mut source = MockCatalogSource::new();
        source
            .expect_list_snapshots()
            .returning(|_, _| {
                Ok(vec![SnapshotRecord::scheduled(now() - Duration::days(3))].into())
            });

        let mut trigger = MockRemediationTrigger::new();
        trigger.expect_is_backup_running().returning(|_| None);
        trigger
            .expect_trigger_backup()
            .times(1)
            .returning(|_| TriggerOutcome::Triggered);

        let reconciler = Reconciler::new(&source, &trigger, EvaluationPolicy::default()).at(now());
        // "SRV-A" dedupes to the same request
        let records = reconciler
            .reconcile_catalog(&names(&["srv-a", "SRV-A"]), &catalog)
            .await;

        assert_eq!(records.len(), 1);
        assert!(!records[0].compliant);
        assert_eq!(records[0].remediation, Remediation::Triggered);
    }

    #[tokio::test]
    async fn test_running_backup_is_not_retriggered() {
        let catalog = vec![vm("vm-1", "srv-a")];

        let mut source = MockCatalogSource::new();
        source
            .expect_list_snapshots()
            .returning(|_, _| Ok(SnapshotHistory::default()));

        let mut trigger = MockRemediationTrigger::new();
        trigger.expect_is_backup_running().returning(|_| Some(true));
        trigger.expect_trigger_backup().never();

        let records = Reconciler::new(&source, &trigger, EvaluationPolicy::default())
            .at(now())
            .reconcile_catalog(&names(&["srv-a"]), &catalog)
            .await;

        assert_eq!(records[0].remediation, Remediation::AlreadyRunning);
        assert!(records[0].last_backup_at.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_failure_is_found_no_id() {
        let catalog = vec![vm("vm-1", "srv-a")];

        let mut source = MockCatalogSource::new();
        source
            .expect_list_snapshots()
            .returning(|_, _| Err(PlatformError::Transport("timed out".into())));

        let mut trigger = MockRemediationTrigger::new();
        trigger.expect_trigger_backup().never();

        let records = Reconciler::new(&source, &trigger, EvaluationPolicy::default())
            .at(now())
            .reconcile_catalog(&names(&["srv-a"]), &catalog)
            .await;

        assert_eq!(records[0].in_catalog, CatalogPresence::FoundNoId);
        assert!(!records[0].compliant);
        assert!(records[0].object_type.is_none());
        assert!(records[0].detail.as_deref().unwrap_or_default().contains("timed out"));
    }

    #[tokio::test]
    async fn test_remediation_disabled_for_type() {
        let catalog = vec![vm("vm-1", "srv-a")];

        let mut source = MockCatalogSource::new();
        source
            .expect_list_snapshots()
            .returning(|_, _| Ok(SnapshotHistory::default()));

        let mut trigger = MockRemediationTrigger::new();
        trigger.expect_trigger_backup().never();

        let remediation = RemediationConfig {
            enabled: true,
            object_types: vec![ObjectType::LinuxFileset],
        };
        let records = Reconciler::new(&source, &trigger, EvaluationPolicy::default())
            .with_remediation(remediation)
            .at(now())
            .reconcile_catalog(&names(&["srv-a"]), &catalog)
            .await;

        assert_eq!(records[0].remediation, Remediation::NotAttempted);
    }

    #[test]
    fn test_pick_winner_prefers_latest_snapshot() {
        let a = vm("vm-a", "srv-a");
        let b = vm("vm-b", "srv-a");
        let candidates = vec![
            MatchCandidate { object: &a, weight: 3 },
            MatchCandidate { object: &b, weight: 3 },
        ];

        let mut evaluations = Evaluations::new();
        evaluations.insert(
            "vm-a".into(),
            Ok(EvaluationResult {
                last_backup_at: Some(now() - Duration::days(2)),
                ..Default::default()
            }),
        );
        evaluations.insert(
            "vm-b".into(),
            Ok(EvaluationResult {
                last_backup_at: Some(now() - Duration::hours(1)),
                ..Default::default()
            }),
        );

        assert_eq!(pick_winner(&candidates, &evaluations).and_then(|o| o.id()), Some("vm-b"));

        evaluations.clear();
        assert_eq!(pick_winner(&candidates, &evaluations).and_then(|o| o.id()), Some("vm-a"));
    }
}
