//! Rubrik Security Cloud implementation of the platform traits
//!
//! The catalog is the union of Windows filesets, Linux filesets and
//! vSphere VMs. Each listing is cursor-paginated; a listing that fails
//! outright is skipped as long as another one succeeds.

pub mod catalog;
pub mod client;
pub mod queries;
pub mod snapshots;
pub mod trigger;

pub use client::RubrikClient;
pub use trigger::classify_trigger_response;

use crate::config::VmSource;
use crate::models::{CatalogObject, ObjectType, SnapshotHistory, SnapshotRecord};
use crate::platform::{
    CatalogSource, PlatformError, RemediationTrigger, TriggerOutcome, merge_catalogs,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::future::Future;

/// Cursor state of a connection page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

impl PageInfo {
    /// Read `pageInfo` from a connection; absent means a single page
    pub fn from_connection(connection: &Value) -> Self {
        let Some(info) = connection.get("pageInfo") else {
            return Self::default();
        };
        Self {
            end_cursor: info
                .get("endCursor")
                .and_then(|c| c.as_str())
                .map(String::from),
            has_next_page: info
                .get("hasNextPage")
                .and_then(|h| h.as_bool())
                .unwrap_or(false),
        }
    }

    /// Cursor for the next request, or None when paging should stop.
    ///
    /// A cursor equal to the previous one would loop forever, so it ends
    /// the listing too.
    pub fn next_cursor(&self, previous: Option<&str>) -> Option<String> {
        if !self.has_next_page {
            return None;
        }
        self.end_cursor
            .clone()
            .filter(|cursor| Some(cursor.as_str()) != previous)
    }
}

fn listing_filter() -> Value {
    json!([
        { "field": "IS_RELIC", "texts": ["false"] },
        { "field": "IS_REPLICATED", "texts": ["false"] }
    ])
}

impl RubrikClient {
    async fn fetch_filesets(
        &self,
        object_type: ObjectType,
    ) -> Result<Vec<CatalogObject>, PlatformError> {
        let host_root = object_type.host_root().unwrap_or_default();
        self.paginate(
            object_type.as_str(),
            queries::FILESET_TEMPLATES,
            json!({ "hostRoot": host_root, "filter": listing_filter() }),
            |response| catalog::parse_fileset_page(response, object_type),
        )
        .await
    }

    async fn fetch_vms(&self) -> Result<Vec<CatalogObject>, PlatformError> {
        match self.settings.vm_source {
            VmSource::Inventory => {
                self.paginate(
                    ObjectType::VirtualMachine.as_str(),
                    queries::VSPHERE_VMS,
                    json!({ "filter": listing_filter() }),
                    catalog::parse_vm_page,
                )
                .await
            }
            VmSource::SlaIndex => self.fetch_vms_by_sla().await,
        }
    }

    async fn snapshot_page(
        &self,
        object_id: &str,
        after: Option<String>,
    ) -> Result<(Vec<SnapshotRecord>, PageInfo), PlatformError> {
        let vars = json!({
            "snappableId": object_id,
            "first": self.settings.snapshot_page_size,
            "after": after,
        });

        let response = self.query(queries::SNAPSHOTS_OF_OBJECT, vars).await?;
        snapshots::parse_snapshot_page(&response).ok_or_else(|| {
            PlatformError::MalformedResponse("snapshot listing has no connection".into())
        })
    }

    /// VMs discovered through each policy's protected-object list
    async fn fetch_vms_by_sla(&self) -> Result<Vec<CatalogObject>, PlatformError> {
        let slas = self
            .paginate(
                "SLA domain",
                queries::SLA_DOMAINS,
                json!({}),
                catalog::parse_sla_page,
            )
            .await?;

        let mut objects = Vec::new();
        for (sla_id, sla_name) in slas {
            let listed = self
                .paginate(
                    "protected object",
                    queries::SLA_PROTECTED_OBJECTS,
                    json!({ "slaIds": [sla_id] }),
                    |response| catalog::parse_protected_objects_page(response, &sla_name),
                )
                .await;

            match listed {
                Ok(listed) => objects.extend(
                    listed
                        .into_iter()
                        .filter(|o| o.object_type() == ObjectType::VirtualMachine),
                ),
                Err(e) => tracing::warn!("Skipping SLA domain {}: {}", sla_name, e),
            }
        }

        Ok(objects)
    }
}

/// Page through one object's snapshots, newest first.
///
/// Paging ends once a page reaches back past `not_before` or the listing
/// runs out. `max_pages` only bounds runaway listings; stopping there, or
/// on a failed later page, marks the history as truncated. A failed first
/// page is an error.
pub async fn collect_snapshot_pages<F, Fut>(
    object_id: &str,
    not_before: DateTime<Utc>,
    max_pages: u32,
    mut fetch_page: F,
) -> Result<SnapshotHistory, PlatformError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<SnapshotRecord>, PageInfo), PlatformError>>,
{
    let mut snapshots = Vec::new();
    let mut after: Option<String> = None;

    for page_number in 0..max_pages.max(1) {
        let (batch, info) = match fetch_page(after.clone()).await {
            Ok(page) => page,
            Err(e) if page_number == 0 => return Err(e),
            Err(e) => {
                tracing::warn!(
                    "Keeping {} snapshot(s) of {}: {}",
                    snapshots.len(),
                    object_id,
                    e
                );
                return Ok(SnapshotHistory::truncated(snapshots));
            }
        };

        let passed_cutoff = batch.iter().any(|s| s.timestamp < not_before);
        snapshots.extend(batch);
        if passed_cutoff {
            return Ok(SnapshotHistory::complete(snapshots));
        }

        match info.next_cursor(after.as_deref()) {
            Some(cursor) => after = Some(cursor),
            None => return Ok(SnapshotHistory::complete(snapshots)),
        }
    }

    tracing::warn!(
        "Snapshot listing of {} hit the {} page limit before {}",
        object_id,
        max_pages,
        not_before
    );
    Ok(SnapshotHistory::truncated(snapshots))
}

#[async_trait]
impl CatalogSource for RubrikClient {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogObject>, PlatformError> {
        let windows = self.fetch_filesets(ObjectType::WindowsFileset).await;
        let linux = self.fetch_filesets(ObjectType::LinuxFileset).await;
        let vms = self.fetch_vms().await;

        let objects = merge_catalogs(vec![
            (ObjectType::WindowsFileset, windows),
            (ObjectType::LinuxFileset, linux),
            (ObjectType::VirtualMachine, vms),
        ])?;

        tracing::info!("Catalog holds {} object(s)", objects.len());
        Ok(objects)
    }

    async fn list_snapshots(
        &self,
        object_id: &str,
        not_before: DateTime<Utc>,
    ) -> Result<SnapshotHistory, PlatformError> {
        collect_snapshot_pages(
            object_id,
            not_before,
            self.settings.snapshot_max_pages,
            |after| self.snapshot_page(object_id, after),
        )
        .await
    }
}

#[async_trait]
impl RemediationTrigger for RubrikClient {
    async fn trigger_backup(&self, object_id: &str) -> TriggerOutcome {
        tracing::debug!("Requesting on-demand backup for {}", object_id);

        let outcome = match self
            .post_remediation(queries::CREATE_ON_DEMAND_SNAPSHOT, json!({ "id": object_id }))
            .await
        {
            Ok((status, body)) => classify_trigger_response(status, &body),
            Err(e) if e.is_timeout() => TriggerOutcome::Failed("request timed out".into()),
            Err(e) => TriggerOutcome::Failed(e.to_string()),
        };

        match &outcome {
            TriggerOutcome::Triggered => {
                tracing::info!("On-demand backup triggered for {}", object_id)
            }
            TriggerOutcome::AlreadyRunning => {
                tracing::info!("Backup already running for {}", object_id)
            }
            TriggerOutcome::Failed(reason) => {
                tracing::warn!("On-demand backup for {} failed: {}", object_id, reason)
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_page_info_defaults_to_single_page() {
        let info = PageInfo::from_connection(&json!({ "edges": [] }));
        assert_eq!(info, PageInfo::default());
        assert!(info.next_cursor(None).is_none());
    }

    #[test]
    fn test_repeated_cursor_stops_paging() {
        let info = PageInfo::from_connection(&json!({
            "pageInfo": { "endCursor": "abc", "hasNextPage": true }
        }));
        assert_eq!(info.next_cursor(None).as_deref(), Some("abc"));
        assert!(info.next_cursor(Some("abc")).is_none());
    }

    type Page = Result<(Vec<SnapshotRecord>, PageInfo), PlatformError>;

    /// Endless listing of hourly snapshots going back from `newest`
    fn hourly_pages(
        newest: DateTime<Utc>,
        per_page: i64,
    ) -> impl FnMut(Option<String>) -> std::future::Ready<Page> {
        let mut served = 0i64;
        move |_after| {
            let batch = (0..per_page)
                .map(|i| SnapshotRecord::scheduled(newest - Duration::hours(served + i)))
                .collect();
            served += per_page;
            let info = PageInfo {
                end_cursor: Some(format!("cursor-{}", served)),
                has_next_page: true,
            };
            std::future::ready(Ok((batch, info)))
        }
    }

    #[tokio::test]
    async fn test_snapshot_paging_reaches_the_cutoff() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let not_before = now - Duration::days(60);

        let history = collect_snapshot_pages("vm-1", not_before, 100, hourly_pages(now, 50))
            .await
            .unwrap();

        assert!(!history.truncated);
        let retained = history
            .snapshots
            .iter()
            .filter(|s| s.timestamp >= not_before)
            .count();
        assert_eq!(retained, 60 * 24 + 1);
    }

    #[tokio::test]
    async fn test_snapshot_page_cap_marks_truncation() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let not_before = now - Duration::days(60);

        let history = collect_snapshot_pages("vm-1", not_before, 4, hourly_pages(now, 50))
            .await
            .unwrap();

        assert!(history.truncated);
        assert_eq!(history.snapshots.len(), 200);
    }

    #[tokio::test]
    async fn test_snapshot_first_page_failure_is_an_error() {
        let result = collect_snapshot_pages("vm-1", Utc::now(), 4, |_| {
            std::future::ready(Err(PlatformError::Transport("timed out".into())))
        })
        .await;
        assert!(matches!(result, Err(PlatformError::Transport(_))));
    }

    #[test]
    fn test_has_next_without_cursor_stops() {
        let info = PageInfo::from_connection(&json!({
            "pageInfo": { "endCursor": null, "hasNextPage": true }
        }));
        assert!(info.next_cursor(None).is_none());
    }
}
