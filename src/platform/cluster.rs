//! Several platform endpoints behind one catalog
//!
//! Catalogs of every member are merged. Snapshot queries and backup
//! requests are routed back to the member that listed the object.

use super::{CatalogSource, PlatformError, RemediationTrigger, TriggerOutcome, merge_catalogs};
use crate::models::{CatalogObject, NOT_AVAILABLE, SnapshotHistory};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Platform members keyed by their endpoint label
pub struct ClusterSet<P> {
    members: Vec<(String, P)>,
    /// Object id to member index, rebuilt by every catalog fetch
    owners: RwLock<HashMap<String, usize>>,
}

impl<P> ClusterSet<P>
where
    P: CatalogSource + RemediationTrigger,
{
    pub fn new(members: Vec<(String, P)>) -> Self {
        Self {
            members,
            owners: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member that listed `object_id`. A lone member owns everything.
    async fn owner(&self, object_id: &str) -> Option<&P> {
        if let [(_, only)] = self.members.as_slice() {
            return Some(only);
        }
        let index = *self.owners.read().await.get(object_id)?;
        self.members.get(index).map(|(_, member)| member)
    }
}

#[async_trait]
impl<P> CatalogSource for ClusterSet<P>
where
    P: CatalogSource + RemediationTrigger,
{
    async fn fetch_catalog(&self) -> Result<Vec<CatalogObject>, PlatformError> {
        let mut parts = Vec::with_capacity(self.members.len());
        let mut owners = HashMap::new();

        for (index, (label, member)) in self.members.iter().enumerate() {
            let listed = member.fetch_catalog().await.map(|objects| {
                objects
                    .into_iter()
                    .map(|object| {
                        if object.cluster_name() == NOT_AVAILABLE {
                            object.with_cluster(Some(label.as_str()))
                        } else {
                            object
                        }
                    })
                    .collect::<Vec<_>>()
            });

            if let Ok(objects) = &listed {
                tracing::info!("{}: {} catalog object(s)", label, objects.len());
                for id in objects.iter().filter_map(|o| o.id()) {
                    // First member to list an id keeps it
                    owners.entry(id.to_string()).or_insert(index);
                }
            }
            parts.push((label.as_str(), listed));
        }

        *self.owners.write().await = owners;
        merge_catalogs(parts)
    }

    async fn list_snapshots(
        &self,
        object_id: &str,
        not_before: DateTime<Utc>,
    ) -> Result<SnapshotHistory, PlatformError> {
        match self.owner(object_id).await {
            Some(member) => member.list_snapshots(object_id, not_before).await,
            None => Err(PlatformError::SnapshotQuery {
                object_id: object_id.to_string(),
                reason: "no cluster lists this object".to_string(),
            }),
        }
    }
}

#[async_trait]
impl<P> RemediationTrigger for ClusterSet<P>
where
    P: CatalogSource + RemediationTrigger,
{
    async fn trigger_backup(&self, object_id: &str) -> TriggerOutcome {
        match self.owner(object_id).await {
            Some(member) => member.trigger_backup(object_id).await,
            None => TriggerOutcome::Failed(format!("no cluster lists {}", object_id)),
        }
    }

    async fn is_backup_running(&self, object_id: &str) -> Option<bool> {
        self.owner(object_id).await?.is_backup_running(object_id).await
    }
}
