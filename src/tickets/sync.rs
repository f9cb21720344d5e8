//! Write reconciliation results back to tickets

use super::TicketStore;
use crate::models::{ResultRecord, TicketRef, TicketState, display_timestamp};
use serde::Serialize;
use std::collections::HashMap;

/// Body of one ticket PATCH
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketUpdate {
    pub work_notes: String,
    pub incident_state: TicketState,
    /// Only sent when resolving and a closer identity is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
}

impl TicketUpdate {
    pub fn for_result(record: &ResultRecord, allowed_closer: Option<&str>) -> Self {
        let incident_state = TicketState::for_compliance(record.compliant);
        let resolved_by = match incident_state {
            TicketState::Resolved => allowed_closer.map(String::from),
            TicketState::Active => None,
        };
        Self {
            work_notes: build_work_note(record),
            incident_state,
            resolved_by,
        }
    }
}

/// Human-readable work note for one result
pub fn build_work_note(record: &ResultRecord) -> String {
    format!(
        "Rubrik Backup Validation Result:\nNode: {}\nSLA Domain: {}\nStatus: {}\nLast Snapshot: {}\n",
        record.server,
        record.policy_name,
        record.status_label(),
        display_timestamp(record.last_backup_at)
    )
}

/// Counts of a sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Applies results to their tickets, best effort
pub struct TicketSynchronizer<'a> {
    store: &'a dyn TicketStore,
    allowed_closer: Option<String>,
}

impl<'a> TicketSynchronizer<'a> {
    pub fn new(store: &'a dyn TicketStore) -> Self {
        Self {
            store,
            allowed_closer: None,
        }
    }

    pub fn with_allowed_closer(mut self, closer: Option<String>) -> Self {
        self.allowed_closer = closer.filter(|c| !c.trim().is_empty());
        self
    }

    /// Update the ticket of every result, one at a time.
    ///
    /// Results without a ticket are skipped without a remote call. A failed
    /// update is counted and the loop moves on.
    pub async fn sync(
        &self,
        results: &[ResultRecord],
        ticket_index: &HashMap<String, TicketRef>,
    ) -> SyncSummary {
        let mut summary = SyncSummary::default();

        for record in results {
            let Some(ticket) = ticket_index.get(&record.server.to_lowercase()) else {
                tracing::info!("No incident mapped for server {}", record.server);
                summary.skipped += 1;
                continue;
            };

            let update = TicketUpdate::for_result(record, self.allowed_closer.as_deref());
            match self.store.update_ticket(ticket, &update).await {
                Ok(()) => {
                    tracing::info!(
                        "Updated {}: status={} state={}",
                        ticket.number,
                        record.status_label(),
                        update.incident_state
                    );
                    summary.updated += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to update {}: {}", ticket.number, e);
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
