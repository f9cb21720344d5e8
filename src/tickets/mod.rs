//! Ticket store seam and synchronization
//!
//! [`TicketStore`] hides the ticketing system's transport; the ServiceNow
//! table API is the one implementation. [`TicketSynchronizer`] writes
//! reconciliation results back, one ticket at a time.

pub mod servicenow;
pub mod sync;

pub use servicenow::ServiceNowClient;
pub use sync::{SyncSummary, TicketSynchronizer, TicketUpdate, build_work_note};

use crate::models::{Ticket, TicketRef};
use async_trait::async_trait;

/// Ticket store errors
#[derive(Debug, thiserror::Error)]
pub enum TicketStoreError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected status {status} for {target}")]
    Status { status: u16, target: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Read and write access to incident tickets
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// All tickets matched by the configured incident query
    async fn fetch_tickets(&self) -> Result<Vec<Ticket>, TicketStoreError>;

    /// Apply one update. Made once, never retried.
    async fn update_ticket(
        &self,
        ticket: &TicketRef,
        update: &TicketUpdate,
    ) -> Result<(), TicketStoreError>;
}
