//! l2backup library
//!
//! Reconciles backup-compliance tickets against backup snapshot history.
//! The binary is a thin CLI over these modules; integration tests drive
//! them directly with in-memory doubles.

pub mod cli;
pub mod config;
pub mod evaluator;
pub mod matcher;
pub mod models;
pub mod platform;
pub mod reconcile;
pub mod servers;
pub mod tickets;

// Re-export commonly used types for convenience
pub use evaluator::{EvaluationPolicy, EvaluationResult, FreshnessPolicy, evaluate_snapshots};
pub use matcher::{MatchCandidate, match_candidates};
pub use models::{
    CatalogObject, CatalogPresence, ObjectType, Remediation, ResultRecord, SnapshotRecord,
    TicketRef,
};
pub use platform::{CatalogSource, PlatformError, RemediationTrigger, TriggerOutcome};
pub use reconcile::{Reconciler, Report, ReportSummary};
pub use tickets::{SyncSummary, TicketStore, TicketStoreError, TicketSynchronizer, TicketUpdate};
