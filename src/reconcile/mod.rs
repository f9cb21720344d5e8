//! Reconciliation of requested names against the backup catalog

pub mod driver;
pub mod report;

pub use driver::Reconciler;
pub use report::{Report, ReportSummary};
