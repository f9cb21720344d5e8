//! Backup platform seam
//!
//! The reconciliation engine only talks to the platform through these two
//! traits, so tests can swap in doubles and the Rubrik client stays an
//! implementation detail:
//! - [`CatalogSource`] lists catalog objects and their snapshots
//! - [`RemediationTrigger`] requests an on-demand backup
//!
//! Remote calls are made once with a fixed timeout. There are no retries;
//! a failed call is reported to the caller and the run moves on.

pub mod cluster;
pub mod rubrik;

use crate::models::{CatalogObject, SnapshotHistory};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

pub use cluster::ClusterSet;
pub use rubrik::RubrikClient;

/// Backup platform errors
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Catalog fetch failed: {0}")]
    CatalogFetch(String),

    #[error("Snapshot query failed for {object_id}: {reason}")]
    SnapshotQuery { object_id: String, reason: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Outcome of an on-demand backup request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    Triggered,
    AlreadyRunning,
    Failed(String),
}

/// Read access to the backup catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch every backup-tracked object.
    ///
    /// Fails only when nothing could be listed at all; that is fatal for
    /// the run.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogObject>, PlatformError>;

    /// Snapshots of one object, in whatever order the platform returns them.
    ///
    /// `not_before` is a paging hint: implementations may stop fetching
    /// once they have passed it, but may also return older snapshots.
    async fn list_snapshots(
        &self,
        object_id: &str,
        not_before: DateTime<Utc>,
    ) -> Result<SnapshotHistory, PlatformError>;
}

/// Union of several partial catalog listings.
///
/// A failed part is logged and skipped. Only when every part failed is
/// the result a [`PlatformError::CatalogFetch`] naming each failure.
pub fn merge_catalogs<L: fmt::Display>(
    parts: Vec<(L, Result<Vec<CatalogObject>, PlatformError>)>,
) -> Result<Vec<CatalogObject>, PlatformError> {
    let mut objects = Vec::new();
    let mut failures = Vec::new();
    let mut listed_any = false;

    for (label, part) in parts {
        match part {
            Ok(listed) => {
                listed_any = true;
                objects.extend(listed);
            }
            Err(e) => {
                tracing::warn!("Skipping {} listing: {}", label, e);
                failures.push(format!("{}: {}", label, e));
            }
        }
    }

    if !listed_any && !failures.is_empty() {
        return Err(PlatformError::CatalogFetch(failures.join("; ")));
    }
    Ok(objects)
}

/// Write access used for remediation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemediationTrigger: Send + Sync {
    /// Request an on-demand backup. Never retried.
    async fn trigger_backup(&self, object_id: &str) -> TriggerOutcome;

    /// Platform-reported running state, None when the platform cannot tell
    async fn is_backup_running(&self, _object_id: &str) -> Option<bool> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObjectType;

    fn vm(id: &str) -> CatalogObject {
        CatalogObject::new(Some(id.to_string()), id, ObjectType::VirtualMachine)
    }

    #[test]
    fn test_failed_listing_keeps_the_others() {
        let merged = merge_catalogs(vec![
            (
                ObjectType::WindowsFileset,
                Err(PlatformError::Transport("GraphQL returned 503".into())),
            ),
            (ObjectType::LinuxFileset, Ok(vec![])),
            (ObjectType::VirtualMachine, Ok(vec![vm("srv-a")])),
        ])
        .unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id(), Some("srv-a"));
    }

    #[test]
    fn test_all_listings_failing_is_fatal() {
        let err = merge_catalogs(vec![
            ("WINDOWS_FILESET", Err(PlatformError::Transport("timed out".into()))),
            ("VIRTUAL_MACHINE", Err(PlatformError::Transport("refused".into()))),
        ])
        .unwrap_err();

        match err {
            PlatformError::CatalogFetch(reason) => {
                assert!(reason.contains("WINDOWS_FILESET"));
                assert!(reason.contains("refused"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_listings_are_not_failures() {
        let merged = merge_catalogs::<&str>(vec![("a", Ok(vec![])), ("b", Ok(vec![]))]).unwrap();
        assert!(merged.is_empty());
    }
}
