//! Snapshot page parsing

use super::PageInfo;
use super::catalog::{connection, edge_nodes, nested_name, str_field};
use crate::models::{SnapshotRecord, parse_timestamp};
use serde_json::Value;

/// Parse one snapshot listing page.
///
/// Returns None when the connection is missing. Nodes whose `date` cannot
/// be parsed are dropped; they carry no usable information.
pub fn parse_snapshot_page(response: &Value) -> Option<(Vec<SnapshotRecord>, PageInfo)> {
    let conn = connection(response, "snapshotsListConnection")?;
    let mut snapshots = Vec::new();

    for node in edge_nodes(conn) {
        let raw_date = str_field(node, "date").unwrap_or_default();
        let Some(timestamp) = parse_timestamp(raw_date) else {
            tracing::debug!("Dropping snapshot with unparseable date {:?}", raw_date);
            continue;
        };

        snapshots.push(SnapshotRecord {
            timestamp,
            policy_name_at_snapshot: nested_name(node, "slaDomain").map(String::from),
            is_on_demand: node
                .get("isOnDemandSnapshot")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        });
    }

    Some((snapshots, PageInfo::from_connection(conn)))
}
