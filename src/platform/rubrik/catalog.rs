//! Catalog page parsing
//!
//! Turns GraphQL listing responses into [`CatalogObject`]s. Missing fields
//! degrade to "N/A" rather than failing the page; a missing connection
//! object means the response is unusable.

use super::PageInfo;
use crate::models::{CatalogObject, ObjectType};
use serde_json::Value;

/// Navigate `data.<connection>` of a GraphQL response
pub(crate) fn connection<'a>(response: &'a Value, name: &str) -> Option<&'a Value> {
    response
        .get("data")
        .and_then(|d| d.get(name))
        .filter(|c| c.is_object())
}

/// Node objects of a connection's `edges`
pub(crate) fn edge_nodes(connection: &Value) -> impl Iterator<Item = &Value> {
    connection
        .get("edges")
        .and_then(|e| e.as_array())
        .into_iter()
        .flatten()
        .filter_map(|edge| edge.get("node"))
}

pub(crate) fn str_field<'a>(node: &'a Value, field: &str) -> Option<&'a str> {
    node.get(field).and_then(|v| v.as_str())
}

/// `node.<field>.name`, e.g. `cluster.name` or `effectiveSlaDomain.name`
pub(crate) fn nested_name<'a>(node: &'a Value, field: &str) -> Option<&'a str> {
    node.get(field).and_then(|v| str_field(v, "name"))
}

/// Flatten `physicalPath` (a list or a single object) into one lowercase string
pub fn physical_path_string(field: Option<&Value>) -> String {
    match field {
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|p| str_field(p, "name"))
            .collect::<Vec<_>>()
            .join(", ")
            .to_lowercase(),
        Some(obj @ Value::Object(_)) => str_field(obj, "name").unwrap_or_default().to_lowercase(),
        _ => String::new(),
    }
}

/// Parse one `filesetTemplates` page; every physical child is an object
pub fn parse_fileset_page(
    response: &Value,
    object_type: ObjectType,
) -> Option<(Vec<CatalogObject>, PageInfo)> {
    let conn = connection(response, "filesetTemplates")?;
    let mut objects = Vec::new();

    for template in edge_nodes(conn) {
        let cluster = nested_name(template, "cluster");
        let Some(children) = template.get("physicalChildConnection") else {
            continue;
        };

        for child in edge_nodes(children) {
            let name = str_field(child, "name").unwrap_or("n/a");
            objects.push(
                CatalogObject::new(str_field(child, "id").map(String::from), name, object_type)
                    .with_cluster(cluster)
                    .with_policy(nested_name(child, "effectiveSlaDomain"))
                    .with_path_hint(physical_path_string(child.get("physicalPath"))),
            );
        }
    }

    Some((objects, PageInfo::from_connection(conn)))
}

/// Parse one `vSphereVmNewConnection` page
pub fn parse_vm_page(response: &Value) -> Option<(Vec<CatalogObject>, PageInfo)> {
    let conn = connection(response, "vSphereVmNewConnection")?;
    let objects = edge_nodes(conn)
        .map(|node| {
            CatalogObject::new(
                str_field(node, "id").map(String::from),
                str_field(node, "name").unwrap_or("n/a"),
                ObjectType::VirtualMachine,
            )
            .with_cluster(nested_name(node, "cluster"))
            .with_policy(nested_name(node, "effectiveSlaDomain"))
        })
        .collect();

    Some((objects, PageInfo::from_connection(conn)))
}

/// Parse one `slaDomains` page into `(id, name)` pairs
pub fn parse_sla_page(response: &Value) -> Option<(Vec<(String, String)>, PageInfo)> {
    let conn = connection(response, "slaDomains")?;
    let slas = edge_nodes(conn)
        .filter_map(|node| {
            let id = str_field(node, "id")?;
            let name = str_field(node, "name").unwrap_or_default();
            Some((id.to_string(), name.to_string()))
        })
        .collect();

    Some((slas, PageInfo::from_connection(conn)))
}

/// Parse one `slaProtectedObjects` page, tagging objects with the SLA name.
///
/// Objects without a name or id, or of a workload kind this tool does not
/// evaluate, are skipped.
pub fn parse_protected_objects_page(
    response: &Value,
    sla_name: &str,
) -> Option<(Vec<CatalogObject>, PageInfo)> {
    let conn = connection(response, "slaProtectedObjects")?;
    let objects = edge_nodes(conn)
        .filter_map(|node| {
            let name = str_field(node, "name")?;
            let id = str_field(node, "id")?;
            let Some(object_type) =
                str_field(node, "objectType").and_then(ObjectType::from_platform_tag)
            else {
                tracing::trace!("Skipping protected object {} of unsupported type", name);
                return None;
            };
            Some(
                CatalogObject::new(Some(id.to_string()), name, object_type)
                    .with_cluster(nested_name(node, "cluster"))
                    .with_policy(Some(sla_name)),
            )
        })
        .collect();

    Some((objects, PageInfo::from_connection(conn)))
}
