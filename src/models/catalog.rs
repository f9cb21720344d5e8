//! Catalog objects pulled from the backup platform

use super::ObjectType;
use serde::{Deserialize, Serialize};

/// Placeholder used for unknown cluster / policy names
pub const NOT_AVAILABLE: &str = "N/A";

/// Normalize a host name for matching.
///
/// Lowercases, trims, and strips the domain suffix by keeping the first
/// dot-delimited segment: `"WEB01.corp.local"` becomes `"web01"`.
pub fn normalize_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    lowered
        .split('.')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// A backup-tracked object (fileset child or VM)
///
/// Built once per run from the catalog listing and never mutated; the
/// normalized name is derived at construction so every consumer compares
/// the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogObject {
    id: Option<String>,
    display_name: String,
    normalized_name: String,
    object_type: ObjectType,
    cluster_name: String,
    policy_name: String,
    path_hint: String,
}

impl CatalogObject {
    pub fn new(
        id: Option<String>,
        display_name: impl Into<String>,
        object_type: ObjectType,
    ) -> Self {
        let display_name = display_name.into();
        let normalized_name = normalize_name(&display_name);
        Self {
            // Empty ids are as useless as missing ones
            id: id.filter(|id| !id.trim().is_empty()),
            display_name,
            normalized_name,
            object_type,
            cluster_name: NOT_AVAILABLE.to_string(),
            policy_name: NOT_AVAILABLE.to_string(),
            path_hint: String::new(),
        }
    }

    pub fn with_cluster(mut self, cluster_name: Option<&str>) -> Self {
        self.cluster_name = non_empty_or_na(cluster_name);
        self
    }

    pub fn with_policy(mut self, policy_name: Option<&str>) -> Self {
        self.policy_name = non_empty_or_na(policy_name);
        self
    }

    pub fn with_path_hint(mut self, path_hint: impl Into<String>) -> Self {
        self.path_hint = path_hint.into().to_lowercase();
        self
    }

    /// Platform identifier, None when the object is known but unqueryable
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn normalized_name(&self) -> &str {
        &self.normalized_name
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn policy_name(&self) -> &str {
        &self.policy_name
    }

    pub fn path_hint(&self) -> &str {
        &self.path_hint
    }

    pub fn has_policy(&self) -> bool {
        self.policy_name != NOT_AVAILABLE
    }
}

fn non_empty_or_na(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_domain() {
        assert_eq!(normalize_name("WEB01.corp.local"), "web01");
        assert_eq!(normalize_name("  db-02  "), "db-02");
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name(".hidden"), "");
    }

    #[test]
    fn test_catalog_object_defaults() {
        let obj = CatalogObject::new(
            Some("vm-1".into()),
            "Srv-A.example.com",
            ObjectType::VirtualMachine,
        );
        assert_eq!(obj.id(), Some("vm-1"));
        assert_eq!(obj.normalized_name(), "srv-a");
        assert_eq!(obj.display_name(), "Srv-A.example.com");
        assert_eq!(obj.cluster_name(), NOT_AVAILABLE);
        assert_eq!(obj.policy_name(), NOT_AVAILABLE);
        assert_eq!(obj.path_hint(), "");
        assert!(!obj.has_policy());
    }

    #[test]
    fn test_blank_id_is_unqueryable() {
        let obj = CatalogObject::new(Some("  ".into()), "host", ObjectType::LinuxFileset);
        assert!(obj.id().is_none());
    }

    #[test]
    fn test_builders() {
        let obj = CatalogObject::new(None, "host", ObjectType::WindowsFileset)
            .with_cluster(Some("cdm-east"))
            .with_policy(Some(""))
            .with_path_hint("D:\\Data");
        assert_eq!(obj.cluster_name(), "cdm-east");
        assert_eq!(obj.policy_name(), NOT_AVAILABLE);
        assert_eq!(obj.path_hint(), "d:\\data");
    }
}
