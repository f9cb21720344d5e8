//! Catalog object type definitions
//!
//! Centralized enum for the kinds of backup-tracked objects the platform
//! reports. Serialized as `WINDOWS_FILESET` / `LINUX_FILESET` /
//! `VIRTUAL_MACHINE` in reports and config files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of backup-tracked object
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    // Fileset children attached to a host
    WindowsFileset,
    LinuxFileset,
    // Hypervisor-level backups
    VirtualMachine,
}

impl ObjectType {
    /// Get the report name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::WindowsFileset => "WINDOWS_FILESET",
            ObjectType::LinuxFileset => "LINUX_FILESET",
            ObjectType::VirtualMachine => "VIRTUAL_MACHINE",
        }
    }

    /// Try to parse a string into an ObjectType, returning None if invalid
    pub fn parse_optional(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// Get all object types
    pub fn all() -> &'static [Self] {
        &[
            ObjectType::WindowsFileset,
            ObjectType::LinuxFileset,
            ObjectType::VirtualMachine,
        ]
    }

    /// Whether this object is a fileset child of a host
    pub fn is_fileset(&self) -> bool {
        matches!(self, ObjectType::WindowsFileset | ObjectType::LinuxFileset)
    }

    /// Host root used by the fileset template listing, None for VMs
    pub fn host_root(&self) -> Option<&'static str> {
        match self {
            ObjectType::WindowsFileset => Some("WINDOWS_HOST_ROOT"),
            ObjectType::LinuxFileset => Some("LINUX_HOST_ROOT"),
            ObjectType::VirtualMachine => None,
        }
    }

    /// Map a platform `objectType` tag (protected-object listing) to a type
    ///
    /// The platform reports many workload kinds; only the ones this tool
    /// evaluates are mapped.
    pub fn from_platform_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "vmwarevirtualmachine" | "vsphere_virtual_machine" | "vspherevirtualmachine"
            | "hypervvirtualmachine" | "nutanixvirtualmachine" => Some(ObjectType::VirtualMachine),
            "windowsfileset" | "windows_fileset" => Some(ObjectType::WindowsFileset),
            "linuxfileset" | "linux_fileset" => Some(ObjectType::LinuxFileset),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ObjectType> for String {
    fn from(kind: ObjectType) -> Self {
        kind.as_str().to_string()
    }
}

impl FromStr for ObjectType {
    type Err = String;

    /// Case-insensitive, accepts the short aliases used in config files
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "windows_fileset" | "windowsfileset" | "windows" => Ok(ObjectType::WindowsFileset),
            "linux_fileset" | "linuxfileset" | "linux" => Ok(ObjectType::LinuxFileset),
            "virtual_machine" | "virtualmachine" | "vm" | "vmsnapshot" => {
                Ok(ObjectType::VirtualMachine)
            }
            _ => Err(format!("Unknown object type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str() {
        assert_eq!(ObjectType::WindowsFileset.as_str(), "WINDOWS_FILESET");
        assert_eq!(ObjectType::VirtualMachine.as_str(), "VIRTUAL_MACHINE");
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!(
            ObjectType::parse_optional("vm"),
            Some(ObjectType::VirtualMachine)
        );
        assert_eq!(
            ObjectType::parse_optional("LINUX_FILESET"),
            Some(ObjectType::LinuxFileset)
        );
        assert_eq!(
            ObjectType::parse_optional("Windows"),
            Some(ObjectType::WindowsFileset)
        );
        assert_eq!(ObjectType::parse_optional("oracle"), None);
    }

    #[test]
    fn test_platform_tags() {
        assert_eq!(
            ObjectType::from_platform_tag("VmwareVirtualMachine"),
            Some(ObjectType::VirtualMachine)
        );
        assert_eq!(
            ObjectType::from_platform_tag("LinuxFileset"),
            Some(ObjectType::LinuxFileset)
        );
        assert_eq!(ObjectType::from_platform_tag("MssqlDatabase"), None);
    }

    #[test]
    fn test_serde_names_match_display() {
        for kind in ObjectType::all() {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }

    #[test]
    fn test_host_root() {
        assert_eq!(
            ObjectType::LinuxFileset.host_root(),
            Some("LINUX_HOST_ROOT")
        );
        assert!(ObjectType::VirtualMachine.host_root().is_none());
        assert!(!ObjectType::VirtualMachine.is_fileset());
    }
}
