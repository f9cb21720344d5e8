//! Name matcher ranking against realistic catalog shapes

use l2backup::matcher::{
    WEIGHT_DISPLAY_NAME, WEIGHT_EXACT, WEIGHT_PATH_HINT, match_candidates, top_candidates_by_type,
};
use l2backup::models::{CatalogObject, ObjectType};

fn object(id: &str, name: &str, object_type: ObjectType) -> CatalogObject {
    CatalogObject::new(Some(id.to_string()), name, object_type)
}

#[test]
fn test_weight_tiers() {
    let catalog = vec![
        object("vm-1", "web01.corp.local", ObjectType::VirtualMachine),
        object("fs-1", "web01-backup", ObjectType::LinuxFileset).with_path_hint("/data/web01"),
    ];

    let matches = match_candidates("WEB01", &catalog);
    let weights: Vec<(&str, u8)> = matches
        .iter()
        .map(|c| (c.object.id().unwrap_or_default(), c.weight))
        .collect();
    assert_eq!(weights, vec![("vm-1", WEIGHT_EXACT), ("fs-1", WEIGHT_DISPLAY_NAME)]);
}

#[test]
fn test_path_hint_is_lowest_tier() {
    let catalog = vec![
        object("vm-1", "web01.corp.local", ObjectType::VirtualMachine),
        object("fs-1", "web01-backup", ObjectType::LinuxFileset).with_path_hint("/data/ghost"),
    ];

    let matches = match_candidates("ghost", &catalog);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].object.id(), Some("fs-1"));
    assert_eq!(matches[0].weight, WEIGHT_PATH_HINT);
}

#[test]
fn test_no_match_yields_nothing() {
    let catalog = vec![object("vm-1", "alpha", ObjectType::VirtualMachine)];
    assert!(match_candidates("omega", &catalog).is_empty());
    assert!(match_candidates("omega", &[]).is_empty());
}

#[test]
fn test_fileset_and_vm_are_both_reported() {
    let catalog = vec![
        object("fs-w", "APP01", ObjectType::WindowsFileset),
        object("vm-1", "app01", ObjectType::VirtualMachine),
        object("vm-2", "app01-clone", ObjectType::VirtualMachine),
    ];

    let groups = top_candidates_by_type(match_candidates("app01", &catalog));
    let types: Vec<ObjectType> = groups.keys().copied().collect();
    assert_eq!(types, vec![ObjectType::WindowsFileset, ObjectType::VirtualMachine]);

    let vms = &groups[&ObjectType::VirtualMachine];
    assert_eq!(vms.len(), 1);
    assert_eq!(vms[0].object.id(), Some("vm-1"));
}

#[test]
fn test_unqueryable_objects_still_match() {
    let catalog = vec![CatalogObject::new(None, "legacy01", ObjectType::LinuxFileset)];
    let matches = match_candidates("legacy01", &catalog);
    assert_eq!(matches.len(), 1);
    assert!(matches[0].object.id().is_none());
}
