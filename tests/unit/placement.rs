use std::collections::BTreeMap;
use std::path::Path;

use super::*;
use crate::foundation::core::ViewKind;
use crate::host::memory::{ComponentFile, Hosting, MemoryWorkspace, TypeFile};
use crate::host::{ensure_view, transact};
use crate::model::ComponentDefinition;

fn load(ws: &mut MemoryWorkspace, dir: &Path, hosting: Hosting) -> ComponentDefinition {
    let path = dir.join("thing.fam");
    ComponentFile {
        name: Some("Thing".into()),
        hosting,
        types: vec![TypeFile {
            name: "T1".into(),
            size: [0.9, 0.2, 2.1],
            parameters: BTreeMap::new(),
        }],
    }
    .write_to(&path)
    .unwrap();
    transact(ws, "load", |ws| ws.load_component(&path)).unwrap()
}

#[test]
fn unhosted_variant_places_directly() {
    let tmp = tempfile::tempdir().unwrap();
    let mut ws = MemoryWorkspace::new();
    let def = load(&mut ws, tmp.path(), Hosting::Unhosted);
    let view = ensure_view(&mut ws, ViewKind::Plan).unwrap();

    let placement = place(&mut ws, &def.variants[0], view).unwrap();
    assert!(matches!(placement, Placement::Direct { .. }));
    assert!(placement.synthetic_hosts().is_empty());
    assert_eq!(ws.stats().walls_created, 0);
    assert_eq!(ws.instances().len(), 1);
}

#[test]
fn wall_hosted_variant_falls_back_with_one_wall() {
    let tmp = tempfile::tempdir().unwrap();
    let mut ws = MemoryWorkspace::new();
    let def = load(&mut ws, tmp.path(), Hosting::Wall);
    let view = ensure_view(&mut ws, ViewKind::Plan).unwrap();

    let placement = place(&mut ws, &def.variants[0], view).unwrap();
    let Placement::WallHosted { instance, wall } = placement else {
        panic!("expected wall-hosted placement, got {placement:?}");
    };
    assert_eq!(ws.stats().walls_created, 1);
    assert_eq!(ws.walls(), vec![wall]);
    // The failed direct attempt was rolled back, only the hosted instance remains.
    let instances: Vec<_> = ws.instances().iter().map(|i| i.id).collect();
    assert_eq!(instances, vec![instance]);
    assert!(ws.bounding_box(instance, view).is_some());
}

#[test]
fn unresolvable_host_fails_without_leftovers() {
    let tmp = tempfile::tempdir().unwrap();
    let mut ws = MemoryWorkspace::new();
    let def = load(&mut ws, tmp.path(), Hosting::Face);
    let view = ensure_view(&mut ws, ViewKind::Plan).unwrap();

    let placement = place(&mut ws, &def.variants[0], view).unwrap();
    let Placement::Failed { reason } = &placement else {
        panic!("expected failure");
    };
    assert!(reason.contains("Direct"));
    assert!(reason.contains("WallHosted"));
    assert!(!placement.is_placed());
    assert!(ws.instances().is_empty());
    assert!(ws.walls().is_empty());
}

#[test]
fn empty_strategy_list_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let mut ws = MemoryWorkspace::new();
    let def = load(&mut ws, tmp.path(), Hosting::Unhosted);
    let view = ensure_view(&mut ws, ViewKind::Plan).unwrap();

    let placement = place_with(&mut ws, &def.variants[0], view, &[]).unwrap();
    assert_eq!(placement.instance(), None);
}

#[test]
fn non_level_view_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let mut ws = MemoryWorkspace::new();
    let def = load(&mut ws, tmp.path(), Hosting::Unhosted);
    let iso = ensure_view(&mut ws, ViewKind::Isometric).unwrap();

    assert!(place(&mut ws, &def.variants[0], iso).is_err());
}
