use super::*;
use crate::host::{PLAN_VIEW_NAME, transact};
use crate::model::{RasterFormat, Resolution};

fn component_file(dir: &Path, name: &str, hosting: Hosting, types: &[&str]) -> PathBuf {
    let path = dir.join(format!("{name}.{COMPONENT_EXTENSION}"));
    ComponentFile {
        name: None,
        hosting,
        types: types
            .iter()
            .map(|t| TypeFile {
                name: t.to_string(),
                size: [1.0, 0.5, 2.0],
                parameters: BTreeMap::from([("Type Mark".to_string(), format!("M-{t}"))]),
            })
            .collect(),
    }
    .write_to(&path)
    .unwrap();
    path
}

fn plan_setup(ws: &mut MemoryWorkspace) -> (ViewId, ElementId) {
    let view = transact(ws, "view", |ws| ws.create_view(ViewKind::Plan, PLAN_VIEW_NAME)).unwrap();
    let level = ws.view_level(view).unwrap();
    (view, level)
}

#[test]
fn mutations_require_a_transaction() {
    let tmp = tempfile::tempdir().unwrap();
    let path = component_file(tmp.path(), "Chair", Hosting::Unhosted, &["A"]);
    let mut ws = MemoryWorkspace::new();

    let err = ws.load_component(&path).unwrap_err();
    assert!(err.to_string().contains("needs an open transaction"));

    let def = transact(&mut ws, "load", |ws| ws.load_component(&path)).unwrap();
    assert_eq!(def.name, "Chair");
    assert_eq!(def.variants.len(), 1);
    assert_eq!(ws.components(), vec![def.id]);
}

#[test]
fn nested_transactions_are_rejected() {
    let mut ws = MemoryWorkspace::new();
    ws.begin_transaction("outer").unwrap();
    assert!(ws.begin_transaction("inner").is_err());
    ws.commit_transaction().unwrap();
    assert!(ws.commit_transaction().is_err());
}

#[test]
fn rollback_restores_document() {
    let tmp = tempfile::tempdir().unwrap();
    let path = component_file(tmp.path(), "Chair", Hosting::Unhosted, &["A", "B"]);
    let mut ws = MemoryWorkspace::new();

    let res: FamshotResult<()> = transact(&mut ws, "load", |ws| {
        ws.load_component(&path)?;
        Err(FamshotError::host("boom"))
    });
    assert!(res.is_err());
    assert!(ws.components().is_empty());
    assert!(ws.symbols().is_empty());
    assert_eq!(ws.stats().rollbacks, 1);
    assert_eq!(ws.stats().loads, 1);
    assert!(!ws.in_transaction());
}

#[test]
fn placement_requires_activation() {
    let tmp = tempfile::tempdir().unwrap();
    let path = component_file(tmp.path(), "Chair", Hosting::Unhosted, &["A"]);
    let mut ws = MemoryWorkspace::new();
    let (view, level) = plan_setup(&mut ws);
    let def = transact(&mut ws, "load", |ws| ws.load_component(&path)).unwrap();
    let symbol = def.variants[0].symbol;

    let err = transact(&mut ws, "place", |ws| {
        ws.place_instance(symbol, level, Point::ORIGIN, None)
    })
    .unwrap_err();
    assert!(err.to_string().contains("activated"));

    let inst = transact(&mut ws, "place", |ws| {
        ws.activate_symbol(symbol)?;
        ws.place_instance(symbol, level, Point::ORIGIN, None)
    })
    .unwrap();
    let bbox = ws.bounding_box(inst, view).unwrap();
    assert_eq!(bbox.width(), 1.0);
    assert_eq!(bbox.depth(), 0.5);
    assert_eq!(bbox.height(), 2.0);
}

#[test]
fn wall_hosted_symbol_needs_a_wall_for_geometry() {
    let tmp = tempfile::tempdir().unwrap();
    let path = component_file(tmp.path(), "Door", Hosting::Wall, &["900"]);
    let mut ws = MemoryWorkspace::new();
    let (view, level) = plan_setup(&mut ws);
    let def = transact(&mut ws, "load", |ws| ws.load_component(&path)).unwrap();
    let symbol = def.variants[0].symbol;

    let loose = transact(&mut ws, "place", |ws| {
        ws.activate_symbol(symbol)?;
        ws.place_instance(symbol, level, Point::ORIGIN, None)
    })
    .unwrap();
    assert!(ws.bounding_box(loose, view).is_none());

    let (wall, hosted) = transact(&mut ws, "place hosted", |ws| {
        let wall = ws.create_wall(level, Line::new((-5.0, 0.0), (5.0, 0.0)))?;
        let inst = ws.place_instance(symbol, level, Point::ORIGIN, Some(wall))?;
        Ok((wall, inst))
    })
    .unwrap();
    assert!(ws.bounding_box(hosted, view).is_some());
    assert!(ws.bounding_box(wall, view).is_some());
    assert_eq!(ws.stats().walls_created, 1);

    // Deleting the wall takes the hosted instance with it.
    transact(&mut ws, "delete wall", |ws| ws.delete(wall)).unwrap();
    let remaining: Vec<ElementId> = ws.instances().iter().map(|i| i.id).collect();
    assert_eq!(remaining, vec![loose]);
}

#[test]
fn deleting_component_cascades() {
    let tmp = tempfile::tempdir().unwrap();
    let path = component_file(tmp.path(), "Chair", Hosting::Unhosted, &["A", "B"]);
    let mut ws = MemoryWorkspace::new();
    let (view, level) = plan_setup(&mut ws);
    let def = transact(&mut ws, "load", |ws| ws.load_component(&path)).unwrap();
    let symbol = def.variants[1].symbol;
    let inst = transact(&mut ws, "place", |ws| {
        ws.activate_symbol(symbol)?;
        let inst = ws.place_instance(symbol, level, Point::ORIGIN, None)?;
        ws.hide_in_view(view, &[inst])?;
        Ok(inst)
    })
    .unwrap();
    assert_eq!(ws.hidden_in(view), vec![inst]);

    transact(&mut ws, "delete", |ws| ws.delete(def.id)).unwrap();
    assert!(ws.components().is_empty());
    assert!(ws.symbols().is_empty());
    assert!(ws.instances().is_empty());
    assert!(ws.hidden_in(view).is_empty());

    assert!(transact(&mut ws, "delete again", |ws| ws.delete(def.id)).is_err());
}

#[test]
fn type_parameters_are_readable() {
    let tmp = tempfile::tempdir().unwrap();
    let path = component_file(tmp.path(), "Chair", Hosting::Unhosted, &["A"]);
    let mut ws = MemoryWorkspace::new();
    let def = transact(&mut ws, "load", |ws| ws.load_component(&path)).unwrap();
    let symbol = def.variants[0].symbol;
    assert_eq!(ws.type_parameter(symbol, "Type Mark").as_deref(), Some("M-A"));
    assert_eq!(ws.type_parameter(symbol, "Missing"), None);
}

#[test]
fn save_as_refuses_open_transaction_and_existing_files() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join(format!("doc.{DOCUMENT_EXTENSION}"));
    let mut ws = MemoryWorkspace::new().with_title_convention(TitleConvention::WithExtension);
    assert_eq!(ws.document_title(), "Project1");

    ws.begin_transaction("t").unwrap();
    assert!(ws.save_as(&target).is_err());
    ws.rollback_transaction();

    ws.save_as(&target).unwrap();
    assert_eq!(ws.document_title(), format!("doc.{DOCUMENT_EXTENSION}"));
    assert!(ws.save_as(&target).is_err());

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(saved["title"], "doc");
}

#[test]
fn export_uses_landscape_frame_and_skips_hidden() {
    let tmp = tempfile::tempdir().unwrap();
    let path = component_file(tmp.path(), "Chair", Hosting::Unhosted, &["A"]);
    let mut ws = MemoryWorkspace::new().with_frame_aspect(2.0);
    let (view, level) = plan_setup(&mut ws);
    let def = transact(&mut ws, "load", |ws| ws.load_component(&path)).unwrap();
    let symbol = def.variants[0].symbol;
    let (inst, wall) = transact(&mut ws, "place", |ws| {
        ws.activate_symbol(symbol)?;
        let inst = ws.place_instance(symbol, level, Point::ORIGIN, None)?;
        let wall = ws.create_wall(level, Line::new((-5.0, 0.0), (5.0, 0.0)))?;
        ws.hide_in_view(view, &[wall])?;
        Ok((inst, wall))
    })
    .unwrap();

    let out = tmp.path().join("x.png");
    ws.export_image(&ImageExportRequest {
        path: out.clone(),
        view,
        format: RasterFormat::Png,
        resolution: Resolution::default(),
        pixel_size: 50,
        fit: FitDirection::Vertical,
    })
    .unwrap();

    let img = image::open(&out).unwrap();
    assert_eq!((img.width(), img.height()), (100, 50));
    let rec = &ws.exports()[0];
    assert_eq!(rec.visible, vec![inst]);
    assert_eq!(rec.hidden, vec![wall]);
}
