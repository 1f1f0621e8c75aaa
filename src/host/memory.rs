//! In-memory reference host.
//!
//! Component files are JSON documents (`*.fam`):
//!
//! ```json
//! {
//!   "name": "Door",
//!   "hosting": "wall",
//!   "types": [
//!     { "name": "900 x 2100", "size": [0.9, 0.1, 2.1], "parameters": { "Type Mark": "D1" } }
//!   ]
//! }
//! ```
//!
//! The host mirrors the behaviour the core has to cope with: mutations need an open transaction,
//! rollbacks restore the document, wall-hosted symbols placed without a wall have no geometry, and
//! deletes cascade (component → symbols → instances, wall → hosted instances).

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use super::raster::{self, Frame, ItemKind, SceneItem};
use super::{FitDirection, ImageExportRequest, PlacedInstance, TitleConvention, Workspace};
use crate::foundation::core::{BoundingBox, ElementId, Line, Point, Rect, ViewId, ViewKind};
use crate::foundation::error::{FamshotError, FamshotResult};
use crate::model::{ComponentDefinition, DetailLevel, Variant};

pub const COMPONENT_EXTENSION: &str = "fam";
pub const DOCUMENT_EXTENSION: &str = "famproj";

const DEFAULT_LEVEL_NAME: &str = "Level 1";
const UNSAVED_TITLE: &str = "Project1";
const WALL_HEIGHT: f64 = 3.0;
const WALL_THICKNESS: f64 = 0.2;

/// How a component's symbols must be hosted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hosting {
    #[default]
    Unhosted,
    Wall,
    /// Needs a face host; no placement strategy of the core provides one.
    Face,
}

/// On-disk component file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComponentFile {
    /// Defaults to the file stem.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hosting: Hosting,
    #[serde(default)]
    pub types: Vec<TypeFile>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TypeFile {
    pub name: String,
    /// Width, depth, height in metres.
    pub size: [f64; 3],
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl ComponentFile {
    pub fn write_to(&self, path: &Path) -> FamshotResult<()> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| FamshotError::serde(e.to_string()))?;
        std::fs::write(path, json)
            .with_context(|| format!("write component file '{}'", path.display()))?;
        Ok(())
    }
}

/// Counters that survive rollbacks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostStats {
    pub loads: usize,
    pub walls_created: usize,
    pub saves: usize,
    pub exports: usize,
    pub commits: usize,
    pub rollbacks: usize,
}

/// What an export saw.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportRecord {
    pub path: PathBuf,
    pub view: ViewId,
    pub zoom: f64,
    pub width: u32,
    pub height: u32,
    pub visible: Vec<ElementId>,
    pub hidden: Vec<ElementId>,
}

#[derive(Clone, Debug)]
struct Level {
    name: String,
    elevation: f64,
}

#[derive(Clone, Debug)]
struct View {
    name: String,
    kind: ViewKind,
    level: Option<ElementId>,
    zoom: f64,
    detail: DetailLevel,
    scale: u32,
    hidden: BTreeSet<ElementId>,
}

#[derive(Clone, Debug)]
struct Component {
    name: String,
    source: PathBuf,
    hosting: Hosting,
}

#[derive(Clone, Debug)]
struct Symbol {
    component: ElementId,
    name: String,
    size: [f64; 3],
    parameters: BTreeMap<String, String>,
    active: bool,
}

#[derive(Clone, Debug)]
struct Instance {
    symbol: ElementId,
    level: ElementId,
    origin: Point,
    host: Option<ElementId>,
}

#[derive(Clone, Debug)]
struct Wall {
    level: ElementId,
    line: Line,
}

#[derive(Clone, Debug, Default)]
struct Document {
    next_id: u64,
    levels: BTreeMap<ElementId, Level>,
    views: BTreeMap<ViewId, View>,
    components: BTreeMap<ElementId, Component>,
    symbols: BTreeMap<ElementId, Symbol>,
    instances: BTreeMap<ElementId, Instance>,
    walls: BTreeMap<ElementId, Wall>,
    active_view: Option<ViewId>,
    path: Option<PathBuf>,
}

impl Document {
    fn alloc(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn default_level(&mut self) -> ElementId {
        if let Some(id) = self.levels.keys().next() {
            return *id;
        }
        let id = ElementId(self.alloc());
        self.levels.insert(
            id,
            Level {
                name: DEFAULT_LEVEL_NAME.to_string(),
                elevation: 0.0,
            },
        );
        id
    }

    fn hosting_of(&self, symbol: &Symbol) -> Hosting {
        self.components
            .get(&symbol.component)
            .map(|c| c.hosting)
            .unwrap_or_default()
    }

    fn remove_instances_where(&mut self, pred: impl Fn(&Instance) -> bool) {
        self.instances.retain(|_, i| !pred(i));
    }

    fn forget_hidden(&mut self, ids: &BTreeSet<ElementId>) {
        for view in self.views.values_mut() {
            view.hidden.retain(|id| !ids.contains(id));
        }
    }
}

#[derive(serde::Serialize)]
struct SavedDocument<'a> {
    title: &'a str,
    levels: Vec<&'a str>,
    components: Vec<SavedComponent<'a>>,
    instances: Vec<SavedInstance<'a>>,
    walls: usize,
}

#[derive(serde::Serialize)]
struct SavedComponent<'a> {
    name: &'a str,
    source: &'a Path,
    types: Vec<&'a str>,
}

#[derive(serde::Serialize)]
struct SavedInstance<'a> {
    symbol: &'a str,
    origin: [f64; 2],
    hosted: bool,
}

/// In-memory [`Workspace`] backed by JSON component files.
#[derive(Debug)]
pub struct MemoryWorkspace {
    doc: Document,
    tx: Option<(String, Document)>,
    title_convention: TitleConvention,
    frame_aspect: f64,
    stats: HostStats,
    exports: Vec<ExportRecord>,
}

impl Default for MemoryWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryWorkspace {
    /// An empty project with one level and no views.
    pub fn new() -> Self {
        let mut doc = Document::default();
        doc.default_level();
        Self {
            doc,
            tx: None,
            title_convention: TitleConvention::WithoutExtension,
            frame_aspect: 4.0 / 3.0,
            stats: HostStats::default(),
            exports: Vec::new(),
        }
    }

    /// How this host reports document titles.
    pub fn with_title_convention(mut self, convention: TitleConvention) -> Self {
        self.title_convention = convention;
        self
    }

    /// Width/height ratio of exported frames; clamped to landscape.
    pub fn with_frame_aspect(mut self, aspect: f64) -> Self {
        self.frame_aspect = if aspect.is_finite() {
            aspect.max(1.0)
        } else {
            1.0
        };
        self
    }

    pub fn stats(&self) -> HostStats {
        self.stats
    }

    pub fn exports(&self) -> &[ExportRecord] {
        &self.exports
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    pub fn views(&self) -> Vec<(ViewId, ViewKind, String)> {
        self.doc
            .views
            .iter()
            .map(|(id, v)| (*id, v.kind, v.name.clone()))
            .collect()
    }

    pub fn zoom_of(&self, view: ViewId) -> Option<f64> {
        self.doc.views.get(&view).map(|v| v.zoom)
    }

    pub fn hidden_in(&self, view: ViewId) -> Vec<ElementId> {
        self.doc
            .views
            .get(&view)
            .map(|v| v.hidden.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn symbols(&self) -> Vec<ElementId> {
        self.doc.symbols.keys().copied().collect()
    }

    pub fn active_view(&self) -> Option<ViewId> {
        self.doc.active_view
    }

    fn require_tx(&self, op: &str) -> FamshotResult<()> {
        if self.tx.is_none() {
            return Err(FamshotError::host(format!(
                "{op} modifies the document and needs an open transaction"
            )));
        }
        Ok(())
    }

    fn view_mut(&mut self, view: ViewId) -> FamshotResult<&mut View> {
        self.doc
            .views
            .get_mut(&view)
            .ok_or_else(|| FamshotError::host(format!("view {} does not exist", view.0)))
    }

    fn frame_size(&self, request: &ImageExportRequest) -> (u32, u32) {
        let size = request.pixel_size.max(1);
        let scaled = |v: f64| (v.round() as u32).max(1);
        match request.fit {
            FitDirection::Vertical => (scaled(f64::from(size) * self.frame_aspect), size),
            FitDirection::Horizontal => (size, scaled(f64::from(size) / self.frame_aspect)),
        }
    }

    fn snapshot_json(&self, title: &str) -> FamshotResult<String> {
        let doc = &self.doc;
        let saved = SavedDocument {
            title,
            levels: doc.levels.values().map(|l| l.name.as_str()).collect(),
            components: doc
                .components
                .iter()
                .map(|(id, c)| SavedComponent {
                    name: &c.name,
                    source: &c.source,
                    types: doc
                        .symbols
                        .values()
                        .filter(|s| s.component == *id)
                        .map(|s| s.name.as_str())
                        .collect(),
                })
                .collect(),
            instances: doc
                .instances
                .values()
                .filter_map(|i| {
                    doc.symbols.get(&i.symbol).map(|s| SavedInstance {
                        symbol: &s.name,
                        origin: [i.origin.x, i.origin.y],
                        hosted: i.host.is_some(),
                    })
                })
                .collect(),
            walls: doc.walls.len(),
        };
        serde_json::to_string_pretty(&saved).map_err(|e| FamshotError::serde(e.to_string()))
    }
}

impl Workspace for MemoryWorkspace {
    fn begin_transaction(&mut self, name: &str) -> FamshotResult<()> {
        if let Some((open, _)) = &self.tx {
            return Err(FamshotError::host(format!(
                "cannot start '{name}' while '{open}' is open"
            )));
        }
        self.tx = Some((name.to_string(), self.doc.clone()));
        Ok(())
    }

    fn commit_transaction(&mut self) -> FamshotResult<()> {
        self.tx
            .take()
            .ok_or_else(|| FamshotError::host("commit without an open transaction"))?;
        self.stats.commits += 1;
        Ok(())
    }

    fn rollback_transaction(&mut self) {
        if let Some((_, snapshot)) = self.tx.take() {
            self.doc = snapshot;
            self.stats.rollbacks += 1;
        }
    }

    fn load_component(&mut self, path: &Path) -> FamshotResult<ComponentDefinition> {
        self.require_tx("load component")?;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read component file '{}'", path.display()))?;
        let file: ComponentFile = serde_json::from_str(&text).map_err(|e| {
            FamshotError::serde(format!("parse component '{}': {e}", path.display()))
        })?;

        let name = match file.name {
            Some(n) if !n.trim().is_empty() => n,
            _ => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .ok_or_else(|| FamshotError::host("component file has no name"))?,
        };

        let id = ElementId(self.doc.alloc());
        self.doc.components.insert(
            id,
            Component {
                name: name.clone(),
                source: path.to_path_buf(),
                hosting: file.hosting,
            },
        );

        let mut variants = Vec::with_capacity(file.types.len());
        for t in file.types {
            let symbol = ElementId(self.doc.alloc());
            variants.push(Variant {
                symbol,
                name: t.name.clone(),
            });
            self.doc.symbols.insert(
                symbol,
                Symbol {
                    component: id,
                    name: t.name,
                    size: t.size,
                    parameters: t.parameters,
                    active: false,
                },
            );
        }

        self.stats.loads += 1;
        Ok(ComponentDefinition {
            id,
            name,
            source: path.to_path_buf(),
            variants,
        })
    }

    fn components(&self) -> Vec<ElementId> {
        self.doc.components.keys().copied().collect()
    }

    fn instances(&self) -> Vec<PlacedInstance> {
        self.doc
            .instances
            .iter()
            .map(|(id, i)| PlacedInstance {
                id: *id,
                symbol: i.symbol,
            })
            .collect()
    }

    fn walls(&self) -> Vec<ElementId> {
        self.doc.walls.keys().copied().collect()
    }

    fn delete(&mut self, id: ElementId) -> FamshotResult<()> {
        self.require_tx("delete")?;
        let doc = &mut self.doc;
        let before: BTreeSet<ElementId> = doc
            .components
            .keys()
            .chain(doc.symbols.keys())
            .chain(doc.instances.keys())
            .chain(doc.walls.keys())
            .copied()
            .collect();

        if doc.components.remove(&id).is_some() {
            let symbols: BTreeSet<ElementId> = doc
                .symbols
                .iter()
                .filter(|(_, s)| s.component == id)
                .map(|(sid, _)| *sid)
                .collect();
            doc.symbols.retain(|sid, _| !symbols.contains(sid));
            doc.remove_instances_where(|i| symbols.contains(&i.symbol));
        } else if doc.symbols.remove(&id).is_some() {
            doc.remove_instances_where(|i| i.symbol == id);
        } else if doc.walls.remove(&id).is_some() {
            doc.remove_instances_where(|i| i.host == Some(id));
        } else if doc.instances.remove(&id).is_none() {
            return Err(FamshotError::host(format!(
                "element {} does not exist",
                id.0
            )));
        }

        let after: BTreeSet<ElementId> = doc
            .components
            .keys()
            .chain(doc.symbols.keys())
            .chain(doc.instances.keys())
            .chain(doc.walls.keys())
            .copied()
            .collect();
        let removed: BTreeSet<ElementId> = before.difference(&after).copied().collect();
        doc.forget_hidden(&removed);
        Ok(())
    }

    fn type_parameter(&self, symbol: ElementId, name: &str) -> Option<String> {
        self.doc.symbols.get(&symbol)?.parameters.get(name).cloned()
    }

    fn activate_symbol(&mut self, symbol: ElementId) -> FamshotResult<()> {
        self.require_tx("activate symbol")?;
        let s = self
            .doc
            .symbols
            .get_mut(&symbol)
            .ok_or_else(|| FamshotError::host(format!("symbol {} does not exist", symbol.0)))?;
        s.active = true;
        Ok(())
    }

    fn place_instance(
        &mut self,
        symbol: ElementId,
        level: ElementId,
        origin: Point,
        host: Option<ElementId>,
    ) -> FamshotResult<ElementId> {
        self.require_tx("place instance")?;
        let s = self
            .doc
            .symbols
            .get(&symbol)
            .ok_or_else(|| FamshotError::host(format!("symbol {} does not exist", symbol.0)))?;
        if !s.active {
            return Err(FamshotError::host(format!(
                "symbol '{}' must be activated before placement",
                s.name
            )));
        }
        if !self.doc.levels.contains_key(&level) {
            return Err(FamshotError::host(format!("level {} does not exist", level.0)));
        }
        if let Some(h) = host
            && !self.doc.walls.contains_key(&h)
        {
            return Err(FamshotError::host(format!("host {} is not a wall", h.0)));
        }

        let id = ElementId(self.doc.alloc());
        self.doc.instances.insert(
            id,
            Instance {
                symbol,
                level,
                origin,
                host,
            },
        );
        Ok(id)
    }

    fn create_wall(&mut self, level: ElementId, line: Line) -> FamshotResult<ElementId> {
        self.require_tx("create wall")?;
        if !self.doc.levels.contains_key(&level) {
            return Err(FamshotError::host(format!("level {} does not exist", level.0)));
        }
        if !(line.p0.distance(line.p1) > 0.0) {
            return Err(FamshotError::host("wall line must have non-zero length"));
        }
        let id = ElementId(self.doc.alloc());
        self.doc.walls.insert(id, Wall { level, line });
        self.stats.walls_created += 1;
        Ok(id)
    }

    fn bounding_box(&self, element: ElementId, view: ViewId) -> Option<BoundingBox> {
        let doc = &self.doc;
        let v = doc.views.get(&view)?;
        if v.hidden.contains(&element) {
            return None;
        }
        let on_level = |level: ElementId| v.kind != ViewKind::Plan || v.level == Some(level);

        if let Some(i) = doc.instances.get(&element) {
            let s = doc.symbols.get(&i.symbol)?;
            let hosted_ok = match doc.hosting_of(s) {
                Hosting::Unhosted => true,
                Hosting::Wall => i.host.is_some_and(|h| doc.walls.contains_key(&h)),
                Hosting::Face => false,
            };
            if !hosted_ok || !on_level(i.level) {
                return None;
            }
            let elevation = doc.levels.get(&i.level)?.elevation;
            let [w, d, h] = s.size;
            return Some(BoundingBox::centered(i.origin, elevation, w, d, h));
        }

        if let Some(w) = doc.walls.get(&element) {
            if !on_level(w.level) {
                return None;
            }
            let elevation = doc.levels.get(&w.level)?.elevation;
            let half = WALL_THICKNESS / 2.0;
            let footprint = Rect::from_points(w.line.p0, w.line.p1).inflate(half, half);
            return Some(BoundingBox::new(
                footprint,
                elevation,
                elevation + WALL_HEIGHT,
            ));
        }

        None
    }

    fn find_view(&self, kind: ViewKind, name: &str) -> Option<ViewId> {
        self.doc
            .views
            .iter()
            .find(|(_, v)| v.kind == kind && v.name == name)
            .map(|(id, _)| *id)
    }

    fn create_view(&mut self, kind: ViewKind, name: &str) -> FamshotResult<ViewId> {
        self.require_tx("create view")?;
        let level = match kind {
            ViewKind::Plan => Some(self.doc.default_level()),
            ViewKind::Isometric => None,
        };
        let id = ViewId(self.doc.alloc());
        self.doc.views.insert(
            id,
            View {
                name: name.to_string(),
                kind,
                level,
                zoom: 1.0,
                detail: DetailLevel::default(),
                scale: 100,
                hidden: BTreeSet::new(),
            },
        );
        Ok(id)
    }

    fn view_level(&self, view: ViewId) -> FamshotResult<ElementId> {
        let v = self
            .doc
            .views
            .get(&view)
            .ok_or_else(|| FamshotError::host(format!("view {} does not exist", view.0)))?;
        v.level
            .ok_or_else(|| FamshotError::host(format!("view '{}' is not a level view", v.name)))
    }

    /// Every view of the in-memory host counts as open.
    fn open_views(&self) -> Vec<ViewId> {
        self.doc.views.keys().copied().collect()
    }

    fn activate_view(&mut self, view: ViewId) -> FamshotResult<()> {
        self.view_mut(view)?;
        self.doc.active_view = Some(view);
        Ok(())
    }

    fn set_zoom(&mut self, view: ViewId, zoom: f64) -> FamshotResult<()> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(FamshotError::host(format!("invalid zoom {zoom}")));
        }
        self.view_mut(view)?.zoom = zoom;
        Ok(())
    }

    fn set_detail_level(&mut self, view: ViewId, level: DetailLevel) -> FamshotResult<()> {
        self.require_tx("set detail level")?;
        self.view_mut(view)?.detail = level;
        Ok(())
    }

    fn set_view_scale(&mut self, view: ViewId, scale: u32) -> FamshotResult<()> {
        self.require_tx("set view scale")?;
        if scale == 0 {
            return Err(FamshotError::host("view scale must be non-zero"));
        }
        self.view_mut(view)?.scale = scale;
        Ok(())
    }

    fn hide_in_view(&mut self, view: ViewId, elements: &[ElementId]) -> FamshotResult<()> {
        self.require_tx("hide elements")?;
        self.view_mut(view)?.hidden.extend(elements.iter().copied());
        Ok(())
    }

    fn refresh(&mut self) {}

    fn document_extension(&self) -> &str {
        DOCUMENT_EXTENSION
    }

    fn save_as(&mut self, path: &Path) -> FamshotResult<()> {
        if let Some((open, _)) = &self.tx {
            return Err(FamshotError::host(format!(
                "cannot save while '{open}' is open"
            )));
        }
        if path.exists() {
            return Err(FamshotError::host(format!(
                "'{}' already exists",
                path.display()
            )));
        }
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let json = self.snapshot_json(&title)?;
        std::fs::write(path, json)
            .with_context(|| format!("save document '{}'", path.display()))?;
        self.doc.path = Some(path.to_path_buf());
        self.stats.saves += 1;
        Ok(())
    }

    fn document_title(&self) -> String {
        let Some(path) = &self.doc.path else {
            return UNSAVED_TITLE.to_string();
        };
        let file = match self.title_convention {
            TitleConvention::WithExtension => path.file_name(),
            TitleConvention::WithoutExtension => path.file_stem(),
        };
        file.map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNSAVED_TITLE.to_string())
    }

    fn export_image(&mut self, request: &ImageExportRequest) -> FamshotResult<()> {
        let view = self
            .doc
            .views
            .get(&request.view)
            .ok_or_else(|| FamshotError::host(format!("view {} does not exist", request.view.0)))?
            .clone();

        let mut visible = Vec::new();
        let mut items = Vec::new();
        let candidates = self
            .doc
            .walls
            .keys()
            .map(|id| (*id, ItemKind::Wall))
            .chain(self.doc.instances.keys().map(|id| (*id, ItemKind::Instance)));
        for (id, kind) in candidates {
            if let Some(bbox) = self.bounding_box(id, request.view) {
                visible.push(id);
                items.push(SceneItem { bbox, kind });
            }
        }

        let (width, height) = self.frame_size(request);
        let frame = Frame {
            width,
            height,
            zoom: view.zoom,
            view: view.kind,
            detail: view.detail,
            view_scale: view.scale,
        };
        let rgba = raster::render(&frame, &items)?;
        let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();
        image::DynamicImage::ImageRgb8(rgb)
            .save_with_format(&request.path, request.format.image_format())
            .with_context(|| format!("write export '{}'", request.path.display()))?;

        self.stats.exports += 1;
        self.exports.push(ExportRecord {
            path: request.path.clone(),
            view: request.view,
            zoom: view.zoom,
            width,
            height,
            visible,
            hidden: view.hidden.iter().copied().collect(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/memory.rs"]
mod tests;
