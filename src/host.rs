//! Host document access.
//!
//! The CAD host (document model, transactions, rasterizer) is reached only through the
//! [`Workspace`] trait. Element and view handles are opaque ids issued by the host; the core never
//! holds host objects directly.

pub mod memory;
pub(crate) mod raster;

use std::path::{Path, PathBuf};

use crate::foundation::core::{BoundingBox, ElementId, Line, Point, ViewId, ViewKind};
use crate::foundation::error::{FamshotError, FamshotResult};
use crate::model::{ComponentDefinition, DetailLevel, RasterFormat, Resolution};

/// Name of the engineering plan view used for placement and plan thumbnails.
pub const PLAN_VIEW_NAME: &str = "Level 1";
/// Name of the isometric view used for 3D thumbnails.
pub const ISO_VIEW_NAME: &str = "{3D}";

/// A placed instance and the symbol it instantiates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacedInstance {
    pub id: ElementId,
    pub symbol: ElementId,
}

/// Which frame dimension the export pixel size constrains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitDirection {
    Horizontal,
    Vertical,
}

/// Raster export request for the visible region of a single view.
///
/// Only the visible region of one view can be requested.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageExportRequest {
    pub path: PathBuf,
    pub view: ViewId,
    pub format: RasterFormat,
    pub resolution: Resolution,
    pub pixel_size: u32,
    pub fit: FitDirection,
}

/// The host document a batch runs against.
///
/// Every mutating call must happen inside a transaction opened with
/// [`Workspace::begin_transaction`]; use [`transact`] rather than pairing the calls by hand.
pub trait Workspace {
    fn begin_transaction(&mut self, name: &str) -> FamshotResult<()>;
    fn commit_transaction(&mut self) -> FamshotResult<()>;
    fn rollback_transaction(&mut self);

    /// Load a component definition file and return its identity and variants.
    fn load_component(&mut self, path: &Path) -> FamshotResult<ComponentDefinition>;
    /// Component definitions currently loaded.
    fn components(&self) -> Vec<ElementId>;
    fn instances(&self) -> Vec<PlacedInstance>;
    /// Walls present in the document.
    fn walls(&self) -> Vec<ElementId>;
    /// Delete an element and whatever the host cascades from it.
    fn delete(&mut self, id: ElementId) -> FamshotResult<()>;

    /// Value of a type parameter on a symbol, if the symbol has it.
    fn type_parameter(&self, symbol: ElementId, name: &str) -> Option<String>;
    fn activate_symbol(&mut self, symbol: ElementId) -> FamshotResult<()>;
    fn place_instance(
        &mut self,
        symbol: ElementId,
        level: ElementId,
        origin: Point,
        host: Option<ElementId>,
    ) -> FamshotResult<ElementId>;
    fn create_wall(&mut self, level: ElementId, line: Line) -> FamshotResult<ElementId>;
    /// Bounding box of an element as seen in a view. `None` when it has no visible geometry.
    fn bounding_box(&self, element: ElementId, view: ViewId) -> Option<BoundingBox>;

    fn find_view(&self, kind: ViewKind, name: &str) -> Option<ViewId>;
    /// Create a view; plan views are created on the default level.
    fn create_view(&mut self, kind: ViewKind, name: &str) -> FamshotResult<ViewId>;
    fn view_level(&self, view: ViewId) -> FamshotResult<ElementId>;
    fn open_views(&self) -> Vec<ViewId>;
    fn activate_view(&mut self, view: ViewId) -> FamshotResult<()>;
    fn set_zoom(&mut self, view: ViewId, zoom: f64) -> FamshotResult<()>;
    fn set_detail_level(&mut self, view: ViewId, level: DetailLevel) -> FamshotResult<()>;
    fn set_view_scale(&mut self, view: ViewId, scale: u32) -> FamshotResult<()>;
    fn hide_in_view(&mut self, view: ViewId, elements: &[ElementId]) -> FamshotResult<()>;
    fn refresh(&mut self);

    /// File extension of standalone documents written by [`Workspace::save_as`].
    fn document_extension(&self) -> &str;
    fn save_as(&mut self, path: &Path) -> FamshotResult<()>;
    /// The document title as the host reports it.
    fn document_title(&self) -> String;
    fn export_image(&mut self, request: &ImageExportRequest) -> FamshotResult<()>;
}

/// Run `f` as one atomic unit of work: commit on `Ok`, roll back on `Err`.
pub fn transact<W, T, F>(ws: &mut W, name: &str, f: F) -> FamshotResult<T>
where
    W: Workspace + ?Sized,
    F: FnOnce(&mut W) -> FamshotResult<T>,
{
    ws.begin_transaction(name)?;
    match f(ws) {
        Ok(v) => {
            ws.commit_transaction()?;
            Ok(v)
        }
        Err(e) => {
            ws.rollback_transaction();
            Err(e)
        }
    }
}

/// Find a view by kind and name, creating it when missing.
pub fn ensure_view<W>(ws: &mut W, kind: ViewKind) -> FamshotResult<ViewId>
where
    W: Workspace + ?Sized,
{
    let name = match kind {
        ViewKind::Plan => PLAN_VIEW_NAME,
        ViewKind::Isometric => ISO_VIEW_NAME,
    };
    if let Some(view) = ws.find_view(kind, name) {
        return Ok(view);
    }
    tracing::debug!(?kind, name, "creating missing view");
    transact(ws, "create view", |ws| ws.create_view(kind, name))
}

/// Normalizes the host's document title into an image file stem.
///
/// Host versions differ in whether the reported title carries the document extension; the
/// convention in use is configuration, not something the core guesses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TitleConvention {
    #[default]
    WithoutExtension,
    WithExtension,
}

impl TitleConvention {
    pub fn title_of<W>(self, ws: &W) -> FamshotResult<String>
    where
        W: Workspace + ?Sized,
    {
        let raw = ws.document_title();
        let title = match self {
            Self::WithoutExtension => raw,
            Self::WithExtension => {
                let suffix = format!(".{}", ws.document_extension());
                match raw.strip_suffix(&suffix) {
                    Some(stem) => stem.to_string(),
                    None => {
                        return Err(FamshotError::host(format!(
                            "document title '{raw}' does not end with '{suffix}'"
                        )));
                    }
                }
            }
        };
        if title.is_empty() {
            return Err(FamshotError::host("host reported an empty document title"));
        }
        Ok(title)
    }
}
