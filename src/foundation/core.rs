pub use kurbo::{Affine, BezPath, Line, Point, Rect, Vec2};

/// Opaque handle to a host model element (component, symbol, instance, wall, level).
///
/// Handles are identities owned by the host; they are only meaningful to the [`Workspace`]
/// that issued them.
///
/// [`Workspace`]: crate::host::Workspace
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ElementId(pub u64);

/// Opaque handle to a host view.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ViewId(pub u64);

/// Kind of view a thumbnail is framed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// Engineering plan view of a level (2D).
    Plan,
    /// Isometric 3D view.
    Isometric,
}

impl ViewKind {
    pub fn is_3d(self) -> bool {
        matches!(self, Self::Isometric)
    }
}

/// Axis-aligned model-space bounding box.
///
/// `footprint` spans the two horizontal axes (x = width, y = depth); `bottom..top` spans the
/// vertical axis (z = height).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub footprint: Rect,
    pub bottom: f64,
    pub top: f64,
}

impl BoundingBox {
    pub fn new(footprint: Rect, bottom: f64, top: f64) -> Self {
        Self {
            footprint: footprint.abs(),
            bottom: bottom.min(top),
            top: bottom.max(top),
        }
    }

    /// Box of `width x depth x height` whose footprint is centred on `origin` and whose bottom
    /// sits at `elevation`.
    pub fn centered(origin: Point, elevation: f64, width: f64, depth: f64, height: f64) -> Self {
        let half = Vec2::new(width.abs() / 2.0, depth.abs() / 2.0);
        Self::new(
            Rect::from_points(origin - half, origin + half),
            elevation,
            elevation + height.abs(),
        )
    }

    pub fn width(&self) -> f64 {
        self.footprint.width()
    }

    pub fn depth(&self) -> f64 {
        self.footprint.height()
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// A box with no extent along any axis carries no visible geometry.
    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 || self.depth() > 0.0 || self.height() > 0.0)
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            footprint: self.footprint.union(other.footprint),
            bottom: self.bottom.min(other.bottom),
            top: self.top.max(other.top),
        }
    }

    /// The eight corners, bottom ring first.
    pub fn corners(&self) -> [[f64; 3]; 8] {
        let Rect { x0, y0, x1, y1 } = self.footprint;
        let (b, t) = (self.bottom, self.top);
        [
            [x0, y0, b],
            [x1, y0, b],
            [x1, y1, b],
            [x0, y1, b],
            [x0, y0, t],
            [x1, y0, t],
            [x1, y1, t],
            [x0, y1, t],
        ]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
