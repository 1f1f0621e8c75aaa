//! Camera scale heuristic for consistent thumbnail framing.
//!
//! A plain "zoom to fit" gives variants of very different real-world size very different visual
//! weight. The scale computed here shrinks tall content so that the host's width-driven fit keeps
//! it inside a square frame, and it is taken over every placed instance so the largest one still
//! fits.

use crate::foundation::core::{BoundingBox, ViewKind};

/// Isometric projection angle.
pub const ISO_ANGLE_DEG: f64 = 30.0;
/// Post-adjustment coefficient for 3D views, applied only while it keeps the scale below 1.
pub const ISO_BOOST: f64 = 1.55;
/// Post-adjustment margin for plan views so geometry never touches the frame edge.
pub const PLAN_MARGIN: f64 = 0.95;

/// On-screen `(width, height)` of a box in the given view kind.
///
/// In a plan view the screen vertical is the model's depth axis; the isometric projection uses a
/// fixed 30 degree basis.
pub fn screen_extent(bbox: &BoundingBox, kind: ViewKind) -> (f64, f64) {
    let (w, d, h) = (bbox.width(), bbox.depth(), bbox.height());
    match kind {
        ViewKind::Plan => (w, d),
        ViewKind::Isometric => {
            let (sin, cos) = ISO_ANGLE_DEG.to_radians().sin_cos();
            let width_total = (cos * w).abs() + (cos * d).abs();
            let height_total = (sin * w).abs() + (sin * d).abs() + h.abs();
            (width_total, height_total)
        }
    }
}

/// Scale for a single box. Always in `(0, 1]`.
pub fn compute_scale(bbox: &BoundingBox, kind: ViewKind) -> f64 {
    let (w, h) = screen_extent(bbox, kind);
    let ratio = w / h;
    if ratio.is_finite() && ratio > 0.0 && ratio < 1.0 {
        ratio
    } else {
        1.0
    }
}

/// Most conservative scale over `boxes`, post-adjusted for the view kind.
///
/// No boxes yields the default scale of 1 (before adjustment).
pub fn frame_scale<'a>(boxes: impl IntoIterator<Item = &'a BoundingBox>, kind: ViewKind) -> f64 {
    let scale = boxes
        .into_iter()
        .map(|b| compute_scale(b, kind))
        .fold(1.0_f64, f64::min);
    post_adjust(scale, kind)
}

fn post_adjust(scale: f64, kind: ViewKind) -> f64 {
    match kind {
        ViewKind::Isometric => {
            let boosted = scale * ISO_BOOST;
            if boosted < 1.0 { boosted } else { scale }
        }
        ViewKind::Plan => scale * PLAN_MARGIN,
    }
}

#[cfg(test)]
#[path = "../tests/unit/framing.rs"]
mod tests;
