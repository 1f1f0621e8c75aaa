//! Rasterizer of the in-memory host.
//!
//! Visible elements are projected to screen space, written out as an SVG scene and rendered with
//! `resvg`. Fit rule: the content's on-screen width maps to the frame height, then the view zoom
//! is applied; content is centred in the frame. Isometric frames reserve headroom for the boosted
//! framing scale so tall content stays clear of the frame edges.

use std::cmp::Ordering;

use kurbo::Shape as _;

use crate::foundation::core::{Affine, BezPath, BoundingBox, Point, Rect, Vec2, ViewKind};
use crate::foundation::error::{FamshotError, FamshotResult};
use crate::framing::{ISO_ANGLE_DEG, ISO_BOOST, PLAN_MARGIN};
use crate::model::DetailLevel;

const BACKGROUND: &str = "#ffffff";
const STROKE: &str = "#2b3340";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ItemKind {
    Instance,
    Wall,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct SceneItem {
    pub bbox: BoundingBox,
    pub kind: ItemKind,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Frame {
    pub width: u32,
    pub height: u32,
    pub zoom: f64,
    pub view: ViewKind,
    pub detail: DetailLevel,
    pub view_scale: u32,
}

struct Face {
    outline: BezPath,
    fill: &'static str,
}

pub(crate) fn render(frame: &Frame, items: &[SceneItem]) -> FamshotResult<image::RgbaImage> {
    let svg = scene_svg(frame, items);
    let tree = usvg::Tree::from_str(&svg, &usvg::Options::default())
        .map_err(|e| FamshotError::export(format!("build export scene: {e}")))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(frame.width, frame.height)
        .ok_or_else(|| FamshotError::export("failed to allocate export pixmap"))?;
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap.as_mut());

    // The background is opaque, so premultiplied and straight alpha coincide.
    image::RgbaImage::from_raw(frame.width, frame.height, pixmap.take())
        .ok_or_else(|| FamshotError::export("export pixmap has unexpected size"))
}

pub(crate) fn scene_svg(frame: &Frame, items: &[SceneItem]) -> String {
    let (w, h) = (frame.width, frame.height);
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    svg.push_str(&format!(
        r#"<rect width="{w}" height="{h}" fill="{BACKGROUND}"/>"#
    ));

    let mut ordered: Vec<&SceneItem> = items.iter().collect();
    ordered.sort_by(|a, b| paint_order(frame.view, a, b));

    let faces: Vec<Face> = ordered
        .iter()
        .flat_map(|item| project(frame.view, item))
        .collect();

    if let Some(content) = faces
        .iter()
        .map(|f| f.outline.bounding_box())
        .reduce(|a, b| a.union(b))
    {
        let xf = fit_transform(frame, content);
        let stroke = stroke_width(frame);
        for face in faces {
            let mut outline = face.outline;
            outline.apply_affine(xf);
            svg.push_str(&format!(
                r#"<path d="{}" fill="{}" stroke="{STROKE}" "#,
                outline.to_svg(),
                face.fill,
            ));
            svg.push_str(&format!(
                r#"stroke-width="{stroke:.3}" stroke-linejoin="round"/>"#
            ));
        }
    }

    svg.push_str("</svg>");
    svg
}

/// Maps model-screen coordinates (y up) into frame pixels (y down).
fn fit_transform(frame: &Frame, content: Rect) -> Affine {
    let (cw, ch) = (content.width(), content.height());
    let fit = if cw > 0.0 {
        f64::from(frame.height) / cw
    } else if ch > 0.0 {
        f64::from(frame.height) / ch
    } else {
        1.0
    };
    // The isometric framing scale may be boosted up to `ISO_BOOST`; plan scales carry their own
    // margin already.
    let headroom = match frame.view {
        ViewKind::Plan => 1.0,
        ViewKind::Isometric => ISO_BOOST / PLAN_MARGIN,
    };
    let ppu = fit * frame.zoom / headroom;
    let frame_center = Vec2::new(f64::from(frame.width) / 2.0, f64::from(frame.height) / 2.0);

    Affine::translate(frame_center)
        * Affine::scale_non_uniform(ppu, -ppu)
        * Affine::translate(-content.center().to_vec2())
}

fn stroke_width(frame: &Frame) -> f64 {
    let base = match frame.detail {
        DetailLevel::Coarse => 2.0,
        DetailLevel::Medium => 1.25,
        DetailLevel::Fine => 0.75,
    };
    let scale = (20.0 / f64::from(frame.view_scale.max(1))).clamp(0.5, 2.0);
    base * scale
}

fn paint_order(view: ViewKind, a: &SceneItem, b: &SceneItem) -> Ordering {
    match view {
        ViewKind::Plan => {
            let rank = |i: &SceneItem| (i.kind == ItemKind::Instance) as u8;
            rank(a).cmp(&rank(b))
        }
        ViewKind::Isometric => {
            // Farther (larger x + y) first, then lower first.
            let depth = |i: &SceneItem| {
                let c = i.bbox.footprint.center();
                c.x + c.y
            };
            depth(b)
                .total_cmp(&depth(a))
                .then(a.bbox.bottom.total_cmp(&b.bbox.bottom))
        }
    }
}

fn iso_point(p: [f64; 3]) -> Point {
    let (sin, cos) = ISO_ANGLE_DEG.to_radians().sin_cos();
    Point::new((p[0] - p[1]) * cos, (p[0] + p[1]) * sin + p[2])
}

fn polygon(points: impl IntoIterator<Item = Point>) -> BezPath {
    let mut path = BezPath::new();
    for (i, p) in points.into_iter().enumerate() {
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.close_path();
    path
}

fn project(view: ViewKind, item: &SceneItem) -> Vec<Face> {
    let (top, left, right) = match item.kind {
        ItemKind::Instance => ("#d0d7e2", "#9aa7bb", "#b5c0d0"),
        ItemKind::Wall => ("#e4d9c4", "#b8a888", "#cbbd9f"),
    };

    match view {
        ViewKind::Plan => {
            let r = item.bbox.footprint;
            vec![Face {
                outline: polygon([
                    Point::new(r.x0, r.y0),
                    Point::new(r.x1, r.y0),
                    Point::new(r.x1, r.y1),
                    Point::new(r.x0, r.y1),
                ]),
                fill: top,
            }]
        }
        ViewKind::Isometric => {
            let c = item.bbox.corners();
            let face = |idx: [usize; 4], fill| Face {
                outline: polygon(idx.map(|i| iso_point(c[i]))),
                fill,
            };
            vec![
                face([0, 3, 7, 4], left),
                face([0, 1, 5, 4], right),
                face([4, 5, 6, 7], top),
            ]
        }
    }
}
