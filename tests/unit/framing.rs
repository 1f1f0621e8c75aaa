use super::*;
use crate::foundation::core::Point;

fn boxed(w: f64, d: f64, h: f64) -> BoundingBox {
    BoundingBox::centered(Point::ORIGIN, 0.0, w, d, h)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn plan_wide_content_keeps_default() {
    assert_eq!(compute_scale(&boxed(4.0, 1.0, 9.0), ViewKind::Plan), 1.0);
}

#[test]
fn plan_deep_content_scales_by_ratio() {
    assert!(close(compute_scale(&boxed(1.0, 4.0, 0.5), ViewKind::Plan), 0.25));
}

#[test]
fn plan_scale_is_in_unit_interval() {
    for (w, d) in [(0.1, 10.0), (1.0, 1.0), (7.0, 0.3), (2.5, 2.6), (1e-6, 1e6)] {
        let s = compute_scale(&boxed(w, d, 1.0), ViewKind::Plan);
        assert!(s > 0.0 && s <= 1.0, "scale {s} for {w}x{d}");
        assert_eq!(s, compute_scale(&boxed(w, d, 1.0), ViewKind::Plan));
    }
}

#[test]
fn isometric_projection_matches_basis() {
    let b = boxed(1.0, 1.0, 2.0);
    let (wt, ht) = screen_extent(&b, ViewKind::Isometric);
    let cos30 = 30f64.to_radians().cos();
    assert!(close(wt, 2.0 * cos30));
    assert!(close(ht, 0.5 + 0.5 + 2.0));
    assert!(close(compute_scale(&b, ViewKind::Isometric), wt / ht));
}

#[test]
fn degenerate_boxes_fall_back_to_default() {
    assert_eq!(compute_scale(&boxed(0.0, 0.0, 0.0), ViewKind::Isometric), 1.0);
    assert_eq!(compute_scale(&boxed(1.0, 0.0, 1.0), ViewKind::Plan), 1.0);
    assert_eq!(compute_scale(&boxed(0.0, 1.0, 1.0), ViewKind::Plan), 1.0);
}

#[test]
fn frame_scale_keeps_smallest() {
    let boxes = [boxed(1.0, 2.0, 1.0), boxed(1.0, 5.0, 1.0), boxed(3.0, 1.0, 1.0)];
    assert!(close(frame_scale(&boxes, ViewKind::Plan), 0.2 * PLAN_MARGIN));
}

#[test]
fn frame_scale_without_boxes_is_adjusted_default() {
    assert!(close(
        frame_scale(std::iter::empty(), ViewKind::Plan),
        PLAN_MARGIN
    ));
    assert_eq!(frame_scale(std::iter::empty(), ViewKind::Isometric), 1.0);
}

#[test]
fn isometric_boost_applies_only_below_one() {
    // Tall column: raw ratio small enough that the boost stays below 1.
    let tall = boxed(0.2, 0.2, 3.0);
    let raw = compute_scale(&tall, ViewKind::Isometric);
    assert!(raw * ISO_BOOST < 1.0);
    assert!(close(frame_scale([&tall], ViewKind::Isometric), raw * ISO_BOOST));

    // Nearly square content: boosting would exceed 1, so the raw value is kept.
    let squat = boxed(1.0, 1.0, 0.9);
    let raw = compute_scale(&squat, ViewKind::Isometric);
    assert!(raw < 1.0 && raw * ISO_BOOST >= 1.0);
    assert!(close(frame_scale([&squat], ViewKind::Isometric), raw));
}
