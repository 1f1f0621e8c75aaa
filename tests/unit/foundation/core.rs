use super::*;

#[test]
fn centered_box_extents() {
    let b = BoundingBox::centered(Point::ORIGIN, 0.0, 0.9, 0.1, 2.1);
    assert!((b.width() - 0.9).abs() < 1e-12);
    assert!((b.depth() - 0.1).abs() < 1e-12);
    assert!((b.height() - 2.1).abs() < 1e-12);
    assert!((b.footprint.center().x).abs() < 1e-12);
    assert!(!b.is_empty());
}

#[test]
fn new_normalizes_inverted_bounds() {
    let b = BoundingBox::new(Rect::new(2.0, 3.0, 0.0, 1.0), 5.0, 1.0);
    assert_eq!(b.width(), 2.0);
    assert_eq!(b.depth(), 2.0);
    assert_eq!(b.height(), 4.0);
}

#[test]
fn degenerate_box_is_empty() {
    let b = BoundingBox::centered(Point::new(1.0, 1.0), 0.0, 0.0, 0.0, 0.0);
    assert!(b.is_empty());

    let flat = BoundingBox::centered(Point::ORIGIN, 0.0, 1.0, 1.0, 0.0);
    assert!(!flat.is_empty());
}

#[test]
fn union_covers_both() {
    let a = BoundingBox::centered(Point::ORIGIN, 0.0, 1.0, 1.0, 1.0);
    let b = BoundingBox::centered(Point::new(5.0, 0.0), 2.0, 1.0, 1.0, 1.0);
    let u = a.union(&b);
    assert_eq!(u.footprint.x0, -0.5);
    assert_eq!(u.footprint.x1, 5.5);
    assert_eq!(u.bottom, 0.0);
    assert_eq!(u.top, 3.0);
}

#[test]
fn view_kind_serde_is_lowercase() {
    let json = serde_json::to_string(&ViewKind::Isometric).unwrap();
    assert_eq!(json, "\"isometric\"");
    let back: ViewKind = serde_json::from_str("\"plan\"").unwrap();
    assert_eq!(back, ViewKind::Plan);
    assert!(!back.is_3d());
}
