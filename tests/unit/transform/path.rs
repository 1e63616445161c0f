use super::*;
use std::f64::consts::{FRAC_PI_2, PI};

fn sample() -> Vec<PathSegment> {
    vec![
        PathSegment::move_to(10.0, 20.5),
        PathSegment::line_to(19.0, 11.0),
        PathSegment::curve(14.0, 3.0),
        PathSegment::curve(11.0, 13.0),
        PathSegment::curve(9.0, 10.0),
    ]
}

#[test]
fn extents_cover_all_drawable_points() {
    assert_eq!(path_extents(&sample()), Some((9.0, 3.0, 19.0, 20.5)));
}

#[test]
fn extents_of_close_only_path_is_none() {
    assert_eq!(path_extents(&[]), None);
    assert_eq!(path_extents(&[PathSegment::close()]), None);
}

#[test]
fn close_is_idempotent() {
    let mut path = vec![
        PathSegment::move_to(0.0, 0.0),
        PathSegment::line_to(1.0, 0.0),
        PathSegment::move_to(5.0, 5.0),
        PathSegment::line_to(6.0, 5.0),
    ];
    path_close(&mut path);
    let once = path.clone();
    path_close(&mut path);
    assert_eq!(path, once);

    let kinds: Vec<_> = once.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SegmentKind::Move,
            SegmentKind::Line,
            SegmentKind::Close,
            SegmentKind::Move,
            SegmentKind::Line,
            SegmentKind::Close,
        ]
    );
}

#[test]
fn close_leaves_empty_path_empty() {
    let mut path = Vec::new();
    path_close(&mut path);
    assert!(path.is_empty());
}

#[test]
fn flatten_removes_curves_and_stays_near_curve() {
    let mut path = sample();
    path_flatten(&mut path, 0.1);
    assert!(path.iter().all(|s| s.kind != SegmentKind::Curve));
    let last = path.last().copied().unwrap();
    assert_eq!((last.x, last.y), (9.0, 10.0));
    // Straight segments pass through untouched.
    assert_eq!(path[0], PathSegment::move_to(10.0, 20.5));
    assert_eq!(path[1], PathSegment::line_to(19.0, 11.0));
    assert!(path.len() > 3);
}

#[test]
fn flatten_drops_incomplete_runs() {
    let mut path = vec![
        PathSegment::move_to(0.0, 0.0),
        PathSegment::curve(1.0, 1.0),
        PathSegment::curve(2.0, 2.0),
        PathSegment::line_to(3.0, 0.0),
    ];
    path_flatten(&mut path, 0.5);
    assert_eq!(
        path,
        vec![PathSegment::move_to(0.0, 0.0), PathSegment::line_to(3.0, 0.0)]
    );
}

#[test]
fn arc_quarter_turn_ends_on_circle() {
    let segs = path_by_arc(10.0, 0.0, 0.0, 0.0, FRAC_PI_2);
    assert_eq!(segs.len(), 3);
    assert!(segs.iter().all(|s| s.kind == SegmentKind::Curve));
    let end = segs[2];
    assert!(end.x.abs() < 1e-9 && (end.y - 10.0).abs() < 1e-9);
    let k = 4.0 / 3.0 * (FRAC_PI_2 / 4.0).tan() * 10.0;
    assert!((segs[0].x - 10.0).abs() < 1e-9 && (segs[0].y - k).abs() < 1e-9);
}

#[test]
fn arc_splits_into_quarter_spans() {
    let segs = path_by_arc(0.0, -5.0, 0.0, 0.0, -PI);
    assert_eq!(segs.len(), 6);
    let end = segs[5];
    assert!(end.x.abs() < 1e-9 && (end.y - 5.0).abs() < 1e-9);
    assert!(path_by_arc(1.0, 1.0, 1.0, 1.0, PI).is_empty());
    assert!(path_by_arc(2.0, 0.0, 0.0, 0.0, 0.0).is_empty());
}

#[test]
fn points_become_closed_squares() {
    let path = points_to_path(&[Point::new(5.0, 5.0), Point::new(20.0, 0.0)], 4.0);
    assert_eq!(path.len(), 10);
    assert_eq!(path_extents(&path), Some((3.0, -2.0, 22.0, 7.0)));
    assert_eq!(path[4].kind, SegmentKind::Close);
}

#[test]
fn path_to_path_truncates_partial_curve_runs() {
    let mut input = sample();
    input.push(PathSegment::curve(1.0, 1.0));
    input.push(PathSegment::close());
    let out = path_to_path(&input);
    assert_eq!(out.len(), 6);
    assert_eq!(out[5].kind, SegmentKind::Close);
}
