use crate::foundation::core::Point;
use std::f64::consts::FRAC_PI_2;

/// Kind of a [`PathSegment`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SegmentKind {
    /// Start a new sub-path at the point.
    Move,
    /// Straight line to the point.
    Line,
    /// One control/end point of a cubic Bezier; always appears in runs of three.
    Curve,
    /// Close the current sub-path. The coordinates are unused.
    Close,
}

/// One path element.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PathSegment {
    /// Segment kind.
    pub kind: SegmentKind,
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl PathSegment {
    /// A move-to segment.
    pub const fn move_to(x: f64, y: f64) -> Self {
        Self {
            kind: SegmentKind::Move,
            x,
            y,
        }
    }

    /// A line-to segment.
    pub const fn line_to(x: f64, y: f64) -> Self {
        Self {
            kind: SegmentKind::Line,
            x,
            y,
        }
    }

    /// One point of a cubic curve run.
    pub const fn curve(x: f64, y: f64) -> Self {
        Self {
            kind: SegmentKind::Curve,
            x,
            y,
        }
    }

    /// A close segment.
    pub const fn close() -> Self {
        Self {
            kind: SegmentKind::Close,
            x: 0.0,
            y: 0.0,
        }
    }

    /// The segment's coordinates as a point.
    pub const fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Axis-aligned bounds `(x0, y0, x1, y1)` over all non-close points.
pub fn path_extents(path: &[PathSegment]) -> Option<(f64, f64, f64, f64)> {
    path.iter()
        .filter(|s| s.kind != SegmentKind::Close)
        .fold(None, |acc, s| {
            Some(match acc {
                None => (s.x, s.y, s.x, s.y),
                Some((x0, y0, x1, y1)) => (x0.min(s.x), y0.min(s.y), x1.max(s.x), y1.max(s.y)),
            })
        })
}

/// Close every sub-path: a close is inserted before each move not already preceded by one
/// (except a leading move), and appended when the path does not end with one.
pub fn path_close(path: &mut Vec<PathSegment>) {
    if path.is_empty() {
        return;
    }
    let mut out = Vec::with_capacity(path.len() + 4);
    for (i, seg) in path.iter().enumerate() {
        if seg.kind == SegmentKind::Move
            && i > 0
            && out
                .last()
                .is_some_and(|s: &PathSegment| s.kind != SegmentKind::Close)
        {
            out.push(PathSegment::close());
        }
        out.push(*seg);
    }
    if out.last().is_some_and(|s| s.kind != SegmentKind::Close) {
        out.push(PathSegment::close());
    }
    *path = out;
}

const FLATTEN_MAX_DEPTH: u32 = 16;

/// Replace every cubic curve run with line segments within `tolerance` of the curve.
///
/// Curve runs without a current point, or shorter than three points, are dropped.
pub fn path_flatten(path: &mut Vec<PathSegment>, tolerance: f64) {
    let tolerance = if tolerance.is_finite() && tolerance > 0.0 {
        tolerance
    } else {
        0.1
    };
    let mut out = Vec::with_capacity(path.len() * 2);
    let mut current: Option<Point> = None;
    let mut subpath_start: Option<Point> = None;
    let mut i = 0usize;
    while i < path.len() {
        let seg = path[i];
        match seg.kind {
            SegmentKind::Move => {
                current = Some(seg.point());
                subpath_start = current;
                out.push(seg);
            }
            SegmentKind::Line => {
                current = Some(seg.point());
                out.push(seg);
            }
            SegmentKind::Close => {
                current = subpath_start;
                out.push(seg);
            }
            SegmentKind::Curve => {
                let run = &path[i..path.len().min(i + 3)];
                let complete = run.len() == 3 && run.iter().all(|s| s.kind == SegmentKind::Curve);
                if let (true, Some(p0)) = (complete, current) {
                    let ctrl = [p0, run[0].point(), run[1].point(), run[2].point()];
                    flatten_cubic(ctrl, tolerance, 0, &mut out);
                    current = Some(run[2].point());
                    i += 3;
                    continue;
                }
                tracing::debug!(index = i, "dropping incomplete curve run while flattening");
                i += run.iter().take_while(|s| s.kind == SegmentKind::Curve).count();
                continue;
            }
        }
        i += 1;
    }
    *path = out;
}

fn flatten_cubic(p: [Point; 4], tolerance: f64, depth: u32, out: &mut Vec<PathSegment>) {
    if depth >= FLATTEN_MAX_DEPTH || is_flat(&p, tolerance) {
        out.push(PathSegment::line_to(p[3].x, p[3].y));
        return;
    }
    let mid = |a: Point, b: Point| Point::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5);
    let p01 = mid(p[0], p[1]);
    let p12 = mid(p[1], p[2]);
    let p23 = mid(p[2], p[3]);
    let p012 = mid(p01, p12);
    let p123 = mid(p12, p23);
    let p0123 = mid(p012, p123);
    flatten_cubic([p[0], p01, p012, p0123], tolerance, depth + 1, out);
    flatten_cubic([p0123, p123, p23, p[3]], tolerance, depth + 1, out);
}

/// Both control points lie within `tolerance` of the chord.
fn is_flat(p: &[Point; 4], tolerance: f64) -> bool {
    let (dx, dy) = (p[3].x - p[0].x, p[3].y - p[0].y);
    let len = dx.hypot(dy);
    let dist = |q: Point| {
        if len <= f64::EPSILON {
            (q.x - p[0].x).hypot(q.y - p[0].y)
        } else {
            ((q.x - p[0].x) * dy - (q.y - p[0].y) * dx).abs() / len
        }
    };
    dist(p[1]) <= tolerance && dist(p[2]) <= tolerance
}

/// Curve segments approximating a circular arc of `angle` radians around `(cx, cy)`
/// starting at `(x, y)`. The initial move is not included.
pub fn path_by_arc(x: f64, y: f64, cx: f64, cy: f64, angle: f64) -> Vec<PathSegment> {
    let radius = (x - cx).hypot(y - cy);
    if angle == 0.0 || !angle.is_finite() || radius <= f64::EPSILON {
        return Vec::new();
    }
    let spans = (angle.abs() / FRAC_PI_2 - 1e-9).ceil().max(1.0) as usize;
    let step = angle / spans as f64;
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    let mut out = Vec::with_capacity(spans * 3);
    let mut theta = (y - cy).atan2(x - cx);
    for _ in 0..spans {
        let next = theta + step;
        let (s0, c0) = theta.sin_cos();
        let (s1, c1) = next.sin_cos();
        let p0 = (cx + radius * c0, cy + radius * s0);
        let p3 = (cx + radius * c1, cy + radius * s1);
        out.push(PathSegment::curve(
            p0.0 - k * radius * s0,
            p0.1 + k * radius * c0,
        ));
        out.push(PathSegment::curve(
            p3.0 + k * radius * s1,
            p3.1 - k * radius * c1,
        ));
        out.push(PathSegment::curve(p3.0, p3.1));
        theta = next;
    }
    out
}

/// One closed square of side `size` centred on every point.
pub fn points_to_path(points: &[Point], size: f64) -> Vec<PathSegment> {
    let h = (size.abs() * 0.5).max(0.5);
    let mut out = Vec::with_capacity(points.len() * 5);
    for p in points {
        out.push(PathSegment::move_to(p.x - h, p.y - h));
        out.push(PathSegment::line_to(p.x + h, p.y - h));
        out.push(PathSegment::line_to(p.x + h, p.y + h));
        out.push(PathSegment::line_to(p.x - h, p.y + h));
        out.push(PathSegment::close());
    }
    out
}

/// Owned copy of a parsed path with incomplete curve runs removed.
pub fn path_to_path(path: &[PathSegment]) -> Vec<PathSegment> {
    let mut out = Vec::with_capacity(path.len());
    let mut i = 0usize;
    while i < path.len() {
        if path[i].kind != SegmentKind::Curve {
            out.push(path[i]);
            i += 1;
            continue;
        }
        let run = path[i..]
            .iter()
            .take_while(|s| s.kind == SegmentKind::Curve)
            .count();
        let keep = run - run % 3;
        out.extend_from_slice(&path[i..i + keep]);
        i += run;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/transform/path.rs"]
mod tests;
