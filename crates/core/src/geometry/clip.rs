//! Polygon clipping.
//!
//! Area intersection works on flattened rings. Both operands are cut into
//! horizontal slabs at every vertex and every edge crossing, so inside a slab
//! no two edges cross and each operand's interior is a list of trapezoids
//! bounded by a left and a right edge. Intersecting two such lists is a merge
//! walk. Trapezoids that share an edge with the slab above are chained back
//! into polygons. The output polygons are disjoint, so their winding rule no
//! longer matters.
//!
//! Stroke-only paths are clipped as polylines: every segment is split where it
//! crosses the clip boundary and the pieces whose midpoint is inside are kept.

use super::{FillRule, Path, PathCommand, Point, Subpath};

/// Line segments per flattened curve.
pub const CURVE_SEGMENTS: usize = 16;

const EPSILON: f64 = 1e-9;

/// Chains whose shared slab boundary differs by less than this are merged.
const JOIN_EPSILON: f64 = 1e-7;

/// Clips `subject` against `clip`, using the clip's own rule (non-zero when
/// it was not established as a clip).
///
/// Returns `None` when nothing of the subject remains. Paint parameters of
/// the subject are carried over unchanged.
pub fn clip_path(subject: &Path, clip: &Path) -> Option<Path> {
    let clip_rule = clip.clipping.unwrap_or_default();
    let subject_bounds = subject.bounding_rectangle()?;
    let clip_bounds = clip.bounding_rectangle()?;

    if !subject_bounds.intersects(&clip_bounds) {
        return None;
    }
    if let Some(rect) = clip.as_axis_aligned_rectangle()
        && rect.contains_rect(&subject_bounds)
    {
        return Some(subject.clone());
    }

    let clip_rings = rings(clip);
    let subpaths = if is_area(subject) {
        let subject_rule = subject
            .clipping
            .or(subject.fill.as_ref().map(|f| f.rule))
            .unwrap_or_default();
        intersect_areas(&rings(subject), subject_rule, &clip_rings, clip_rule)
            .iter()
            .filter_map(|ring| Subpath::from_polygon(ring))
            .collect::<Vec<_>>()
    } else {
        subject
            .subpaths
            .iter()
            .flat_map(|sp| clip_polyline(&polyline_of(sp), &clip_rings, clip_rule))
            .filter_map(|line| Subpath::from_polyline(&line))
            .collect::<Vec<_>>()
    };

    if subpaths.is_empty() {
        return None;
    }
    Some(Path {
        subpaths,
        ..subject.clone()
    })
}

/// Filled and clip-establishing paths are areas; stroke-only paths are lines.
fn is_area(path: &Path) -> bool {
    path.is_filled() || path.is_clipping() || !path.is_stroked()
}

/// Flattened, implicitly closed rings of every sub-path.
pub fn rings(path: &Path) -> Vec<Vec<Point>> {
    path.subpaths
        .iter()
        .map(|sp| {
            let mut ring = sp.flatten(CURVE_SEGMENTS);
            ring.dedup();
            if ring.len() > 1 && ring.first() == ring.last() {
                ring.pop();
            }
            ring
        })
        .filter(|ring| ring.len() >= 3)
        .collect()
}

fn polyline_of(sp: &Subpath) -> Vec<Point> {
    let mut line = sp.flatten(CURVE_SEGMENTS);
    if sp.is_closed() {
        line.push(sp.start_point());
    }
    line.dedup();
    line
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    lo: Point,
    hi: Point,
    winding: i32,
}

impl Edge {
    fn new(a: Point, b: Point) -> Option<Self> {
        if a.y == b.y {
            None
        } else if a.y < b.y {
            Some(Self {
                lo: a,
                hi: b,
                winding: 1,
            })
        } else {
            Some(Self {
                lo: b,
                hi: a,
                winding: -1,
            })
        }
    }

    fn x_at(&self, y: f64) -> f64 {
        if y <= self.lo.y {
            self.lo.x
        } else if y >= self.hi.y {
            self.hi.x
        } else {
            self.lo.x + (y - self.lo.y) * (self.hi.x - self.lo.x) / (self.hi.y - self.lo.y)
        }
    }

    fn spans(&self, y0: f64, y1: f64) -> bool {
        self.lo.y <= y0 + EPSILON && self.hi.y >= y1 - EPSILON
    }
}

fn ring_segments(ring: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    (0..ring.len()).map(move |i| (ring[i], ring[(i + 1) % ring.len()]))
}

fn edges(rings: &[Vec<Point>]) -> Vec<Edge> {
    rings
        .iter()
        .flat_map(|ring| ring_segments(ring).filter_map(|(a, b)| Edge::new(a, b)))
        .collect()
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Parameter along `p1 -> p2` where it properly crosses `q1 -> q2`.
fn crossing(p1: Point, p2: Point, q1: Point, q2: Point) -> Option<f64> {
    let r = Point::new(p2.x - p1.x, p2.y - p1.y);
    let s = Point::new(q2.x - q1.x, q2.y - q1.y);
    let denom = r.x * s.y - r.y * s.x;
    if denom.abs() < EPSILON {
        return None;
    }
    let qp = Point::new(q1.x - p1.x, q1.y - p1.y);
    let t = (qp.x * s.y - qp.y * s.x) / denom;
    let u = (qp.x * r.y - qp.y * r.x) / denom;
    (t > EPSILON && t < 1.0 - EPSILON && u > -EPSILON && u < 1.0 + EPSILON).then_some(t)
}

fn is_inside(winding: i32, rule: FillRule) -> bool {
    match rule {
        FillRule::NonZeroWinding => winding != 0,
        FillRule::EvenOdd => winding % 2 != 0,
    }
}

/// Winding-number point-in-polygon test over all rings.
pub fn contains_point(rings: &[Vec<Point>], rule: FillRule, p: Point) -> bool {
    let mut winding = 0;
    for ring in rings {
        for (a, b) in ring_segments(ring) {
            if a.y <= p.y {
                if b.y > p.y && cross(a, b, p) > 0.0 {
                    winding += 1;
                }
            } else if b.y <= p.y && cross(a, b, p) < 0.0 {
                winding -= 1;
            }
        }
    }
    is_inside(winding, rule)
}

/// Interior spans of one operand inside the slab, as (left, right) edges
/// ordered by x at the slab's midline.
fn spans(edges: &[Edge], rule: FillRule, y0: f64, y1: f64) -> Vec<(Edge, Edge)> {
    let mid = (y0 + y1) / 2.0;
    let mut active: Vec<Edge> = edges.iter().copied().filter(|e| e.spans(y0, y1)).collect();
    active.sort_by(|a, b| a.x_at(mid).total_cmp(&b.x_at(mid)));

    let mut out = Vec::new();
    let mut winding = 0;
    let mut start: Option<Edge> = None;
    for edge in active {
        let was_inside = is_inside(winding, rule);
        winding += edge.winding;
        match (was_inside, is_inside(winding, rule)) {
            (false, true) => start = Some(edge),
            (true, false) => {
                if let Some(left) = start.take() {
                    out.push((left, edge));
                }
            }
            _ => {}
        }
    }
    out
}

#[derive(Debug, Clone, Copy)]
struct Trapezoid {
    y0: f64,
    y1: f64,
    bottom: (f64, f64),
    top: (f64, f64),
}

fn intersect_spans(a: &[(Edge, Edge)], b: &[(Edge, Edge)], y0: f64, y1: f64) -> Vec<Trapezoid> {
    let mid = (y0 + y1) / 2.0;
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::new();
    while i < a.len() && j < b.len() {
        let (al, ar) = a[i];
        let (bl, br) = b[j];
        let left = if al.x_at(mid) >= bl.x_at(mid) { al } else { bl };
        let right = if ar.x_at(mid) <= br.x_at(mid) { ar } else { br };
        if left.x_at(mid) < right.x_at(mid) {
            out.push(Trapezoid {
                y0,
                y1,
                bottom: (left.x_at(y0), right.x_at(y0)),
                top: (left.x_at(y1), right.x_at(y1)),
            });
        }
        if ar.x_at(mid) <= br.x_at(mid) {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

/// Slab boundaries: every vertex y and every y where two edges cross.
fn breakpoints(all: &[Edge]) -> Vec<f64> {
    let mut ys: Vec<f64> = all.iter().flat_map(|e| [e.lo.y, e.hi.y]).collect();
    for (i, e) in all.iter().enumerate() {
        for f in &all[i + 1..] {
            if e.hi.y <= f.lo.y || f.hi.y <= e.lo.y {
                continue;
            }
            if let Some(t) = crossing(e.lo, e.hi, f.lo, f.hi) {
                ys.push(e.lo.y + t * (e.hi.y - e.lo.y));
            }
        }
    }
    ys.sort_by(f64::total_cmp);
    ys.dedup_by(|a, b| (*a - *b).abs() < EPSILON);
    ys
}

struct Chain {
    left: Vec<Point>,
    right: Vec<Point>,
    top_y: f64,
    top: (f64, f64),
}

impl Chain {
    fn start(t: &Trapezoid) -> Self {
        Self {
            left: vec![Point::new(t.bottom.0, t.y0), Point::new(t.top.0, t.y1)],
            right: vec![Point::new(t.bottom.1, t.y0), Point::new(t.top.1, t.y1)],
            top_y: t.y1,
            top: t.top,
        }
    }

    fn continues_into(&self, t: &Trapezoid) -> bool {
        (self.top_y - t.y0).abs() < JOIN_EPSILON
            && (self.top.0 - t.bottom.0).abs() < JOIN_EPSILON
            && (self.top.1 - t.bottom.1).abs() < JOIN_EPSILON
    }

    fn extend(&mut self, t: &Trapezoid) {
        self.left.push(Point::new(t.top.0, t.y1));
        self.right.push(Point::new(t.top.1, t.y1));
        self.top_y = t.y1;
        self.top = t.top;
    }

    /// Counter-clockwise ring: up the right side, down the left.
    fn into_ring(self) -> Vec<Point> {
        let mut ring = self.right;
        ring.extend(self.left.into_iter().rev());
        simplify(ring)
    }
}

/// Drops repeated and collinear vertices.
fn simplify(mut ring: Vec<Point>) -> Vec<Point> {
    ring.dedup_by(|a, b| a.approx_eq(*b, EPSILON));
    if ring.len() > 1 && ring[0].approx_eq(ring[ring.len() - 1], EPSILON) {
        ring.pop();
    }
    let mut changed = true;
    while changed && ring.len() >= 3 {
        changed = false;
        let n = ring.len();
        for i in 0..n {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            if cross(prev, ring[i], next).abs() < EPSILON {
                ring.remove(i);
                changed = true;
                break;
            }
        }
    }
    ring
}

/// Intersection of two areas given as rings, as disjoint polygons.
pub fn intersect_areas(
    subject: &[Vec<Point>],
    subject_rule: FillRule,
    clip: &[Vec<Point>],
    clip_rule: FillRule,
) -> Vec<Vec<Point>> {
    let subject_edges = edges(subject);
    let clip_edges = edges(clip);
    if subject_edges.is_empty() || clip_edges.is_empty() {
        return Vec::new();
    }
    let all: Vec<Edge> = subject_edges.iter().chain(&clip_edges).copied().collect();
    let ys = breakpoints(&all);

    let mut open: Vec<Chain> = Vec::new();
    let mut finished: Vec<Chain> = Vec::new();
    for w in ys.windows(2) {
        let (y0, y1) = (w[0], w[1]);
        if y1 - y0 < EPSILON {
            continue;
        }
        let traps = intersect_spans(
            &spans(&subject_edges, subject_rule, y0, y1),
            &spans(&clip_edges, clip_rule, y0, y1),
            y0,
            y1,
        );
        let mut next_open = Vec::with_capacity(traps.len());
        for t in &traps {
            match open.iter().position(|c| c.continues_into(t)) {
                Some(idx) => {
                    let mut chain = open.swap_remove(idx);
                    chain.extend(t);
                    next_open.push(chain);
                }
                None => next_open.push(Chain::start(t)),
            }
        }
        finished.append(&mut open);
        open = next_open;
    }
    finished.append(&mut open);

    finished
        .into_iter()
        .map(Chain::into_ring)
        .filter(|ring| ring.len() >= 3)
        .collect()
}

/// Pieces of an open polyline that lie inside the clip area.
pub fn clip_polyline(line: &[Point], clip: &[Vec<Point>], rule: FillRule) -> Vec<Vec<Point>> {
    let mut out: Vec<Vec<Point>> = Vec::new();
    let mut run: Vec<Point> = Vec::new();
    for pair in line.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let mut ts: Vec<f64> = clip
            .iter()
            .flat_map(|ring| ring_segments(ring))
            .filter_map(|(q1, q2)| crossing(a, b, q1, q2))
            .collect();
        ts.push(0.0);
        ts.push(1.0);
        ts.sort_by(f64::total_cmp);
        ts.dedup_by(|x, y| (*x - *y).abs() < EPSILON);

        for t in ts.windows(2) {
            let p = lerp(a, b, t[0]);
            let q = lerp(a, b, t[1]);
            if contains_point(clip, rule, lerp(p, q, 0.5)) {
                if run.last().is_some_and(|last| last.approx_eq(p, EPSILON)) {
                    run.push(q);
                } else {
                    if run.len() >= 2 {
                        out.push(std::mem::take(&mut run));
                    }
                    run = vec![p, q];
                }
            } else if run.len() >= 2 {
                out.push(std::mem::take(&mut run));
            } else {
                run.clear();
            }
        }
    }
    if run.len() >= 2 {
        out.push(run);
    }
    out
}

fn lerp(a: Point, b: Point, t: f64) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// True when any command of the path is a curve.
pub fn has_curves(path: &Path) -> bool {
    path.subpaths.iter().any(|sp| {
        sp.commands().iter().any(|c| {
            matches!(
                c,
                PathCommand::QuadraticCurve { .. } | PathCommand::CubicCurve { .. }
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rectangle;

    fn rect_path(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
        let sp = Subpath::from_polygon(&[
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
        .unwrap();
        Path::from_subpaths(vec![sp])
    }

    fn area(ring: &[Point]) -> f64 {
        ring_segments(ring)
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum::<f64>()
            .abs()
            / 2.0
    }

    #[test]
    fn overlapping_rectangles() {
        let out = intersect_areas(
            &rings(&rect_path(0.0, 0.0, 10.0, 10.0)),
            FillRule::NonZeroWinding,
            &rings(&rect_path(5.0, 5.0, 15.0, 15.0)),
            FillRule::NonZeroWinding,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 4);
        assert!((area(&out[0]) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn triangle_against_square() {
        let tri = Subpath::from_polygon(&[
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(0.0, 20.0),
        ])
        .unwrap();
        let out = intersect_areas(
            &rings(&Path::from_subpaths(vec![tri])),
            FillRule::NonZeroWinding,
            &rings(&rect_path(0.0, 0.0, 10.0, 10.0)),
            FillRule::NonZeroWinding,
        );
        // The hypotenuse x + y = 20 passes through the square's far corner.
        let total: f64 = out.iter().map(|r| area(r)).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn even_odd_hole_is_excluded() {
        let outer = rect_path(0.0, 0.0, 10.0, 10.0);
        let inner = rect_path(3.0, 3.0, 7.0, 7.0);
        let donut = Path::from_subpaths(
            outer
                .subpaths
                .into_iter()
                .chain(inner.subpaths)
                .collect(),
        );
        let clip = rings(&rect_path(-1.0, -1.0, 11.0, 11.0));
        let even_odd: f64 = intersect_areas(&rings(&donut), FillRule::EvenOdd, &clip, FillRule::NonZeroWinding)
            .iter()
            .map(|r| area(r))
            .sum();
        let non_zero: f64 = intersect_areas(
            &rings(&donut),
            FillRule::NonZeroWinding,
            &clip,
            FillRule::NonZeroWinding,
        )
        .iter()
        .map(|r| area(r))
        .sum();
        assert!((even_odd - 84.0).abs() < 1e-9);
        assert!((non_zero - 100.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_clip_drops_path() {
        let subject = rect_path(0.0, 0.0, 1.0, 1.0);
        let clip = rect_path(5.0, 5.0, 6.0, 6.0);
        assert!(clip_path(&subject, &clip).is_none());
    }

    #[test]
    fn containing_rectangle_keeps_curves() {
        let mut sp = Subpath::new(Point::new(1.0, 1.0));
        sp.cubic_to(Point::new(1.0, 3.0), Point::new(3.0, 3.0), Point::new(3.0, 1.0));
        let subject = Path::from_subpaths(vec![sp]);
        let clip = rect_path(0.0, 0.0, 10.0, 10.0);
        let out = clip_path(&subject, &clip).unwrap();
        assert!(has_curves(&out));
        assert_eq!(out, subject);
    }

    #[test]
    fn stroke_line_is_cut_at_boundary() {
        let line = [Point::new(-5.0, 5.0), Point::new(15.0, 5.0)];
        let clip = rings(&rect_path(0.0, 0.0, 10.0, 10.0));
        let pieces = clip_polyline(&line, &clip, FillRule::NonZeroWinding);
        assert_eq!(pieces.len(), 1);
        let bounds = Rectangle::bounding(pieces[0].iter().copied()).unwrap();
        assert!((bounds.left() - 0.0).abs() < 1e-9);
        assert!((bounds.right() - 10.0).abs() < 1e-9);
    }
}
