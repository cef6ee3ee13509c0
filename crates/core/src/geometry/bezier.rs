//! Bézier curve evaluation and tight bounding boxes.
//!
//! Extrema are found analytically: the derivative of a quadratic curve is
//! linear and the derivative of a cubic curve is quadratic, so each axis has
//! at most one (quadratic) or two (cubic) interior extrema.

use smallvec::SmallVec;

use super::{Point, Rectangle};

/// Coefficients below this are treated as zero when solving.
const ROOT_EPSILON: f64 = 1e-12;

fn quadratic_at(p0: f64, p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    mt * mt * p0 + 2.0 * mt * t * p1 + t * t * p2
}

fn cubic_at(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    mt * mt * mt * p0 + 3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t * p3
}

/// Root of the derivative of a 1D quadratic Bézier, if it lies in (0, 1).
fn quadratic_extremum(p0: f64, p1: f64, p2: f64) -> Option<f64> {
    // B'(t) = 2[(p1 - p0) + t(p0 - 2p1 + p2)]
    let denom = p0 - 2.0 * p1 + p2;
    if denom.abs() < ROOT_EPSILON {
        return None;
    }
    let t = (p0 - p1) / denom;
    (t > 0.0 && t < 1.0).then_some(t)
}

/// Roots of the derivative of a 1D cubic Bézier that lie in (0, 1).
fn cubic_extrema(p0: f64, p1: f64, p2: f64, p3: f64) -> SmallVec<[f64; 2]> {
    // B'(t)/3 = a t^2 + b t + c
    let a = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
    let b = 2.0 * (p0 - 2.0 * p1 + p2);
    let c = p1 - p0;

    let mut roots = SmallVec::new();
    if a.abs() < ROOT_EPSILON {
        if b.abs() >= ROOT_EPSILON {
            roots.push(-c / b);
        }
    } else {
        let disc = b * b - 4.0 * a * c;
        if disc >= 0.0 {
            let sq = disc.sqrt();
            roots.push((-b + sq) / (2.0 * a));
            roots.push((-b - sq) / (2.0 * a));
        }
    }
    roots.retain(|t| *t > 0.0 && *t < 1.0);
    roots
}

pub fn quadratic_point(start: Point, control: Point, end: Point, t: f64) -> Point {
    Point::new(
        quadratic_at(start.x, control.x, end.x, t),
        quadratic_at(start.y, control.y, end.y, t),
    )
}

pub fn cubic_point(start: Point, c1: Point, c2: Point, end: Point, t: f64) -> Point {
    Point::new(
        cubic_at(start.x, c1.x, c2.x, end.x, t),
        cubic_at(start.y, c1.y, c2.y, end.y, t),
    )
}

/// Tight bounding box of a quadratic curve.
pub fn quadratic_bounds(start: Point, control: Point, end: Point) -> Rectangle {
    let mut xs: SmallVec<[f64; 3]> = smallvec::smallvec![start.x, end.x];
    let mut ys: SmallVec<[f64; 3]> = smallvec::smallvec![start.y, end.y];
    if let Some(t) = quadratic_extremum(start.x, control.x, end.x) {
        xs.push(quadratic_at(start.x, control.x, end.x, t));
    }
    if let Some(t) = quadratic_extremum(start.y, control.y, end.y) {
        ys.push(quadratic_at(start.y, control.y, end.y, t));
    }
    bounds_of(&xs, &ys)
}

/// Tight bounding box of a cubic curve.
pub fn cubic_bounds(start: Point, c1: Point, c2: Point, end: Point) -> Rectangle {
    let mut xs: SmallVec<[f64; 4]> = smallvec::smallvec![start.x, end.x];
    let mut ys: SmallVec<[f64; 4]> = smallvec::smallvec![start.y, end.y];
    for t in cubic_extrema(start.x, c1.x, c2.x, end.x) {
        xs.push(cubic_at(start.x, c1.x, c2.x, end.x, t));
    }
    for t in cubic_extrema(start.y, c1.y, c2.y, end.y) {
        ys.push(cubic_at(start.y, c1.y, c2.y, end.y, t));
    }
    bounds_of(&xs, &ys)
}

fn bounds_of(xs: &[f64], ys: &[f64]) -> Rectangle {
    let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let max_x = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min);
    let max_y = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Rectangle::new(min_x, min_y, max_x, max_y)
}
