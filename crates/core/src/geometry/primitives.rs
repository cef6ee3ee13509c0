//! Point and rectangle value types.

use serde::Serialize;

/// A point in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn approx_eq(&self, other: Point, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }
}

/// A rectangle described by its four corners.
///
/// Keeping all four corners lets a rotated rectangle (for example a glyph
/// box on rotated text) survive transformation. `width` and `height` are the
/// lengths of the bottom and left edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rectangle {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl Default for Rectangle {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

impl Rectangle {
    /// Axis-aligned rectangle from two opposite corners, in any order.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let (left, right) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (bottom, top) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        Self {
            top_left: Point::new(left, top),
            top_right: Point::new(right, top),
            bottom_left: Point::new(left, bottom),
            bottom_right: Point::new(right, bottom),
        }
    }

    pub fn from_points(p1: Point, p2: Point) -> Self {
        Self::new(p1.x, p1.y, p2.x, p2.y)
    }

    pub const fn from_corners(
        top_left: Point,
        top_right: Point,
        bottom_left: Point,
        bottom_right: Point,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// Smallest axis-aligned rectangle containing every point.
    pub fn bounding<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x, max_y))
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            self.bottom_left,
            self.bottom_right,
            self.top_right,
            self.top_left,
        ]
    }

    pub fn width(&self) -> f64 {
        self.bottom_left.distance(self.bottom_right)
    }

    pub fn height(&self) -> f64 {
        self.bottom_left.distance(self.top_left)
    }

    pub fn left(&self) -> f64 {
        self.corners().iter().map(|p| p.x).fold(f64::INFINITY, f64::min)
    }

    pub fn right(&self) -> f64 {
        self.corners()
            .iter()
            .map(|p| p.x)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn bottom(&self) -> f64 {
        self.corners().iter().map(|p| p.y).fold(f64::INFINITY, f64::min)
    }

    pub fn top(&self) -> f64 {
        self.corners()
            .iter()
            .map(|p| p.y)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn centroid(&self) -> Point {
        let corners = self.corners();
        let sum = corners
            .iter()
            .fold(Point::ORIGIN, |acc, p| acc.translate(p.x, p.y));
        Point::new(sum.x / 4.0, sum.y / 4.0)
    }

    /// Angle of the bottom edge in degrees, counter-clockwise.
    pub fn rotation(&self) -> f64 {
        let dx = self.bottom_right.x - self.bottom_left.x;
        let dy = self.bottom_right.y - self.bottom_left.y;
        dy.atan2(dx).to_degrees()
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            top_left: self.top_left.translate(dx, dy),
            top_right: self.top_right.translate(dx, dy),
            bottom_left: self.bottom_left.translate(dx, dy),
            bottom_right: self.bottom_right.translate(dx, dy),
        }
    }

    /// Axis-aligned bounds of this rectangle.
    pub fn normalized(&self) -> Self {
        Self::new(self.left(), self.bottom(), self.right(), self.top())
    }

    pub fn is_axis_aligned(&self) -> bool {
        let eps = 1e-9;
        (self.bottom_left.y - self.bottom_right.y).abs() <= eps
            && (self.bottom_left.x - self.top_left.x).abs() <= eps
            && (self.top_left.y - self.top_right.y).abs() <= eps
            && (self.bottom_right.x - self.top_right.x).abs() <= eps
    }

    /// Point containment against the axis-aligned bounds.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.bottom() && p.y <= self.top()
    }

    /// Whether `other`'s axis-aligned bounds lie inside this rectangle's.
    pub fn contains_rect(&self, other: &Rectangle) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.bottom() >= self.bottom()
            && other.top() <= self.top()
    }

    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.left() <= other.right()
            && other.left() <= self.right()
            && self.bottom() <= other.top()
            && other.bottom() <= self.top()
    }

    /// Axis-aligned union of both rectangles.
    pub fn union(&self, other: &Rectangle) -> Self {
        Self::new(
            self.left().min(other.left()),
            self.bottom().min(other.bottom()),
            self.right().max(other.right()),
            self.top().max(other.top()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_round_trip_is_exact() {
        let offsets = [(0.5, -0.25), (1024.0, 3.75), (-17.125, 96.0)];
        let rects = [
            Rectangle::new(0.0, 0.0, 612.0, 792.0),
            Rectangle::new(-3.5, 2.25, 10.0, 40.5),
            Rectangle::from_corners(
                Point::new(-4.0, 3.0),
                Point::new(0.0, 6.0),
                Point::new(0.0, 0.0),
                Point::new(4.0, 3.0),
            ),
        ];
        for r in rects {
            for (dx, dy) in offsets {
                assert_eq!(r.translate(dx, dy).translate(-dx, -dy), r);
            }
        }
    }

    #[test]
    fn corners_are_normalized() {
        let r = Rectangle::new(10.0, 20.0, 2.0, 5.0);
        assert_eq!(r.bottom_left, Point::new(2.0, 5.0));
        assert_eq!(r.top_right, Point::new(10.0, 20.0));
        assert_eq!(r.width(), 8.0);
        assert_eq!(r.height(), 15.0);
    }

    #[test]
    fn rotated_rectangle_keeps_edge_lengths() {
        let r = Rectangle::from_corners(
            Point::new(-4.0, 3.0),
            Point::new(0.0, 6.0),
            Point::new(0.0, 0.0),
            Point::new(4.0, 3.0),
        );
        assert!((r.width() - 5.0).abs() < 1e-12);
        assert!((r.height() - 5.0).abs() < 1e-12);
        assert!((r.rotation() - 36.869_897_645_844_02).abs() < 1e-9);
        assert!(!r.is_axis_aligned());
        assert_eq!(r.left(), -4.0);
        assert_eq!(r.top(), 6.0);
    }

    #[test]
    fn union_and_intersection() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let b = Rectangle::new(20.0, 20.0, 30.0, 30.0);
        assert!(!a.intersects(&b));
        let u = a.union(&b);
        assert_eq!(u, Rectangle::new(0.0, 0.0, 30.0, 30.0));
        assert!(u.contains_rect(&a));
    }
}
