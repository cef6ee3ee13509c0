//! Affine transformation matrices.
//!
//! A matrix `[a b c d e f]` stands for
//!
//! ```text
//! | a b 0 |
//! | c d 0 |
//! | e f 1 |
//! ```
//!
//! and maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)` (row-vector
//! convention, as in the PDF reference).

use serde::Serialize;

use super::{Point, Rectangle};
use crate::error::{PdfError, Result};

/// Determinants smaller than this are treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Immutable 2D affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineTransform {
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Pure translation by `(tx, ty)`.
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Pure scale.
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Counter-clockwise rotation by `degrees`.
    pub fn rotation(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Builds a matrix from the six numbers of a PDF matrix array.
    pub fn from_array(values: &[f64]) -> Result<Self> {
        match values {
            [a, b, c, d, e, f] => Ok(Self::new(*a, *b, *c, *d, *e, *f)),
            _ => Err(PdfError::format(format!(
                "transformation matrix needs 6 numbers, got {}",
                values.len()
            ))),
        }
    }

    pub const fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Composes two transforms. `self` is applied first, then `other`.
    pub fn multiply(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform. Degenerate matrices are an error, never a panic.
    pub fn inverse(&self) -> Result<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return Err(PdfError::SingularTransform);
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Ok(Self {
            a,
            b,
            c,
            d,
            e: -(self.e * a + self.f * c),
            f: -(self.e * b + self.f * d),
        })
    }

    /// Moves the origin to `(tx, ty)` expressed in this matrix's own space.
    ///
    /// Equivalent to `translation(tx, ty).multiply(self)`; this is how the
    /// text matrix advances after each glyph.
    pub fn translate(&self, tx: f64, ty: f64) -> Self {
        Self {
            e: tx * self.a + ty * self.c + self.e,
            f: tx * self.b + ty * self.d + self.f,
            ..*self
        }
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Applies the linear part only.
    pub fn transform_vector(&self, v: Point) -> Point {
        Point::new(self.a * v.x + self.c * v.y, self.b * v.x + self.d * v.y)
    }

    /// Transforms all four corners, so rotation survives.
    pub fn transform_rect(&self, rect: &Rectangle) -> Rectangle {
        Rectangle::from_corners(
            self.transform_point(rect.top_left),
            self.transform_point(rect.top_right),
            self.transform_point(rect.bottom_left),
            self.transform_point(rect.bottom_right),
        )
    }

    /// Average scale factor of the linear part; used to carry line widths
    /// into device space.
    pub fn scaling_factor(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(x, y)| (x - y).abs() <= epsilon)
    }
}
