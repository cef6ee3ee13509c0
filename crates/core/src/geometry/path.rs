//! Paths and their paint parameters.

use serde::Serialize;

use super::{Point, Rectangle, Subpath};
use crate::model::color::Color;

/// Winding rule for fills and clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FillRule {
    #[default]
    NonZeroWinding,
    EvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    ProjectingSquare,
}

impl LineCap {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Butt),
            1 => Some(Self::Round),
            2 => Some(Self::ProjectingSquare),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Miter),
            1 => Some(Self::Round),
            2 => Some(Self::Bevel),
            _ => None,
        }
    }
}

/// Dash array and phase. An empty array is a solid line.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DashPattern {
    pub array: Vec<f64>,
    pub phase: f64,
}

impl DashPattern {
    pub fn is_solid(&self) -> bool {
        self.array.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillParams {
    pub color: Color,
    pub rule: FillRule,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrokeParams {
    pub color: Color,
    /// Device-space width.
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
    pub dash: DashPattern,
}

/// Sub-paths plus the paint intent they were finalized with.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Path {
    pub subpaths: Vec<Subpath>,
    /// Set when the path established a clip, with the rule used.
    pub clipping: Option<FillRule>,
    pub fill: Option<FillParams>,
    pub stroke: Option<StrokeParams>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_subpaths(subpaths: Vec<Subpath>) -> Self {
        Self {
            subpaths,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    pub fn is_clipping(&self) -> bool {
        self.clipping.is_some()
    }

    pub fn is_filled(&self) -> bool {
        self.fill.is_some()
    }

    pub fn is_stroked(&self) -> bool {
        self.stroke.is_some()
    }

    pub fn bounding_rectangle(&self) -> Option<Rectangle> {
        self.subpaths
            .iter()
            .map(Subpath::bounding_rectangle)
            .reduce(|a, b| a.union(&b))
    }

    /// A single rectangle drawn with axis-aligned edges.
    pub fn as_axis_aligned_rectangle(&self) -> Option<Rectangle> {
        match self.subpaths.as_slice() {
            [only] if only.is_drawn_as_rectangle() => Some(only.bounding_rectangle()),
            _ => None,
        }
    }

    /// Every vertex of every sub-path.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.subpaths
            .iter()
            .flat_map(|sp| sp.commands().iter().filter_map(|c| c.end_point()))
    }
}
