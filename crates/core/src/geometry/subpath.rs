//! Sub-paths: a start point followed by lines and curves.

use serde::Serialize;

use super::{Point, Rectangle, bezier};

/// One drawing command of a sub-path. Points are in device space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathCommand {
    Move(Point),
    Line(Point),
    QuadraticCurve { control: Point, end: Point },
    CubicCurve { c1: Point, c2: Point, end: Point },
    Close,
}

impl PathCommand {
    /// Point the pen ends at, if the command moves it.
    pub fn end_point(&self) -> Option<Point> {
        match self {
            Self::Move(p) | Self::Line(p) => Some(*p),
            Self::QuadraticCurve { end, .. } | Self::CubicCurve { end, .. } => Some(*end),
            Self::Close => None,
        }
    }
}

/// Append-only command list. The first command is always `Move`; `Close`,
/// when present, is the last.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subpath {
    commands: Vec<PathCommand>,
    #[serde(skip)]
    shoelace: f64,
    #[serde(skip)]
    start: Point,
    #[serde(skip)]
    current: Point,
}

impl Subpath {
    pub fn new(start: Point) -> Self {
        Self {
            commands: vec![PathCommand::Move(start)],
            shoelace: 0.0,
            start,
            current: start,
        }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn start_point(&self) -> Point {
        self.start
    }

    pub fn current_point(&self) -> Point {
        self.current
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.commands.last(), Some(PathCommand::Close))
    }

    /// Only a move, nothing drawn yet.
    pub fn is_empty(&self) -> bool {
        self.commands.len() == 1
    }

    fn accumulate(&mut self, to: Point) {
        self.shoelace += (to.x - self.current.x) * (to.y + self.current.y);
        self.current = to;
    }

    /// Appends a line. Returns `false` (and appends nothing) once closed.
    pub fn line_to(&mut self, to: Point) -> bool {
        if self.is_closed() {
            return false;
        }
        self.accumulate(to);
        self.commands.push(PathCommand::Line(to));
        true
    }

    pub fn quadratic_to(&mut self, control: Point, end: Point) -> bool {
        if self.is_closed() {
            return false;
        }
        self.accumulate(end);
        self.commands
            .push(PathCommand::QuadraticCurve { control, end });
        true
    }

    pub fn cubic_to(&mut self, c1: Point, c2: Point, end: Point) -> bool {
        if self.is_closed() {
            return false;
        }
        self.accumulate(end);
        self.commands.push(PathCommand::CubicCurve { c1, c2, end });
        true
    }

    /// Closes the sub-path and returns its start point. Closing twice is a
    /// no-op.
    pub fn close(&mut self) -> Point {
        let start = self.start_point();
        if !self.is_closed() {
            self.accumulate(start);
            self.commands.push(PathCommand::Close);
        }
        start
    }

    /// Running shoelace sum `Σ (x2 - x1)(y2 + y1)` over the endpoints added
    /// so far. Positive means clockwise in a y-up system.
    pub fn shoelace_sum(&self) -> f64 {
        self.shoelace
    }

    /// Orientation as if the sub-path were closed.
    fn closed_sum(&self) -> f64 {
        if self.is_closed() {
            self.shoelace
        } else {
            let start = self.start_point();
            self.shoelace + (start.x - self.current.x) * (start.y + self.current.y)
        }
    }

    pub fn is_clockwise(&self) -> bool {
        self.closed_sum() > 0.0
    }

    pub fn is_counter_clockwise(&self) -> bool {
        self.closed_sum() < 0.0
    }

    /// Mean of the command endpoints.
    pub fn centroid(&self) -> Point {
        let (sum, n) = self
            .commands
            .iter()
            .filter_map(PathCommand::end_point)
            .fold((Point::ORIGIN, 0usize), |(acc, n), p| {
                (acc.translate(p.x, p.y), n + 1)
            });
        Point::new(sum.x / n as f64, sum.y / n as f64)
    }

    /// Tight bounds; curves contribute their true extrema, not their
    /// control points.
    pub fn bounding_rectangle(&self) -> Rectangle {
        let mut prev = self.start_point();
        let mut bounds = Rectangle::from_points(prev, prev);
        for cmd in &self.commands[1..] {
            let piece = match *cmd {
                PathCommand::Move(p) | PathCommand::Line(p) => Rectangle::from_points(p, p),
                PathCommand::QuadraticCurve { control, end } => {
                    bezier::quadratic_bounds(prev, control, end)
                }
                PathCommand::CubicCurve { c1, c2, end } => bezier::cubic_bounds(prev, c1, c2, end),
                PathCommand::Close => continue,
            };
            bounds = bounds.union(&piece);
            if let Some(p) = cmd.end_point() {
                prev = p;
            }
        }
        bounds
    }

    /// Four axis-aligned edges, optionally repeating the start before
    /// closing.
    pub fn is_drawn_as_rectangle(&self) -> bool {
        let mut points: Vec<Point> = Vec::with_capacity(5);
        for cmd in &self.commands {
            match cmd {
                PathCommand::Move(p) | PathCommand::Line(p) => points.push(*p),
                PathCommand::Close => {}
                _ => return false,
            }
        }
        if points.len() == 5 && points[4] == points[0] {
            points.pop();
        }
        if points.len() != 4 {
            return false;
        }
        (0..4).all(|i| {
            let a = points[i];
            let b = points[(i + 1) % 4];
            a.x == b.x || a.y == b.y
        }) && self.bounding_rectangle().area() > 0.0
    }

    /// Polyline approximation with curves split into `segments` pieces.
    pub fn flatten(&self, segments: usize) -> Vec<Point> {
        let mut out = vec![self.start_point()];
        let mut prev = self.start_point();
        for cmd in &self.commands[1..] {
            match *cmd {
                PathCommand::Move(p) | PathCommand::Line(p) => out.push(p),
                PathCommand::QuadraticCurve { control, end } => {
                    for i in 1..=segments {
                        let t = i as f64 / segments as f64;
                        out.push(bezier::quadratic_point(prev, control, end, t));
                    }
                }
                PathCommand::CubicCurve { c1, c2, end } => {
                    for i in 1..=segments {
                        let t = i as f64 / segments as f64;
                        out.push(bezier::cubic_point(prev, c1, c2, end, t));
                    }
                }
                PathCommand::Close => {}
            }
            if let Some(p) = cmd.end_point() {
                prev = p;
            }
        }
        out
    }

    /// Builds a closed polygon sub-path from a point ring.
    pub fn from_polygon(ring: &[Point]) -> Option<Self> {
        let (first, rest) = ring.split_first()?;
        let mut sp = Self::new(*first);
        for p in rest {
            sp.line_to(*p);
        }
        sp.close();
        Some(sp)
    }

    /// Builds an open polyline sub-path.
    pub fn from_polyline(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut sp = Self::new(*first);
        for p in rest {
            sp.line_to(*p);
        }
        Some(sp)
    }
}
