//! Accumulates sub-paths between path-construction and painting operators.
//!
//! Points arrive already transformed into device space.

use tracing::debug;

use crate::geometry::{FillRule, Path, Point, Subpath};

#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    path: Option<Path>,
    subpath: Option<Subpath>,
    /// Rule of a pending `W`/`W*`.
    clip: Option<FillRule>,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.subpath.is_none()
    }

    pub fn current_point(&self) -> Option<Point> {
        self.subpath.as_ref().map(Subpath::current_point)
    }

    /// Moves the open sub-path into the current path.
    fn flush(&mut self) {
        if let Some(subpath) = self.subpath.take() {
            self.path.get_or_insert_with(Path::new).subpaths.push(subpath);
        }
    }

    /// Starts a new sub-path at `start` (`m`).
    pub fn begin_subpath(&mut self, start: Point) {
        self.flush();
        self.subpath = Some(Subpath::new(start));
    }

    /// Sub-path to extend. Drawing after `h` continues from the closed
    /// sub-path's start point in a new sub-path.
    fn open_subpath(&mut self, op: &str) -> Option<&mut Subpath> {
        let Some(current) = self.subpath.as_ref() else {
            debug!(op, "no current point, ignoring");
            return None;
        };
        if current.is_closed() {
            let start = current.start_point();
            self.begin_subpath(start);
        }
        self.subpath.as_mut()
    }

    pub fn line_to(&mut self, to: Point) {
        if let Some(sp) = self.open_subpath("l") {
            sp.line_to(to);
        }
    }

    pub fn curve_to(&mut self, c1: Point, c2: Point, end: Point) {
        if let Some(sp) = self.open_subpath("c") {
            sp.cubic_to(c1, c2, end);
        }
    }

    /// `v`: the first control point is the current point.
    pub fn curve_to_v(&mut self, c2: Point, end: Point) {
        if let Some(sp) = self.open_subpath("v") {
            let c1 = sp.current_point();
            sp.cubic_to(c1, c2, end);
        }
    }

    /// `y`: the second control point is the end point.
    pub fn curve_to_y(&mut self, c1: Point, end: Point) {
        if let Some(sp) = self.open_subpath("y") {
            sp.cubic_to(c1, end, end);
        }
    }

    /// Closes the open sub-path and returns its start point.
    pub fn close_subpath(&mut self) -> Option<Point> {
        match self.subpath.as_mut() {
            Some(sp) => Some(sp.close()),
            None => {
                debug!("h without a current sub-path");
                None
            }
        }
    }

    /// `re`: four device-space corners as one closed sub-path, flushed
    /// immediately.
    pub fn rectangle(&mut self, corners: [Point; 4]) {
        self.begin_subpath(corners[0]);
        if let Some(sp) = self.subpath.as_mut() {
            for corner in &corners[1..] {
                sp.line_to(*corner);
            }
            sp.close();
        }
        self.flush();
    }

    /// Marks the path as clip-establishing (`W`/`W*`).
    pub fn set_clip(&mut self, rule: FillRule) {
        self.clip = Some(rule);
    }

    pub fn pending_clip(&self) -> Option<FillRule> {
        self.clip
    }

    /// The path built so far without ending it, e.g. to install a clip.
    pub fn peek(&mut self) -> Option<Path> {
        self.flush();
        self.path.clone()
    }

    /// Ends the path: the builder is idle again. Returns the path and the
    /// clip rule it was marked with, if any.
    pub fn finish(&mut self) -> (Option<Path>, Option<FillRule>) {
        self.flush();
        let path = self.path.take().filter(|p| !p.is_empty());
        (path, self.clip.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PathCommand;

    #[test]
    fn lines_without_current_point_are_ignored() {
        let mut b = PathBuilder::new();
        b.line_to(Point::new(1.0, 1.0));
        assert!(b.is_empty());
        assert_eq!(b.close_subpath(), None);
    }

    #[test]
    fn subpaths_accumulate_into_one_path() {
        let mut b = PathBuilder::new();
        b.begin_subpath(Point::ORIGIN);
        b.line_to(Point::new(10.0, 0.0));
        b.begin_subpath(Point::new(0.0, 5.0));
        b.line_to(Point::new(10.0, 5.0));
        let (path, clip) = b.finish();
        let path = path.unwrap();
        assert_eq!(path.subpaths.len(), 2);
        assert_eq!(path.subpaths[0].commands().len(), 2);
        assert_eq!(clip, None);
        assert!(b.is_empty());
    }

    #[test]
    fn v_and_y_fill_in_control_points() {
        let mut b = PathBuilder::new();
        b.begin_subpath(Point::ORIGIN);
        b.curve_to_v(Point::new(1.0, 1.0), Point::new(2.0, 0.0));
        b.curve_to_y(Point::new(3.0, 1.0), Point::new(4.0, 0.0));
        let (path, _) = b.finish();
        let cmds = path.unwrap().subpaths[0].commands().to_vec();
        assert_eq!(
            cmds[1],
            PathCommand::CubicCurve {
                c1: Point::ORIGIN,
                c2: Point::new(1.0, 1.0),
                end: Point::new(2.0, 0.0)
            }
        );
        assert_eq!(
            cmds[2],
            PathCommand::CubicCurve {
                c1: Point::new(3.0, 1.0),
                c2: Point::new(4.0, 0.0),
                end: Point::new(4.0, 0.0)
            }
        );
    }

    #[test]
    fn drawing_after_close_starts_at_the_old_start() {
        let mut b = PathBuilder::new();
        b.begin_subpath(Point::new(1.0, 1.0));
        b.line_to(Point::new(5.0, 1.0));
        assert_eq!(b.close_subpath(), Some(Point::new(1.0, 1.0)));
        b.line_to(Point::new(1.0, 9.0));
        let (path, _) = b.finish();
        let path = path.unwrap();
        assert_eq!(path.subpaths.len(), 2);
        assert!(path.subpaths[0].is_closed());
        assert_eq!(path.subpaths[1].start_point(), Point::new(1.0, 1.0));
    }

    #[test]
    fn rectangle_is_closed_and_flushed() {
        let mut b = PathBuilder::new();
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 2.0),
            Point::new(0.0, 2.0),
        ];
        b.rectangle(corners);
        assert_eq!(b.current_point(), None);
        b.set_clip(FillRule::EvenOdd);
        let (path, clip) = b.finish();
        let path = path.unwrap();
        let rect = &path.subpaths[0];
        assert!(rect.is_closed());
        assert!(rect.is_drawn_as_rectangle());
        assert_eq!(clip, Some(FillRule::EvenOdd));
    }
}
