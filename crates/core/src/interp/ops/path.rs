//! Path construction, painting and clipping operators.
//!
//! Handles: m, l, c, v, y, h, re, S, s, f, F, f*, B, B*, b, b*, n, W, W*
//!
//! Coordinates are mapped through the CTM as they are appended, so a later
//! `cm` does not move segments already in the path.

use tracing::{debug, warn};

use crate::geometry::{FillParams, FillRule, Point, StrokeParams, clip};
use crate::interp::processor::ContentStreamProcessor;

#[allow(non_snake_case)]
impl ContentStreamProcessor<'_> {
    // ========================================================================
    // Path Construction Operators
    // ========================================================================

    /// Begins a new subpath at the given point.
    ///
    /// PDF operator: `m`
    pub fn do_m(&mut self, x: f64, y: f64) {
        let p = self.to_device(x, y);
        self.path.begin_subpath(p);
    }

    /// Appends a straight line segment from the current point.
    ///
    /// PDF operator: `l`
    pub fn do_l(&mut self, x: f64, y: f64) {
        let p = self.to_device(x, y);
        self.path.line_to(p);
    }

    /// Appends a cubic Bezier curve to the path.
    ///
    /// PDF operator: `c`
    pub fn do_c(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        let (c1, c2, end) = (
            self.to_device(x1, y1),
            self.to_device(x2, y2),
            self.to_device(x3, y3),
        );
        self.path.curve_to(c1, c2, end);
    }

    /// Appends a cubic Bezier curve with the current point as first control point.
    ///
    /// PDF operator: `v`
    pub fn do_v(&mut self, x2: f64, y2: f64, x3: f64, y3: f64) {
        let (c2, end) = (self.to_device(x2, y2), self.to_device(x3, y3));
        self.path.curve_to_v(c2, end);
    }

    /// Appends a cubic Bezier curve with the endpoint as second control point.
    ///
    /// PDF operator: `y`
    pub fn do_y(&mut self, x1: f64, y1: f64, x3: f64, y3: f64) {
        let (c1, end) = (self.to_device(x1, y1), self.to_device(x3, y3));
        self.path.curve_to_y(c1, end);
    }

    /// Closes the current subpath.
    ///
    /// PDF operator: `h`
    pub fn do_h(&mut self) {
        self.path.close_subpath();
    }

    /// Appends a rectangle as a complete subpath. Each corner is mapped
    /// separately so rotation and skew are kept.
    ///
    /// PDF operator: `re`
    pub fn do_re(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let corners = [
            self.to_device(x, y),
            self.to_device(x + w, y),
            self.to_device(x + w, y + h),
            self.to_device(x, y + h),
        ];
        self.path.rectangle(corners);
    }

    // ========================================================================
    // Path Painting Operators
    // ========================================================================

    /// Finalizes the current path with its paint intent, clips it and
    /// records it.
    fn paint_path(&mut self, fill: Option<FillRule>, stroke: bool, close: bool) {
        if close {
            self.path.close_subpath();
        }
        let (path, clip_rule) = self.path.finish();
        let Some(mut path) = path else {
            debug!("paint operator without a path");
            return;
        };

        let gs = self.gs();
        if let Some(rule) = fill {
            path.fill = Some(FillParams {
                color: gs.colors.fill_color().clone(),
                rule,
            });
        }
        if stroke {
            path.stroke = Some(StrokeParams {
                color: gs.colors.stroke_color().clone(),
                width: gs.line_width * gs.ctm.scaling_factor(),
                cap: gs.line_cap,
                join: gs.line_join,
                miter_limit: gs.miter_limit,
                dash: gs.dash.clone(),
            });
        }
        path.clipping = clip_rule;

        // The clip itself was installed by W/W*. Nothing is painted, so
        // marked content does not see it.
        if path.is_clipping() && !path.is_filled() && !path.is_stroked() {
            if !self.options.clip_paths {
                self.content.paths.push(path);
            }
            return;
        }

        match self.clip_to_active(path) {
            Some(visible) => self.emit_path(visible),
            None => warn!(
                page = self.page.page_number,
                "path lies outside the clipping path, dropped"
            ),
        }
    }

    /// Strokes the current path.
    ///
    /// PDF operator: `S`
    pub fn do_S(&mut self) {
        self.paint_path(None, true, false);
    }

    /// Closes and strokes the current path.
    ///
    /// Equivalent to: h S
    ///
    /// PDF operator: `s`
    pub fn do_s(&mut self) {
        self.paint_path(None, true, true);
    }

    /// Fills the current path using the nonzero winding number rule.
    ///
    /// PDF operator: `f`
    pub fn do_f(&mut self) {
        self.paint_path(Some(FillRule::NonZeroWinding), false, false);
    }

    /// Fills the current path using the nonzero winding number rule (obsolete).
    ///
    /// PDF operator: `F`
    pub fn do_F(&mut self) {
        self.do_f();
    }

    /// Fills the current path using the even-odd rule.
    ///
    /// PDF operator: `f*`
    pub fn do_f_star(&mut self) {
        self.paint_path(Some(FillRule::EvenOdd), false, false);
    }

    /// Fills and strokes the current path using the nonzero winding number rule.
    ///
    /// PDF operator: `B`
    pub fn do_B(&mut self) {
        self.paint_path(Some(FillRule::NonZeroWinding), true, false);
    }

    /// Fills and strokes the current path using the even-odd rule.
    ///
    /// PDF operator: `B*`
    pub fn do_B_star(&mut self) {
        self.paint_path(Some(FillRule::EvenOdd), true, false);
    }

    /// Closes, fills, and strokes the current path using the nonzero winding number rule.
    ///
    /// Equivalent to: h B
    ///
    /// PDF operator: `b`
    pub fn do_b(&mut self) {
        self.paint_path(Some(FillRule::NonZeroWinding), true, true);
    }

    /// Closes, fills, and strokes the current path using the even-odd rule.
    ///
    /// Equivalent to: h B*
    ///
    /// PDF operator: `b*`
    pub fn do_b_star(&mut self) {
        self.paint_path(Some(FillRule::EvenOdd), true, true);
    }

    /// Ends the path without filling or stroking it.
    ///
    /// PDF operator: `n`
    pub fn do_n(&mut self) {
        self.paint_path(None, false, false);
    }

    // ========================================================================
    // Clipping Path Operators
    // ========================================================================

    /// Intersects the active clip with the current path. The path stays
    /// open and is ended by the next painting operator.
    fn install_clip(&mut self, rule: FillRule) {
        self.path.set_clip(rule);
        if !self.options.clip_paths {
            return;
        }
        let Some(mut candidate) = self.path.peek() else {
            debug!("clip operator without a path");
            return;
        };
        candidate.clipping = Some(rule);
        match clip::clip_path(&candidate, &self.gs().clipping_path) {
            Some(new_clip) => self.gs_mut().clipping_path = new_clip,
            None => warn!(
                page = self.page.page_number,
                "clipping path does not intersect the active clip, clip unchanged"
            ),
        }
    }

    /// Sets the clipping path using the nonzero winding number rule.
    ///
    /// PDF operator: `W`
    pub fn do_W(&mut self) {
        self.install_clip(FillRule::NonZeroWinding);
    }

    /// Sets the clipping path using the even-odd rule.
    ///
    /// PDF operator: `W*`
    pub fn do_W_star(&mut self) {
        self.install_clip(FillRule::EvenOdd);
    }

    /// Current point in device space, if a sub-path is open.
    pub fn current_point(&self) -> Option<Point> {
        self.path.current_point()
    }
}
