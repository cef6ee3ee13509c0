//! Graphics state operators.
//!
//! Handles: q, Q, cm, w, J, j, M, d, ri, i, gs
//!
//! - q/Q: Push/pop graphics state
//! - cm: Concatenate transformation matrix
//! - w, J, j, M, d: Line styling (width, cap, join, miter limit, dash)
//! - ri, i: Rendering intent and flatness
//! - gs: Set parameters from an ExtGState dictionary

use tracing::{debug, warn};

use crate::error::{PdfError, Result};
use crate::geometry::{AffineTransform, DashPattern, LineCap, LineJoin};
use crate::interp::processor::ContentStreamProcessor;
use crate::interp::state::ExtGStateFont;
use crate::model::objects::{Dictionary, Name, Object};

#[allow(non_snake_case)]
impl ContentStreamProcessor<'_> {
    /// Saves the current graphics state to the stack.
    ///
    /// PDF operator: `q`
    pub fn do_q(&mut self) {
        self.gstack.push();
    }

    /// Restores the graphics state from the stack.
    ///
    /// At page level an unmatched `Q` is an error. Inside a form it is
    /// ignored so the form cannot restore its caller's state.
    ///
    /// PDF operator: `Q`
    pub fn do_Q(&mut self) -> Result<()> {
        if self.gstack.len() <= self.gstack_floor && self.gstack_floor > 1 {
            warn!(page = self.page.page_number, "Q without matching q inside form, ignored");
            return Ok(());
        }
        self.gstack.pop()
    }

    /// Concatenates a matrix to the current transformation matrix.
    ///
    /// PDF operator: `cm`
    pub fn do_cm(&mut self, matrix: &AffineTransform) {
        let gs = self.gs_mut();
        gs.ctm = matrix.multiply(&gs.ctm);
    }

    /// Sets the line width in user space.
    ///
    /// PDF operator: `w`
    pub fn do_w(&mut self, width: f64) {
        self.gs_mut().line_width = width;
    }

    /// PDF operator: `J`
    pub fn do_J(&mut self, cap: LineCap) {
        self.gs_mut().line_cap = cap;
    }

    /// PDF operator: `j`
    pub fn do_j(&mut self, join: LineJoin) {
        self.gs_mut().line_join = join;
    }

    /// PDF operator: `M`
    pub fn do_M(&mut self, limit: f64) {
        self.gs_mut().miter_limit = limit;
    }

    /// Sets the dash pattern.
    ///
    /// PDF operator: `d`
    pub fn do_d(&mut self, dash: &DashPattern) {
        self.gs_mut().dash = dash.clone();
    }

    /// Sets the colour rendering intent.
    ///
    /// PDF operator: `ri`
    pub fn do_ri(&mut self, intent: &Name) {
        self.gs_mut().rendering_intent = intent.clone();
    }

    /// Sets the flatness tolerance.
    ///
    /// PDF operator: `i`
    pub fn do_i(&mut self, flatness: f64) {
        self.gs_mut().flatness = flatness;
    }

    /// Applies the named ExtGState dictionary.
    ///
    /// PDF operator: `gs`
    pub fn do_gs(&mut self, name: &Name) -> Result<()> {
        let lookup = self.resources.ext_graphics_state(name);
        let Some(dict) = self.tolerate_missing(lookup)? else {
            return Ok(());
        };
        self.apply_ext_gstate(&dict)
    }

    /// Sets every recognised ExtGState entry. Unknown keys are ignored.
    pub(crate) fn apply_ext_gstate(&mut self, dict: &Dictionary) -> Result<()> {
        for (key, value) in dict {
            match key.as_str() {
                "LW" => self.gs_mut().line_width = value.as_num()?,
                "LC" => {
                    if let Some(cap) = LineCap::from_code(value.as_int()?) {
                        self.gs_mut().line_cap = cap;
                    }
                }
                "LJ" => {
                    if let Some(join) = LineJoin::from_code(value.as_int()?) {
                        self.gs_mut().line_join = join;
                    }
                }
                "ML" => self.gs_mut().miter_limit = value.as_num()?,
                "D" => self.gs_mut().dash = read_dash(value)?,
                "RI" => self.gs_mut().rendering_intent = Name::new(value.as_name()?),
                "FL" => self.gs_mut().flatness = value.as_num()?,
                "SM" => self.gs_mut().smoothness = value.as_num()?,
                "SA" => self.gs_mut().stroke_adjustment = value.as_bool()?,
                "OP" => {
                    let overprint = value.as_bool()?;
                    let gs = self.gs_mut();
                    gs.overprint_stroke = overprint;
                    // /op defaults to /OP.
                    if !dict.contains_key("op") {
                        gs.overprint_fill = overprint;
                    }
                }
                "op" => self.gs_mut().overprint_fill = value.as_bool()?,
                "OPM" => self.gs_mut().overprint_mode = value.as_int()?,
                "CA" => self.gs_mut().stroke_alpha = value.as_num()?,
                "ca" => self.gs_mut().fill_alpha = value.as_num()?,
                "BM" => self.gs_mut().blend_mode = read_blend_mode(value)?,
                "SMask" => {
                    self.gs_mut().soft_mask = match value {
                        Object::Name(n) if n == "None" => None,
                        other => Some(other.as_dict()?.clone()),
                    }
                }
                "AIS" => self.gs_mut().alpha_is_shape = value.as_bool()?,
                "TK" => self.gs_mut().text.knockout = value.as_bool()?,
                "Font" => self.apply_ext_gstate_font(value)?,
                other => debug!(key = other, "ExtGState entry ignored"),
            }
        }
        Ok(())
    }

    /// `/Font [font size]`
    fn apply_ext_gstate_font(&mut self, value: &Object) -> Result<()> {
        let [font_ref, size] = value.as_array()? else {
            return Err(PdfError::format("ExtGState /Font must be [font size]"));
        };
        let size = size.as_num()?;
        let lookup = self.resources.font_from_reference(font_ref);
        let Some(font) = self.tolerate_missing(lookup)? else {
            return Ok(());
        };
        let text = &mut self.gs_mut().text;
        text.font_size = size;
        text.from_ext_gstate = true;
        text.ext_gstate_font = Some(ExtGStateFont(font));
        Ok(())
    }
}

fn read_dash(value: &Object) -> Result<DashPattern> {
    match value.as_array()? {
        [array, phase] => Ok(DashPattern {
            array: array.as_numbers()?,
            phase: phase.as_num()?,
        }),
        _ => Err(PdfError::format("ExtGState /D must be [array phase]")),
    }
}

/// A name, or an array whose first supported entry is used.
fn read_blend_mode(value: &Object) -> Result<Name> {
    match value {
        Object::Name(n) => Ok(n.clone()),
        Object::Array(items) => Ok(items
            .iter()
            .find_map(|o| o.as_name().ok())
            .map(Name::new)
            .unwrap_or_else(|| Name::new_static("Normal"))),
        other => Err(PdfError::TypeError {
            expected: "name",
            got: other.type_name(),
        }),
    }
}
