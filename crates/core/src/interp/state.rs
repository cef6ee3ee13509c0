//! Graphics state and the `q`/`Q` stack.
//!
//! Every frame is an independent value: `push` clones the top frame, clip
//! path and text state included, so later changes never leak back into a
//! saved frame.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::color::ColorSpaceContext;
use super::font::Font;
use crate::error::{PdfError, Result};
use crate::geometry::{AffineTransform, DashPattern, FillRule, LineCap, LineJoin, Path, Subpath};
use crate::model::objects::{Dictionary, Name};

/// `Tr` operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TextRenderingMode {
    #[default]
    Fill,
    Stroke,
    FillStroke,
    Invisible,
    FillClip,
    StrokeClip,
    FillStrokeClip,
    Clip,
}

impl TextRenderingMode {
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            0 => Self::Fill,
            1 => Self::Stroke,
            2 => Self::FillStroke,
            3 => Self::Invisible,
            4 => Self::FillClip,
            5 => Self::StrokeClip,
            6 => Self::FillStrokeClip,
            7 => Self::Clip,
            _ => return None,
        })
    }
}

/// Font set through an ExtGState `/Font` entry. Equality is identity.
#[derive(Clone)]
pub struct ExtGStateFont(pub Arc<dyn Font>);

impl PartialEq for ExtGStateFont {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ExtGStateFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExtGStateFont").field(&self.0.name()).finish()
    }
}

/// Text parameters of the graphics state.
#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
    pub font_name: Option<Name>,
    pub font_size: f64,
    pub character_spacing: f64,
    pub word_spacing: f64,
    /// Percent; 100 is unscaled.
    pub horizontal_scaling: f64,
    pub leading: f64,
    pub rise: f64,
    pub rendering_mode: TextRenderingMode,
    pub knockout: bool,
    /// The active font came from `gs` rather than `Tf`.
    pub from_ext_gstate: bool,
    pub ext_gstate_font: Option<ExtGStateFont>,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_name: None,
            font_size: 0.0,
            character_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            rise: 0.0,
            rendering_mode: TextRenderingMode::Fill,
            knockout: true,
            from_ext_gstate: false,
            ext_gstate_font: None,
        }
    }
}

impl TextState {
    pub fn horizontal_scale(&self) -> f64 {
        self.horizontal_scaling / 100.0
    }

    pub fn clear_ext_gstate_font(&mut self) {
        self.from_ext_gstate = false;
        self.ext_gstate_font = None;
    }
}

/// One frame of the graphics state stack.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    pub ctm: AffineTransform,
    pub colors: ColorSpaceContext,
    pub line_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
    pub dash: DashPattern,
    pub rendering_intent: Name,
    pub stroke_alpha: f64,
    pub fill_alpha: f64,
    pub flatness: f64,
    pub smoothness: f64,
    pub stroke_adjustment: bool,
    pub overprint_stroke: bool,
    pub overprint_fill: bool,
    pub overprint_mode: i64,
    pub blend_mode: Name,
    /// `/SMask` dictionary from `gs`, `None` for `/None`.
    pub soft_mask: Option<Dictionary>,
    pub alpha_is_shape: bool,
    /// Device-space clip with its rule in `clipping`.
    pub clipping_path: Path,
    pub text: TextState,
    pub text_matrix: AffineTransform,
    pub text_line_matrix: AffineTransform,
}

impl GraphicsState {
    /// Root frame: `ctm` is the page's initial transform and the clip is
    /// `clip` (already in device space).
    pub fn new(ctm: AffineTransform, clip: Subpath) -> Self {
        let mut clipping_path = Path::from_subpaths(vec![clip]);
        clipping_path.clipping = Some(FillRule::NonZeroWinding);
        Self {
            ctm,
            colors: ColorSpaceContext::default(),
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: DashPattern::default(),
            rendering_intent: Name::new_static("RelativeColorimetric"),
            stroke_alpha: 1.0,
            fill_alpha: 1.0,
            flatness: 1.0,
            smoothness: 0.0,
            stroke_adjustment: false,
            overprint_stroke: false,
            overprint_fill: false,
            overprint_mode: 0,
            blend_mode: Name::new_static("Normal"),
            soft_mask: None,
            alpha_is_shape: false,
            clipping_path,
            text: TextState::default(),
            text_matrix: AffineTransform::IDENTITY,
            text_line_matrix: AffineTransform::IDENTITY,
        }
    }

    /// Clears transparency group state on entry to a group XObject.
    pub fn reset_transparency(&mut self) {
        self.blend_mode = Name::new_static("Normal");
        self.stroke_alpha = 1.0;
        self.fill_alpha = 1.0;
        self.soft_mask = None;
    }
}

/// Stack of graphics states. Never empty: the top frame is held apart from
/// the saved ones.
#[derive(Debug, Clone)]
pub struct GraphicsStateStack {
    top: GraphicsState,
    saved: Vec<GraphicsState>,
}

impl GraphicsStateStack {
    pub fn new(root: GraphicsState) -> Self {
        Self {
            top: root,
            saved: Vec::new(),
        }
    }

    /// Saves a copy of the current frame (`q`).
    pub fn push(&mut self) {
        self.saved.push(self.top.clone());
    }

    /// Restores the previously saved frame (`Q`). Any font activated by
    /// an ExtGState is dropped.
    pub fn pop(&mut self) -> Result<()> {
        let previous = self.saved.pop().ok_or(PdfError::GraphicsStateUnderflow)?;
        self.top = previous;
        self.top.text.clear_ext_gstate_font();
        Ok(())
    }

    /// Pops back down to `len` frames. Used to restore the stack after a
    /// form whose own `q`/`Q` did not balance.
    pub fn truncate(&mut self, len: usize) {
        while self.len() > len.max(1) {
            if self.pop().is_err() {
                break;
            }
        }
    }

    pub fn current(&self) -> &GraphicsState {
        &self.top
    }

    pub fn current_mut(&mut self) -> &mut GraphicsState {
        &mut self.top
    }

    /// Number of saved frames below the current one.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn len(&self) -> usize {
        self.saved.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}
