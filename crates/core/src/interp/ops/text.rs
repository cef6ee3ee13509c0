//! Text operators.
//!
//! Handles: BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts, Td, TD, Tm, T*, Tj, TJ, ', "
//!
//! Text object:
//! - BT/ET: Begin/end text object
//!
//! Text state:
//! - Tc: Character spacing
//! - Tw: Word spacing
//! - Tz: Horizontal scaling
//! - TL: Leading
//! - Tf: Font and size
//! - Tr: Rendering mode
//! - Ts: Rise (baseline offset)
//!
//! Text positioning:
//! - Td/TD: Move to next line (TD also sets leading)
//! - Tm: Set text matrix directly
//! - T*: Move to next line using current leading
//!
//! Text showing:
//! - Tj: Show string
//! - TJ: Show with individual glyph positioning
//! - ': Move to next line and show
//! - ": Set spacing, move to next line, and show

use std::sync::Arc;

use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::{PdfError, Result, ResourceKind};
use crate::geometry::{AffineTransform, Point};
use crate::interp::content::Letter;
use crate::interp::font::Font;
use crate::interp::operation::TextItem;
use crate::interp::processor::ContentStreamProcessor;
use crate::interp::state::TextRenderingMode;
use crate::model::objects::Name;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[allow(non_snake_case)]
impl ContentStreamProcessor<'_> {
    // ========================================================================
    // Text Object Operators
    // ========================================================================

    /// Begins a text object.
    ///
    /// Resets the text matrix and text line matrix to identity.
    ///
    /// PDF operator: `BT`
    pub fn do_BT(&mut self) {
        let gs = self.gs_mut();
        gs.text_matrix = AffineTransform::IDENTITY;
        gs.text_line_matrix = AffineTransform::IDENTITY;
    }

    /// Ends a text object. Text state persists.
    ///
    /// PDF operator: `ET`
    pub fn do_ET(&mut self) {}

    // ========================================================================
    // Text State Operators
    // ========================================================================

    /// PDF operator: `Tc`
    pub fn do_Tc(&mut self, spacing: f64) {
        self.gs_mut().text.character_spacing = spacing;
    }

    /// PDF operator: `Tw`
    pub fn do_Tw(&mut self, spacing: f64) {
        self.gs_mut().text.word_spacing = spacing;
    }

    /// Sets horizontal scaling in percent (100 = normal width).
    ///
    /// PDF operator: `Tz`
    pub fn do_Tz(&mut self, scaling: f64) {
        self.gs_mut().text.horizontal_scaling = scaling;
    }

    /// PDF operator: `TL`
    pub fn do_TL(&mut self, leading: f64) {
        self.gs_mut().text.leading = leading;
    }

    /// Selects a font by resource name. The font is resolved when text is
    /// shown, so a missing font only matters if it is used.
    ///
    /// PDF operator: `Tf`
    pub fn do_Tf(&mut self, name: &Name, size: f64) {
        let text = &mut self.gs_mut().text;
        text.font_name = Some(name.clone());
        text.font_size = size;
        text.clear_ext_gstate_font();
    }

    /// PDF operator: `Tr`
    pub fn do_Tr(&mut self, mode: i64) {
        match TextRenderingMode::from_code(mode) {
            Some(mode) => self.gs_mut().text.rendering_mode = mode,
            None => warn!(mode, "invalid text rendering mode, ignored"),
        }
    }

    /// PDF operator: `Ts`
    pub fn do_Ts(&mut self, rise: f64) {
        self.gs_mut().text.rise = rise;
    }

    // ========================================================================
    // Text Positioning Operators
    // ========================================================================

    /// Moves to the start of the next line, offset by `(tx, ty)`.
    ///
    /// PDF operator: `Td`
    pub fn do_Td(&mut self, tx: f64, ty: f64) {
        let gs = self.gs_mut();
        gs.text_line_matrix = gs.text_line_matrix.translate(tx, ty);
        gs.text_matrix = gs.text_line_matrix;
    }

    /// Like `Td`, also setting the leading to `-ty`.
    ///
    /// PDF operator: `TD`
    pub fn do_TD(&mut self, tx: f64, ty: f64) {
        self.gs_mut().text.leading = -ty;
        self.do_Td(tx, ty);
    }

    /// Sets both the text matrix and the text line matrix.
    ///
    /// PDF operator: `Tm`
    pub fn do_Tm(&mut self, matrix: &AffineTransform) {
        let gs = self.gs_mut();
        gs.text_matrix = *matrix;
        gs.text_line_matrix = *matrix;
    }

    /// Moves to the start of the next line.
    ///
    /// Equivalent to: 0 -TL Td
    ///
    /// PDF operator: `T*`
    pub fn do_T_star(&mut self) {
        let leading = self.gs().text.leading;
        self.do_Td(0.0, -leading);
    }

    // ========================================================================
    // Text Showing Operators
    // ========================================================================

    /// PDF operator: `Tj`
    pub fn do_Tj(&mut self, bytes: &[u8]) -> Result<()> {
        self.show_text(bytes)
    }

    /// Shows strings with positioning adjustments in between.
    ///
    /// PDF operator: `TJ`
    pub fn do_TJ(&mut self, items: &[TextItem]) -> Result<()> {
        let adjusts = items.iter().any(|i| matches!(i, TextItem::Adjustment(_)));
        let vertical = adjusts && self.active_font()?.is_some_and(|f| f.is_vertical());
        for item in items {
            match item {
                TextItem::Text(bytes) => self.show_text(bytes)?,
                TextItem::Adjustment(n) => self.adjust_text_position(*n, vertical),
            }
        }
        Ok(())
    }

    /// Equivalent to: T* Tj
    ///
    /// PDF operator: `'`
    pub fn do_quote(&mut self, bytes: &[u8]) -> Result<()> {
        self.do_T_star();
        self.show_text(bytes)
    }

    /// Equivalent to: aw Tw ac Tc T* Tj
    ///
    /// PDF operator: `"`
    pub fn do_doublequote(&mut self, aw: f64, ac: f64, bytes: &[u8]) -> Result<()> {
        self.do_Tw(aw);
        self.do_Tc(ac);
        self.do_quote(bytes)
    }

    /// A `TJ` number: thousandths of text space, positive moves left (or
    /// down for vertical fonts).
    fn adjust_text_position(&mut self, adjustment: f64, vertical: bool) {
        let gs = self.gs_mut();
        let size = gs.text.font_size;
        let offset = -adjustment / 1000.0 * size;
        gs.text_matrix = if vertical {
            gs.text_matrix.translate(0.0, offset)
        } else {
            gs.text_matrix.translate(offset * gs.text.horizontal_scale(), 0.0)
        };
    }

    fn active_font(&mut self) -> Result<Option<Arc<dyn Font>>> {
        let text = &self.gs().text;
        if text.from_ext_gstate {
            if let Some(font) = &text.ext_gstate_font {
                return Ok(Some(Arc::clone(&font.0)));
            }
        }
        let Some(name) = text.font_name.clone() else {
            let err = PdfError::missing(ResourceKind::Font, "");
            return self.tolerate_missing(Err(err));
        };
        let lookup = self.resources.font(&name);
        self.tolerate_missing(lookup)
    }

    /// Places every glyph of `bytes` and advances the text matrix.
    pub(crate) fn show_text(&mut self, bytes: &[u8]) -> Result<()> {
        let Some(font) = self.active_font()? else {
            return Ok(());
        };
        self.text_sequence += 1;
        let sequence = self.text_sequence;

        let gs = self.gs();
        let ctm = gs.ctm;
        let text = gs.text.clone();
        let (stroke_color, fill_color) = (
            gs.colors.stroke_color().clone(),
            gs.colors.fill_color().clone(),
        );
        let size = text.font_size;
        let th = text.horizontal_scale();
        let vertical = font.is_vertical();
        let font_name = text
            .font_name
            .clone()
            .unwrap_or_else(|| Name::new(font.name()));
        let point_size = round2(
            size * gs
                .text_matrix
                .multiply(&ctm)
                .transform_vector(Point::new(0.0, 1.0))
                .length(),
        );
        let render = AffineTransform::new(size * th, 0.0, 0.0, size, 0.0, text.rise);

        let mut tm = gs.text_matrix;
        let mut pending: Option<Letter> = None;
        let mut rest = bytes;
        let mut first = true;
        while !rest.is_empty() {
            if !first {
                tm = if vertical {
                    tm.translate(0.0, text.character_spacing)
                } else {
                    tm.translate(text.character_spacing * th, 0.0)
                };
            }
            first = false;

            let (code, consumed) = font.read_character_code(rest);
            let consumed = consumed.clamp(1, rest.len());
            rest = &rest[consumed..];

            let value = font.unicode(code).unwrap_or_else(|| {
                warn!(code, font = font.name(), "no unicode mapping, using the raw code");
                char::from_u32(code)
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
                    .to_string()
            });
            let bbox = font.bounding_box(code);

            let glyph_tm = if vertical {
                let v = font.position_vector(code);
                tm.translate(-v.x * size, -v.y * size)
            } else {
                tm
            };
            let full = render.multiply(&glyph_tm).multiply(&ctm);
            let glyph_rectangle = full.transform_rect(&bbox.glyph_bounds);
            let start_base_line = full.transform_point(Point::ORIGIN);
            let end_base_line = full.transform_point(Point::new(bbox.width, 0.0));

            let word_spacing = if code == 32 && consumed == 1 {
                text.word_spacing
            } else {
                0.0
            };
            tm = if vertical {
                let disp = font.displacement_vector(code);
                tm.translate(0.0, disp.y * size + word_spacing)
            } else {
                tm.translate((bbox.width * size + word_spacing) * th, 0.0)
            };

            let is_mark = !value.is_empty() && value.chars().all(is_combining_mark);
            if self.options.combine_diacritics && is_mark {
                if let Some(previous) = pending.as_mut() {
                    previous.value = format!("{}{}", previous.value, value).nfc().collect();
                    previous.glyph_rectangle = previous.glyph_rectangle.union(&glyph_rectangle);
                    continue;
                }
            }

            let letter = Letter {
                value,
                glyph_rectangle,
                start_base_line,
                end_base_line,
                width: start_base_line.distance(end_base_line),
                font_name: font_name.clone(),
                font_size: size,
                point_size,
                rendering_mode: text.rendering_mode,
                stroke_color: stroke_color.clone(),
                fill_color: fill_color.clone(),
                text_sequence: sequence,
            };
            if let Some(previous) = pending.replace(letter) {
                self.emit_letter(previous);
            }
        }
        if let Some(last) = pending {
            self.emit_letter(last);
        }

        self.gs_mut().text_matrix = tm;
        if bytes.is_empty() {
            debug!(sequence, "empty text string");
        }
        Ok(())
    }
}
