//! What a page's content stream produces.

use serde::Serialize;

use super::image::{Image, XObjectRecord};
use super::marked_content::MarkedContentElement;
use super::state::TextRenderingMode;
use crate::geometry::{Path, Point, Rectangle};
use crate::model::color::Color;
use crate::model::objects::Name;

/// One shown glyph in device space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Letter {
    pub value: String,
    /// Glyph bounds; rotated when the text is.
    pub glyph_rectangle: Rectangle,
    pub start_base_line: Point,
    pub end_base_line: Point,
    /// Advance along the baseline.
    pub width: f64,
    pub font_name: Name,
    /// `Tf` size in text space.
    pub font_size: f64,
    /// Effective size on the page.
    pub point_size: f64,
    pub rendering_mode: TextRenderingMode,
    pub stroke_color: Color,
    pub fill_color: Color,
    /// Letters from the same `Tj`/`'`/`"` call (or string of a `TJ`) share
    /// this id.
    pub text_sequence: u64,
}

impl Letter {
    /// The colour the glyph is painted with.
    pub fn color(&self) -> &Color {
        match self.rendering_mode {
            TextRenderingMode::Stroke => &self.stroke_color,
            _ => &self.fill_color,
        }
    }
}

/// Everything extracted from one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageContent {
    pub letters: Vec<Letter>,
    pub paths: Vec<Path>,
    pub images: Vec<Image>,
    pub xobjects: Vec<XObjectRecord>,
    pub marked_content: Vec<MarkedContentElement>,
}

impl PageContent {
    /// Concatenated letter values in content-stream order.
    pub fn text(&self) -> String {
        self.letters.iter().map(|l| l.value.as_str()).collect()
    }
}
