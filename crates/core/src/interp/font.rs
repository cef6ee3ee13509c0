//! Font interface used by the text-showing operators, plus a simple
//! single-byte implementation built from a font dictionary.
//!
//! Metrics are expressed in text space for a font size of 1, i.e. glyph
//! space already divided by 1000.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::geometry::{Point, Rectangle};
use crate::model::objects::{Dictionary, Object};

/// Glyph outline bounds and advance of one character code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterBoundingBox {
    pub glyph_bounds: Rectangle,
    pub width: f64,
}

impl CharacterBoundingBox {
    pub fn new(glyph_bounds: Rectangle, width: f64) -> Self {
        Self {
            glyph_bounds,
            width,
        }
    }
}

/// A font as seen by the content-stream processor.
///
/// Fonts are shared between graphics-state frames and pages through `Arc`.
pub trait Font: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Reads one character code from the front of `bytes`, returning the
    /// code and the number of bytes consumed (at least 1 for non-empty input).
    fn read_character_code(&self, bytes: &[u8]) -> (u32, usize);

    /// Unicode value of a code, if the font knows it.
    fn unicode(&self, code: u32) -> Option<String>;

    fn bounding_box(&self, code: u32) -> CharacterBoundingBox;

    fn is_vertical(&self) -> bool {
        false
    }

    /// Offset from the horizontal origin to the vertical origin.
    fn position_vector(&self, code: u32) -> Point {
        Point::new(self.bounding_box(code).width / 2.0, 0.88)
    }

    fn displacement_vector(&self, code: u32) -> Point {
        if self.is_vertical() {
            Point::new(0.0, -1.0)
        } else {
            Point::new(self.bounding_box(code).width, 0.0)
        }
    }
}

/// Builds fonts from their dictionaries.
pub trait FontFactory {
    /// `name` is the resource name the font was looked up under, if any.
    fn build(&self, name: Option<&str>, dict: &Dictionary) -> Result<Arc<dyn Font>>;
}

/// Single-byte font: `/FirstChar`, `/Widths`, `/MissingWidth` and
/// `/FontBBox`, with an optional explicit code-to-unicode table.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleFont {
    name: String,
    first_char: u32,
    widths: Vec<f64>,
    missing_width: f64,
    /// Vertical extent of every glyph, from the font bounding box.
    descent: f64,
    ascent: f64,
    unicode: FxHashMap<u32, String>,
}

impl SimpleFont {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            first_char: 0,
            widths: Vec::new(),
            missing_width: 0.0,
            descent: 0.0,
            ascent: 1.0,
            unicode: FxHashMap::default(),
        }
    }

    /// Widths in glyph space (thousandths) starting at `first_char`.
    pub fn with_widths(mut self, first_char: u32, widths: impl IntoIterator<Item = f64>) -> Self {
        self.first_char = first_char;
        self.widths = widths.into_iter().map(|w| w / 1000.0).collect();
        self
    }

    pub fn with_missing_width(mut self, width: f64) -> Self {
        self.missing_width = width / 1000.0;
        self
    }

    pub fn with_unicode(mut self, code: u32, value: impl Into<String>) -> Self {
        self.unicode.insert(code, value.into());
        self
    }

    /// Reads a font dictionary. `/MissingWidth` and `/FontBBox` are taken
    /// from `/FontDescriptor` when present there.
    pub fn from_dict(name: Option<&str>, dict: &Dictionary) -> Result<Self> {
        let base = match dict.get("BaseFont") {
            Some(obj) => obj.as_name()?.to_string(),
            None => name.unwrap_or_default().to_string(),
        };
        let mut font = Self::new(base);

        if let Some(widths) = dict.get("Widths") {
            let first = dict.get("FirstChar").map(Object::as_int).transpose()?.unwrap_or(0);
            font = font.with_widths(first.max(0) as u32, widths.as_numbers()?);
        }

        let descriptor = dict.get("FontDescriptor").map(Object::as_dict).transpose()?;
        let lookup = |key: &str| {
            descriptor
                .and_then(|d| d.get(key))
                .or_else(|| dict.get(key))
        };
        if let Some(missing) = lookup("MissingWidth") {
            font = font.with_missing_width(missing.as_num()?);
        }
        if let Some(bbox) = lookup("FontBBox") {
            let values = bbox.as_numbers()?;
            if let [_, y1, _, y2] = values.as_slice()
                && y1 != y2
            {
                font.descent = y1.min(*y2) / 1000.0;
                font.ascent = y1.max(*y2) / 1000.0;
            }
        }
        Ok(font)
    }

    fn width(&self, code: u32) -> f64 {
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .unwrap_or(self.missing_width)
    }
}

impl Font for SimpleFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_character_code(&self, bytes: &[u8]) -> (u32, usize) {
        match bytes.first() {
            Some(&b) => (u32::from(b), 1),
            None => (0, 0),
        }
    }

    fn unicode(&self, code: u32) -> Option<String> {
        if let Some(value) = self.unicode.get(&code) {
            return Some(value.clone());
        }
        (0x20..=0x7E)
            .contains(&code)
            .then(|| char::from(code as u8).to_string())
    }

    fn bounding_box(&self, code: u32) -> CharacterBoundingBox {
        let width = self.width(code);
        CharacterBoundingBox::new(Rectangle::new(0.0, self.descent, width, self.ascent), width)
    }
}

/// Factory that builds every font as a [`SimpleFont`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleFontFactory;

impl FontFactory for SimpleFontFactory {
    fn build(&self, name: Option<&str>, dict: &Dictionary) -> Result<Arc<dyn Font>> {
        Ok(Arc::new(SimpleFont::from_dict(name, dict)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::dict;

    #[test]
    fn widths_are_scaled_and_offset_by_first_char() {
        let d = dict([
            ("BaseFont", Object::name("Helvetica")),
            ("FirstChar", Object::Int(65)),
            (
                "Widths",
                Object::Array(vec![Object::Int(500), Object::Int(600)]),
            ),
            (
                "FontDescriptor",
                Object::Dict(dict([
                    ("MissingWidth", Object::Int(250)),
                    (
                        "FontBBox",
                        Object::Array(vec![
                            Object::Int(-100),
                            Object::Int(-200),
                            Object::Int(1000),
                            Object::Int(900),
                        ]),
                    ),
                ])),
            ),
        ]);
        let font = SimpleFont::from_dict(Some("F1"), &d).unwrap();
        assert_eq!(font.name(), "Helvetica");
        assert_eq!(font.bounding_box(65).width, 0.5);
        assert_eq!(font.bounding_box(66).width, 0.6);
        assert_eq!(font.bounding_box(10).width, 0.25);

        let bounds = font.bounding_box(65).glyph_bounds;
        assert_eq!(bounds.bottom(), -0.2);
        assert_eq!(bounds.top(), 0.9);
    }

    #[test]
    fn unicode_prefers_explicit_map_then_ascii() {
        let font = SimpleFont::new("X").with_unicode(0x41, "Ω");
        assert_eq!(font.unicode(0x41).as_deref(), Some("Ω"));
        assert_eq!(font.unicode(0x42).as_deref(), Some("B"));
        assert_eq!(font.unicode(0x07), None);
        assert_eq!(font.read_character_code(b"AB"), (0x41, 1));
    }

    #[test]
    fn default_vertical_metrics() {
        let font = SimpleFont::new("X").with_widths(0, [1000.0]);
        assert_eq!(font.position_vector(0), Point::new(0.5, 0.88));
        assert_eq!(font.displacement_vector(0), Point::new(1.0, 0.0));
    }
}
