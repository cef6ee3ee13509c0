//! Active stroking and non-stroking colour spaces and colours.

use serde::Serialize;
use tracing::debug;

use crate::model::color::{Color, ColorSpace};
use crate::model::objects::Name;

/// Colour half of the graphics state. Selecting a space resets the colour
/// to that space's initial colour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorSpaceContext {
    stroke_space: ColorSpace,
    fill_space: ColorSpace,
    stroke_color: Color,
    fill_color: Color,
}

impl Default for ColorSpaceContext {
    fn default() -> Self {
        Self {
            stroke_space: ColorSpace::DeviceGray,
            fill_space: ColorSpace::DeviceGray,
            stroke_color: Color::Gray(0.0),
            fill_color: Color::Gray(0.0),
        }
    }
}

impl ColorSpaceContext {
    pub fn stroke_space(&self) -> &ColorSpace {
        &self.stroke_space
    }

    pub fn fill_space(&self) -> &ColorSpace {
        &self.fill_space
    }

    pub fn stroke_color(&self) -> &Color {
        &self.stroke_color
    }

    pub fn fill_color(&self) -> &Color {
        &self.fill_color
    }

    pub fn set_stroke_space(&mut self, space: ColorSpace) {
        self.stroke_color = space.initial_color();
        self.stroke_space = space;
    }

    pub fn set_fill_space(&mut self, space: ColorSpace) {
        self.fill_color = space.initial_color();
        self.fill_space = space;
    }

    /// `SC`/`SCN` operands interpreted in the current stroking space.
    pub fn set_stroke_components(&mut self, values: &[f64], pattern: Option<Name>) {
        check_arity(&self.stroke_space, values, "stroking");
        self.stroke_color = self.stroke_space.color_from(values, pattern);
    }

    pub fn set_fill_components(&mut self, values: &[f64], pattern: Option<Name>) {
        check_arity(&self.fill_space, values, "non-stroking");
        self.fill_color = self.fill_space.color_from(values, pattern);
    }

    pub fn set_stroke_gray(&mut self, gray: f64) {
        self.stroke_space = ColorSpace::DeviceGray;
        self.stroke_color = Color::Gray(gray);
    }

    pub fn set_fill_gray(&mut self, gray: f64) {
        self.fill_space = ColorSpace::DeviceGray;
        self.fill_color = Color::Gray(gray);
    }

    pub fn set_stroke_rgb(&mut self, r: f64, g: f64, b: f64) {
        self.stroke_space = ColorSpace::DeviceRGB;
        self.stroke_color = Color::Rgb(r, g, b);
    }

    pub fn set_fill_rgb(&mut self, r: f64, g: f64, b: f64) {
        self.fill_space = ColorSpace::DeviceRGB;
        self.fill_color = Color::Rgb(r, g, b);
    }

    pub fn set_stroke_cmyk(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.stroke_space = ColorSpace::DeviceCMYK;
        self.stroke_color = Color::Cmyk(c, m, y, k);
    }

    pub fn set_fill_cmyk(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.fill_space = ColorSpace::DeviceCMYK;
        self.fill_color = Color::Cmyk(c, m, y, k);
    }
}

fn check_arity(space: &ColorSpace, values: &[f64], which: &str) {
    let expected = space.components();
    if values.len() != expected {
        debug!(
            space = space.family_name(),
            expected,
            got = values.len(),
            "{which} colour operand count does not match the colour space"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selecting_a_space_resets_the_colour() {
        let mut ctx = ColorSpaceContext::default();
        ctx.set_fill_rgb(1.0, 0.0, 0.0);
        ctx.set_fill_space(ColorSpace::DeviceCMYK);
        assert_eq!(ctx.fill_color(), &Color::Cmyk(0.0, 0.0, 0.0, 1.0));
        // Stroking side untouched.
        assert_eq!(ctx.stroke_color(), &Color::Gray(0.0));
    }

    #[test]
    fn components_follow_the_space() {
        let mut ctx = ColorSpaceContext::default();
        ctx.set_stroke_space(ColorSpace::DeviceRGB);
        ctx.set_stroke_components(&[0.1, 0.2, 0.3], None);
        assert_eq!(ctx.stroke_color(), &Color::Rgb(0.1, 0.2, 0.3));

        ctx.set_fill_space(ColorSpace::Pattern { underlying: None });
        ctx.set_fill_components(&[], Some(Name::new("P0")));
        assert_eq!(ctx.fill_color().pattern_name(), Some("P0"));
    }

    #[test]
    fn device_shortcuts_switch_space() {
        let mut ctx = ColorSpaceContext::default();
        ctx.set_stroke_cmyk(0.0, 1.0, 0.0, 0.0);
        assert_eq!(ctx.stroke_space(), &ColorSpace::DeviceCMYK);
        ctx.set_fill_gray(0.5);
        assert_eq!(ctx.fill_space(), &ColorSpace::DeviceGray);
    }
}
