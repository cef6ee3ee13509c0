//! Color operators.
//!
//! Handles: CS, cs, SC, SCN, sc, scn, G, g, RG, rg, K, k

use tracing::debug;

use crate::error::Result;
use crate::interp::processor::ContentStreamProcessor;
use crate::model::color::ColorSpace;
use crate::model::objects::Name;

#[allow(non_snake_case)]
impl ContentStreamProcessor<'_> {
    fn resolve_color_space(&mut self, name: &Name) -> Result<Option<ColorSpace>> {
        let lookup = self.resources.color_space(name);
        self.tolerate_missing(lookup)
    }

    /// Sets the stroking colour space.
    ///
    /// PDF operator: `CS`
    pub fn do_CS(&mut self, name: &Name) -> Result<()> {
        match self.resolve_color_space(name)? {
            Some(space) => self.gs_mut().colors.set_stroke_space(space),
            None => debug!(space = %name, "stroking colour space unchanged"),
        }
        Ok(())
    }

    /// Sets the non-stroking colour space.
    ///
    /// PDF operator: `cs`
    pub fn do_cs(&mut self, name: &Name) -> Result<()> {
        match self.resolve_color_space(name)? {
            Some(space) => self.gs_mut().colors.set_fill_space(space),
            None => debug!(space = %name, "non-stroking colour space unchanged"),
        }
        Ok(())
    }

    /// PDF operator: `SC`
    pub fn do_SC(&mut self, values: &[f64]) {
        self.gs_mut().colors.set_stroke_components(values, None);
    }

    /// PDF operator: `sc`
    pub fn do_sc(&mut self, values: &[f64]) {
        self.gs_mut().colors.set_fill_components(values, None);
    }

    /// Like `SC`, also accepting a pattern name.
    ///
    /// PDF operator: `SCN`
    pub fn do_SCN(&mut self, values: &[f64], pattern: Option<&Name>) {
        self.gs_mut()
            .colors
            .set_stroke_components(values, pattern.cloned());
    }

    /// PDF operator: `scn`
    pub fn do_scn(&mut self, values: &[f64], pattern: Option<&Name>) {
        self.gs_mut().colors.set_fill_components(values, pattern.cloned());
    }

    /// PDF operator: `G`
    pub fn do_G(&mut self, gray: f64) {
        self.gs_mut().colors.set_stroke_gray(gray);
    }

    /// PDF operator: `g`
    pub fn do_g(&mut self, gray: f64) {
        self.gs_mut().colors.set_fill_gray(gray);
    }

    /// PDF operator: `RG`
    pub fn do_RG(&mut self, r: f64, g: f64, b: f64) {
        self.gs_mut().colors.set_stroke_rgb(r, g, b);
    }

    /// PDF operator: `rg`
    pub fn do_rg(&mut self, r: f64, g: f64, b: f64) {
        self.gs_mut().colors.set_fill_rgb(r, g, b);
    }

    /// PDF operator: `K`
    pub fn do_K(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.gs_mut().colors.set_stroke_cmyk(c, m, y, k);
    }

    /// PDF operator: `k`
    pub fn do_k(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.gs_mut().colors.set_fill_cmyk(c, m, y, k);
    }
}
