//! XObject and inline image operators.
//!
//! Handles: Do, BI, ID, EI
//!
//! XObjects:
//! - Do: Invoke named XObject (Form, Image or PostScript)
//!
//! Inline images:
//! - BI: Begin inline image dictionary
//! - ID: Begin inline image data
//! - EI: End inline image

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{PdfError, Result};
use crate::geometry::AffineTransform;
use crate::interp::image::{Image, InlineImageBuilder, XObjectImage, XObjectRecord};
use crate::interp::processor::ContentStreamProcessor;
use crate::interp::resources::{ResourceStore, XObject, XObjectKind};
use crate::model::color::ColorSpace;
use crate::model::objects::{Dictionary, Name, Object, Stream};

/// Resolves an image `/ColorSpace` entry: names through the resource
/// store, arrays in place with named entries looked up the same way.
fn resolve_image_color_space(resources: &dyn ResourceStore, obj: &Object) -> Result<ColorSpace> {
    match obj {
        Object::Name(name) => resources.color_space(name),
        other => {
            let named = |n: &str| resources.color_space(n).ok();
            ColorSpace::from_object(other, &named)
        }
    }
}

#[allow(non_snake_case)]
impl ContentStreamProcessor<'_> {
    // ========================================================================
    // XObject Operators
    // ========================================================================

    /// Invokes a named XObject.
    ///
    /// `depth` is the form nesting of the stream containing this operator.
    ///
    /// PDF operator: `Do`
    pub fn do_Do(&mut self, name: &Name, depth: usize) -> Result<()> {
        let lookup = self.resources.xobject(name);
        let Some(xobject) = self.tolerate_missing(lookup)? else {
            return Ok(());
        };
        debug!(xobject = %name, kind = ?xobject.kind, depth, "Do");
        match xobject.kind {
            XObjectKind::Form => self.run_form(&xobject.stream, depth),
            XObjectKind::Image => self.draw_image_xobject(xobject),
            XObjectKind::PostScript => {
                self.record_xobject(xobject);
                Ok(())
            }
        }
    }

    fn run_form(&mut self, stream: &Stream, depth: usize) -> Result<()> {
        let limit = self.options.max_form_depth;
        if depth + 1 > limit {
            return Err(PdfError::RecursionLimitExceeded { limit });
        }
        let content = self.decoder.decode(stream)?;
        let resources = stream.get("Resources").map(Object::as_dict).transpose()?;
        self.run_form_content(
            content,
            resources,
            |p| {
                if let Some(group) = stream.get("Group") {
                    p.enter_transparency_group(group.as_dict()?)?;
                }
                if let Some(matrix) = stream.get("Matrix") {
                    let matrix = AffineTransform::from_array(&matrix.as_numbers()?)?;
                    let gs = p.gs_mut();
                    gs.ctm = matrix.multiply(&gs.ctm);
                }
                Ok(())
            },
            depth + 1,
        )
    }

    /// Only transparency groups are defined; the group's `/CS` becomes the
    /// non-stroking colour space.
    fn enter_transparency_group(&mut self, group: &Dictionary) -> Result<()> {
        match group.get("S") {
            Some(Object::Name(s)) if s == "Transparency" => {}
            other => {
                return Err(PdfError::format(format!(
                    "form group must have /S /Transparency, found {}",
                    other.map_or("nothing", Object::type_name)
                )));
            }
        }
        self.gs_mut().reset_transparency();

        let Some(cs) = group.get("CS") else {
            return Ok(());
        };
        let space = match cs {
            Object::Name(name) => self.resources.color_space(name)?,
            Object::Array(items) if matches!(items.first(), Some(Object::Name(_))) => {
                let resources: &dyn ResourceStore = &*self.resources;
                let named = |n: &str| resources.color_space(n).ok();
                ColorSpace::from_object(cs, &named)?
            }
            other => {
                return Err(PdfError::format(format!(
                    "group /CS must be a name or an array starting with a name, got {}",
                    other.type_name()
                )));
            }
        };
        self.gs_mut().colors.set_fill_space(space);
        Ok(())
    }

    fn draw_image_xobject(&mut self, xobject: XObject) -> Result<()> {
        let image = {
            let gs = self.gs();
            let resources: &dyn ResourceStore = &*self.resources;
            let resolve = |obj: &Object| resolve_image_color_space(resources, obj);
            XObjectImage::read(
                xobject.name,
                &xobject.stream,
                &gs.ctm,
                &gs.rendering_intent,
                &resolve,
            )?
        };
        self.emit_image(Image::XObject(image));
        Ok(())
    }

    fn record_xobject(&mut self, xobject: XObject) {
        let gs = self.gs();
        let record = XObjectRecord {
            kind: xobject.kind,
            name: xobject.name,
            stream: xobject.stream,
            ctm: gs.ctm,
            rendering_intent: gs.rendering_intent.clone(),
            color_space: gs.colors.fill_space().clone(),
        };
        self.content.xobjects.push(record);
    }

    // ========================================================================
    // Inline Image Operators
    // ========================================================================

    /// Begins an inline image.
    ///
    /// PDF operator: `BI`
    pub fn do_BI(&mut self) {
        if self.inline_image.is_some() {
            warn!(page = self.page.page_number, "BI inside an open inline image, discarding it");
        }
        self.inline_image = Some(InlineImageBuilder::new());
    }

    /// Sets the inline image dictionary.
    ///
    /// PDF operator: `ID`
    pub fn do_ID(&mut self, dict: &Dictionary) {
        match self.inline_image.as_mut() {
            Some(builder) => builder.set_properties(dict.clone()),
            None => warn!(page = self.page.page_number, "ID without BI, ignored"),
        }
    }

    /// Completes the inline image with its data.
    ///
    /// PDF operator: `EI`
    pub fn do_EI(&mut self, data: &Bytes) -> Result<()> {
        let Some(builder) = self.inline_image.take() else {
            warn!(page = self.page.page_number, "EI without BI, ignored");
            return Ok(());
        };
        let image = {
            let gs = self.gs();
            let resources: &dyn ResourceStore = &*self.resources;
            let resolve = |obj: &Object| resolve_image_color_space(resources, obj);
            builder.finalize(data.clone(), &gs.ctm, &gs.rendering_intent, &resolve)?
        };
        self.emit_image(Image::Inline(image));
        Ok(())
    }
}
