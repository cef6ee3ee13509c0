//! Content-stream processor: replays a page's operations against the
//! graphics state and collects letters, paths, images and marked content.
//!
//! Operator implementations live in `interp::ops`, one `impl` block per
//! operator group.

use std::ops::{Deref, DerefMut};

use tracing::{debug, trace, warn};

use super::content::{Letter, PageContent};
use super::image::{Image, InlineImageBuilder};
use super::lexer::tokenize;
use super::marked_content::MarkedContentStack;
use super::operation::{Operation, decode_operations};
use super::path::PathBuilder;
use super::resources::ResourceStore;
use super::state::{GraphicsState, GraphicsStateStack};
use crate::error::{PdfError, Result};
use crate::filters::{StandardDecoder, StreamDecoder};
use crate::geometry::{AffineTransform, Path, Point, Subpath, clip};
use crate::model::objects::Dictionary;
use crate::options::{PageSetup, ParsingOptions};

/// Interprets the content of one page.
///
/// The processor owns all per-page state; resources and the stream decoder
/// are borrowed from the caller.
pub struct ContentStreamProcessor<'r> {
    pub(crate) resources: &'r mut dyn ResourceStore,
    pub(crate) decoder: &'r dyn StreamDecoder,
    pub(crate) options: ParsingOptions,
    pub(crate) page: PageSetup,
    pub(crate) gstack: GraphicsStateStack,
    /// `Q` may not restore below this many frames (a running form's
    /// caller owns the ones underneath).
    pub(crate) gstack_floor: usize,
    pub(crate) path: PathBuilder,
    pub(crate) marked_content: MarkedContentStack,
    pub(crate) inline_image: Option<InlineImageBuilder>,
    pub(crate) text_sequence: u64,
    pub(crate) content: PageContent,
}

impl<'r> ContentStreamProcessor<'r> {
    pub fn new(
        page: PageSetup,
        resources: &'r mut dyn ResourceStore,
        decoder: &'r dyn StreamDecoder,
        options: ParsingOptions,
    ) -> Self {
        let crop = page.device_crop_box();
        // Corners in drawing order; a rectangle always yields a ring.
        let clip = Subpath::from_polygon(&crop.corners())
            .unwrap_or_else(|| Subpath::new(crop.bottom_left));
        Self {
            resources,
            decoder,
            options,
            page,
            gstack: GraphicsStateStack::new(GraphicsState::new(page.initial_transform, clip)),
            gstack_floor: 1,
            path: PathBuilder::new(),
            marked_content: MarkedContentStack::new(),
            inline_image: None,
            text_sequence: 0,
            content: PageContent::default(),
        }
    }

    /// Runs the page's operations and returns what they drew.
    pub fn process(mut self, operations: &[Operation]) -> Result<PageContent> {
        self.process_operations(operations, 0)?;
        self.finish_page();
        Ok(self.content)
    }

    /// Runs operations at form nesting `depth` (0 for the page itself).
    pub fn process_operations(&mut self, operations: &[Operation], depth: usize) -> Result<()> {
        for op in operations {
            self.apply(op, depth)?;
        }
        Ok(())
    }

    fn finish_page(&mut self) {
        if !self.marked_content.is_empty() {
            warn!(
                page = self.page.page_number,
                open = self.marked_content.depth(),
                "marked content still open at end of page, closing"
            );
            if let Some(root) = self.marked_content.close_all() {
                self.content.marked_content.push(root);
            }
        }
        if !self.path.is_empty() {
            debug!(page = self.page.page_number, "unpainted path at end of page discarded");
        }
        if self.inline_image.is_some() {
            warn!(page = self.page.page_number, "inline image without EI at end of page");
        }
    }

    /// Executes one operation.
    pub fn apply(&mut self, op: &Operation, depth: usize) -> Result<()> {
        use Operation as Op;
        match op {
            // Graphics state
            Op::Save => self.do_q(),
            Op::Restore => self.do_Q()?,
            Op::ConcatMatrix(m) => self.do_cm(m),
            Op::SetLineWidth(w) => self.do_w(*w),
            Op::SetLineCap(cap) => self.do_J(*cap),
            Op::SetLineJoin(join) => self.do_j(*join),
            Op::SetMiterLimit(limit) => self.do_M(*limit),
            Op::SetDash(dash) => self.do_d(dash),
            Op::SetRenderingIntent(intent) => self.do_ri(intent),
            Op::SetFlatness(flatness) => self.do_i(*flatness),
            Op::SetGraphicsStateParameters(name) => self.do_gs(name)?,

            // Path construction
            Op::MoveTo(x, y) => self.do_m(*x, *y),
            Op::LineTo(x, y) => self.do_l(*x, *y),
            Op::CurveTo(x1, y1, x2, y2, x3, y3) => self.do_c(*x1, *y1, *x2, *y2, *x3, *y3),
            Op::CurveToV(x2, y2, x3, y3) => self.do_v(*x2, *y2, *x3, *y3),
            Op::CurveToY(x1, y1, x3, y3) => self.do_y(*x1, *y1, *x3, *y3),
            Op::CloseSubpath => self.do_h(),
            Op::AppendRectangle(x, y, w, h) => self.do_re(*x, *y, *w, *h),

            // Path painting and clipping
            Op::Stroke => self.do_S(),
            Op::CloseAndStroke => self.do_s(),
            Op::FillNonZero => self.do_f(),
            Op::FillNonZeroLegacy => self.do_F(),
            Op::FillEvenOdd => self.do_f_star(),
            Op::FillStrokeNonZero => self.do_B(),
            Op::FillStrokeEvenOdd => self.do_B_star(),
            Op::CloseFillStrokeNonZero => self.do_b(),
            Op::CloseFillStrokeEvenOdd => self.do_b_star(),
            Op::EndPath => self.do_n(),
            Op::ClipNonZero => self.do_W(),
            Op::ClipEvenOdd => self.do_W_star(),

            // Text
            Op::BeginText => self.do_BT(),
            Op::EndText => self.do_ET(),
            Op::SetCharacterSpacing(tc) => self.do_Tc(*tc),
            Op::SetWordSpacing(tw) => self.do_Tw(*tw),
            Op::SetHorizontalScaling(tz) => self.do_Tz(*tz),
            Op::SetLeading(tl) => self.do_TL(*tl),
            Op::SetFont(name, size) => self.do_Tf(name, *size),
            Op::SetTextRenderingMode(mode) => self.do_Tr(*mode),
            Op::SetTextRise(rise) => self.do_Ts(*rise),
            Op::MoveTextPosition(tx, ty) => self.do_Td(*tx, *ty),
            Op::MoveTextPositionSetLeading(tx, ty) => self.do_TD(*tx, *ty),
            Op::SetTextMatrix(m) => self.do_Tm(m),
            Op::NextLine => self.do_T_star(),
            Op::ShowText(bytes) => self.do_Tj(bytes)?,
            Op::ShowTextPositioned(items) => self.do_TJ(items)?,
            Op::NextLineShowText(bytes) => self.do_quote(bytes)?,
            Op::NextLineShowTextWithSpacing(aw, ac, bytes) => self.do_doublequote(*aw, *ac, bytes)?,
            Op::SetGlyphWidth(..) | Op::SetGlyphWidthAndBoundingBox(..) => {
                debug!(operator = op.operator(), "glyph metrics operator ignored");
            }

            // Colour
            Op::SetStrokeColorSpace(name) => self.do_CS(name)?,
            Op::SetFillColorSpace(name) => self.do_cs(name)?,
            Op::SetStrokeColor(values) => self.do_SC(values),
            Op::SetFillColor(values) => self.do_sc(values),
            Op::SetStrokeColorN(values, pattern) => self.do_SCN(values, pattern.as_ref()),
            Op::SetFillColorN(values, pattern) => self.do_scn(values, pattern.as_ref()),
            Op::SetStrokeGray(g) => self.do_G(*g),
            Op::SetFillGray(g) => self.do_g(*g),
            Op::SetStrokeRgb(r, g, b) => self.do_RG(*r, *g, *b),
            Op::SetFillRgb(r, g, b) => self.do_rg(*r, *g, *b),
            Op::SetStrokeCmyk(c, m, y, k) => self.do_K(*c, *m, *y, *k),
            Op::SetFillCmyk(c, m, y, k) => self.do_k(*c, *m, *y, *k),
            Op::PaintShading(name) => {
                debug!(shading = %name, "sh ignored");
            }

            // XObjects and inline images
            Op::InvokeXObject(name) => self.do_Do(name, depth)?,
            Op::BeginInlineImage => self.do_BI(),
            Op::BeginInlineImageData(dict) => self.do_ID(dict),
            Op::EndInlineImage(data) => self.do_EI(data)?,

            // Marked content
            Op::BeginMarkedContent(tag) => self.do_BMC(tag),
            Op::BeginMarkedContentWithProperties(tag, props) => self.do_BDC(tag, props)?,
            Op::EndMarkedContent => self.do_EMC(),
            Op::MarkPoint(tag) | Op::MarkPointWithProperties(tag, _) => {
                debug!(tag = %tag, operator = op.operator(), "marked-content point ignored");
            }

            // Compatibility sections
            Op::BeginCompatibility | Op::EndCompatibility => {
                debug!(operator = op.operator(), "compatibility section marker");
            }
            Op::Unknown(name) => {
                debug!(operator = %name, "unknown operator ignored");
            }
        }
        Ok(())
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    pub(crate) fn gs(&self) -> &GraphicsState {
        self.gstack.current()
    }

    pub(crate) fn gs_mut(&mut self) -> &mut GraphicsState {
        self.gstack.current_mut()
    }

    pub(crate) fn ctm(&self) -> AffineTransform {
        self.gs().ctm
    }

    /// User-space point to device space.
    pub(crate) fn to_device(&self, x: f64, y: f64) -> Point {
        self.ctm().transform_point(Point::new(x, y))
    }

    /// Applies the missing-resource policy: with skipping enabled a missing
    /// resource is logged and becomes `None`.
    pub(crate) fn tolerate_missing<T>(&self, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(PdfError::MissingResource { kind, name }) if self.options.skip_missing_resources => {
                warn!(page = self.page.page_number, %kind, name, "missing resource skipped");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub(crate) fn emit_letter(&mut self, letter: Letter) {
        self.marked_content.add_letter(&letter);
        self.content.letters.push(letter);
    }

    /// Records a painted path, already clipped, on the page and in the
    /// innermost marked-content node.
    pub(crate) fn emit_path(&mut self, path: Path) {
        for subpath in &path.subpaths {
            self.marked_content.add_path(subpath);
        }
        self.content.paths.push(path);
    }

    pub(crate) fn emit_image(&mut self, image: Image) {
        self.marked_content.add_image(&image);
        self.content.images.push(image);
    }

    /// Intersects `path` with the active clip, or passes it through when
    /// clipping is off. `None` means nothing is visible.
    pub(crate) fn clip_to_active(&self, path: Path) -> Option<Path> {
        if !self.options.clip_paths {
            return Some(path);
        }
        clip::clip_path(&path, &self.gs().clipping_path)
    }

    /// Runs a form's decoded content inside a [`FormScope`].
    pub(crate) fn run_form_content(
        &mut self,
        content: bytes::Bytes,
        resources: Option<&Dictionary>,
        setup: impl FnOnce(&mut Self) -> Result<()>,
        depth: usize,
    ) -> Result<()> {
        let mut scope = FormScope::enter(self, resources)?;
        setup(&mut *scope)?;
        let operations = decode_operations(tokenize(content));
        trace!(depth, operations = operations.len(), "entering form");
        scope.process_operations(&operations, depth)?;
        trace!(depth, "leaving form");
        Ok(())
    }
}

/// Saves the graphics state and pushes a form's resource scope; both are
/// restored when the guard drops, on success and on error alike.
pub(crate) struct FormScope<'p, 'r> {
    processor: &'p mut ContentStreamProcessor<'r>,
    saved_len: usize,
    saved_floor: usize,
    pushed_resources: bool,
}

impl<'p, 'r> FormScope<'p, 'r> {
    fn enter(
        processor: &'p mut ContentStreamProcessor<'r>,
        resources: Option<&Dictionary>,
    ) -> Result<Self> {
        let saved_len = processor.gstack.len();
        let saved_floor = processor.gstack_floor;
        processor.gstack.push();
        processor.gstack_floor = processor.gstack.len();
        let mut scope = Self {
            processor,
            saved_len,
            saved_floor,
            pushed_resources: false,
        };
        if let Some(resources) = resources {
            scope.processor.resources.push_scope(resources)?;
            scope.pushed_resources = true;
        }
        Ok(scope)
    }
}

impl<'r> Deref for FormScope<'_, 'r> {
    type Target = ContentStreamProcessor<'r>;

    fn deref(&self) -> &Self::Target {
        self.processor
    }
}

impl DerefMut for FormScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.processor
    }
}

impl Drop for FormScope<'_, '_> {
    fn drop(&mut self) {
        self.processor.gstack.truncate(self.saved_len);
        self.processor.gstack_floor = self.saved_floor;
        if self.pushed_resources {
            self.processor.resources.pop_scope();
        }
    }
}

/// Tokenizes, decodes and interprets one page's content stream.
pub fn process_page(
    content: &[u8],
    page: PageSetup,
    resources: &mut dyn ResourceStore,
    options: ParsingOptions,
) -> Result<PageContent> {
    let operations = decode_operations(tokenize(content.to_vec()));
    ContentStreamProcessor::new(page, resources, &StandardDecoder, options).process(&operations)
}
