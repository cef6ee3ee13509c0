//! Operators decoded once from tokens into a closed enum.

use bytes::Bytes;
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::lexer::Token;
use crate::geometry::{AffineTransform, DashPattern, LineCap, LineJoin};
use crate::model::objects::{Dictionary, Name, Object};

/// Operand list of one operator.
pub type Operands = SmallVec<[Object; 8]>;

/// Colour components of `SC`/`sc`/`SCN`/`scn`.
pub type Components = SmallVec<[f64; 4]>;

/// Property list operand of `BDC`/`DP`.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyList {
    /// Dictionary written directly in the content stream.
    Inline(Dictionary),
    /// Name of an entry in the `/Properties` resource dictionary.
    Named(Name),
}

/// One element of a `TJ` array.
#[derive(Debug, Clone, PartialEq)]
pub enum TextItem {
    Text(Vec<u8>),
    /// Adjustment in thousandths of text space; positive moves left.
    Adjustment(f64),
}

/// A decoded content-stream operator with its operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    // General graphics state
    /// `w`
    SetLineWidth(f64),
    /// `J`
    SetLineCap(LineCap),
    /// `j`
    SetLineJoin(LineJoin),
    /// `M`
    SetMiterLimit(f64),
    /// `d`
    SetDash(DashPattern),
    /// `ri`
    SetRenderingIntent(Name),
    /// `i`
    SetFlatness(f64),
    /// `gs`
    SetGraphicsStateParameters(Name),

    // Special graphics state
    /// `q`
    Save,
    /// `Q`
    Restore,
    /// `cm`
    ConcatMatrix(AffineTransform),

    // Path construction
    /// `m`
    MoveTo(f64, f64),
    /// `l`
    LineTo(f64, f64),
    /// `c`
    CurveTo(f64, f64, f64, f64, f64, f64),
    /// `v`: first control point is the current point.
    CurveToV(f64, f64, f64, f64),
    /// `y`: second control point is the end point.
    CurveToY(f64, f64, f64, f64),
    /// `h`
    CloseSubpath,
    /// `re`
    AppendRectangle(f64, f64, f64, f64),

    // Path painting
    /// `S`
    Stroke,
    /// `s`
    CloseAndStroke,
    /// `f`
    FillNonZero,
    /// `F`, an older spelling of `f`.
    FillNonZeroLegacy,
    /// `f*`
    FillEvenOdd,
    /// `B`
    FillStrokeNonZero,
    /// `B*`
    FillStrokeEvenOdd,
    /// `b`
    CloseFillStrokeNonZero,
    /// `b*`
    CloseFillStrokeEvenOdd,
    /// `n`
    EndPath,

    // Clipping
    /// `W`
    ClipNonZero,
    /// `W*`
    ClipEvenOdd,

    // Text objects and state
    /// `BT`
    BeginText,
    /// `ET`
    EndText,
    /// `Tc`
    SetCharacterSpacing(f64),
    /// `Tw`
    SetWordSpacing(f64),
    /// `Tz`
    SetHorizontalScaling(f64),
    /// `TL`
    SetLeading(f64),
    /// `Tf`
    SetFont(Name, f64),
    /// `Tr`
    SetTextRenderingMode(i64),
    /// `Ts`
    SetTextRise(f64),

    // Text positioning
    /// `Td`
    MoveTextPosition(f64, f64),
    /// `TD`
    MoveTextPositionSetLeading(f64, f64),
    /// `Tm`
    SetTextMatrix(AffineTransform),
    /// `T*`
    NextLine,

    // Text showing
    /// `Tj`
    ShowText(Vec<u8>),
    /// `TJ`
    ShowTextPositioned(Vec<TextItem>),
    /// `'`
    NextLineShowText(Vec<u8>),
    /// `"`: word spacing, character spacing, string.
    NextLineShowTextWithSpacing(f64, f64, Vec<u8>),

    // Type 3 glyph metrics
    /// `d0`
    SetGlyphWidth(f64, f64),
    /// `d1`
    SetGlyphWidthAndBoundingBox([f64; 6]),

    // Colour
    /// `CS`
    SetStrokeColorSpace(Name),
    /// `cs`
    SetFillColorSpace(Name),
    /// `SC`
    SetStrokeColor(Components),
    /// `sc`
    SetFillColor(Components),
    /// `SCN`
    SetStrokeColorN(Components, Option<Name>),
    /// `scn`
    SetFillColorN(Components, Option<Name>),
    /// `G`
    SetStrokeGray(f64),
    /// `g`
    SetFillGray(f64),
    /// `RG`
    SetStrokeRgb(f64, f64, f64),
    /// `rg`
    SetFillRgb(f64, f64, f64),
    /// `K`
    SetStrokeCmyk(f64, f64, f64, f64),
    /// `k`
    SetFillCmyk(f64, f64, f64, f64),

    // Shading, XObjects, inline images
    /// `sh`
    PaintShading(Name),
    /// `Do`
    InvokeXObject(Name),
    /// `BI`
    BeginInlineImage,
    /// `ID`
    BeginInlineImageData(Dictionary),
    /// `EI`
    EndInlineImage(Bytes),

    // Marked content
    /// `MP`
    MarkPoint(Name),
    /// `DP`
    MarkPointWithProperties(Name, PropertyList),
    /// `BMC`
    BeginMarkedContent(Name),
    /// `BDC`
    BeginMarkedContentWithProperties(Name, PropertyList),
    /// `EMC`
    EndMarkedContent,

    // Compatibility
    /// `BX`
    BeginCompatibility,
    /// `EX`
    EndCompatibility,

    /// Operator outside the known set; ignored at dispatch.
    Unknown(Name),
}

fn pop_number(args: &mut Operands) -> Option<f64> {
    args.pop().and_then(|o| o.as_num().ok())
}

fn pop_int(args: &mut Operands) -> Option<i64> {
    args.pop().and_then(|o| o.as_int().ok())
}

fn pop_name(args: &mut Operands) -> Option<Name> {
    match args.pop()? {
        Object::Name(n) => Some(n),
        _ => None,
    }
}

fn pop_string(args: &mut Operands) -> Option<Vec<u8>> {
    match args.pop()? {
        Object::String(s) => Some(s),
        _ => None,
    }
}

fn pop_numbers<const N: usize>(args: &mut Operands) -> Option<[f64; N]> {
    if args.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for slot in out.iter_mut().rev() {
        *slot = pop_number(args)?;
    }
    Some(out)
}

fn pop_point(args: &mut Operands) -> Option<(f64, f64)> {
    let [x, y] = pop_numbers::<2>(args)?;
    Some((x, y))
}

fn pop_matrix(args: &mut Operands) -> Option<AffineTransform> {
    let [a, b, c, d, e, f] = pop_numbers::<6>(args)?;
    Some(AffineTransform::new(a, b, c, d, e, f))
}

fn pop_dash(args: &mut Operands) -> Option<DashPattern> {
    let phase = pop_number(args)?;
    let array = match args.pop()? {
        Object::Array(items) => items
            .iter()
            .map(|o| o.as_num().ok())
            .collect::<Option<Vec<_>>>()?,
        _ => return None,
    };
    Some(DashPattern { array, phase })
}

fn pop_property_list(args: &mut Operands) -> Option<PropertyList> {
    match args.pop()? {
        Object::Dict(d) => Some(PropertyList::Inline(d)),
        Object::Name(n) => Some(PropertyList::Named(n)),
        _ => None,
    }
}

fn pop_text_items(args: &mut Operands) -> Option<Vec<TextItem>> {
    match args.pop()? {
        Object::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Object::String(s) => Some(TextItem::Text(s)),
                    Object::Int(n) => Some(TextItem::Adjustment(n as f64)),
                    Object::Real(n) => Some(TextItem::Adjustment(n)),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    }
}

/// All operands as numbers (for `SC`/`sc`).
fn take_components(args: &mut Operands) -> Option<Components> {
    args.drain(..).map(|o| o.as_num().ok()).collect()
}

/// Numbers optionally followed by a pattern name (for `SCN`/`scn`).
fn take_components_n(args: &mut Operands) -> Option<(Components, Option<Name>)> {
    let pattern = match args.last() {
        Some(Object::Name(_)) => pop_name(args),
        _ => None,
    };
    Some((take_components(args)?, pattern))
}

impl Operation {
    /// Decodes `op` using operands from the end of `args`.
    ///
    /// Returns `None` when operands are missing or of the wrong type; the
    /// operator is then dropped with a warning.
    pub fn decode(op: &str, args: &mut Operands) -> Option<Self> {
        let decoded = Self::decode_inner(op, args);
        if decoded.is_none() {
            warn!(
                operator = op,
                operands = args.len(),
                "operator dropped: missing or ill-typed operands"
            );
        } else if !args.is_empty() {
            debug!(operator = op, extra = args.len(), "ignoring extra operands");
        }
        args.clear();
        decoded
    }

    fn decode_inner(op: &str, args: &mut Operands) -> Option<Self> {
        use Operation::*;
        let decoded = match op {
            "w" => SetLineWidth(pop_number(args)?),
            "J" => SetLineCap(LineCap::from_code(pop_int(args)?)?),
            "j" => SetLineJoin(LineJoin::from_code(pop_int(args)?)?),
            "M" => SetMiterLimit(pop_number(args)?),
            "d" => SetDash(pop_dash(args)?),
            "ri" => SetRenderingIntent(pop_name(args)?),
            "i" => SetFlatness(pop_number(args)?),
            "gs" => SetGraphicsStateParameters(pop_name(args)?),

            "q" => Save,
            "Q" => Restore,
            "cm" => ConcatMatrix(pop_matrix(args)?),

            "m" => {
                let (x, y) = pop_point(args)?;
                MoveTo(x, y)
            }
            "l" => {
                let (x, y) = pop_point(args)?;
                LineTo(x, y)
            }
            "c" => {
                let [x1, y1, x2, y2, x3, y3] = pop_numbers::<6>(args)?;
                CurveTo(x1, y1, x2, y2, x3, y3)
            }
            "v" => {
                let [x2, y2, x3, y3] = pop_numbers::<4>(args)?;
                CurveToV(x2, y2, x3, y3)
            }
            "y" => {
                let [x1, y1, x3, y3] = pop_numbers::<4>(args)?;
                CurveToY(x1, y1, x3, y3)
            }
            "h" => CloseSubpath,
            "re" => {
                let [x, y, w, h] = pop_numbers::<4>(args)?;
                AppendRectangle(x, y, w, h)
            }

            "S" => Stroke,
            "s" => CloseAndStroke,
            "f" => FillNonZero,
            "F" => FillNonZeroLegacy,
            "f*" => FillEvenOdd,
            "B" => FillStrokeNonZero,
            "B*" => FillStrokeEvenOdd,
            "b" => CloseFillStrokeNonZero,
            "b*" => CloseFillStrokeEvenOdd,
            "n" => EndPath,

            "W" => ClipNonZero,
            "W*" => ClipEvenOdd,

            "BT" => BeginText,
            "ET" => EndText,
            "Tc" => SetCharacterSpacing(pop_number(args)?),
            "Tw" => SetWordSpacing(pop_number(args)?),
            "Tz" => SetHorizontalScaling(pop_number(args)?),
            "TL" => SetLeading(pop_number(args)?),
            "Tf" => {
                let size = pop_number(args)?;
                SetFont(pop_name(args)?, size)
            }
            "Tr" => SetTextRenderingMode(pop_int(args)?),
            "Ts" => SetTextRise(pop_number(args)?),

            "Td" => {
                let (x, y) = pop_point(args)?;
                MoveTextPosition(x, y)
            }
            "TD" => {
                let (x, y) = pop_point(args)?;
                MoveTextPositionSetLeading(x, y)
            }
            "Tm" => SetTextMatrix(pop_matrix(args)?),
            "T*" => NextLine,

            "Tj" => ShowText(pop_string(args)?),
            "TJ" => ShowTextPositioned(pop_text_items(args)?),
            "'" => NextLineShowText(pop_string(args)?),
            "\"" => {
                let text = pop_string(args)?;
                let [aw, ac] = pop_numbers::<2>(args)?;
                NextLineShowTextWithSpacing(aw, ac, text)
            }

            "d0" => {
                let (wx, wy) = pop_point(args)?;
                SetGlyphWidth(wx, wy)
            }
            "d1" => SetGlyphWidthAndBoundingBox(pop_numbers::<6>(args)?),

            "CS" => SetStrokeColorSpace(pop_name(args)?),
            "cs" => SetFillColorSpace(pop_name(args)?),
            "SC" => SetStrokeColor(take_components(args)?),
            "sc" => SetFillColor(take_components(args)?),
            "SCN" => {
                let (values, pattern) = take_components_n(args)?;
                SetStrokeColorN(values, pattern)
            }
            "scn" => {
                let (values, pattern) = take_components_n(args)?;
                SetFillColorN(values, pattern)
            }
            "G" => SetStrokeGray(pop_number(args)?),
            "g" => SetFillGray(pop_number(args)?),
            "RG" => {
                let [r, g, b] = pop_numbers::<3>(args)?;
                SetStrokeRgb(r, g, b)
            }
            "rg" => {
                let [r, g, b] = pop_numbers::<3>(args)?;
                SetFillRgb(r, g, b)
            }
            "K" => {
                let [c, m, y, k] = pop_numbers::<4>(args)?;
                SetStrokeCmyk(c, m, y, k)
            }
            "k" => {
                let [c, m, y, k] = pop_numbers::<4>(args)?;
                SetFillCmyk(c, m, y, k)
            }

            "sh" => PaintShading(pop_name(args)?),
            "Do" => InvokeXObject(pop_name(args)?),
            "BI" => BeginInlineImage,
            // Outside an inline image the lexer leaves ID and EI bare.
            "ID" => BeginInlineImageData(Dictionary::new()),
            "EI" => EndInlineImage(Bytes::new()),

            "MP" => MarkPoint(pop_name(args)?),
            "DP" => {
                let props = pop_property_list(args)?;
                MarkPointWithProperties(pop_name(args)?, props)
            }
            "BMC" => BeginMarkedContent(pop_name(args)?),
            "BDC" => {
                let props = pop_property_list(args)?;
                BeginMarkedContentWithProperties(pop_name(args)?, props)
            }
            "EMC" => EndMarkedContent,

            "BX" => BeginCompatibility,
            "EX" => EndCompatibility,

            other => Unknown(Name::new(other)),
        };
        Some(decoded)
    }

    /// Operator symbol as written in a content stream.
    pub fn operator(&self) -> &str {
        use Operation::*;
        match self {
            SetLineWidth(_) => "w",
            SetLineCap(_) => "J",
            SetLineJoin(_) => "j",
            SetMiterLimit(_) => "M",
            SetDash(_) => "d",
            SetRenderingIntent(_) => "ri",
            SetFlatness(_) => "i",
            SetGraphicsStateParameters(_) => "gs",
            Save => "q",
            Restore => "Q",
            ConcatMatrix(_) => "cm",
            MoveTo(..) => "m",
            LineTo(..) => "l",
            CurveTo(..) => "c",
            CurveToV(..) => "v",
            CurveToY(..) => "y",
            CloseSubpath => "h",
            AppendRectangle(..) => "re",
            Stroke => "S",
            CloseAndStroke => "s",
            FillNonZero => "f",
            FillNonZeroLegacy => "F",
            FillEvenOdd => "f*",
            FillStrokeNonZero => "B",
            FillStrokeEvenOdd => "B*",
            CloseFillStrokeNonZero => "b",
            CloseFillStrokeEvenOdd => "b*",
            EndPath => "n",
            ClipNonZero => "W",
            ClipEvenOdd => "W*",
            BeginText => "BT",
            EndText => "ET",
            SetCharacterSpacing(_) => "Tc",
            SetWordSpacing(_) => "Tw",
            SetHorizontalScaling(_) => "Tz",
            SetLeading(_) => "TL",
            SetFont(..) => "Tf",
            SetTextRenderingMode(_) => "Tr",
            SetTextRise(_) => "Ts",
            MoveTextPosition(..) => "Td",
            MoveTextPositionSetLeading(..) => "TD",
            SetTextMatrix(_) => "Tm",
            NextLine => "T*",
            ShowText(_) => "Tj",
            ShowTextPositioned(_) => "TJ",
            NextLineShowText(_) => "'",
            NextLineShowTextWithSpacing(..) => "\"",
            SetGlyphWidth(..) => "d0",
            SetGlyphWidthAndBoundingBox(_) => "d1",
            SetStrokeColorSpace(_) => "CS",
            SetFillColorSpace(_) => "cs",
            SetStrokeColor(_) => "SC",
            SetFillColor(_) => "sc",
            SetStrokeColorN(..) => "SCN",
            SetFillColorN(..) => "scn",
            SetStrokeGray(_) => "G",
            SetFillGray(_) => "g",
            SetStrokeRgb(..) => "RG",
            SetFillRgb(..) => "rg",
            SetStrokeCmyk(..) => "K",
            SetFillCmyk(..) => "k",
            PaintShading(_) => "sh",
            InvokeXObject(_) => "Do",
            BeginInlineImage => "BI",
            BeginInlineImageData(_) => "ID",
            EndInlineImage(_) => "EI",
            MarkPoint(_) => "MP",
            MarkPointWithProperties(..) => "DP",
            BeginMarkedContent(_) => "BMC",
            BeginMarkedContentWithProperties(..) => "BDC",
            EndMarkedContent => "EMC",
            BeginCompatibility => "BX",
            EndCompatibility => "EX",
            Unknown(name) => name.as_str(),
        }
    }
}

/// Decodes a token sequence into operations. An inline-image token expands
/// into `BI`, `ID` and `EI`.
pub fn decode_operations<I>(tokens: I) -> Vec<Operation>
where
    I: IntoIterator<Item = Token>,
{
    let mut ops = Vec::new();
    let mut args = Operands::new();
    for token in tokens {
        match token {
            Token::Operand(obj) => args.push(obj),
            Token::Operator(name) => {
                if let Some(op) = Operation::decode(&name, &mut args) {
                    ops.push(op);
                }
            }
            Token::InlineImage { dict, data } => {
                if !args.is_empty() {
                    debug!(count = args.len(), "operands before BI discarded");
                    args.clear();
                }
                ops.push(Operation::BeginInlineImage);
                ops.push(Operation::BeginInlineImageData(dict));
                ops.push(Operation::EndInlineImage(data));
            }
        }
    }
    if !args.is_empty() {
        debug!(count = args.len(), "trailing operands without operator");
    }
    ops
}
