//! Text positioning and showing through whole content streams.

mod common;

use common::{AccentFontFactory, approx, page_resources, run, run_default};
use folio_core::interp::TextRenderingMode;
use folio_core::model::Color;
use folio_core::{ParsingOptions, PdfError, ResourceKind, ScopedResources, process_page};

// ============================================================================
// Advance and spacing
// ============================================================================

#[test]
fn test_character_spacing_applies_between_glyphs() {
    // Three 5pt glyphs plus two gaps of Tc; the next string starts right
    // after the advance.
    let page = run_default("BT /F1 10 Tf 2 Tc 100 100 Td (ABC) Tj (D) Tj ET");
    let xs: Vec<f64> = page.letters.iter().map(|l| l.start_base_line.x).collect();
    assert_eq!(xs.len(), 4);
    assert!(approx(xs[0], 100.0));
    assert!(approx(xs[1], 107.0));
    assert!(approx(xs[2], 114.0));
    assert!(approx(xs[3], 100.0 + 3.0 * 5.0 + 2.0 * 2.0));
}

#[test]
fn test_horizontal_scaling_scales_the_advance() {
    let page = run_default("BT /F1 10 Tf 2 Tc 50 Tz (ABC) Tj (D) Tj ET");
    let d = &page.letters[3];
    assert!(approx(d.start_base_line.x, (3.0 * 5.0 + 2.0 * 2.0) * 0.5));
    assert!(approx(page.letters[0].width, 2.5));
}

#[test]
fn test_word_spacing_on_single_byte_space() {
    let page = run_default("BT /F1 10 Tf 5 Tw (A B) Tj ET");
    assert_eq!(page.text(), "A B");
    assert!(approx(page.letters[2].start_base_line.x, 5.0 + 5.0 + 5.0));
}

#[test]
fn test_tj_adjustments_move_left_for_positive_numbers() {
    let page = run_default("BT /F1 10 Tf [(A) -1000 (B) 500 (C)] TJ ET");
    let xs: Vec<f64> = page.letters.iter().map(|l| l.start_base_line.x).collect();
    assert!(approx(xs[1], 15.0));
    assert!(approx(xs[2], 15.0 + 5.0 - 5.0));
}

#[test]
fn test_quote_operators_move_to_next_line() {
    let page = run_default("BT /F1 10 Tf 14 TL 0 100 Td (A) ' 3 1 (BC) \" ET");
    assert_eq!(page.text(), "ABC");
    assert!(approx(page.letters[0].start_base_line.y, 86.0));
    assert!(approx(page.letters[1].start_base_line.y, 72.0));
    // `"` set Tc to 1 before showing.
    assert!(approx(page.letters[2].start_base_line.x, 6.0));
}

#[test]
fn test_td_sets_leading() {
    let page = run_default("BT /F1 10 Tf 0 -12 TD (A) Tj T* (B) Tj ET");
    assert!(approx(page.letters[0].start_base_line.y, -12.0));
    assert!(approx(page.letters[1].start_base_line.y, -24.0));
}

// ============================================================================
// Letter attributes
// ============================================================================

#[test]
fn test_point_size_follows_the_ctm() {
    let page = run_default("2 0 0 2 0 0 cm BT /F1 10 Tf (A) Tj ET");
    let letter = &page.letters[0];
    assert_eq!(letter.font_size, 10.0);
    assert_eq!(letter.point_size, 20.0);
    assert!(approx(letter.glyph_rectangle.height(), 20.0));
}

#[test]
fn test_glyph_rectangle_rotates_with_text_matrix() {
    let page = run_default("BT /F1 10 Tf 0 1 -1 0 200 200 Tm (A) Tj ET");
    let letter = &page.letters[0];
    assert!(approx(letter.start_base_line.x, 200.0));
    assert!(approx(letter.end_base_line.y, 205.0));
    assert!(approx(letter.glyph_rectangle.width(), 5.0));
    assert!(approx(letter.point_size, 10.0));
}

#[test]
fn test_text_sequence_counts_show_calls() {
    let page = run_default("BT /F1 10 Tf (AB) Tj [(C) 10 (D)] TJ ET");
    let ids: Vec<u64> = page.letters.iter().map(|l| l.text_sequence).collect();
    assert_eq!(ids, vec![1, 1, 2, 3]);
}

#[test]
fn test_colour_follows_rendering_mode() {
    let page = run_default("1 0 0 RG 0 0 1 rg BT /F1 10 Tf (A) Tj 1 Tr (B) Tj ET");
    assert_eq!(page.letters[0].color(), &Color::Rgb(0.0, 0.0, 1.0));
    assert_eq!(page.letters[1].rendering_mode, TextRenderingMode::Stroke);
    assert_eq!(page.letters[1].color(), &Color::Rgb(1.0, 0.0, 0.0));
    assert_eq!(page.letters[0].font_name, "F1");
}

// ============================================================================
// Diacritics
// ============================================================================

fn accented(options: ParsingOptions) -> folio_core::PageContent {
    let mut store = ScopedResources::with_factory(page_resources(), AccentFontFactory);
    process_page(
        b"BT /F1 10 Tf (e\x80x) Tj ET",
        folio_core::PageSetup::letter(),
        &mut store,
        options,
    )
    .expect("page should interpret")
}

#[test]
fn test_combining_mark_merges_into_previous_letter() {
    let page = accented(ParsingOptions::default());
    let values: Vec<&str> = page.letters.iter().map(|l| l.value.as_str()).collect();
    assert_eq!(values, vec!["\u{e9}", "x"]);
}

#[test]
fn test_combining_marks_kept_apart_when_disabled() {
    let page = accented(ParsingOptions::default().with_combine_diacritics(false));
    assert_eq!(page.letters.len(), 3);
    assert_eq!(page.letters[1].value, "\u{0301}");
}

// ============================================================================
// Fonts
// ============================================================================

#[test]
fn test_missing_font_is_an_error_by_default() {
    let err = run("BT /F9 12 Tf (A) Tj ET", page_resources(), ParsingOptions::default())
        .expect_err("unknown font");
    assert!(matches!(
        err,
        PdfError::MissingResource { kind: ResourceKind::Font, ref name } if name == "F9"
    ));
}

#[test]
fn test_missing_font_is_skipped_when_tolerated() {
    let options = ParsingOptions::default().with_skip_missing_resources(true);
    let page = run("BT /F9 12 Tf (A) Tj /F1 12 Tf (B) Tj ET", page_resources(), options)
        .expect("missing font skipped");
    assert_eq!(page.text(), "B");
}

#[test]
fn test_show_without_font() {
    let err = run("BT (A) Tj ET", page_resources(), ParsingOptions::default())
        .expect_err("no font selected");
    assert!(matches!(err, PdfError::MissingResource { .. }));
}

#[test]
fn test_font_from_graphics_state_dictionary() {
    use folio_core::model::Object;
    use folio_core::model::objects::dict;

    let gs = dict([(
        "Font",
        Object::Array(vec![Object::Dict(common::font_dict()), Object::Int(20)]),
    )]);
    let resources = common::with_entries(page_resources(), "ExtGState", dict([("GS1", Object::Dict(gs))]));
    let page = run("/GS1 gs BT (AB) Tj ET", resources, ParsingOptions::default())
        .expect("page should interpret");
    assert_eq!(page.letters.len(), 2);
    assert_eq!(page.letters[0].font_size, 20.0);
    assert_eq!(page.letters[0].font_name, "Helvetica");
    assert!(approx(page.letters[1].start_base_line.x, 10.0));

    // Tf takes over again.
    let resources = common::with_entries(
        page_resources(),
        "ExtGState",
        dict([(
            "GS1",
            Object::Dict(dict([(
                "Font",
                Object::Array(vec![Object::Dict(common::font_dict()), Object::Int(20)]),
            )])),
        )]),
    );
    let page = run("/GS1 gs BT /F1 10 Tf (A) Tj ET", resources, ParsingOptions::default())
        .expect("page should interpret");
    assert_eq!(page.letters[0].font_name, "F1");
    assert_eq!(page.letters[0].font_size, 10.0);
}
