//! Graphics state, path painting and clipping.

mod common;

use common::{approx, page_resources, run, run_default};
use folio_core::geometry::{FillRule, LineCap, Point};
use folio_core::model::Color;
use folio_core::{ParsingOptions, PdfError};

// ============================================================================
// State stack
// ============================================================================

#[test]
fn test_restore_discards_changes_made_after_save() {
    let page = run_default("q 1 0 0 RG 5 w 2 J 2 0 0 2 0 0 cm Q 10 10 m 20 10 l S");
    let stroke = page.paths[0].stroke.as_ref().expect("stroked");
    assert_eq!(stroke.color, Color::Gray(0.0));
    assert_eq!(stroke.width, 1.0);
    assert_eq!(stroke.cap, LineCap::Butt);
    assert_eq!(page.paths[0].subpaths[0].start_point(), Point::new(10.0, 10.0));
}

#[test]
fn test_unmatched_restore_is_an_error() {
    let err = run("q Q Q", page_resources(), ParsingOptions::default()).expect_err("underflow");
    assert!(matches!(err, PdfError::GraphicsStateUnderflow));
}

#[test]
fn test_line_width_is_scaled_into_device_space() {
    let page = run_default("3 0 0 3 0 0 cm 2 w 10 10 m 20 10 l S");
    let stroke = page.paths[0].stroke.as_ref().expect("stroked");
    assert!(approx(stroke.width, 6.0));
}

// ============================================================================
// Path painting
// ============================================================================

#[test]
fn test_paint_operators_set_fill_and_stroke() {
    let page = run_default(
        "0.5 g 10 10 50 50 re f \
         10 10 50 50 re f* \
         10 10 50 50 re B \
         10 10 m 20 20 l 30 10 l b* \
         10 10 m 20 20 l s",
    );
    assert_eq!(page.paths.len(), 5);
    let fill = page.paths[0].fill.as_ref().expect("filled");
    assert_eq!(fill.rule, FillRule::NonZeroWinding);
    assert_eq!(fill.color, Color::Gray(0.5));
    assert!(page.paths[0].stroke.is_none());
    assert_eq!(page.paths[1].fill.as_ref().map(|f| f.rule), Some(FillRule::EvenOdd));
    assert!(page.paths[2].is_filled() && page.paths[2].is_stroked());
    assert_eq!(page.paths[3].fill.as_ref().map(|f| f.rule), Some(FillRule::EvenOdd));
    assert!(page.paths[3].subpaths[0].is_closed());
    assert!(page.paths[4].subpaths[0].is_closed());
    assert!(!page.paths[4].is_filled());
}

#[test]
fn test_end_path_without_clip_draws_nothing() {
    let page = run_default("10 10 50 50 re n");
    assert!(page.paths.is_empty());
}

#[test]
fn test_rectangle_keeps_rotation() {
    let page = run_default("0.7071 0.7071 -0.7071 0.7071 300 300 cm 0 0 10 10 re f");
    let sp = &page.paths[0].subpaths[0];
    assert!(!sp.is_drawn_as_rectangle());
    assert_eq!(sp.start_point(), Point::new(300.0, 300.0));
}

// ============================================================================
// Clipping
// ============================================================================

#[test]
fn test_path_outside_the_clip_is_dropped() {
    let page = run_default("0 0 100 100 re W n 200 200 50 50 re f");
    assert!(page.paths.is_empty());
}

#[test]
fn test_overlapping_path_is_cut_to_the_clip() {
    let page = run_default("0 0 100 100 re W n 50 50 100 100 re f");
    assert_eq!(page.paths.len(), 1);
    let bounds = page.paths[0].bounding_rectangle().expect("non-empty");
    assert!(approx(bounds.left(), 50.0));
    assert!(approx(bounds.bottom(), 50.0));
    assert!(approx(bounds.right(), 100.0));
    assert!(approx(bounds.top(), 100.0));
}

#[test]
fn test_clip_is_restored_with_the_graphics_state() {
    let page = run_default("q 0 0 100 100 re W n Q 200 200 50 50 re f");
    assert_eq!(page.paths.len(), 1);
}

#[test]
fn test_disjoint_clip_leaves_active_clip_unchanged() {
    let page = run_default(
        "0 0 100 100 re W n 300 300 10 10 re W n 10 10 20 20 re f",
    );
    assert_eq!(page.paths.len(), 1);
}

#[test]
fn test_clipping_disabled_reports_clip_paths() {
    let options = ParsingOptions::default().with_clip_paths(false);
    let page = run(
        "0 0 100 100 re W n 200 200 50 50 re f",
        page_resources(),
        options,
    )
    .expect("page should interpret");
    assert_eq!(page.paths.len(), 2);
    assert_eq!(page.paths[0].clipping, Some(FillRule::NonZeroWinding));
    assert!(!page.paths[0].is_filled());
    assert!(page.paths[1].is_filled());
}

#[test]
fn test_fill_and_clip_in_one_path() {
    let page = run_default("0 0 100 100 re W* f 200 200 50 50 re f");
    assert_eq!(page.paths.len(), 1);
    assert_eq!(page.paths[0].clipping, Some(FillRule::EvenOdd));
}

// ============================================================================
// ExtGState
// ============================================================================

#[test]
fn test_graphics_state_dictionary_sets_line_parameters() {
    use folio_core::model::Object;
    use folio_core::model::objects::dict;

    let gs = dict([
        ("LW", Object::Int(4)),
        ("LC", Object::Int(1)),
        ("CA", Object::Real(0.5)),
        (
            "D",
            Object::Array(vec![Object::Array(vec![Object::Int(3)]), Object::Int(0)]),
        ),
    ]);
    let resources = common::with_entries(page_resources(), "ExtGState", dict([("GS1", Object::Dict(gs))]));
    let page = run("/GS1 gs 10 10 m 20 10 l S", resources, ParsingOptions::default())
        .expect("page should interpret");
    let stroke = page.paths[0].stroke.as_ref().expect("stroked");
    assert_eq!(stroke.width, 4.0);
    assert_eq!(stroke.cap, LineCap::Round);
    assert_eq!(stroke.dash.array, vec![3.0]);
}

#[test]
fn test_missing_graphics_state_dictionary() {
    let err = run("/GS9 gs", page_resources(), ParsingOptions::default()).expect_err("missing");
    assert!(matches!(err, PdfError::MissingResource { .. }));
}
