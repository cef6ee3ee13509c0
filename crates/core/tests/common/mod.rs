//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use folio_core::interp::{Font, FontFactory, SimpleFont};
use folio_core::model::objects::dict;
use folio_core::model::{Dictionary, Object, Stream};
use folio_core::{PageContent, PageSetup, ParsingOptions, Result, ScopedResources, process_page};

/// Every printable ASCII glyph is 500 units wide; the font box spans
/// -200..800.
pub fn font_dict() -> Dictionary {
    dict([
        ("Type", Object::name("Font")),
        ("Subtype", Object::name("Type1")),
        ("BaseFont", Object::name("Helvetica")),
        ("FirstChar", Object::Int(32)),
        (
            "Widths",
            Object::Array((32..=126).map(|_| Object::Int(500)).collect()),
        ),
        (
            "FontDescriptor",
            Object::Dict(dict([(
                "FontBBox",
                Object::Array(vec![
                    Object::Int(0),
                    Object::Int(-200),
                    Object::Int(1000),
                    Object::Int(800),
                ]),
            )])),
        ),
    ])
}

/// Page resources with `/F1` bound to [`font_dict`].
pub fn page_resources() -> Dictionary {
    dict([("Font", Object::Dict(dict([("F1", Object::Dict(font_dict()))])))])
}

/// Adds `entries` to the `category` sub-dictionary of `resources`.
pub fn with_entries(mut resources: Dictionary, category: &str, entries: Dictionary) -> Dictionary {
    let slot = resources
        .entry(category.into())
        .or_insert_with(|| Object::Dict(Dictionary::new()));
    if let Object::Dict(existing) = slot {
        existing.extend(entries);
    }
    resources
}

/// A form XObject stream with `/BBox` and the given extra entries.
pub fn form(content: &str, extra: Dictionary) -> Object {
    let mut d = dict([
        ("Type", Object::name("XObject")),
        ("Subtype", Object::name("Form")),
        (
            "BBox",
            Object::Array(vec![
                Object::Int(0),
                Object::Int(0),
                Object::Int(612),
                Object::Int(792),
            ]),
        ),
    ]);
    d.extend(extra);
    Object::from(Stream::new(d, content.as_bytes().to_vec()))
}

pub fn run(content: &str, resources: Dictionary, options: ParsingOptions) -> Result<PageContent> {
    let mut store = ScopedResources::new(resources);
    process_page(content.as_bytes(), PageSetup::letter(), &mut store, options)
}

pub fn run_default(content: &str) -> PageContent {
    run(content, page_resources(), ParsingOptions::default()).expect("page should interpret")
}

/// Builds every font as the fixture font plus a combining acute accent at
/// code 0x80.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccentFontFactory;

impl FontFactory for AccentFontFactory {
    fn build(&self, _name: Option<&str>, _dict: &Dictionary) -> Result<Arc<dyn Font>> {
        Ok(Arc::new(
            SimpleFont::new("Accented")
                .with_widths(32, vec![500.0; 97])
                .with_unicode(0x80, "\u{0301}"),
        ))
    }
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

/// Deterministic xorshift generator for property-style tests.
pub struct XorShift64(u64);

impl XorShift64 {
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Uniform in `[lo, hi)`.
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        lo + unit * (hi - lo)
    }
}
