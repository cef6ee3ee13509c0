//! folio - PDF content-stream interpretation.
//!
//! Replays a page's content stream against a graphics state and reports
//! what it draws: letters with device-space geometry, painted and clipped
//! paths, images, and the marked-content tree.
//!
//! ```no_run
//! use folio_core::{PageSetup, ParsingOptions, ScopedResources, process_page};
//! use folio_core::model::Dictionary;
//!
//! let mut resources = ScopedResources::new(Dictionary::new());
//! let page = process_page(
//!     b"BT /F1 12 Tf 72 720 Td (Hello) Tj ET",
//!     PageSetup::letter(),
//!     &mut resources,
//!     ParsingOptions::default(),
//! )?;
//! println!("{}", page.text());
//! # Ok::<(), folio_core::PdfError>(())
//! ```

pub mod error;
pub mod filters;
pub mod geometry;
pub mod interp;
pub mod model;
pub mod options;

pub use error::{PdfError, ResourceKind, Result};
pub use filters::{StandardDecoder, StreamDecoder};
pub use interp::{
    ContentStreamProcessor, Letter, PageContent, ResourceStore, ScopedResources, process_page,
};
pub use options::{PageSetup, ParsingOptions};
