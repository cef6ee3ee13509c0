//! Content stream interpretation.
//!
//! This module contains:
//! - `lexer` / `operation`: tokens and the decoded operator enum
//! - `processor`: the page processor and its form scopes
//! - `ops`: operator implementations by category
//! - `state`, `color`, `path`: graphics state, colour context and path builder
//! - `font`, `resources`: the font and resource-store interfaces
//! - `content`, `image`, `marked_content`: what a page produces

pub mod color;
pub mod content;
pub mod font;
pub mod image;
pub mod lexer;
pub mod marked_content;
pub mod operation;
pub mod ops;
pub mod path;
pub mod processor;
pub mod resources;
pub mod state;

// Re-export main types for convenience
pub use content::{Letter, PageContent};
pub use font::{CharacterBoundingBox, Font, FontFactory, SimpleFont, SimpleFontFactory};
pub use image::{Image, ImageData, InlineImage, XObjectImage, XObjectRecord};
pub use lexer::{ContentLexer, Token, tokenize, try_tokenize};
pub use marked_content::{Artifact, ArtifactType, MarkedContentElement, MarkedContentStack};
pub use operation::{Operation, PropertyList, TextItem, decode_operations};
pub use processor::{ContentStreamProcessor, process_page};
pub use resources::{ResourceStore, ScopedResources, XObject, XObjectKind};
pub use state::{GraphicsState, GraphicsStateStack, TextRenderingMode, TextState};
