//! Error types for folio content-stream interpretation.

use thiserror::Error;

/// Kind of named resource that could not be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Font,
    XObject,
    ExtGState,
    ColorSpace,
    Properties,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Font => "font",
            Self::XObject => "XObject",
            Self::ExtGState => "graphics state dictionary",
            Self::ColorSpace => "color space",
            Self::Properties => "property list",
        };
        f.write_str(name)
    }
}

/// Primary error type for content-stream interpretation.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("invalid token at position {pos}: {msg}")]
    TokenError { pos: usize, msg: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    /// Malformed or contradictory document structure. The geometry produced
    /// so far cannot be trusted.
    #[error("format error: {0}")]
    Format(String),

    #[error("transformation matrix is not invertible")]
    SingularTransform,

    #[error("no {kind} named {name} in the current resources")]
    MissingResource { kind: ResourceKind, name: String },

    #[error("form XObject nesting exceeds the limit of {limit}")]
    RecursionLimitExceeded { limit: usize },

    #[error("graphics state restore without a matching save")]
    GraphicsStateUnderflow,

    #[error("decode error: {0}")]
    Decode(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub(crate) fn missing(kind: ResourceKind, name: &str) -> Self {
        Self::MissingResource {
            kind,
            name: name.to_string(),
        }
    }
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
