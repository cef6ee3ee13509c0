//! 2D geometry kernel.
//!
//! - `transform` - affine matrices (`AffineTransform`)
//! - `primitives` - `Point` and four-corner `Rectangle`
//! - `bezier` - curve evaluation and tight bounding boxes
//! - `subpath` / `path` - path commands and paint parameters
//! - `clip` - polygon clipping under even-odd and non-zero rules

pub mod bezier;
pub mod clip;
pub mod path;
pub mod primitives;
pub mod subpath;
pub mod transform;

pub use path::{DashPattern, FillParams, FillRule, LineCap, LineJoin, Path, StrokeParams};
pub use primitives::{Point, Rectangle};
pub use subpath::{PathCommand, Subpath};
pub use transform::AffineTransform;
