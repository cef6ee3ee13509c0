//! Data model types.
//!
//! - `objects` - object values (`Object`, `Dictionary`, `Stream`)
//! - `color` - colour spaces and colour values

pub mod color;
pub mod objects;

pub use color::{Color, ColorSpace};
pub use objects::{Dictionary, Name, Object, ObjectId, Stream};
