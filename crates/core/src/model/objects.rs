//! Object values: the operands of content-stream operators and the
//! building blocks of resource dictionaries.

use std::fmt;

use bytes::Bytes;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use smol_str::SmolStr;

use crate::error::{PdfError, Result};

/// Name object without the leading slash (`/Font` is `"Font"`).
pub type Name = SmolStr;

/// Insertion-ordered dictionary.
pub type Dictionary = IndexMap<Name, Object>;

/// Identifier of an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ObjectId {
    pub number: u32,
    pub generation: u16,
}

impl ObjectId {
    pub const fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// Object value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Object {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Name(Name),
    /// String bytes; literal and hex strings are not distinguished.
    String(Vec<u8>),
    Array(Vec<Object>),
    Dict(Dictionary),
    Stream(Box<Stream>),
    Ref(ObjectId),
}

impl Object {
    pub fn name(name: &str) -> Self {
        Self::Name(Name::new(name))
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(PdfError::TypeError {
                expected: "bool",
                got: self.type_name(),
            }),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            Self::Real(n) => Ok(*n as i64),
            _ => Err(PdfError::TypeError {
                expected: "int",
                got: self.type_name(),
            }),
        }
    }

    /// Numeric value, integers coerced to `f64`.
    pub const fn as_num(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "number",
                got: self.type_name(),
            }),
        }
    }

    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "name",
                got: self.type_name(),
            }),
        }
    }

    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "string",
                got: self.type_name(),
            }),
        }
    }

    pub fn as_array(&self) -> Result<&[Object]> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(PdfError::TypeError {
                expected: "array",
                got: self.type_name(),
            }),
        }
    }

    /// Dictionary view; a stream yields its dictionary.
    pub fn as_dict(&self) -> Result<&Dictionary> {
        match self {
            Self::Dict(d) => Ok(d),
            Self::Stream(s) => Ok(&s.dict),
            _ => Err(PdfError::TypeError {
                expected: "dict",
                got: self.type_name(),
            }),
        }
    }

    pub fn as_stream(&self) -> Result<&Stream> {
        match self {
            Self::Stream(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "stream",
                got: self.type_name(),
            }),
        }
    }

    /// Array of numbers, e.g. a matrix or a bounding box.
    pub fn as_numbers(&self) -> Result<Vec<f64>> {
        self.as_array()?.iter().map(Object::as_num).collect()
    }

    /// Text string decoded as UTF-16BE (with BOM) or PDFDocEncoding
    /// approximated as Latin-1.
    pub fn as_text(&self) -> Result<String> {
        Ok(decode_text_string(self.as_string()?))
    }

    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Stream(_) => "stream",
            Self::Ref(_) => "ref",
        }
    }
}

impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<i64> for Object {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for Object {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Dictionary> for Object {
    fn from(d: Dictionary) -> Self {
        Self::Dict(d)
    }
}

impl From<Stream> for Object {
    fn from(s: Stream) -> Self {
        Self::Stream(Box::new(s))
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Real(n) => serializer.serialize_f64(*n),
            Self::Name(n) => serializer.serialize_str(&format!("/{n}")),
            Self::String(bytes) => serializer.serialize_str(&decode_text_string(bytes)),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Dict(d) => d.serialize(serializer),
            Self::Stream(s) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("dict", &s.dict)?;
                map.serialize_entry("length", &s.data.len())?;
                map.end()
            }
            Self::Ref(id) => serializer.serialize_str(&id.to_string()),
        }
    }
}

/// Decodes a text string: UTF-16BE when it starts with a byte-order mark,
/// otherwise one byte per character.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| char::from(b)).collect()
    }
}

/// Stream: a dictionary plus raw (possibly filtered) bytes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stream {
    pub dict: Dictionary,
    pub data: Bytes,
    pub id: Option<ObjectId>,
}

impl Stream {
    pub fn new(dict: Dictionary, data: impl Into<Bytes>) -> Self {
        Self {
            dict,
            data: data.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.dict.get(key)
    }

    /// First present key; covers full and abbreviated spellings.
    pub fn get_any(&self, keys: &[&str]) -> Option<&Object> {
        get_any(&self.dict, keys)
    }

    /// `/Filter` entry as a list of filter names.
    pub fn filters(&self) -> Vec<Name> {
        match self.get("Filter") {
            Some(Object::Name(n)) => vec![n.clone()],
            Some(Object::Array(arr)) => arr
                .iter()
                .filter_map(|o| o.as_name().ok().map(Name::new))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// First present key of `dict`.
pub fn get_any<'a>(dict: &'a Dictionary, keys: &[&str]) -> Option<&'a Object> {
    keys.iter().find_map(|k| dict.get(*k))
}

/// Builds a dictionary from `(key, value)` pairs.
pub fn dict<const N: usize>(entries: [(&str, Object); N]) -> Dictionary {
    entries
        .into_iter()
        .map(|(k, v)| (Name::new(k), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_coerce() {
        assert_eq!(Object::Int(3).as_num().unwrap(), 3.0);
        assert_eq!(Object::Real(2.5).as_num().unwrap(), 2.5);
        assert!(matches!(
            Object::name("X").as_num(),
            Err(PdfError::TypeError {
                expected: "number",
                got: "name"
            })
        ));
    }

    #[test]
    fn stream_dict_is_a_dict() {
        let s = Stream::new(dict([("Subtype", Object::name("Form"))]), Vec::new());
        let obj = Object::from(s);
        assert_eq!(
            obj.as_dict().unwrap().get("Subtype"),
            Some(&Object::name("Form"))
        );
    }

    #[test]
    fn text_strings() {
        assert_eq!(decode_text_string(b"abc"), "abc");
        assert_eq!(decode_text_string(&[0xFE, 0xFF, 0x00, 0x41, 0x00, 0xE9]), "Aé");
    }

    #[test]
    fn filter_names() {
        let s = Stream::new(
            dict([(
                "Filter",
                Object::Array(vec![Object::name("FlateDecode"), Object::name("DCTDecode")]),
            )]),
            Vec::new(),
        );
        assert_eq!(s.filters(), vec![Name::new("FlateDecode"), Name::new("DCTDecode")]);
    }
}
