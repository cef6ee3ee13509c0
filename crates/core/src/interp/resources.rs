//! Named resources of a page and of the form XObjects it invokes.
//!
//! Names are looked up from the innermost scope (the form being executed)
//! outward to the page's own resource dictionary.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::trace;

use super::font::{Font, FontFactory, SimpleFontFactory};
use crate::error::{PdfError, ResourceKind, Result};
use crate::model::color::ColorSpace;
use crate::model::objects::{Dictionary, Name, Object, ObjectId, Stream};

/// Indirect references are followed at most this many levels deep when a
/// resource is materialized.
const MAX_RESOLVE_DEPTH: usize = 8;

static NULL: Object = Object::Null;

/// `/Subtype` of an XObject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum XObjectKind {
    Image,
    Form,
    PostScript,
}

impl XObjectKind {
    pub fn from_subtype(subtype: &str) -> Option<Self> {
        match subtype {
            "Image" => Some(Self::Image),
            "Form" => Some(Self::Form),
            "PS" => Some(Self::PostScript),
            _ => None,
        }
    }
}

/// A classified XObject stream.
#[derive(Debug, Clone, PartialEq)]
pub struct XObject {
    pub name: Name,
    pub kind: XObjectKind,
    pub stream: Stream,
}

/// Source of the named resources an operator refers to.
///
/// Lookups that find nothing return [`PdfError::MissingResource`]; the
/// processor decides whether that is fatal.
pub trait ResourceStore {
    fn font(&mut self, name: &str) -> Result<Arc<dyn Font>>;

    /// Font given directly as an object, as in an ExtGState `/Font` entry.
    fn font_from_reference(&mut self, reference: &Object) -> Result<Arc<dyn Font>>;

    /// Unknown `/Subtype` values are a format error.
    fn xobject(&self, name: &str) -> Result<XObject>;

    /// Device and parameterless families resolve without a resource entry.
    fn color_space(&self, name: &str) -> Result<ColorSpace>;

    fn ext_graphics_state(&self, name: &str) -> Result<Dictionary>;

    fn marked_content_properties(&self, name: &str) -> Result<Dictionary>;

    /// Makes `resources` the innermost scope.
    fn push_scope(&mut self, resources: &Dictionary) -> Result<()>;

    fn pop_scope(&mut self);
}

/// [`ResourceStore`] over materialized resource dictionaries.
///
/// Indirect references inside the dictionaries are resolved through objects
/// registered with [`ScopedResources::with_object`].
#[derive(Debug)]
pub struct ScopedResources<F = SimpleFontFactory> {
    scopes: Vec<Dictionary>,
    objects: FxHashMap<ObjectId, Object>,
    factory: F,
    /// Built fonts keyed by the scope that defines them.
    fonts: FxHashMap<(usize, Name), Arc<dyn Font>>,
}

impl ScopedResources<SimpleFontFactory> {
    /// Store whose only scope is the page's resource dictionary.
    pub fn new(page_resources: Dictionary) -> Self {
        Self::with_factory(page_resources, SimpleFontFactory)
    }
}

impl Default for ScopedResources<SimpleFontFactory> {
    fn default() -> Self {
        Self::new(Dictionary::new())
    }
}

impl<F: FontFactory> ScopedResources<F> {
    pub fn with_factory(page_resources: Dictionary, factory: F) -> Self {
        Self {
            scopes: vec![page_resources],
            objects: FxHashMap::default(),
            factory,
            fonts: FxHashMap::default(),
        }
    }

    /// Registers the target of an indirect reference.
    pub fn with_object(mut self, id: ObjectId, object: Object) -> Self {
        self.objects.insert(id, object);
        self
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    fn resolve<'a>(&'a self, mut obj: &'a Object) -> &'a Object {
        for _ in 0..MAX_RESOLVE_DEPTH {
            match obj {
                Object::Ref(id) => match self.objects.get(id) {
                    Some(target) => obj = target,
                    None => return &NULL,
                },
                _ => return obj,
            }
        }
        &NULL
    }

    /// Copy of `obj` with every reachable indirect reference replaced by
    /// its target.
    fn materialize(&self, obj: &Object, depth: usize) -> Object {
        if depth > MAX_RESOLVE_DEPTH {
            return Object::Null;
        }
        match self.resolve(obj) {
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.materialize(item, depth + 1))
                    .collect(),
            ),
            Object::Dict(d) => Object::Dict(self.materialize_dict(d, depth)),
            Object::Stream(s) => Object::from(Stream {
                dict: self.materialize_dict(&s.dict, depth),
                ..(**s).clone()
            }),
            other => other.clone(),
        }
    }

    fn materialize_dict(&self, dict: &Dictionary, depth: usize) -> Dictionary {
        dict.iter()
            .map(|(k, v)| (k.clone(), self.materialize(v, depth + 1)))
            .collect()
    }

    /// Innermost scope defining `category/name`, with the entry.
    fn lookup(&self, category: &str, name: &str) -> Option<(usize, &Object)> {
        self.scopes.iter().enumerate().rev().find_map(|(index, scope)| {
            let entries = scope.get(category).map(|c| self.resolve(c))?;
            let Object::Dict(entries) = entries else {
                return None;
            };
            let entry = self.resolve(entries.get(name)?);
            (!entry.is_null()).then_some((index, entry))
        })
    }

    /// A colour space definition may name another entry of the same
    /// dictionary; `depth` bounds such chains.
    fn color_space_at(&self, name: &str, depth: usize) -> Result<ColorSpace> {
        if let Some(cs) = ColorSpace::from_name(name) {
            return Ok(cs);
        }
        let (_, entry) = self
            .lookup("ColorSpace", name)
            .filter(|_| depth < MAX_RESOLVE_DEPTH)
            .ok_or_else(|| PdfError::missing(ResourceKind::ColorSpace, name))?;
        let definition = self.materialize(entry, 0);
        let named = |other: &str| self.color_space_at(other, depth + 1).ok();
        ColorSpace::from_object(&definition, &named)
    }

    fn lookup_dict(&self, category: &str, name: &str, kind: ResourceKind) -> Result<Dictionary> {
        let (_, entry) = self
            .lookup(category, name)
            .ok_or_else(|| PdfError::missing(kind, name))?;
        match self.materialize(entry, 0) {
            Object::Dict(d) => Ok(d),
            Object::Stream(s) => Ok(s.dict),
            other => Err(PdfError::TypeError {
                expected: "dict",
                got: other.type_name(),
            }),
        }
    }
}

impl<F: FontFactory> ResourceStore for ScopedResources<F> {
    fn font(&mut self, name: &str) -> Result<Arc<dyn Font>> {
        let (scope, entry) = self
            .lookup("Font", name)
            .ok_or_else(|| PdfError::missing(ResourceKind::Font, name))?;
        let key = (scope, Name::new(name));
        if let Some(font) = self.fonts.get(&key) {
            return Ok(Arc::clone(font));
        }
        let Object::Dict(dict) = self.materialize(entry, 0) else {
            return Err(PdfError::format(format!("font /{name} is not a dictionary")));
        };
        let font = self.factory.build(Some(name), &dict)?;
        self.fonts.insert(key, Arc::clone(&font));
        Ok(font)
    }

    fn font_from_reference(&mut self, reference: &Object) -> Result<Arc<dyn Font>> {
        match self.materialize(reference, 0) {
            Object::Dict(dict) => self.factory.build(None, &dict),
            Object::Null => Err(PdfError::missing(
                ResourceKind::Font,
                &match reference {
                    Object::Ref(id) => id.to_string(),
                    other => other.type_name().to_string(),
                },
            )),
            other => Err(PdfError::TypeError {
                expected: "dict",
                got: other.type_name(),
            }),
        }
    }

    fn xobject(&self, name: &str) -> Result<XObject> {
        let (_, entry) = self
            .lookup("XObject", name)
            .ok_or_else(|| PdfError::missing(ResourceKind::XObject, name))?;
        let Object::Stream(stream) = self.materialize(entry, 0) else {
            return Err(PdfError::format(format!("XObject /{name} is not a stream")));
        };
        let subtype = stream
            .get("Subtype")
            .map(Object::as_name)
            .transpose()?
            .unwrap_or_default();
        let kind = XObjectKind::from_subtype(subtype).ok_or_else(|| {
            PdfError::format(format!("XObject /{name} has unsupported subtype /{subtype}"))
        })?;
        Ok(XObject {
            name: Name::new(name),
            kind,
            stream: *stream,
        })
    }

    fn color_space(&self, name: &str) -> Result<ColorSpace> {
        self.color_space_at(name, 0)
    }

    fn ext_graphics_state(&self, name: &str) -> Result<Dictionary> {
        self.lookup_dict("ExtGState", name, ResourceKind::ExtGState)
    }

    fn marked_content_properties(&self, name: &str) -> Result<Dictionary> {
        self.lookup_dict("Properties", name, ResourceKind::Properties)
    }

    fn push_scope(&mut self, resources: &Dictionary) -> Result<()> {
        trace!(depth = self.scopes.len(), "resource scope pushed");
        self.scopes.push(resources.clone());
        Ok(())
    }

    fn pop_scope(&mut self) {
        // The page scope stays.
        if self.scopes.len() > 1 {
            self.scopes.pop();
            let depth = self.scopes.len();
            self.fonts.retain(|(scope, _), _| *scope < depth);
            trace!(depth, "resource scope popped");
        }
    }
}
