//! Marked-content tree built from `BMC`/`BDC` ... `EMC`.

use serde::Serialize;
use tracing::debug;

use super::content::Letter;
use super::image::Image;
use crate::geometry::{Rectangle, Subpath};
use crate::model::objects::{Dictionary, Name, Object};

/// `/Type` of an `Artifact` property list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ArtifactType {
    Pagination,
    Layout,
    Page,
    Background,
    #[default]
    Unknown,
}

impl ArtifactType {
    fn from_name(name: &str) -> Self {
        match name {
            "Pagination" => Self::Pagination,
            "Layout" => Self::Layout,
            "Page" => Self::Page,
            "Background" => Self::Background,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    pub artifact_type: ArtifactType,
    pub subtype: Option<Name>,
    /// `/O`
    pub attribute_owners: Option<Name>,
    pub bounding_box: Option<Rectangle>,
    /// Page edges the artifact is attached to.
    pub attached: Vec<Name>,
}

/// A closed marked-content sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkedContentElement {
    pub tag: Name,
    /// Position of the enclosing root sequence on the page.
    pub index: i64,
    /// `-1` when the property list has no `/MCID`.
    pub mcid: i64,
    pub language: Option<String>,
    pub actual_text: Option<String>,
    pub alternate_description: Option<String>,
    pub expanded_form: Option<String>,
    pub properties: Dictionary,
    /// Set for the `Artifact` tag.
    pub artifact: Option<Artifact>,
    pub letters: Vec<Letter>,
    pub paths: Vec<Subpath>,
    pub images: Vec<Image>,
    pub children: Vec<MarkedContentElement>,
}

impl MarkedContentElement {
    pub fn is_artifact(&self) -> bool {
        self.artifact.is_some()
    }

    /// Letters of this element and of all its descendants, in order.
    pub fn all_letters(&self) -> Vec<&Letter> {
        let mut out: Vec<&Letter> = self.letters.iter().collect();
        for child in &self.children {
            out.extend(child.all_letters());
        }
        out
    }
}

#[derive(Debug, Clone)]
struct OpenNode {
    tag: Name,
    index: i64,
    properties: Dictionary,
    letters: Vec<Letter>,
    paths: Vec<Subpath>,
    images: Vec<Image>,
    children: Vec<MarkedContentElement>,
}

impl OpenNode {
    fn finalize(self) -> MarkedContentElement {
        let props = &self.properties;
        let mcid = match props.get("MCID").map(Object::as_int) {
            Some(Ok(id)) => id,
            Some(Err(err)) => {
                debug!(tag = %self.tag, %err, "ignoring malformed /MCID");
                -1
            }
            None => -1,
        };
        let artifact = (self.tag == "Artifact").then(|| read_artifact(props));

        MarkedContentElement {
            mcid,
            language: text_entry(props, "Lang"),
            actual_text: text_entry(props, "ActualText"),
            alternate_description: text_entry(props, "Alt"),
            expanded_form: text_entry(props, "E"),
            artifact,
            tag: self.tag,
            index: self.index,
            properties: self.properties,
            letters: self.letters,
            paths: self.paths,
            images: self.images,
            children: self.children,
        }
    }
}

fn text_entry(props: &Dictionary, key: &str) -> Option<String> {
    match props.get(key)? {
        Object::String(bytes) => Some(crate::model::objects::decode_text_string(bytes)),
        Object::Name(n) => Some(n.to_string()),
        _ => None,
    }
}

fn name_entry(props: &Dictionary, key: &str) -> Option<Name> {
    props.get(key)?.as_name().ok().map(Name::new)
}

fn read_artifact(props: &Dictionary) -> Artifact {
    let bounding_box = props
        .get("BBox")
        .and_then(|b| b.as_numbers().ok())
        .and_then(|values| match values.as_slice() {
            [l, b, r, t] | [_, _, l, b, r, t] => Some(Rectangle::new(*l, *b, *r, *t)),
            _ => None,
        });
    let attached = props
        .get("Attached")
        .and_then(|a| a.as_array().ok())
        .map(|items| {
            items
                .iter()
                .filter_map(|o| o.as_name().ok().map(Name::new))
                .collect()
        })
        .unwrap_or_default();
    Artifact {
        artifact_type: name_entry(props, "Type")
            .map(|t| ArtifactType::from_name(&t))
            .unwrap_or_default(),
        subtype: name_entry(props, "Subtype"),
        attribute_owners: name_entry(props, "O"),
        bounding_box,
        attached,
    }
}

/// Sequences that are still open, innermost last.
#[derive(Debug, Clone)]
pub struct MarkedContentStack {
    open: Vec<OpenNode>,
    /// Index of the most recent root; `-1` before the first.
    sequence: i64,
}

impl Default for MarkedContentStack {
    fn default() -> Self {
        Self {
            open: Vec::new(),
            sequence: -1,
        }
    }
}

impl MarkedContentStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn push(&mut self, tag: Name, properties: Dictionary) {
        if self.open.is_empty() {
            self.sequence += 1;
        }
        self.open.push(OpenNode {
            tag,
            index: self.sequence,
            properties,
            letters: Vec::new(),
            paths: Vec::new(),
            images: Vec::new(),
            children: Vec::new(),
        });
    }

    /// Closes the innermost sequence. A root is returned; a nested one is
    /// attached to its parent and `None` is returned.
    pub fn pop(&mut self) -> Option<MarkedContentElement> {
        let element = self.open.pop()?.finalize();
        match self.open.last_mut() {
            Some(parent) => {
                parent.children.push(element);
                None
            }
            None => Some(element),
        }
    }

    /// Closes everything still open, returning the root.
    pub fn close_all(&mut self) -> Option<MarkedContentElement> {
        let mut root = None;
        while !self.open.is_empty() {
            root = self.pop().or(root);
        }
        root
    }

    pub fn add_letter(&mut self, letter: &Letter) {
        if let Some(node) = self.open.last_mut() {
            node.letters.push(letter.clone());
        }
    }

    pub fn add_path(&mut self, subpath: &Subpath) {
        if let Some(node) = self.open.last_mut() {
            node.paths.push(subpath.clone());
        }
    }

    pub fn add_image(&mut self, image: &Image) {
        if let Some(node) = self.open.last_mut() {
            node.images.push(image.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::interp::state::TextRenderingMode;
    use crate::model::color::Color;
    use crate::model::objects::dict;

    fn letter(value: &str) -> Letter {
        Letter {
            value: value.to_string(),
            glyph_rectangle: Rectangle::new(0.0, 0.0, 1.0, 1.0),
            start_base_line: Point::ORIGIN,
            end_base_line: Point::new(1.0, 0.0),
            width: 1.0,
            font_name: Name::new("F"),
            font_size: 1.0,
            point_size: 1.0,
            rendering_mode: TextRenderingMode::Fill,
            stroke_color: Color::default(),
            fill_color: Color::default(),
            text_sequence: 1,
        }
    }

    #[test]
    fn nested_letter_lands_in_the_child_only() {
        let mut stack = MarkedContentStack::new();
        stack.push(Name::new("P"), Dictionary::new());
        stack.push(Name::new("Span"), Dictionary::new());
        stack.add_letter(&letter("a"));
        assert!(stack.pop().is_none());
        let root = stack.pop().unwrap();

        assert_eq!(root.tag, "P");
        assert!(root.letters.is_empty());
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].tag, "Span");
        assert_eq!(root.children[0].letters.len(), 1);
        assert_eq!(root.all_letters().len(), 1);
    }

    #[test]
    fn index_advances_per_root() {
        let mut stack = MarkedContentStack::new();
        stack.push(Name::new("A"), Dictionary::new());
        stack.push(Name::new("B"), Dictionary::new());
        stack.pop();
        let first = stack.pop().unwrap();
        stack.push(Name::new("C"), Dictionary::new());
        let second = stack.pop().unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.children[0].index, 0);
        assert_eq!(second.index, 1);
    }

    #[test]
    fn metadata_is_read() {
        let mut stack = MarkedContentStack::new();
        stack.push(
            Name::new("Span"),
            dict([
                ("MCID", Object::Int(4)),
                ("Lang", Object::String(b"en-US".to_vec())),
                ("ActualText", Object::String(vec![0xFE, 0xFF, 0x00, 0x66, 0x00, 0x69])),
            ]),
        );
        let el = stack.pop().unwrap();
        assert_eq!(el.mcid, 4);
        assert_eq!(el.language.as_deref(), Some("en-US"));
        assert_eq!(el.actual_text.as_deref(), Some("fi"));
        assert_eq!(el.alternate_description, None);

        stack.push(Name::new("P"), Dictionary::new());
        assert_eq!(stack.pop().unwrap().mcid, -1);
    }

    #[test]
    fn artifact_fields() {
        let mut stack = MarkedContentStack::new();
        stack.push(
            Name::new("Artifact"),
            dict([
                ("Type", Object::name("Pagination")),
                ("Subtype", Object::name("Header")),
                (
                    "BBox",
                    Object::Array(
                        [0, 0, 10, 700, 600, 780]
                            .into_iter()
                            .map(Object::Int)
                            .collect(),
                    ),
                ),
                ("Attached", Object::Array(vec![Object::name("Top")])),
            ]),
        );
        let el = stack.pop().unwrap();
        let artifact = el.artifact.unwrap();
        assert_eq!(artifact.artifact_type, ArtifactType::Pagination);
        assert_eq!(artifact.subtype.as_deref(), Some("Header"));
        let bbox = artifact.bounding_box.unwrap();
        assert_eq!((bbox.left(), bbox.bottom(), bbox.right(), bbox.top()), (10.0, 700.0, 600.0, 780.0));
        assert_eq!(artifact.attached, vec![Name::new("Top")]);
    }

    #[test]
    fn adds_without_open_nodes_are_ignored() {
        let mut stack = MarkedContentStack::new();
        stack.add_letter(&letter("x"));
        assert!(stack.pop().is_none());
    }

    #[test]
    fn close_all_returns_the_root() {
        let mut stack = MarkedContentStack::new();
        stack.push(Name::new("P"), Dictionary::new());
        stack.push(Name::new("Span"), Dictionary::new());
        let root = stack.close_all().unwrap();
        assert_eq!(root.tag, "P");
        assert_eq!(root.children.len(), 1);
        assert!(stack.is_empty());
    }
}
