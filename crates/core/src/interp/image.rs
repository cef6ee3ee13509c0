//! Image XObjects, inline images and uninterpreted XObjects.

use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use super::resources::XObjectKind;
use crate::error::{PdfError, Result};
use crate::geometry::{AffineTransform, Rectangle};
use crate::model::color::ColorSpace;
use crate::model::objects::{Dictionary, Name, Object, Stream};

/// Resolves an image's `/ColorSpace` entry.
pub type ColorSpaceResolver<'a> = dyn Fn(&Object) -> Result<ColorSpace> + 'a;

/// Properties shared by XObject and inline images.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageData {
    /// Unit square through the CTM.
    pub bounds: Rectangle,
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    /// `None` for image masks and for images that carry their own colour
    /// information (JPX).
    pub color_space: Option<ColorSpace>,
    pub is_image_mask: bool,
    pub interpolate: bool,
    pub decode: Vec<f64>,
    /// Still encoded with `filters`.
    #[serde(skip)]
    pub raw: Bytes,
    pub filters: Vec<Name>,
    pub rendering_intent: Name,
}

impl ImageData {
    /// Reads an image dictionary with full-length keys.
    fn read(
        dict: &Dictionary,
        raw: Bytes,
        bounds: Rectangle,
        rendering_intent: &Name,
        resolve: &ColorSpaceResolver<'_>,
    ) -> Result<Self> {
        let dimension = |key: &str| -> Result<u32> {
            let value = dict
                .get(key)
                .ok_or_else(|| PdfError::format(format!("image is missing /{key}")))?
                .as_int()?;
            u32::try_from(value).map_err(|_| PdfError::format(format!("image /{key} is {value}")))
        };
        let width = dimension("Width")?;
        let height = dimension("Height")?;

        let is_image_mask = dict
            .get("ImageMask")
            .map(Object::as_bool)
            .transpose()?
            .unwrap_or(false);
        let bits_per_component = match dict.get("BitsPerComponent") {
            Some(bpc) => bpc.as_int()?.clamp(1, 16) as u8,
            None if is_image_mask => 1,
            None => return Err(PdfError::format("image is missing /BitsPerComponent")),
        };
        let color_space = match dict.get("ColorSpace") {
            Some(cs) if !is_image_mask => Some(resolve(cs)?),
            _ => None,
        };
        let decode = dict
            .get("Decode")
            .map(Object::as_numbers)
            .transpose()?
            .unwrap_or_default();
        let interpolate = dict
            .get("Interpolate")
            .map(Object::as_bool)
            .transpose()?
            .unwrap_or(false);
        let rendering_intent = match dict.get("Intent") {
            Some(intent) => Name::new(intent.as_name()?),
            None => rendering_intent.clone(),
        };

        Ok(Self {
            bounds,
            width,
            height,
            bits_per_component,
            color_space,
            is_image_mask,
            interpolate,
            decode,
            raw,
            filters: filter_names(dict),
            rendering_intent,
        })
    }
}

fn filter_names(dict: &Dictionary) -> Vec<Name> {
    match dict.get("Filter") {
        Some(Object::Name(n)) => vec![n.clone()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name().ok().map(Name::new))
            .collect(),
        _ => Vec::new(),
    }
}

/// Image drawn with `Do`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XObjectImage {
    pub name: Name,
    #[serde(flatten)]
    pub image: ImageData,
    pub soft_mask: Option<Box<XObjectImage>>,
}

impl XObjectImage {
    pub fn read(
        name: Name,
        stream: &Stream,
        ctm: &AffineTransform,
        rendering_intent: &Name,
        resolve: &ColorSpaceResolver<'_>,
    ) -> Result<Self> {
        let bounds = unit_square(ctm);
        let image = ImageData::read(
            &stream.dict,
            stream.data.clone(),
            bounds,
            rendering_intent,
            resolve,
        )?;
        let soft_mask = match stream.get("SMask") {
            Some(Object::Stream(mask)) => Some(Box::new(Self::read_soft_mask(
                &name,
                mask,
                bounds,
                rendering_intent,
                resolve,
            )?)),
            Some(Object::Name(n)) if n == "None" => None,
            Some(other) => {
                debug!(image = %name, got = other.type_name(), "ignoring /SMask that is not a stream");
                None
            }
            None => None,
        };
        Ok(Self {
            name,
            image,
            soft_mask,
        })
    }

    /// A soft mask is a single-channel `DeviceGray` image with no mask of
    /// its own.
    fn read_soft_mask(
        owner: &Name,
        mask: &Stream,
        bounds: Rectangle,
        rendering_intent: &Name,
        resolve: &ColorSpaceResolver<'_>,
    ) -> Result<Self> {
        if mask.get("SMask").is_some() {
            return Err(PdfError::format(format!(
                "soft mask of image /{owner} has its own /SMask"
            )));
        }
        let image = ImageData::read(&mask.dict, mask.data.clone(), bounds, rendering_intent, resolve)?;
        if image.color_space != Some(ColorSpace::DeviceGray) {
            return Err(PdfError::format(format!(
                "soft mask of image /{owner} must use DeviceGray, found {}",
                image
                    .color_space
                    .as_ref()
                    .map_or("no colour space", ColorSpace::family_name)
            )));
        }
        Ok(Self {
            name: owner.clone(),
            image,
            soft_mask: None,
        })
    }
}

/// Image written directly in the content stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineImage {
    #[serde(flatten)]
    pub image: ImageData,
    /// Dictionary with abbreviations expanded.
    #[serde(skip)]
    pub dictionary: Dictionary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Image {
    XObject(XObjectImage),
    Inline(InlineImage),
}

impl Image {
    pub fn data(&self) -> &ImageData {
        match self {
            Self::XObject(x) => &x.image,
            Self::Inline(i) => &i.image,
        }
    }

    pub fn bounds(&self) -> Rectangle {
        self.data().bounds
    }
}

/// XObject that is recorded but not interpreted (PostScript).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XObjectRecord {
    pub kind: XObjectKind,
    pub name: Name,
    #[serde(skip)]
    pub stream: Stream,
    pub ctm: AffineTransform,
    pub rendering_intent: Name,
    pub color_space: ColorSpace,
}

/// The unit square mapped through `ctm`.
pub fn unit_square(ctm: &AffineTransform) -> Rectangle {
    ctm.transform_rect(&Rectangle::new(0.0, 0.0, 1.0, 1.0))
}

/// Collects an inline image between `BI` and `EI`.
#[derive(Debug, Clone, Default)]
pub struct InlineImageBuilder {
    properties: Option<Dictionary>,
}

impl InlineImageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_properties(&self) -> bool {
        self.properties.is_some()
    }

    /// Sets the `ID` dictionary, expanding abbreviated keys and values.
    pub fn set_properties(&mut self, dict: Dictionary) {
        let expanded = dict
            .into_iter()
            .map(|(key, value)| {
                let key = expand_key(&key);
                let value = match key.as_str() {
                    "ColorSpace" => expand_color_space(value),
                    "Filter" => expand_filters(value),
                    _ => value,
                };
                (key, value)
            })
            .collect();
        self.properties = Some(expanded);
    }

    /// Builds the image from the data following `ID`.
    pub fn finalize(
        self,
        data: Bytes,
        ctm: &AffineTransform,
        rendering_intent: &Name,
        resolve: &ColorSpaceResolver<'_>,
    ) -> Result<InlineImage> {
        let dictionary = self
            .properties
            .ok_or_else(|| PdfError::format("inline image data without a dictionary"))?;
        let image = ImageData::read(&dictionary, data, unit_square(ctm), rendering_intent, resolve)?;
        Ok(InlineImage { image, dictionary })
    }
}

fn expand_key(key: &Name) -> Name {
    let full = match key.as_str() {
        "BPC" => "BitsPerComponent",
        "CS" => "ColorSpace",
        "D" => "Decode",
        "DP" => "DecodeParms",
        "F" => "Filter",
        "H" => "Height",
        "IM" => "ImageMask",
        "I" => "Interpolate",
        "W" => "Width",
        "L" => "Length",
        _ => return key.clone(),
    };
    Name::new_static(full)
}

fn expand_color_space(value: Object) -> Object {
    match value {
        Object::Name(n) => Object::Name(expand_color_space_name(&n)),
        Object::Array(mut items) => {
            if let Some(Object::Name(family)) = items.first_mut() {
                *family = expand_color_space_name(family);
            }
            for item in items.iter_mut().skip(1) {
                if let Object::Name(n) = item {
                    *n = expand_color_space_name(n);
                }
            }
            Object::Array(items)
        }
        other => other,
    }
}

fn expand_color_space_name(name: &Name) -> Name {
    match name.as_str() {
        "G" => Name::new_static("DeviceGray"),
        "RGB" => Name::new_static("DeviceRGB"),
        "CMYK" => Name::new_static("DeviceCMYK"),
        "I" => Name::new_static("Indexed"),
        _ => name.clone(),
    }
}

fn expand_filters(value: Object) -> Object {
    let expand = |name: &Name| {
        let full = match name.as_str() {
            "AHx" => "ASCIIHexDecode",
            "A85" => "ASCII85Decode",
            "LZW" => "LZWDecode",
            "Fl" => "FlateDecode",
            "RL" => "RunLengthDecode",
            "CCF" => "CCITTFaxDecode",
            "DCT" => "DCTDecode",
            _ => return name.clone(),
        };
        Name::new_static(full)
    };
    match value {
        Object::Name(n) => Object::Name(expand(&n)),
        Object::Array(items) => Object::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Object::Name(n) => Object::Name(expand(&n)),
                    other => other,
                })
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::dict;

    fn device_only(obj: &Object) -> Result<ColorSpace> {
        ColorSpace::from_object(obj, &|_| None)
    }

    fn intent() -> Name {
        Name::new("RelativeColorimetric")
    }

    #[test]
    fn inline_abbreviations_expand() {
        let mut builder = InlineImageBuilder::new();
        builder.set_properties(dict([
            ("W", Object::Int(4)),
            ("H", Object::Int(2)),
            ("BPC", Object::Int(8)),
            ("CS", Object::name("RGB")),
            ("F", Object::name("Fl")),
            ("I", Object::Bool(true)),
        ]));
        let img = builder
            .finalize(
                Bytes::from_static(b"xyz"),
                &AffineTransform::scale(40.0, 20.0),
                &intent(),
                &device_only,
            )
            .unwrap();
        assert_eq!((img.image.width, img.image.height), (4, 2));
        assert_eq!(img.image.color_space, Some(ColorSpace::DeviceRGB));
        assert_eq!(img.image.filters, vec![Name::new("FlateDecode")]);
        assert!(img.image.interpolate);
        assert_eq!(img.image.bounds.width(), 40.0);
        assert_eq!(img.image.bounds.height(), 20.0);
    }

    #[test]
    fn inline_indexed_array_expands() {
        let mut builder = InlineImageBuilder::new();
        builder.set_properties(dict([
            ("W", Object::Int(1)),
            ("H", Object::Int(1)),
            ("BPC", Object::Int(8)),
            (
                "CS",
                Object::Array(vec![
                    Object::name("I"),
                    Object::name("G"),
                    Object::Int(1),
                    Object::String(vec![0, 255]),
                ]),
            ),
        ]));
        let img = builder
            .finalize(Bytes::new(), &AffineTransform::IDENTITY, &intent(), &device_only)
            .unwrap();
        assert!(matches!(img.image.color_space, Some(ColorSpace::Indexed { .. })));
    }

    #[test]
    fn inline_without_width_is_a_format_error() {
        let mut builder = InlineImageBuilder::new();
        builder.set_properties(dict([("H", Object::Int(1)), ("BPC", Object::Int(8))]));
        let err = builder
            .finalize(Bytes::new(), &AffineTransform::IDENTITY, &intent(), &device_only)
            .unwrap_err();
        assert!(matches!(err, PdfError::Format(_)));
    }

    #[test]
    fn image_mask_needs_no_bits_per_component() {
        let mut builder = InlineImageBuilder::new();
        builder.set_properties(dict([
            ("W", Object::Int(8)),
            ("H", Object::Int(8)),
            ("IM", Object::Bool(true)),
        ]));
        let img = builder
            .finalize(Bytes::new(), &AffineTransform::IDENTITY, &intent(), &device_only)
            .unwrap();
        assert!(img.image.is_image_mask);
        assert_eq!(img.image.bits_per_component, 1);
        assert_eq!(img.image.color_space, None);
    }

    fn gray_image(extra: Option<(&str, Object)>) -> Stream {
        let mut d = dict([
            ("Subtype", Object::name("Image")),
            ("Width", Object::Int(2)),
            ("Height", Object::Int(2)),
            ("BitsPerComponent", Object::Int(8)),
            ("ColorSpace", Object::name("DeviceGray")),
        ]);
        if let Some((k, v)) = extra {
            d.insert(Name::new(k), v);
        }
        Stream::new(d, vec![0u8; 4])
    }

    #[test]
    fn soft_mask_is_read() {
        let image = gray_image(Some(("SMask", Object::from(gray_image(None)))));
        let x = XObjectImage::read(
            Name::new("Im0"),
            &image,
            &AffineTransform::IDENTITY,
            &intent(),
            &device_only,
        )
        .unwrap();
        assert!(x.soft_mask.is_some());
    }

    #[test]
    fn nested_soft_mask_is_a_format_error() {
        let inner = gray_image(None);
        let mask = gray_image(Some(("SMask", Object::from(inner))));
        let image = gray_image(Some(("SMask", Object::from(mask))));
        let err = XObjectImage::read(
            Name::new("Im0"),
            &image,
            &AffineTransform::IDENTITY,
            &intent(),
            &device_only,
        )
        .unwrap_err();
        assert!(matches!(err, PdfError::Format(_)));
    }

    #[test]
    fn rgb_soft_mask_is_a_format_error() {
        let mut mask = gray_image(None);
        mask.dict
            .insert(Name::new("ColorSpace"), Object::name("DeviceRGB"));
        let image = gray_image(Some(("SMask", Object::from(mask))));
        assert!(
            XObjectImage::read(
                Name::new("Im0"),
                &image,
                &AffineTransform::IDENTITY,
                &intent(),
                &device_only,
            )
            .is_err()
        );
    }
}
