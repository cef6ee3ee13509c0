//! Colour spaces and colour values.

use serde::Serialize;
use smallvec::SmallVec;

use super::objects::{Name, Object};
use crate::error::{PdfError, Result};

/// A colour space as set by `CS`/`cs` or referenced by an image.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum ColorSpace {
    #[default]
    DeviceGray,
    DeviceRGB,
    DeviceCMYK,
    CalGray,
    CalRGB,
    Lab,
    ICCBased {
        components: usize,
        alternate: Option<Box<ColorSpace>>,
    },
    Indexed {
        base: Box<ColorSpace>,
        hival: u8,
        #[serde(skip)]
        lookup: Vec<u8>,
    },
    Separation {
        name: Name,
        alternate: Box<ColorSpace>,
    },
    DeviceN {
        names: Vec<Name>,
        alternate: Box<ColorSpace>,
    },
    Pattern {
        underlying: Option<Box<ColorSpace>>,
    },
}

impl ColorSpace {
    /// Device family or parameterless space by name. Inline-image
    /// abbreviations (`G`, `RGB`, `CMYK`) are accepted.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "DeviceGray" | "G" => Some(Self::DeviceGray),
            "DeviceRGB" | "RGB" => Some(Self::DeviceRGB),
            "DeviceCMYK" | "CMYK" => Some(Self::DeviceCMYK),
            "CalGray" => Some(Self::CalGray),
            "CalRGB" => Some(Self::CalRGB),
            "Lab" => Some(Self::Lab),
            "Pattern" => Some(Self::Pattern { underlying: None }),
            _ => None,
        }
    }

    /// Parses a colour space definition.
    ///
    /// `named` resolves names that are not a family name (entries of the
    /// `/ColorSpace` resource dictionary). Array forms follow the family
    /// layouts: `[/ICCBased stream]`, `[/Indexed base hival lookup]`,
    /// `[/Separation name alt tint]`, `[/DeviceN names alt tint]`,
    /// `[/Pattern base]`, `[/CalRGB dict]` and so on.
    pub fn from_object(obj: &Object, named: &dyn Fn(&str) -> Option<ColorSpace>) -> Result<Self> {
        match obj {
            Object::Name(n) => Self::from_name(n)
                .or_else(|| named(n))
                .ok_or_else(|| PdfError::format(format!("unknown colour space /{n}"))),
            Object::Array(items) => {
                let (family, rest) = items
                    .split_first()
                    .ok_or_else(|| PdfError::format("empty colour space array"))?;
                Self::from_family(family.as_name()?, rest, named)
            }
            other => Err(PdfError::format(format!(
                "colour space must be a name or array, got {}",
                other.type_name()
            ))),
        }
    }

    fn from_family(
        family: &str,
        params: &[Object],
        named: &dyn Fn(&str) -> Option<ColorSpace>,
    ) -> Result<Self> {
        let param = |i: usize| {
            params
                .get(i)
                .ok_or_else(|| PdfError::format(format!("/{family} colour space is missing operand {i}")))
        };
        match family {
            "ICCBased" => {
                let dict = param(0)?.as_dict()?;
                let components = dict.get("N").map(Object::as_int).transpose()?.unwrap_or(3);
                let alternate = dict
                    .get("Alternate")
                    .map(|alt| Self::from_object(alt, named))
                    .transpose()?
                    .map(Box::new);
                Ok(Self::ICCBased {
                    components: components.clamp(1, 4) as usize,
                    alternate,
                })
            }
            "Indexed" | "I" => {
                let base = Self::from_object(param(0)?, named)?;
                let hival = param(1)?.as_int()?.clamp(0, 255) as u8;
                let lookup = match param(2)? {
                    Object::String(bytes) => bytes.clone(),
                    Object::Stream(s) => s.raw_data().to_vec(),
                    other => {
                        return Err(PdfError::format(format!(
                            "indexed lookup must be a string or stream, got {}",
                            other.type_name()
                        )));
                    }
                };
                Ok(Self::Indexed {
                    base: Box::new(base),
                    hival,
                    lookup,
                })
            }
            "Separation" => Ok(Self::Separation {
                name: Name::new(param(0)?.as_name()?),
                alternate: Box::new(Self::from_object(param(1)?, named)?),
            }),
            "DeviceN" => {
                let names = param(0)?
                    .as_array()?
                    .iter()
                    .map(|n| n.as_name().map(Name::new))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::DeviceN {
                    names,
                    alternate: Box::new(Self::from_object(param(1)?, named)?),
                })
            }
            "Pattern" => Ok(Self::Pattern {
                underlying: params
                    .first()
                    .map(|b| Self::from_object(b, named))
                    .transpose()?
                    .map(Box::new),
            }),
            other => Self::from_name(other)
                .ok_or_else(|| PdfError::format(format!("unknown colour space family /{other}"))),
        }
    }

    /// Number of operands `SC`/`sc` take in this space.
    pub fn components(&self) -> usize {
        match self {
            Self::DeviceGray | Self::CalGray | Self::Indexed { .. } | Self::Separation { .. } => 1,
            Self::DeviceRGB | Self::CalRGB | Self::Lab => 3,
            Self::DeviceCMYK => 4,
            Self::ICCBased { components, .. } => *components,
            Self::DeviceN { names, .. } => names.len(),
            Self::Pattern { underlying } => underlying.as_ref().map_or(0, |b| b.components()),
        }
    }

    pub fn family_name(&self) -> &'static str {
        match self {
            Self::DeviceGray => "DeviceGray",
            Self::DeviceRGB => "DeviceRGB",
            Self::DeviceCMYK => "DeviceCMYK",
            Self::CalGray => "CalGray",
            Self::CalRGB => "CalRGB",
            Self::Lab => "Lab",
            Self::ICCBased { .. } => "ICCBased",
            Self::Indexed { .. } => "Indexed",
            Self::Separation { .. } => "Separation",
            Self::DeviceN { .. } => "DeviceN",
            Self::Pattern { .. } => "Pattern",
        }
    }

    /// Colour in effect right after the space is selected.
    pub fn initial_color(&self) -> Color {
        match self {
            Self::Separation { .. } | Self::DeviceN { .. } => {
                self.color_from(&vec![1.0; self.components()], None)
            }
            Self::DeviceCMYK => Color::Cmyk(0.0, 0.0, 0.0, 1.0),
            Self::Pattern { .. } => Color::default(),
            _ => self.color_from(&vec![0.0; self.components()], None),
        }
    }

    /// Builds a colour from `sc`/`scn` operands. Missing operands read as 0.
    pub fn color_from(&self, values: &[f64], pattern: Option<Name>) -> Color {
        let at = |i: usize| values.get(i).copied().unwrap_or(0.0);
        match self {
            Self::DeviceGray | Self::CalGray => Color::Gray(at(0)),
            Self::DeviceRGB | Self::CalRGB => Color::Rgb(at(0), at(1), at(2)),
            Self::DeviceCMYK => Color::Cmyk(at(0), at(1), at(2), at(3)),
            Self::ICCBased { components, .. } => match components {
                1 => Color::Gray(at(0)),
                4 => Color::Cmyk(at(0), at(1), at(2), at(3)),
                _ => Color::Rgb(at(0), at(1), at(2)),
            },
            Self::Indexed {
                base,
                hival,
                lookup,
            } => {
                let index = (at(0).round().max(0.0) as usize).min(*hival as usize);
                let n = base.components();
                let entry: SmallVec<[f64; 4]> = (0..n)
                    .map(|c| {
                        lookup
                            .get(index * n + c)
                            .map_or(0.0, |&b| f64::from(b) / 255.0)
                    })
                    .collect();
                base.color_from(&entry, None)
            }
            Self::Lab | Self::Separation { .. } | Self::DeviceN { .. } => {
                Color::Components(values.to_vec())
            }
            Self::Pattern { underlying } => match (pattern, underlying) {
                (Some(name), Some(base)) => Color::PatternUncolored(
                    Box::new(base.color_from(values, None)),
                    name.to_string(),
                ),
                (Some(name), None) => Color::PatternColored(name.to_string()),
                (None, _) => Color::default(),
            },
        }
    }
}

/// Colour value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Color {
    /// 0.0 = black, 1.0 = white
    Gray(f64),
    Rgb(f64, f64, f64),
    Cmyk(f64, f64, f64, f64),
    /// Raw components of a space without a device equivalent here
    /// (Lab, Separation, DeviceN).
    Components(Vec<f64>),
    /// Coloured tiling pattern (PaintType 1).
    PatternColored(String),
    /// Uncoloured tiling pattern (PaintType 2) with its base colour.
    PatternUncolored(Box<Color>, String),
}

impl Default for Color {
    fn default() -> Self {
        Color::Gray(0.0)
    }
}

impl Color {
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            Color::Gray(g) => vec![*g],
            Color::Rgb(r, g, b) => vec![*r, *g, *b],
            Color::Cmyk(c, m, y, k) => vec![*c, *m, *y, *k],
            Color::Components(v) => v.clone(),
            Color::PatternColored(_) => vec![],
            Color::PatternUncolored(base, _) => base.to_vec(),
        }
    }

    pub fn pattern_name(&self) -> Option<&str> {
        match self {
            Color::PatternColored(name) | Color::PatternUncolored(_, name) => Some(name),
            _ => None,
        }
    }

    pub fn is_pattern(&self) -> bool {
        self.pattern_name().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::{Stream, dict};

    fn no_named(_: &str) -> Option<ColorSpace> {
        None
    }

    #[test]
    fn indexed_resolves_through_lookup() {
        let def = Object::Array(vec![
            Object::name("Indexed"),
            Object::name("DeviceRGB"),
            Object::Int(1),
            Object::String(vec![0, 0, 0, 255, 0, 0]),
        ]);
        let cs = ColorSpace::from_object(&def, &no_named).unwrap();
        assert_eq!(cs.components(), 1);
        assert_eq!(cs.color_from(&[1.0], None), Color::Rgb(1.0, 0.0, 0.0));
        assert_eq!(cs.initial_color(), Color::Rgb(0.0, 0.0, 0.0));
    }

    #[test]
    fn icc_based_uses_n() {
        let icc = Stream::new(dict([("N", Object::Int(4))]), Vec::new());
        let def = Object::Array(vec![Object::name("ICCBased"), Object::from(icc)]);
        let cs = ColorSpace::from_object(&def, &no_named).unwrap();
        assert_eq!(cs.components(), 4);
    }

    #[test]
    fn separation_starts_at_full_tint() {
        let def = Object::Array(vec![
            Object::name("Separation"),
            Object::name("Spot"),
            Object::name("DeviceCMYK"),
            Object::Null,
        ]);
        let cs = ColorSpace::from_object(&def, &no_named).unwrap();
        assert_eq!(cs.initial_color(), Color::Components(vec![1.0]));
    }

    #[test]
    fn named_lookup_and_unknown_names() {
        let named = |n: &str| (n == "CS0").then_some(ColorSpace::Lab);
        assert_eq!(
            ColorSpace::from_object(&Object::name("CS0"), &named).unwrap(),
            ColorSpace::Lab
        );
        assert!(ColorSpace::from_object(&Object::name("Nope"), &named).is_err());
    }

    #[test]
    fn uncolored_pattern_keeps_base_color() {
        let cs = ColorSpace::Pattern {
            underlying: Some(Box::new(ColorSpace::DeviceGray)),
        };
        let c = cs.color_from(&[0.5], Some(Name::new("P1")));
        assert_eq!(c.pattern_name(), Some("P1"));
        assert_eq!(c.to_vec(), vec![0.5]);
    }
}
