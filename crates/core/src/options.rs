//! Interpreter configuration and per-page setup.

use tracing::warn;

use crate::geometry::{AffineTransform, Rectangle};

/// Default limit on nested form XObjects.
pub const DEFAULT_MAX_FORM_DEPTH: usize = 32;

/// Parameters controlling how tolerant and how thorough interpretation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsingOptions {
    /// Missing fonts, XObjects and other named resources are logged and the
    /// operator skipped instead of failing the page.
    pub skip_missing_resources: bool,
    /// Intersect painted paths with the active clip.
    pub clip_paths: bool,
    /// Deepest allowed chain of form XObjects invoking each other.
    pub max_form_depth: usize,
    /// Merge combining marks into the preceding letter.
    pub combine_diacritics: bool,
}

impl Default for ParsingOptions {
    fn default() -> Self {
        Self {
            skip_missing_resources: false,
            clip_paths: true,
            max_form_depth: DEFAULT_MAX_FORM_DEPTH,
            combine_diacritics: true,
        }
    }
}

impl ParsingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_missing_resources(mut self, skip: bool) -> Self {
        self.skip_missing_resources = skip;
        self
    }

    pub fn with_clip_paths(mut self, clip: bool) -> Self {
        self.clip_paths = clip;
        self
    }

    pub fn with_max_form_depth(mut self, depth: usize) -> Self {
        self.max_form_depth = depth;
        self
    }

    pub fn with_combine_diacritics(mut self, combine: bool) -> Self {
        self.combine_diacritics = combine;
        self
    }
}

/// Geometry of the page being interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub crop_box: Rectangle,
    /// Maps user space to device space: the page rotation followed by the
    /// user unit.
    pub initial_transform: AffineTransform,
    /// 1-based, for diagnostics.
    pub page_number: usize,
}

impl PageSetup {
    /// `rotation` is the page's `/Rotate` (clockwise degrees, a multiple of
    /// 90). The page is moved so the crop box lands in the positive
    /// quadrant with its lower-left corner at the origin.
    pub fn new(crop_box: Rectangle, rotation: i64, user_unit: f64) -> Self {
        let (l, b, r, t) = (
            crop_box.left(),
            crop_box.bottom(),
            crop_box.right(),
            crop_box.top(),
        );
        let rotate = match rotation.rem_euclid(360) {
            0 => AffineTransform::translation(-l, -b),
            90 => AffineTransform::new(0.0, -1.0, 1.0, 0.0, -b, r),
            180 => AffineTransform::new(-1.0, 0.0, 0.0, -1.0, r, t),
            270 => AffineTransform::new(0.0, 1.0, -1.0, 0.0, t, -l),
            other => {
                warn!(rotation = other, "page rotation is not a multiple of 90, ignoring");
                AffineTransform::translation(-l, -b)
            }
        };
        let unit = if user_unit > 0.0 { user_unit } else { 1.0 };
        Self {
            crop_box,
            initial_transform: rotate.multiply(&AffineTransform::scale(unit, unit)),
            page_number: 1,
        }
    }

    pub fn with_page_number(mut self, page_number: usize) -> Self {
        self.page_number = page_number;
        self
    }

    /// US Letter, unrotated.
    pub fn letter() -> Self {
        Self::new(Rectangle::new(0.0, 0.0, 612.0, 792.0), 0, 1.0)
    }

    /// The crop box in device space.
    pub fn device_crop_box(&self) -> Rectangle {
        self.initial_transform.transform_rect(&self.crop_box)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn builders_chain() {
        let opts = ParsingOptions::new()
            .with_skip_missing_resources(true)
            .with_clip_paths(false)
            .with_max_form_depth(4);
        assert!(opts.skip_missing_resources);
        assert!(!opts.clip_paths);
        assert_eq!(opts.max_form_depth, 4);
        assert!(opts.combine_diacritics);
    }

    #[test]
    fn rotated_page_lands_in_positive_quadrant() {
        let crop = Rectangle::new(0.0, 0.0, 600.0, 800.0);
        for rotation in [0, 90, 180, 270, -90] {
            let setup = PageSetup::new(crop, rotation, 1.0);
            let device = setup.device_crop_box();
            assert!(device.left().abs() < 1e-9, "rotation {rotation}");
            assert!(device.bottom().abs() < 1e-9, "rotation {rotation}");
        }
        let quarter = PageSetup::new(crop, 90, 1.0);
        let top_left = quarter.initial_transform.transform_point(Point::new(0.0, 800.0));
        assert!(top_left.approx_eq(Point::new(800.0, 600.0), 1e-9));
    }

    #[test]
    fn odd_rotation_still_moves_crop_box_to_origin() {
        let crop = Rectangle::new(50.0, 100.0, 650.0, 900.0);
        let setup = PageSetup::new(crop, 45, 1.0);
        assert_eq!(setup.initial_transform, AffineTransform::translation(-50.0, -100.0));
        let device = setup.device_crop_box();
        assert_eq!(device.left(), 0.0);
        assert_eq!(device.bottom(), 0.0);
        assert_eq!(device.width(), 600.0);
    }

    #[test]
    fn user_unit_scales() {
        let setup = PageSetup::new(Rectangle::new(0.0, 0.0, 10.0, 10.0), 0, 2.0);
        assert_eq!(setup.device_crop_box().width(), 20.0);
    }
}
