// SPDX-License-Identifier: GPL-3.0-only

//! Display filters
//!
//! Each filter is a class name attached to the preview or the canvas, plus a
//! CPU rendition of the CSS filter function of the same name. They only ever
//! affect what is drawn on screen.

use image::RgbaImage;

/// Blur radius of the `blur` class, in source pixels
const BLUR_RADIUS_PX: f32 = 3.0;
const BRIGHTNESS_FACTOR: f32 = 1.5;
const CONTRAST_FACTOR: f32 = 2.0;

/// Filter types for the preview and the snapshot canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    /// Empty slot in the cycle, no class attached
    #[default]
    None,
    /// grayscale(1)
    Grayscale,
    /// sepia(1)
    Sepia,
    /// blur(3px)
    Blur,
    /// invert(1)
    Invert,
    /// brightness(1.5)
    Brightness,
    /// contrast(2)
    Contrast,
}

/// Order in which a trigger walks through the filters
pub const FILTER_CYCLE: [FilterType; 7] = [
    FilterType::Grayscale,
    FilterType::Sepia,
    FilterType::Blur,
    FilterType::Invert,
    FilterType::Brightness,
    FilterType::Contrast,
    FilterType::None,
];

impl FilterType {
    /// Class name, empty for [`FilterType::None`]
    pub fn class_name(&self) -> &'static str {
        match self {
            FilterType::None => "",
            FilterType::Grayscale => "grayscale",
            FilterType::Sepia => "sepia",
            FilterType::Blur => "blur",
            FilterType::Invert => "invert",
            FilterType::Brightness => "brightness",
            FilterType::Contrast => "contrast",
        }
    }

    pub fn from_class_name(name: &str) -> Option<Self> {
        FILTER_CYCLE.into_iter().find(|f| f.class_name() == name)
    }

    /// Filter at position `index` of an ever-increasing counter
    pub fn for_counter(index: usize) -> Self {
        FILTER_CYCLE[index % FILTER_CYCLE.len()]
    }

    /// Render the filter at native resolution
    pub fn apply(&self, image: &RgbaImage) -> RgbaImage {
        self.apply_at_scale(image, 1.0)
    }

    /// Render the filter on an image that was scaled by `scale` from the source
    ///
    /// Only the blur radius depends on scale.
    pub fn apply_at_scale(&self, image: &RgbaImage, scale: f32) -> RgbaImage {
        match self {
            FilterType::None => image.clone(),
            FilterType::Blur => {
                let sigma = BLUR_RADIUS_PX * scale;
                if sigma < 0.1 {
                    image.clone()
                } else {
                    image::imageops::blur(image, sigma)
                }
            }
            _ => {
                let mut out = image.clone();
                for pixel in out.pixels_mut() {
                    let [r, g, b, a] = pixel.0;
                    let (r, g, b) = self.map_rgb(
                        r as f32 / 255.0,
                        g as f32 / 255.0,
                        b as f32 / 255.0,
                    );
                    pixel.0 = [to_byte(r), to_byte(g), to_byte(b), a];
                }
                out
            }
        }
    }

    /// Per-pixel colour matrices, as defined for CSS filter functions
    #[inline]
    fn map_rgb(&self, r: f32, g: f32, b: f32) -> (f32, f32, f32) {
        match self {
            FilterType::Grayscale => {
                let gray = 0.2126 * r + 0.7152 * g + 0.0722 * b;
                (gray, gray, gray)
            }
            FilterType::Sepia => (
                0.393 * r + 0.769 * g + 0.189 * b,
                0.349 * r + 0.686 * g + 0.168 * b,
                0.272 * r + 0.534 * g + 0.131 * b,
            ),
            FilterType::Invert => (1.0 - r, 1.0 - g, 1.0 - b),
            FilterType::Brightness => (
                r * BRIGHTNESS_FACTOR,
                g * BRIGHTNESS_FACTOR,
                b * BRIGHTNESS_FACTOR,
            ),
            FilterType::Contrast => {
                let c = |v: f32| (v - 0.5) * CONTRAST_FACTOR + 0.5;
                (c(r), c(g), c(b))
            }
            FilterType::None | FilterType::Blur => (r, g, b),
        }
    }
}

impl std::fmt::Display for FilterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterType::None => write!(f, "none"),
            other => write!(f, "{}", other.class_name()),
        }
    }
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba(rgba))
    }

    #[test]
    fn test_cycle_order_and_wrap() {
        assert_eq!(FilterType::for_counter(0), FilterType::Grayscale);
        assert_eq!(FilterType::for_counter(6), FilterType::None);
        assert_eq!(FilterType::for_counter(7), FilterType::Grayscale);
    }

    #[test]
    fn test_class_names_roundtrip() {
        for filter in FILTER_CYCLE {
            assert_eq!(FilterType::from_class_name(filter.class_name()), Some(filter));
        }
        assert_eq!(FilterType::from_class_name("vivid"), None);
    }

    #[test]
    fn test_invert_keeps_alpha() {
        let out = FilterType::Invert.apply(&solid([10, 20, 30, 128]));
        assert_eq!(out.get_pixel(0, 0).0, [245, 235, 225, 128]);
    }

    #[test]
    fn test_grayscale_equal_channels() {
        let out = FilterType::Grayscale.apply(&solid([200, 50, 10, 255]));
        let [r, g, b, _] = out.get_pixel(1, 1).0;
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn test_brightness_and_contrast_clamp() {
        let bright = FilterType::Brightness.apply(&solid([200, 100, 0, 255]));
        assert_eq!(bright.get_pixel(0, 0).0, [255, 150, 0, 255]);

        let contrast = FilterType::Contrast.apply(&solid([255, 128, 0, 255]));
        assert_eq!(contrast.get_pixel(0, 0).0[0], 255);
        assert_eq!(contrast.get_pixel(0, 0).0[2], 0);
    }

    #[test]
    fn test_blur_preserves_size_and_flat_color() {
        let out = FilterType::Blur.apply(&solid([90, 90, 90, 255]));
        assert_eq!(out.dimensions(), (4, 4));
        let [r, _, _, _] = out.get_pixel(2, 2).0;
        assert!((88..=92).contains(&r));
    }
}
