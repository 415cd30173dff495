// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding of canvas contents

use crate::errors::PhotoError;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// Same as a canvas export without an explicit quality argument
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

/// Photo encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoEncoder {
    quality: EncodingQuality,
}

impl PhotoEncoder {
    pub fn new(quality: EncodingQuality) -> Self {
        Self { quality }
    }

    /// Encode an RGBA canvas as JPEG
    ///
    /// JPEG has no alpha channel; it is dropped.
    pub fn encode_jpeg(&self, canvas: &RgbaImage) -> Result<Vec<u8>, PhotoError> {
        if canvas.width() == 0 || canvas.height() == 0 {
            return Err(PhotoError::EncodingFailed("canvas is empty".to_string()));
        }

        let rgb = image::DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();

        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut cursor,
            self.quality.jpeg_quality(),
        );
        encoder.encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )?;

        debug!(
            width = canvas.width(),
            height = canvas.height(),
            quality = self.quality.jpeg_quality(),
            size = buffer.len(),
            "Encoded JPEG"
        );
        Ok(buffer)
    }
}
