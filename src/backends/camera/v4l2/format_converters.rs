// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for V4L2 capture buffers
//!
//! Everything downstream of the capture thread works on tightly packed
//! RGBA, so each supported FourCC gets converted here.

use crate::backends::camera::types::{BackendError, BackendResult};

/// Capture formats we know how to decode, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    /// Motion JPEG, one JPEG image per buffer
    Mjpeg,
    /// Packed YUV 4:2:2 (Y0 U Y1 V)
    Yuyv,
    /// 24-bit RGB
    Rgb24,
    /// 8-bit grayscale
    Gray8,
}

impl CaptureFormat {
    /// Formats requested from the device, best first
    pub const PREFERRED: [CaptureFormat; 2] = [CaptureFormat::Mjpeg, CaptureFormat::Yuyv];

    pub fn fourcc(&self) -> v4l::FourCC {
        v4l::FourCC::new(self.fourcc_bytes())
    }

    fn fourcc_bytes(&self) -> &'static [u8; 4] {
        match self {
            CaptureFormat::Mjpeg => b"MJPG",
            CaptureFormat::Yuyv => b"YUYV",
            CaptureFormat::Rgb24 => b"RGB3",
            CaptureFormat::Gray8 => b"GREY",
        }
    }

    /// Identify a negotiated FourCC
    pub fn from_fourcc(fourcc: &v4l::FourCC) -> Option<Self> {
        match &fourcc.repr {
            b"MJPG" | b"JPEG" => Some(CaptureFormat::Mjpeg),
            b"YUYV" => Some(CaptureFormat::Yuyv),
            b"RGB3" => Some(CaptureFormat::Rgb24),
            b"GREY" => Some(CaptureFormat::Gray8),
            _ => None,
        }
    }
}

/// Decode one capture buffer to RGBA
///
/// `stride` is the driver's bytes per line. Zero means rows are tightly
/// packed. MJPEG buffers carry their own size, so the geometry is ignored.
pub fn decode_to_rgba(
    format: CaptureFormat,
    data: &[u8],
    width: u32,
    height: u32,
    stride: u32,
) -> BackendResult<(u32, u32, Vec<u8>)> {
    match format {
        CaptureFormat::Mjpeg => {
            let img = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
                .map_err(|e| BackendError::NotReadable(format!("MJPEG decode failed: {}", e)))?;
            let rgba = img.to_rgba8();
            let (w, h) = rgba.dimensions();
            Ok((w, h, rgba.into_raw()))
        }
        CaptureFormat::Yuyv => {
            let stride = row_stride(stride, width, 2);
            check_len(data, width, height, 2, stride, "YUYV")?;
            Ok((width, height, yuyv_to_rgba(data, width, height, stride)))
        }
        CaptureFormat::Rgb24 => {
            let stride = row_stride(stride, width, 3);
            check_len(data, width, height, 3, stride, "RGB24")?;
            Ok((width, height, rgb24_to_rgba(data, width, height, stride)))
        }
        CaptureFormat::Gray8 => {
            let stride = row_stride(stride, width, 1);
            check_len(data, width, height, 1, stride, "GREY")?;
            Ok((width, height, gray8_to_rgba(data, width, height, stride)))
        }
    }
}

/// Bytes per line, falling back to the packed row size when the driver
/// reports nothing usable
fn row_stride(stride: u32, width: u32, bytes_per_pixel: usize) -> usize {
    let packed = width as usize * bytes_per_pixel;
    (stride as usize).max(packed)
}

fn check_len(
    data: &[u8],
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    stride: usize,
    name: &str,
) -> BackendResult<()> {
    // The last row needs no padding after it
    let expected = match height as usize {
        0 => 0,
        n => stride * (n - 1) + width as usize * bytes_per_pixel,
    };
    if data.len() < expected {
        return Err(BackendError::NotReadable(format!(
            "Short {} buffer: got {} bytes, expected {}",
            name,
            data.len(),
            expected
        )));
    }
    Ok(())
}

/// Visible bytes of every row, skipping the driver's line padding
fn rows(
    data: &[u8],
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    stride: usize,
) -> impl Iterator<Item = &[u8]> {
    let row_len = width as usize * bytes_per_pixel;
    (0..height as usize).filter_map(move |row| data.get(row * stride..row * stride + row_len))
}

/// Convert YUYV (YUV 4:2:2) to RGBA
///
/// YUYV format: Y0 U Y1 V - each 4-byte group encodes 2 pixels.
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32, stride: usize) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    // YUYV widths are always even, so every row is whole 4-byte groups
    for line in rows(data, width, height, 2, stride) {
        for chunk in line.chunks_exact(4) {
            let (y0, u, y1, v) = (chunk[0], chunk[1], chunk[2], chunk[3]);
            for y in [y0, y1] {
                let (r, g, b) = yuv_to_rgb(y, u, v);
                rgba.extend_from_slice(&[r, g, b, 255]);
            }
        }
    }

    rgba
}

/// Convert packed RGB24 to RGBA
pub fn rgb24_to_rgba(data: &[u8], width: u32, height: u32, stride: usize) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((width * height) as usize * 4);
    for line in rows(data, width, height, 3, stride) {
        for px in line.chunks_exact(3) {
            rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
    }
    rgba
}

/// Convert 8-bit grayscale to RGBA
pub fn gray8_to_rgba(data: &[u8], width: u32, height: u32, stride: usize) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((width * height) as usize * 4);
    for line in rows(data, width, height, 1, stride) {
        for &v in line {
            rgba.extend_from_slice(&[v, v, v, 255]);
        }
    }
    rgba
}

/// Convert YUV (BT.601) to RGB
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}
