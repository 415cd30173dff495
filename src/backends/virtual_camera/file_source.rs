// SPDX-License-Identifier: GPL-3.0-only

//! Still image sources for virtual cameras

use crate::backends::camera::types::{BackendError, BackendResult, CameraFrame};
use std::path::Path;
use tracing::debug;

/// Load an image file as a single RGBA camera frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    debug!(path = %path.display(), "Loading image source");

    if !path.exists() {
        return Err(BackendError::DeviceNotFound(format!(
            "Image source {} does not exist",
            path.display()
        )));
    }

    let img = image::open(path).map_err(|e| {
        BackendError::NotReadable(format!("Failed to load {}: {}", path.display(), e))
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(CameraFrame::from_rgba(width, height, rgba.into_raw(), 0))
}
