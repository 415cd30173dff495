// SPDX-License-Identifier: GPL-3.0-only

//! Getting a captured photo out of the canvas and onto disk
//!
//! Two routes, matching what a page can do with a canvas:
//!
//! - **Blob save**: the host writes the encoded blob straight to the
//!   download destination.
//! - **Anchor download**: the encoded image is staged, the save link gets
//!   `href` and `download` set, and clicking the link moves it into place.

use super::encoding::PhotoEncoder;
use crate::backends::camera::HostCapabilities;
use crate::errors::PhotoError;
use crate::storage::unique_destination;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How exported photos reach the save directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportMethod {
    /// Blob save when the backend supports it, anchor download otherwise
    #[default]
    Auto,
    BlobSave,
    AnchorDownload,
}

impl ExportMethod {
    /// Pick a concrete route for the given host
    pub fn resolve(self, capabilities: &HostCapabilities) -> ExportMethod {
        match self {
            ExportMethod::Auto if capabilities.blob_save => ExportMethod::BlobSave,
            ExportMethod::Auto => ExportMethod::AnchorDownload,
            other => other,
        }
    }
}

/// Hidden download link used by the anchor route
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveLink {
    /// Staged file the link points at
    pub href: Option<PathBuf>,
    /// Suggested file name for the download
    pub download: Option<String>,
}

impl SaveLink {
    /// Follow the link: move the staged file into `destination_dir`
    ///
    /// Taken names get a ` (n)` suffix. The link is left empty.
    pub fn click(&mut self, destination_dir: &Path) -> Result<PathBuf, PhotoError> {
        let staged = self
            .href
            .take()
            .ok_or_else(|| PhotoError::SaveFailed("save link has no target".to_string()))?;
        let name = self.download.take().unwrap_or_else(|| {
            staged
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| crate::constants::DEFAULT_PHOTO_FILENAME.to_string())
        });

        deliver(&staged, destination_dir, &name).inspect_err(|_| {
            // A failed download must not leave its staged copy behind
            if let Err(e) = std::fs::remove_file(&staged) {
                warn!(path = %staged.display(), error = %e, "Failed to remove staged photo");
            }
        })
    }
}

fn deliver(staged: &Path, destination_dir: &Path, name: &str) -> Result<PathBuf, PhotoError> {
    std::fs::create_dir_all(destination_dir)?;
    let destination = unique_destination(destination_dir, name);

    // rename fails across filesystems (cache dir on tmpfs, downloads on disk)
    if let Err(e) = std::fs::rename(staged, &destination) {
        debug!(error = %e, "Rename failed, copying staged photo");
        std::fs::copy(staged, &destination)?;
        if let Err(e) = std::fs::remove_file(staged) {
            warn!(path = %staged.display(), error = %e, "Failed to remove staged photo");
        }
    }

    Ok(destination)
}

/// Encodes the canvas and delivers it through one of the export routes
#[derive(Debug, Clone)]
pub struct PhotoExporter {
    encoder: PhotoEncoder,
    save_dir: PathBuf,
    staging_dir: PathBuf,
    filename: String,
}

impl PhotoExporter {
    pub fn new(
        encoder: PhotoEncoder,
        save_dir: impl Into<PathBuf>,
        staging_dir: impl Into<PathBuf>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            encoder,
            save_dir: save_dir.into(),
            staging_dir: staging_dir.into(),
            filename: filename.into(),
        }
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Export `canvas` as JPEG and return the final path
    ///
    /// `method` must already be resolved; `Auto` is treated as blob save.
    pub fn export(
        &self,
        canvas: &RgbaImage,
        method: ExportMethod,
        link: &mut SaveLink,
    ) -> Result<PathBuf, PhotoError> {
        let data = self.encoder.encode_jpeg(canvas)?;

        let path = match method {
            ExportMethod::Auto | ExportMethod::BlobSave => self.blob_save(&data)?,
            ExportMethod::AnchorDownload => self.anchor_download(&data, link)?,
        };

        info!(path = %path.display(), method = ?method, size = data.len(), "Photo saved");
        Ok(path)
    }

    fn blob_save(&self, data: &[u8]) -> Result<PathBuf, PhotoError> {
        std::fs::create_dir_all(&self.save_dir)?;
        let destination = unique_destination(&self.save_dir, &self.filename);
        std::fs::write(&destination, data)?;
        Ok(destination)
    }

    fn anchor_download(&self, data: &[u8], link: &mut SaveLink) -> Result<PathBuf, PhotoError> {
        std::fs::create_dir_all(&self.staging_dir)?;
        let staged = self
            .staging_dir
            .join(format!("{}.jpg", uuid::Uuid::new_v4()));
        std::fs::write(&staged, data)?;
        debug!(path = %staged.display(), "Staged photo for download");

        link.href = Some(staged);
        link.download = Some(self.filename.clone());
        link.click(&self.save_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_resolution() {
        let mut caps = HostCapabilities::default();
        caps.blob_save = false;
        assert_eq!(
            ExportMethod::Auto.resolve(&caps),
            ExportMethod::AnchorDownload
        );
        caps.blob_save = true;
        assert_eq!(ExportMethod::Auto.resolve(&caps), ExportMethod::BlobSave);
        assert_eq!(
            ExportMethod::AnchorDownload.resolve(&caps),
            ExportMethod::AnchorDownload
        );
    }

    #[test]
    fn test_failed_click_discards_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("staged.jpg");
        std::fs::write(&staged, b"jpeg").unwrap();
        // A plain file where the download directory should be
        let blocked = dir.path().join("downloads");
        std::fs::write(&blocked, b"").unwrap();

        let mut link = SaveLink {
            href: Some(staged.clone()),
            download: Some("mySelfie.jpg".to_string()),
        };
        assert!(matches!(
            link.click(&blocked),
            Err(PhotoError::SaveFailed(_))
        ));
        assert!(!staged.exists());
        assert_eq!(link, SaveLink::default());
    }

    #[test]
    fn test_click_without_href_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut link = SaveLink::default();
        assert!(matches!(
            link.click(dir.path()),
            Err(PhotoError::SaveFailed(_))
        ));
    }
}
