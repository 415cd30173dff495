// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera backend
//!
//! Talks to `/dev/video*` nodes through the `v4l` crate. Device identifiers
//! are the node paths, so a request with an exact device constraint opens
//! that node and nothing else.

mod capture_thread;
mod enumeration;
mod format_converters;
mod hotplug;

pub use capture_thread::V4l2Stream;
pub use enumeration::{enumerate_v4l2_cameras, list_video_nodes};
pub use format_converters::{CaptureFormat, decode_to_rgba};
pub use hotplug::DeviceWatcher;

use super::types::*;
use super::{MediaBackend, MediaStream};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Directory scanned for video nodes
pub const DEV_DIR: &str = "/dev";

/// V4L2 backend implementation
pub struct V4l2Backend {
    dev_dir: PathBuf,
    poll_interval: Duration,
    watcher: Option<DeviceWatcher>,
}

impl V4l2Backend {
    /// Create a new V4L2 backend
    pub fn new(poll_interval: Duration) -> Self {
        Self::with_dev_dir(DEV_DIR, poll_interval)
    }

    /// Create a backend scanning a different device directory
    pub fn with_dev_dir(dev_dir: impl AsRef<Path>, poll_interval: Duration) -> Self {
        Self {
            dev_dir: dev_dir.as_ref().to_path_buf(),
            poll_interval,
            watcher: None,
        }
    }

    /// Resolve the node to open for a request
    fn resolve_device(&self, constraints: &StreamConstraints) -> BackendResult<String> {
        match &constraints.device {
            DeviceConstraint::Exact(id) => {
                if Path::new(id).exists() {
                    Ok(id.clone())
                } else {
                    Err(BackendError::DeviceNotFound(format!("{} is not present", id)))
                }
            }
            DeviceConstraint::Any => enumerate_v4l2_cameras(&self.dev_dir)
                .into_iter()
                .next()
                .map(|camera| camera.device_id)
                .ok_or_else(|| BackendError::DeviceNotFound("No cameras found".to_string())),
        }
    }
}

impl MediaBackend for V4l2Backend {
    fn capabilities(&self) -> HostCapabilities {
        let stream_access = self.dev_dir.is_dir();
        HostCapabilities {
            stream_access,
            device_enumeration: stream_access,
            direct_binding: true,
            blob_save: true,
        }
    }

    fn enumerate_devices(&self) -> BackendResult<Vec<MediaDeviceInfo>> {
        if !self.dev_dir.is_dir() {
            return Err(BackendError::NotAvailable(format!(
                "{} is not a directory",
                self.dev_dir.display()
            )));
        }
        Ok(enumerate_v4l2_cameras(&self.dev_dir))
    }

    fn open_stream(&mut self, constraints: &StreamConstraints) -> BackendResult<Box<dyn MediaStream>> {
        let device_path = self.resolve_device(constraints)?;
        debug!(device_path = %device_path, %constraints, "Opening V4L2 stream");
        let stream = V4l2Stream::open(&device_path, constraints)?;
        Ok(Box::new(stream))
    }

    fn watch_device_changes(&mut self) -> Option<DeviceChangeReceiver> {
        // A new subscription replaces the previous watcher
        if let Some(old) = self.watcher.take() {
            old.stop();
        }

        match DeviceWatcher::spawn(self.dev_dir.clone(), self.poll_interval) {
            Ok((watcher, receiver)) => {
                info!(dev_dir = %self.dev_dir.display(), "Watching for camera hotplug");
                self.watcher = Some(watcher);
                Some(receiver)
            }
            Err(e) => {
                warn!(error = %e, "Device change notifications unavailable");
                None
            }
        }
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }
}

impl Drop for V4l2Backend {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dev_dir_reports_no_capabilities() {
        let backend =
            V4l2Backend::with_dev_dir("/nonexistent/selfie-cam/dev", Duration::from_millis(100));
        let caps = backend.capabilities();
        assert!(!caps.stream_access);
        assert!(!caps.device_enumeration);
        assert!(matches!(
            backend.enumerate_devices(),
            Err(BackendError::NotAvailable(_))
        ));
    }

    #[test]
    fn test_exact_missing_device_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = V4l2Backend::with_dev_dir(dir.path(), Duration::from_millis(100));
        let missing = dir.path().join("video7").to_string_lossy().to_string();

        let err = backend
            .open_stream(&StreamConstraints::exact_device(missing, 1280, 720))
            .err()
            .unwrap();
        assert_eq!(err.name(), "NotFoundError");
    }

    #[test]
    fn test_any_camera_without_nodes_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = V4l2Backend::with_dev_dir(dir.path(), Duration::from_millis(100));
        let err = backend
            .open_stream(&StreamConstraints::any_camera())
            .err()
            .unwrap();
        assert_eq!(err.name(), "NotFoundError");
    }
}
