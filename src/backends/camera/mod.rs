// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! The page controller never talks to devices directly. Everything it needs
//! from the host (capability probing, enumeration, stream acquisition,
//! hotplug notifications) goes through [`MediaBackend`], and every live
//! capture handle is a [`MediaStream`].
//!
//! ```text
//! ┌─────────────────────┐
//! │   PageController    │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackendManager│  ← Thread-safe ownership of the backend
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  MediaBackend Trait │  ← Common interface
//! └──────────┬──────────┘
//!            │
//!      ┌─────┴──────┐
//!      ▼            ▼
//!  ┌───────┐   ┌─────────┐
//!  │ V4L2  │   │ Virtual │
//!  └───────┘   └─────────┘
//! ```

pub mod manager;
pub mod types;
pub mod v4l2;

pub use manager::CameraBackendManager;
pub use types::*;

use crate::backends::virtual_camera::VirtualBackend;
use std::path::PathBuf;
use std::time::Duration;

/// Host media capabilities
pub trait MediaBackend: Send {
    /// What this backend supports (probed once at page start)
    fn capabilities(&self) -> HostCapabilities;

    /// List all input devices the backend knows about, of every kind
    fn enumerate_devices(&self) -> BackendResult<Vec<MediaDeviceInfo>>;

    /// Acquire a stream satisfying the constraints
    ///
    /// An exact device constraint that matches no device fails with
    /// [`BackendError::DeviceNotFound`].
    fn open_stream(&mut self, constraints: &StreamConstraints) -> BackendResult<Box<dyn MediaStream>>;

    /// Subscribe to device hotplug notifications
    ///
    /// Returns `None` when the backend cannot report device changes.
    fn watch_device_changes(&mut self) -> Option<DeviceChangeReceiver>;

    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;
}

/// A live capture handle with a single video track
pub trait MediaStream: Send {
    /// Unique stream identifier
    fn id(&self) -> &str;

    /// Device the stream was opened on
    fn device_id(&self) -> &str;

    /// Stop the video track and release the device
    ///
    /// Stopping an ended track is a no-op.
    fn stop_video_track(&mut self);

    /// Current state of the video track
    fn track_state(&self) -> TrackState;

    /// Most recent frame delivered since the last call, if any
    ///
    /// Older queued frames are discarded.
    fn latest_frame(&mut self) -> Option<CameraFrame>;
}

/// Drain a frame channel and keep only the newest frame
pub fn drain_latest(receiver: &mut FrameReceiver) -> Option<CameraFrame> {
    let mut latest = None;
    while let Ok(Some(frame)) = receiver.try_next() {
        latest = Some(frame);
    }
    latest
}

/// Construction options shared by all backends
#[derive(Debug, Clone)]
pub struct BackendOptions {
    /// How often the device directory is rescanned for hotplug events
    pub device_poll_interval: Duration,
    /// Number of synthetic cameras exposed by the virtual backend
    pub virtual_device_count: usize,
    /// Still images offered as extra virtual cameras
    pub virtual_image_sources: Vec<PathBuf>,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            device_poll_interval: Duration::from_millis(crate::constants::DEVICE_POLL_INTERVAL_MS),
            virtual_device_count: 2,
            virtual_image_sources: Vec::new(),
        }
    }
}

/// Create a backend instance for a backend type
pub fn get_backend_for_type(
    backend_type: CameraBackendType,
    options: &BackendOptions,
) -> Box<dyn MediaBackend> {
    match backend_type {
        CameraBackendType::V4l2 => Box::new(v4l2::V4l2Backend::new(options.device_poll_interval)),
        CameraBackendType::Virtual => Box::new(VirtualBackend::with_sources(
            options.virtual_device_count,
            &options.virtual_image_sources,
        )),
    }
}
