// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraBackendType {
    /// Video4Linux2 capture devices (`/dev/video*`)
    #[default]
    V4l2,
    /// Synthetic devices (test patterns and still images)
    Virtual,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::Virtual => write!(f, "virtual"),
        }
    }
}

impl std::str::FromStr for CameraBackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v4l2" | "v4l" => Ok(CameraBackendType::V4l2),
            "virtual" | "synthetic" => Ok(CameraBackendType::Virtual),
            other => Err(format!("Unknown camera backend: {}", other)),
        }
    }
}

/// What the host can do for us
///
/// Mirrors the feature probing a page does before it touches media APIs:
/// stream access alone is the minimum, enumeration enables camera switching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Streams can be opened at all
    pub stream_access: bool,
    /// Input devices can be listed (needed to select a specific camera)
    pub device_enumeration: bool,
    /// Streams can be bound to the preview directly instead of through an object URL
    pub direct_binding: bool,
    /// Encoded photos can be written straight to disk without a staged download
    pub blob_save: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            stream_access: true,
            device_enumeration: true,
            direct_binding: true,
            blob_save: false,
        }
    }
}

/// Kind of an enumerated media device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::VideoInput => write!(f, "videoinput"),
            DeviceKind::AudioInput => write!(f, "audioinput"),
            DeviceKind::AudioOutput => write!(f, "audiooutput"),
        }
    }
}

/// An enumerated media device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDeviceInfo {
    /// Stable identifier used to request this device (V4L2: device path)
    pub device_id: String,
    pub kind: DeviceKind,
    /// Human readable name (V4L2 card name)
    pub label: String,
    /// Driver reported by the device, when known
    pub driver: Option<String>,
}

impl MediaDeviceInfo {
    pub fn video_input(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            kind: DeviceKind::VideoInput,
            label: label.into(),
            driver: None,
        }
    }
}

/// Device selection part of a stream request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeviceConstraint {
    /// Whatever camera the backend considers default
    #[default]
    Any,
    /// This device and no other
    Exact(String),
}

/// Stream request constraints
///
/// Width and height are ideal values: the backend gets as close as the
/// device allows. The device constraint is strict.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamConstraints {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub device: DeviceConstraint,
}

impl StreamConstraints {
    /// A request for any camera at any resolution (`{ video: true }`)
    pub fn any_camera() -> Self {
        Self::default()
    }

    /// A request for one specific device at a target resolution
    pub fn exact_device(device_id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            device: DeviceConstraint::Exact(device_id.into()),
        }
    }

    /// Requested device id, if the request names one
    pub fn device_id(&self) -> Option<&str> {
        match &self.device {
            DeviceConstraint::Any => None,
            DeviceConstraint::Exact(id) => Some(id),
        }
    }
}

impl std::fmt::Display for StreamConstraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.width, self.height) {
            (Some(w), Some(h)) => write!(f, "{}x{}", w, h)?,
            _ => write!(f, "any size")?,
        }
        match &self.device {
            DeviceConstraint::Any => write!(f, " on any camera"),
            DeviceConstraint::Exact(id) => write!(f, " on {}", id),
        }
    }
}

/// Lifecycle state of a video track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    #[default]
    Live,
    Ended,
}

/// A single RGBA frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA pixels (`width * height * 4` bytes)
    pub data: Arc<[u8]>,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
    /// Sequence number within the stream
    pub sequence: u64,
}

impl CameraFrame {
    /// Wrap tightly packed RGBA data
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>, sequence: u64) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            captured_at: Instant::now(),
            sequence,
        }
    }

    /// Copy the frame into an owned RGBA image
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data.to_vec())
    }

    /// Native resolution of the frame
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Frame receiver type for preview streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

/// Receiver for device hotplug notifications
pub type DeviceChangeReceiver = futures::channel::mpsc::Receiver<()>;

/// Sender for device hotplug notifications
pub type DeviceChangeSender = futures::channel::mpsc::Sender<()>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Access to the device was refused (permissions)
    PermissionDenied(String),
    /// Device exists but cannot be read (busy, unplugged mid-open)
    NotReadable(String),
    /// No format satisfies the request
    FormatNotSupported(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl BackendError {
    /// DOM-style error name shown to the user for rejected stream requests
    pub fn name(&self) -> &'static str {
        match self {
            BackendError::NotAvailable(_) => "NotSupportedError",
            BackendError::DeviceNotFound(_) => "NotFoundError",
            BackendError::PermissionDenied(_) => "NotAllowedError",
            BackendError::NotReadable(_) => "NotReadableError",
            BackendError::FormatNotSupported(_) => "OverconstrainedError",
            BackendError::IoError(_) => "AbortError",
            BackendError::Other(_) => "UnknownError",
        }
    }

    /// Map an OS error from opening or reading a device
    pub fn from_io(context: &str, err: &std::io::Error) -> Self {
        const EBUSY: i32 = 16;
        const ENODEV: i32 = 19;

        let msg = format!("{}: {}", context, err);
        match err.kind() {
            std::io::ErrorKind::NotFound => BackendError::DeviceNotFound(msg),
            std::io::ErrorKind::PermissionDenied => BackendError::PermissionDenied(msg),
            _ => match err.raw_os_error() {
                Some(ENODEV) => BackendError::DeviceNotFound(msg),
                Some(EBUSY) => BackendError::NotReadable(msg),
                _ => BackendError::IoError(msg),
            },
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::NotReadable(msg) => write!(f, "Device not readable: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}
