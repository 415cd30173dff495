// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! Synthetic cameras that behave like real ones from the controller's point
//! of view: they enumerate, open with constraints, deliver frames, stop,
//! and can be plugged or unplugged at runtime. Sources are either animated
//! test patterns or still images.
//!
//! The backend is a cheap handle around shared state, so a clone kept by the
//! caller can inspect what the controller requested (constraints, stopped
//! tracks) and inject failures.

mod file_source;
mod pattern;

pub use file_source::load_image_as_frame;
pub use pattern::TestPattern;

use crate::backends::camera::types::*;
use crate::backends::camera::{MediaBackend, MediaStream};
use crate::constants::file_formats::is_image_extension;
use crate::constants::{VIRTUAL_DEFAULT_HEIGHT, VIRTUAL_DEFAULT_WIDTH};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Request and stream records kept for inspection
const HISTORY_LIMIT: usize = 64;

/// Where a virtual camera gets its pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VirtualSource {
    /// Animated color bars
    TestPattern(TestPattern),
    /// A still image file, repeated every frame
    Image(PathBuf),
    /// Not a camera (audio devices are listed but never opened)
    None,
}

/// One device exposed by the virtual backend
#[derive(Debug, Clone)]
pub struct VirtualDevice {
    pub info: MediaDeviceInfo,
    pub source: VirtualSource,
}

impl VirtualDevice {
    /// A test pattern camera
    pub fn camera(device_id: impl Into<String>, label: impl Into<String>, bar_offset: usize) -> Self {
        Self {
            info: MediaDeviceInfo::video_input(device_id, label),
            source: VirtualSource::TestPattern(TestPattern::new(bar_offset)),
        }
    }

    /// A camera replaying a still image
    pub fn image(device_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "Image".to_string());
        Self {
            info: MediaDeviceInfo::video_input(device_id, label),
            source: VirtualSource::Image(path),
        }
    }

    /// A non-video device (microphone or speaker)
    pub fn audio(device_id: impl Into<String>, kind: DeviceKind) -> Self {
        let device_id = device_id.into();
        Self {
            info: MediaDeviceInfo {
                label: format!("Virtual {}", kind),
                device_id,
                kind,
                driver: None,
            },
            source: VirtualSource::None,
        }
    }
}

/// Record of a stream handed out by the backend
#[derive(Debug, Clone)]
pub struct StreamRecord {
    pub stream_id: String,
    pub device_id: String,
    stopped: Arc<AtomicBool>,
}

impl StreamRecord {
    /// Whether the stream's video track has been stopped
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// End the track from the device side, as an unplugged camera would
    pub fn end_track(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

struct VirtualState {
    devices: Vec<VirtualDevice>,
    capabilities: HostCapabilities,
    pending_failure: Option<BackendError>,
    requests: Vec<StreamConstraints>,
    streams: Vec<StreamRecord>,
    watchers: Vec<DeviceChangeSender>,
}

/// Virtual backend handle
#[derive(Clone)]
pub struct VirtualBackend {
    state: Arc<Mutex<VirtualState>>,
}

impl Default for VirtualBackend {
    fn default() -> Self {
        Self::with_test_patterns(2)
    }
}

impl VirtualBackend {
    /// Backend exposing the given devices, with all capabilities enabled
    pub fn new(devices: Vec<VirtualDevice>) -> Self {
        Self {
            state: Arc::new(Mutex::new(VirtualState {
                devices,
                capabilities: HostCapabilities::default(),
                pending_failure: None,
                requests: Vec::new(),
                streams: Vec::new(),
                watchers: Vec::new(),
            })),
        }
    }

    /// Backend with `count` test pattern cameras (`virtual:0`, `virtual:1`, ...)
    pub fn with_test_patterns(count: usize) -> Self {
        let devices = (0..count)
            .map(|i| VirtualDevice::camera(format!("virtual:{}", i), format!("Virtual Camera {}", i), i))
            .collect();
        Self::new(devices)
    }

    /// Test pattern cameras followed by one camera per still image
    ///
    /// Paths without a known image extension are skipped. Image cameras are
    /// named `virtual:image:0`, `virtual:image:1`, ...
    pub fn with_sources(pattern_count: usize, images: &[PathBuf]) -> Self {
        let backend = Self::with_test_patterns(pattern_count);
        let stills = images.iter().filter(|path| {
            let known = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(is_image_extension);
            if !known {
                warn!(path = %path.display(), "Ignoring virtual image source with unknown extension");
            }
            known
        });
        backend
            .state()
            .devices
            .extend(stills.enumerate().map(|(i, path)| {
                VirtualDevice::image(format!("virtual:image:{}", i), path.clone())
            }));
        backend
    }

    fn state(&self) -> MutexGuard<'_, VirtualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Override the reported host capabilities
    pub fn set_capabilities(&self, capabilities: HostCapabilities) {
        self.state().capabilities = capabilities;
    }

    /// Reject the next stream request with `error`
    pub fn fail_next_open(&self, error: BackendError) {
        self.state().pending_failure = Some(error);
    }

    /// Add a device and notify watchers
    pub fn plug(&self, device: VirtualDevice) {
        info!(device = %device.info.device_id, "Virtual device plugged");
        let mut state = self.state();
        state.devices.push(device);
        notify_watchers(&mut state);
    }

    /// Remove a device and notify watchers
    pub fn unplug(&self, device_id: &str) {
        info!(device = %device_id, "Virtual device unplugged");
        let mut state = self.state();
        state.devices.retain(|d| d.info.device_id != device_id);
        notify_watchers(&mut state);
    }

    /// Constraint sets the backend was asked to open, oldest first
    ///
    /// Only the most recent requests are kept.
    pub fn requested_constraints(&self) -> Vec<StreamConstraints> {
        self.state().requests.clone()
    }

    /// Streams handed out, oldest first
    ///
    /// Stopped streams are forgotten once the history is full.
    pub fn opened_streams(&self) -> Vec<StreamRecord> {
        self.state().streams.clone()
    }

    /// Streams whose track has not been stopped
    pub fn live_stream_count(&self) -> usize {
        self.state().streams.iter().filter(|s| !s.is_stopped()).count()
    }
}

impl VirtualState {
    fn record_request(&mut self, constraints: StreamConstraints) {
        if self.requests.len() >= HISTORY_LIMIT {
            self.requests.remove(0);
        }
        self.requests.push(constraints);
    }

    /// Live streams are always kept; the oldest stopped one makes room
    fn record_stream(&mut self, record: StreamRecord) {
        if self.streams.len() >= HISTORY_LIMIT
            && let Some(oldest) = self.streams.iter().position(StreamRecord::is_stopped)
        {
            self.streams.remove(oldest);
        }
        self.streams.push(record);
    }
}

fn notify_watchers(state: &mut VirtualState) {
    // Drop subscribers that went away
    state
        .watchers
        .retain_mut(|sender| match sender.try_send(()) {
            Ok(()) => true,
            Err(e) => !e.is_disconnected(),
        });
}

impl MediaBackend for VirtualBackend {
    fn capabilities(&self) -> HostCapabilities {
        self.state().capabilities
    }

    fn enumerate_devices(&self) -> BackendResult<Vec<MediaDeviceInfo>> {
        let state = self.state();
        if !state.capabilities.device_enumeration {
            return Err(BackendError::NotAvailable(
                "Device enumeration disabled".to_string(),
            ));
        }
        Ok(state.devices.iter().map(|d| d.info.clone()).collect())
    }

    fn open_stream(&mut self, constraints: &StreamConstraints) -> BackendResult<Box<dyn MediaStream>> {
        let mut state = self.state();
        state.record_request(constraints.clone());

        if !state.capabilities.stream_access {
            return Err(BackendError::NotAvailable("Stream access disabled".to_string()));
        }
        if let Some(err) = state.pending_failure.take() {
            debug!(error = %err, "Injected stream failure");
            return Err(err);
        }

        let device = match constraints.device_id() {
            Some(id) => state.devices.iter().find(|d| d.info.device_id == id),
            None => state
                .devices
                .iter()
                .find(|d| d.info.kind == DeviceKind::VideoInput),
        }
        .cloned()
        .ok_or_else(|| {
            BackendError::DeviceNotFound(format!("No virtual camera matches {}", constraints))
        })?;

        let source = match &device.source {
            VirtualSource::TestPattern(pattern) => FrameSource::Pattern {
                pattern: *pattern,
                width: constraints.width.unwrap_or(VIRTUAL_DEFAULT_WIDTH),
                height: constraints.height.unwrap_or(VIRTUAL_DEFAULT_HEIGHT),
            },
            VirtualSource::Image(path) => FrameSource::Still(load_image_as_frame(path)?),
            VirtualSource::None => {
                return Err(BackendError::DeviceNotFound(format!(
                    "{} is not a video input",
                    device.info.device_id
                )));
            }
        };

        let stopped = Arc::new(AtomicBool::new(false));
        let stream = VirtualStream {
            id: uuid::Uuid::new_v4().to_string(),
            device_id: device.info.device_id.clone(),
            source,
            sequence: 0,
            stopped: Arc::clone(&stopped),
        };

        state.record_stream(StreamRecord {
            stream_id: stream.id.clone(),
            device_id: stream.device_id.clone(),
            stopped,
        });

        debug!(stream = %stream.id, device = %stream.device_id, "Virtual stream opened");
        Ok(Box::new(stream))
    }

    fn watch_device_changes(&mut self) -> Option<DeviceChangeReceiver> {
        let (sender, receiver) = futures::channel::mpsc::channel(1);
        self.state().watchers.push(sender);
        Some(receiver)
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }
}

enum FrameSource {
    Pattern {
        pattern: TestPattern,
        width: u32,
        height: u32,
    },
    Still(CameraFrame),
}

/// Stream produced by the virtual backend
///
/// Frames are rendered on demand, one per `latest_frame` call.
struct VirtualStream {
    id: String,
    device_id: String,
    source: FrameSource,
    sequence: u64,
    stopped: Arc<AtomicBool>,
}

impl MediaStream for VirtualStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn stop_video_track(&mut self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            debug!(stream = %self.id, "Virtual track stopped");
        }
    }

    fn track_state(&self) -> TrackState {
        if self.stopped.load(Ordering::SeqCst) {
            TrackState::Ended
        } else {
            TrackState::Live
        }
    }

    fn latest_frame(&mut self) -> Option<CameraFrame> {
        if self.stopped.load(Ordering::SeqCst) {
            return None;
        }

        self.sequence += 1;
        let frame = match &self.source {
            FrameSource::Pattern {
                pattern,
                width,
                height,
            } => pattern.render(*width, *height, self.sequence),
            FrameSource::Still(frame) => CameraFrame {
                sequence: self.sequence,
                captured_at: std::time::Instant::now(),
                ..frame.clone()
            },
        };
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_device_request() {
        let mut backend = VirtualBackend::with_test_patterns(3);
        let mut stream = backend
            .open_stream(&StreamConstraints::exact_device("virtual:2", 32, 18))
            .unwrap();

        assert_eq!(stream.device_id(), "virtual:2");
        let frame = stream.latest_frame().unwrap();
        assert_eq!(frame.dimensions(), (32, 18));
    }

    #[test]
    fn test_unknown_device_is_not_found() {
        let mut backend = VirtualBackend::with_test_patterns(1);
        let err = backend
            .open_stream(&StreamConstraints::exact_device("virtual:9", 32, 18))
            .err()
            .unwrap();
        assert_eq!(err.name(), "NotFoundError");
    }

    #[test]
    fn test_stopped_track_delivers_nothing() {
        let mut backend = VirtualBackend::with_test_patterns(1);
        let handle = backend.clone();
        let mut stream = backend
            .open_stream(&StreamConstraints::any_camera())
            .unwrap();

        stream.stop_video_track();
        assert_eq!(stream.track_state(), TrackState::Ended);
        assert!(stream.latest_frame().is_none());
        assert!(handle.opened_streams()[0].is_stopped());
        assert_eq!(handle.live_stream_count(), 0);
    }

    #[test]
    fn test_plug_notifies_watchers() {
        let mut backend = VirtualBackend::with_test_patterns(1);
        let handle = backend.clone();
        let mut receiver = backend.watch_device_changes().unwrap();

        handle.plug(VirtualDevice::camera("virtual:extra", "Extra", 3));
        assert_eq!(receiver.try_next().unwrap(), Some(()));
        assert_eq!(backend.enumerate_devices().unwrap().len(), 2);
    }

    #[test]
    fn test_injected_failure_applies_once() {
        let mut backend = VirtualBackend::with_test_patterns(1);
        backend.fail_next_open(BackendError::PermissionDenied("denied".into()));

        assert!(backend.open_stream(&StreamConstraints::any_camera()).is_err());
        assert!(backend.open_stream(&StreamConstraints::any_camera()).is_ok());
        assert_eq!(backend.requested_constraints().len(), 2);
    }

    #[test]
    fn test_history_stays_bounded() {
        let mut backend = VirtualBackend::with_test_patterns(1);
        let handle = backend.clone();

        let mut live = backend
            .open_stream(&StreamConstraints::any_camera())
            .unwrap();
        for _ in 0..HISTORY_LIMIT * 3 {
            let mut stream = backend
                .open_stream(&StreamConstraints::any_camera())
                .unwrap();
            stream.stop_video_track();
        }

        assert_eq!(handle.requested_constraints().len(), HISTORY_LIMIT);
        let streams = handle.opened_streams();
        assert_eq!(streams.len(), HISTORY_LIMIT);
        assert!(streams.iter().any(|s| s.stream_id == live.id()));
        assert_eq!(handle.live_stream_count(), 1);
        live.stop_video_track();
    }

    #[test]
    fn test_image_sources_become_cameras() {
        let dir = tempfile::tempdir().unwrap();
        let still = dir.path().join("booth.png");
        image::RgbaImage::from_pixel(12, 8, image::Rgba([9, 9, 9, 255]))
            .save(&still)
            .unwrap();
        let notes = dir.path().join("notes.txt");

        let mut backend = VirtualBackend::with_sources(1, &[still, notes]);
        let devices = backend.enumerate_devices().unwrap();
        let ids: Vec<&str> = devices.iter().map(|d| d.device_id.as_str()).collect();
        assert_eq!(ids, vec!["virtual:0", "virtual:image:0"]);
        assert_eq!(devices[1].label, "booth.png");

        let mut stream = backend
            .open_stream(&StreamConstraints::exact_device("virtual:image:0", 1280, 720))
            .unwrap();
        assert_eq!(stream.latest_frame().unwrap().dimensions(), (12, 8));
    }

    #[test]
    fn test_audio_devices_cannot_be_opened() {
        let mut backend = VirtualBackend::new(vec![VirtualDevice::audio(
            "mic:0",
            DeviceKind::AudioInput,
        )]);
        let err = backend
            .open_stream(&StreamConstraints::exact_device("mic:0", 32, 18))
            .err()
            .unwrap();
        assert_eq!(err.name(), "NotFoundError");
    }
}
