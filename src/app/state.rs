// SPDX-License-Identifier: GPL-3.0-only

//! Controller state and messages

use crate::app::page::{ElementId, Page};
use crate::backends::camera::{
    CameraBackendManager, DeviceChangeReceiver, HostCapabilities, MediaStream,
};
use crate::config::Config;
use crate::pipelines::photo::{PhotoEncoder, PhotoExporter};
use crate::storage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Messages dispatched to the controller
///
/// - **Lifecycle**: `Init`, `Tick`
/// - **Input**: `Click` on a page element, routed through its listener
/// - **Listener targets**: what a click on a wired element turns into
/// - **Host events**: device change notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // ===== Lifecycle =====
    /// Probe the host and wire listeners
    Init,
    /// Pull frames and host notifications
    Tick,

    // ===== Input =====
    /// User clicked or tapped an element
    Click(ElementId),

    // ===== Listener targets =====
    /// Draw the current preview frame to the canvas
    CaptureFrame,
    /// Export the canvas as JPEG
    SavePhoto,
    /// Rotate to the next camera
    NextWebcam,
    /// Advance the preview filter
    CycleVideoFilter,
    /// Advance the canvas filter
    CycleImageFilter,

    // ===== Host events =====
    /// Camera list changed (hotplug)
    DeviceChanged,
}

/// The page controller
///
/// Owns the single active stream and the handful of fields the page logic
/// needs; everything else is derived from the backend on demand.
pub struct PageController {
    pub(crate) manager: CameraBackendManager,
    pub(crate) config: Config,
    pub(crate) capabilities: HostCapabilities,
    pub(crate) page: Page,
    /// Click listeners currently attached, per element
    pub(crate) listeners: HashMap<ElementId, Message>,
    pub(crate) media_stream: Option<Box<dyn MediaStream>>,
    /// Object URL -> stream id, for hosts without direct binding
    pub(crate) object_urls: HashMap<String, String>,
    /// Device ids of the video inputs, in enumeration order
    pub(crate) webcam_list: Vec<String>,
    pub(crate) current_cam: Option<usize>,
    pub(crate) photo_ready: bool,
    pub(crate) filter_index: usize,
    /// Only used when the filter cycle is not shared
    pub(crate) image_filter_index: usize,
    pub(crate) device_changes: Option<DeviceChangeReceiver>,
    pub(crate) listening_for_device_changes: bool,
    pub(crate) exporter: PhotoExporter,
    pub(crate) last_saved: Option<PathBuf>,
    pub(crate) initialized: bool,
}

impl PageController {
    pub fn new(manager: CameraBackendManager, config: Config) -> Self {
        let exporter = PhotoExporter::new(
            PhotoEncoder::new(config.jpeg_quality),
            config.resolved_save_directory(),
            storage::staging_directory(),
            config.photo_filename.clone(),
        );
        let capabilities = manager.capabilities();

        Self {
            manager,
            config,
            capabilities,
            page: Page::new(),
            listeners: HashMap::new(),
            media_stream: None,
            object_urls: HashMap::new(),
            webcam_list: Vec::new(),
            current_cam: None,
            photo_ready: false,
            filter_index: 0,
            image_filter_index: 0,
            device_changes: None,
            listening_for_device_changes: false,
            exporter,
            last_saved: None,
            initialized: false,
        }
    }

    /// Replace the photo exporter (save and staging locations)
    pub fn with_exporter(mut self, exporter: PhotoExporter) -> Self {
        self.exporter = exporter;
        self
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    pub fn webcam_list(&self) -> &[String] {
        &self.webcam_list
    }

    pub fn current_cam(&self) -> Option<usize> {
        self.current_cam
    }

    /// Device id of the active stream
    pub fn active_device_id(&self) -> Option<&str> {
        self.media_stream.as_ref().map(|s| s.device_id())
    }

    pub fn has_stream(&self) -> bool {
        self.media_stream.is_some()
    }

    pub fn photo_ready(&self) -> bool {
        self.photo_ready
    }

    pub fn filter_index(&self) -> usize {
        self.filter_index
    }

    /// Whether a click on `element` currently does anything
    pub fn is_armed(&self, element: ElementId) -> bool {
        self.listeners.contains_key(&element)
    }

    pub fn is_listening_for_device_changes(&self) -> bool {
        self.listening_for_device_changes
    }

    /// Stream id an object URL stands for
    pub fn resolve_object_url(&self, url: &str) -> Option<&str> {
        self.object_urls.get(url).map(String::as_str)
    }

    /// Where the last successful export ended up
    pub fn last_saved(&self) -> Option<&Path> {
        self.last_saved.as_deref()
    }

    pub fn save_directory(&self) -> &Path {
        self.exporter.save_dir()
    }
}

impl std::fmt::Debug for PageController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageController")
            .field("backend", &self.manager.backend_type())
            .field("webcam_list", &self.webcam_list)
            .field("current_cam", &self.current_cam)
            .field("stream", &self.media_stream.as_ref().map(|s| s.id().to_string()))
            .field("photo_ready", &self.photo_ready)
            .field("filter_index", &self.filter_index)
            .finish()
    }
}
