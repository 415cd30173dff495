// SPDX-License-Identifier: GPL-3.0-only

//! Camera control handlers
//!
//! Handles bootstrap, device enumeration, camera rotation, stream binding
//! and hotplug events.

use crate::app::page::{ElementId, PreviewSource};
use crate::app::state::{Message, PageController};
use crate::backends::camera::{
    BackendError, DeviceKind, MediaDeviceInfo, MediaStream, StreamConstraints,
};
use crate::constants::{APP_DIR_NAME, messages};
use tracing::{debug, error, info, warn};

impl PageController {
    // =========================================================================
    // Bootstrap
    // =========================================================================

    /// Wire listeners and probe the host
    pub(crate) fn init(&mut self) {
        if self.initialized {
            warn!("Controller already initialized");
            return;
        }
        self.initialized = true;

        self.listeners
            .insert(ElementId::Preview, Message::CaptureFrame);
        self.listeners
            .insert(ElementId::SwitchButton, Message::NextWebcam);
        self.listeners
            .insert(ElementId::VideoFilterTrigger, Message::CycleVideoFilter);
        self.listeners
            .insert(ElementId::ImageFilterTrigger, Message::CycleImageFilter);

        self.capabilities = self.manager.capabilities();
        info!(
            backend = %self.manager.backend_type(),
            capabilities = ?self.capabilities,
            "Initializing page"
        );

        if self.capabilities.device_enumeration {
            self.enumerate_and_load();
        } else if self.capabilities.stream_access {
            self.page.tooltip = Some(messages::ENUMERATION_UNSUPPORTED.to_string());
            match self.manager.open_stream(&StreamConstraints::any_camera()) {
                Ok(stream) => self.initialize_video_stream(stream),
                Err(e) => self.handle_stream_error(&e),
            }
        } else {
            warn!("Backend offers no stream access");
            self.page.append_error(messages::MEDIA_CAPTURE_UNSUPPORTED);
        }
    }

    // =========================================================================
    // Enumeration and rotation
    // =========================================================================

    fn enumerate_and_load(&mut self) {
        match self.manager.enumerate_devices() {
            Ok(devices) => self.devices_callback(devices),
            Err(e) => {
                error!(error = %e, "Device enumeration failed");
                self.handle_stream_error(&e);
            }
        }
    }

    fn devices_callback(&mut self, devices: Vec<MediaDeviceInfo>) {
        self.webcam_list.extend(
            devices
                .into_iter()
                .filter(|d| d.kind == DeviceKind::VideoInput)
                .map(|d| d.device_id),
        );
        info!(count = self.webcam_list.len(), cameras = ?self.webcam_list, "Cameras enumerated");

        if self.webcam_list.is_empty() {
            self.page.append_error(messages::WEBCAM_NOT_FOUND);
        } else {
            self.next_webcam();
            self.page.switch_button.disabled = self.webcam_list.len() <= 1;
        }

        self.start_listening_for_device_changes();
    }

    /// Stop the current camera and open the next one in the list
    pub(crate) fn next_webcam(&mut self) {
        if self.webcam_list.is_empty() {
            debug!("No cameras to rotate through");
            return;
        }

        self.page.switch_button.disabled = true;

        match self.current_cam {
            Some(index) => {
                let next = index + 1;
                self.current_cam = Some(if next >= self.webcam_list.len() { 0 } else { next });
                self.page.preview.unbind();
                self.stop_media_stream();
            }
            None => self.current_cam = Some(0),
        }

        let Some(index) = self.current_cam else {
            return;
        };
        let constraints = StreamConstraints::exact_device(
            self.webcam_list[index].clone(),
            self.config.target_width,
            self.config.target_height,
        );
        debug!(index, constraints = %constraints, "Requesting stream");

        match self.manager.open_stream(&constraints) {
            Ok(stream) => self.initialize_video_stream(stream),
            Err(e) => {
                self.handle_stream_error(&e);
                if self.webcam_list.len() > 1 {
                    self.page.switch_button.disabled = false;
                }
            }
        }
    }

    fn stop_media_stream(&mut self) {
        if let Some(mut stream) = self.media_stream.take() {
            info!(stream = %stream.id(), device = %stream.device_id(), "Stopping video track");
            stream.stop_video_track();
            let id = stream.id().to_string();
            self.object_urls.retain(|_, stream_id| *stream_id != id);
        }
    }

    // =========================================================================
    // Stream binding
    // =========================================================================

    /// Keep `stream` as the active stream and bind it to the preview
    pub(crate) fn initialize_video_stream(&mut self, stream: Box<dyn MediaStream>) {
        let stream_id = stream.id().to_string();

        let source = if self.capabilities.direct_binding {
            PreviewSource::Stream(stream_id.clone())
        } else {
            let url = format!("blob:{}/{}", APP_DIR_NAME, uuid::Uuid::new_v4());
            self.object_urls.insert(url.clone(), stream_id.clone());
            PreviewSource::ObjectUrl(url)
        };
        info!(stream = %stream_id, device = %stream.device_id(), source = ?source, "Stream bound to preview");

        self.page.preview.src = Some(source);
        self.page.preview.frame = None;
        self.media_stream = Some(stream);

        if self.webcam_list.len() > 1 {
            self.page.switch_button.disabled = false;
        }
    }

    /// Stream id the preview is currently showing
    fn bound_stream_id(&self) -> Option<&str> {
        match self.page.preview.src.as_ref()? {
            PreviewSource::Stream(id) => Some(id.as_str()),
            PreviewSource::ObjectUrl(url) => self.resolve_object_url(url),
        }
    }

    /// Move the newest frame of the active stream into the preview
    pub(crate) fn pump_frames(&mut self) {
        let bound = self.bound_stream_id().map(str::to_string);
        let Some(stream) = self.media_stream.as_mut() else {
            return;
        };
        if bound.as_deref() != Some(stream.id()) {
            return;
        }
        if let Some(frame) = stream.latest_frame() {
            self.page.preview.frame = Some(frame);
        }
    }

    /// Report a rejected stream request
    pub(crate) fn handle_stream_error(&mut self, err: &BackendError) {
        error!(error = %err, name = err.name(), "Camera access failed");

        let name = err.name();
        let message = if name.contains("NotFoundError") {
            messages::WEBCAM_NOT_FOUND.to_string()
        } else {
            messages::access_failure(name)
        };
        self.page.append_error(&message);
    }

    // =========================================================================
    // Hotplug
    // =========================================================================

    fn start_listening_for_device_changes(&mut self) {
        if self.device_changes.is_none() {
            self.device_changes = self.manager.watch_device_changes();
            if self.device_changes.is_none() {
                debug!("Backend does not report device changes");
            }
        }
        self.listening_for_device_changes = true;
    }

    /// Drain pending notifications; true when one arrived while listening
    pub(crate) fn poll_device_changes(&mut self) -> bool {
        let Some(receiver) = self.device_changes.as_mut() else {
            return false;
        };

        let mut changed = false;
        let mut closed = false;
        loop {
            match receiver.try_next() {
                Ok(Some(())) => changed = true,
                Ok(None) => {
                    closed = true;
                    break;
                }
                Err(_) => break,
            }
        }

        if closed {
            warn!("Device change channel closed");
            self.device_changes = None;
        }
        changed && self.listening_for_device_changes
    }

    /// Rebuild the camera list after a hotplug event
    pub(crate) fn device_changed(&mut self) {
        info!("Camera list changed, re-enumerating");
        self.listening_for_device_changes = false;
        self.webcam_list.clear();
        self.enumerate_and_load();
    }
}
