// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the page controller, driven through the virtual backend

use selfie_cam::app::{ElementId, Message, PageController, PreviewSource};
use selfie_cam::backends::camera::{
    BackendError, CameraBackendManager, DeviceKind, HostCapabilities, StreamConstraints,
};
use selfie_cam::backends::virtual_camera::{VirtualBackend, VirtualDevice};
use selfie_cam::config::Config;
use selfie_cam::pipelines::photo::{ExportMethod, PhotoEncoder, PhotoExporter};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Harness {
    backend: VirtualBackend,
    page: PageController,
    dir: TempDir,
}

impl Harness {
    fn new(backend: VirtualBackend) -> Self {
        Self::with_config(backend, small_config())
    }

    fn with_config(backend: VirtualBackend, config: Config) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let exporter = PhotoExporter::new(
            PhotoEncoder::new(config.jpeg_quality),
            dir.path().join("downloads"),
            dir.path().join("staging"),
            config.photo_filename.clone(),
        );
        let manager = CameraBackendManager::with_backend(Box::new(backend.clone()));
        let page = PageController::new(manager, config).with_exporter(exporter);
        Self { backend, page, dir }
    }

    fn init(mut self) -> Self {
        self.page.update(Message::Init);
        self
    }

    fn downloads(&self) -> PathBuf {
        self.dir.path().join("downloads")
    }

    fn staging(&self) -> PathBuf {
        self.dir.path().join("staging")
    }
}

/// Small frames keep the tests fast
fn small_config() -> Config {
    Config {
        target_width: 64,
        target_height: 48,
        ..Config::default()
    }
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

// ===== Bootstrap =====

#[test]
fn test_no_cameras_shows_not_found() {
    let h = Harness::new(VirtualBackend::new(Vec::new())).init();

    assert!(h.page.page().switch_button.disabled);
    assert_eq!(h.page.page().errors, vec!["ERROR: Webcam not found."]);
    assert!(!h.page.has_stream());
    assert!(h.backend.requested_constraints().is_empty());
}

#[test]
fn test_audio_devices_are_not_cameras() {
    let backend = VirtualBackend::new(vec![
        VirtualDevice::audio("mic", DeviceKind::AudioInput),
        VirtualDevice::audio("speaker", DeviceKind::AudioOutput),
    ]);
    let h = Harness::new(backend).init();

    assert!(h.page.webcam_list().is_empty());
    assert_eq!(h.page.page().errors, vec!["ERROR: Webcam not found."]);
}

#[test]
fn test_first_camera_requested_at_target_resolution() {
    let h = Harness::with_config(VirtualBackend::with_test_patterns(3), Config::default()).init();

    assert_eq!(h.page.current_cam(), Some(0));
    assert_eq!(h.page.active_device_id(), Some("virtual:0"));
    assert_eq!(
        h.backend.requested_constraints(),
        vec![StreamConstraints::exact_device("virtual:0", 1280, 720)]
    );
    assert!(!h.page.page().switch_button.disabled);
    assert!(h.page.page().errors.is_empty());
}

#[test]
fn test_single_camera_keeps_switch_disabled() {
    let h = Harness::new(VirtualBackend::with_test_patterns(1)).init();

    assert!(h.page.has_stream());
    assert!(h.page.page().switch_button.disabled);
}

#[test]
fn test_clicks_before_init_do_nothing() {
    let mut h = Harness::new(VirtualBackend::with_test_patterns(2));

    h.page.click(ElementId::Preview);
    h.page.click(ElementId::SwitchButton);
    h.page.click(ElementId::VideoFilterTrigger);

    assert!(h.backend.requested_constraints().is_empty());
    assert_eq!(
        h.page.page().preview.classes.as_attribute(),
        "view--video__video"
    );
}

#[test]
fn test_without_enumeration_requests_any_camera() {
    let backend = VirtualBackend::with_test_patterns(2);
    backend.set_capabilities(HostCapabilities {
        device_enumeration: false,
        ..HostCapabilities::default()
    });
    let h = Harness::new(backend).init();

    assert_eq!(
        h.page.page().tooltip.as_deref(),
        Some("Unable to switch webcams. Device enumeration is not supported by this camera backend.")
    );
    assert_eq!(
        h.backend.requested_constraints(),
        vec![StreamConstraints::any_camera()]
    );
    assert!(h.page.has_stream());
    assert!(h.page.page().switch_button.disabled);
}

#[test]
fn test_without_stream_access_reports_unsupported() {
    let backend = VirtualBackend::with_test_patterns(2);
    backend.set_capabilities(HostCapabilities {
        stream_access: false,
        device_enumeration: false,
        ..HostCapabilities::default()
    });
    let h = Harness::new(backend).init();

    assert_eq!(
        h.page.page().errors,
        vec!["ERROR: This camera backend does not support the media capture API"]
    );
    assert!(h.backend.requested_constraints().is_empty());
}

// ===== Rotation =====

#[test]
fn test_rotation_wraps_to_first_camera() {
    let mut h = Harness::new(VirtualBackend::with_test_patterns(3)).init();

    h.page.click(ElementId::SwitchButton);
    assert_eq!(h.page.active_device_id(), Some("virtual:1"));
    h.page.click(ElementId::SwitchButton);
    assert_eq!(h.page.active_device_id(), Some("virtual:2"));
    h.page.click(ElementId::SwitchButton);
    assert_eq!(h.page.active_device_id(), Some("virtual:0"));
    assert_eq!(h.page.current_cam(), Some(0));

    // Every replaced stream had its track stopped
    let streams = h.backend.opened_streams();
    assert_eq!(streams.len(), 4);
    assert!(streams[..3].iter().all(|s| s.is_stopped()));
    assert_eq!(h.backend.live_stream_count(), 1);
}

#[test]
fn test_rotation_unbinds_previous_stream() {
    let mut h = Harness::new(VirtualBackend::with_test_patterns(2)).init();
    let first = h.backend.opened_streams()[0].stream_id.clone();

    h.page.click(ElementId::SwitchButton);

    let second = h.backend.opened_streams()[1].stream_id.clone();
    assert_eq!(
        h.page.page().preview.src,
        Some(PreviewSource::Stream(second))
    );
    assert_ne!(
        h.page.page().preview.src,
        Some(PreviewSource::Stream(first))
    );
}

#[test]
fn test_rejected_request_shows_error_name() {
    let backend = VirtualBackend::with_test_patterns(2);
    backend.fail_next_open(BackendError::PermissionDenied("/dev/video0".into()));
    let h = Harness::new(backend).init();

    assert_eq!(
        h.page.page().errors,
        vec![
            "ERROR: The following error occurred: \"NotAllowedError\" Please check your webcam and try again."
        ]
    );
    assert!(!h.page.has_stream());
}

#[test]
fn test_missing_device_shows_not_found() {
    let backend = VirtualBackend::with_test_patterns(2);
    backend.fail_next_open(BackendError::DeviceNotFound("virtual:0".into()));
    let h = Harness::new(backend).init();

    assert_eq!(h.page.page().errors, vec!["ERROR: Webcam not found."]);
}

#[test]
fn test_failed_rotation_reenables_switch() {
    let mut h = Harness::new(VirtualBackend::with_test_patterns(2)).init();
    h.backend
        .fail_next_open(BackendError::NotReadable("busy".into()));

    h.page.click(ElementId::SwitchButton);

    assert!(!h.page.has_stream());
    assert_eq!(h.page.current_cam(), Some(1));
    assert!(!h.page.page().switch_button.disabled);
    assert_eq!(h.page.page().errors.len(), 1);

    // Next rotation recovers
    h.page.click(ElementId::SwitchButton);
    assert_eq!(h.page.active_device_id(), Some("virtual:0"));
}

#[test]
fn test_object_url_binding() {
    let backend = VirtualBackend::with_test_patterns(1);
    backend.set_capabilities(HostCapabilities {
        direct_binding: false,
        ..HostCapabilities::default()
    });
    let mut h = Harness::new(backend).init();

    let Some(PreviewSource::ObjectUrl(url)) = h.page.page().preview.src.clone() else {
        panic!("preview should be bound through an object URL");
    };
    assert!(url.starts_with("blob:selfie-cam/"));
    assert_eq!(
        h.page.resolve_object_url(&url),
        Some(h.backend.opened_streams()[0].stream_id.as_str())
    );

    h.page.update(Message::Tick);
    assert_eq!(h.page.page().preview.video_dimensions(), Some((64, 48)));
}

// ===== Hotplug =====

#[test]
fn test_hotplug_reenumerates_and_advances() {
    let mut h = Harness::new(VirtualBackend::with_test_patterns(2)).init();
    assert!(h.page.is_listening_for_device_changes());

    h.backend
        .plug(VirtualDevice::camera("virtual:usb", "USB Camera", 3));
    h.page.update(Message::Tick);

    assert_eq!(h.page.webcam_list().len(), 3);
    assert_eq!(h.page.current_cam(), Some(1));
    assert_eq!(h.page.active_device_id(), Some("virtual:1"));
    assert!(h.page.is_listening_for_device_changes());
    assert_eq!(h.backend.live_stream_count(), 1);
}

#[test]
fn test_unplugging_every_camera_reports_not_found() {
    let mut h = Harness::new(VirtualBackend::with_test_patterns(1)).init();

    h.backend.unplug("virtual:0");
    h.page.update(Message::Tick);

    assert!(h.page.webcam_list().is_empty());
    assert_eq!(h.page.page().errors, vec!["ERROR: Webcam not found."]);
}

// ===== Capture and save =====

#[test]
fn test_capture_requires_stream() {
    let mut h = Harness::new(VirtualBackend::new(Vec::new())).init();

    h.page.click(ElementId::Preview);

    assert!(!h.page.photo_ready());
    assert!(!h.page.is_armed(ElementId::Canvas));
}

#[test]
fn test_canvas_click_before_capture_does_nothing() {
    let mut h = Harness::new(VirtualBackend::with_test_patterns(1)).init();

    h.page.click(ElementId::Canvas);

    assert!(h.page.last_saved().is_none());
    assert!(files_in(&h.downloads()).is_empty());
}

#[test]
fn test_capture_then_save() {
    let mut h = Harness::new(VirtualBackend::with_test_patterns(1)).init();
    h.page.update(Message::Tick);

    h.page.click(ElementId::Preview);
    assert!(h.page.photo_ready());
    assert!(h.page.is_armed(ElementId::Canvas));
    assert_eq!(h.page.page().status, "Click or tap below to save as .jpg");
    assert_eq!(
        (h.page.page().canvas.width(), h.page.page().canvas.height()),
        (64, 48)
    );

    h.page.click(ElementId::Canvas);
    assert!(!h.page.photo_ready());
    assert!(!h.page.is_armed(ElementId::Canvas));
    assert!(h.page.page().status.is_empty());
    assert_eq!(files_in(&h.downloads()), vec!["mySelfie.jpg"]);

    // Second click has nothing to save
    h.page.click(ElementId::Canvas);
    assert_eq!(files_in(&h.downloads()), vec!["mySelfie.jpg"]);
}

#[test]
fn test_capture_without_frame_keeps_pending_photo() {
    let backend = VirtualBackend::with_test_patterns(2);
    let mut h = Harness::new(backend.clone()).init();
    h.page.update(Message::Tick);
    h.page.click(ElementId::Preview);
    assert!(h.page.photo_ready());

    // New camera whose track dies before delivering anything
    h.page.click(ElementId::SwitchButton);
    let streams = backend.opened_streams();
    streams.last().unwrap().end_track();

    h.page.click(ElementId::Preview);
    assert!(h.page.photo_ready());
    assert!(h.page.is_armed(ElementId::Canvas));

    h.page.click(ElementId::Canvas);
    assert_eq!(files_in(&h.downloads()), vec!["mySelfie.jpg"]);
}

#[test]
fn test_repeated_saves_are_numbered() {
    let mut h = Harness::new(VirtualBackend::with_test_patterns(1)).init();

    for _ in 0..2 {
        h.page.update(Message::Tick);
        h.page.click(ElementId::Preview);
        h.page.click(ElementId::Canvas);
    }

    assert_eq!(
        files_in(&h.downloads()),
        vec!["mySelfie (1).jpg", "mySelfie.jpg"]
    );
    assert!(h.page.page().errors.is_empty());
}

#[test]
fn test_anchor_download_moves_staged_file() {
    let config = Config {
        export_method: ExportMethod::AnchorDownload,
        ..small_config()
    };
    let mut h = Harness::with_config(VirtualBackend::with_test_patterns(1), config).init();

    h.page.update(Message::Tick);
    h.page.click(ElementId::Preview);
    h.page.click(ElementId::Canvas);

    assert_eq!(files_in(&h.downloads()), vec!["mySelfie.jpg"]);
    assert!(files_in(&h.staging()).is_empty());
    assert!(h.page.page().save_link.href.is_none());
}

#[test]
fn test_export_ignores_display_filter() {
    let mut h = Harness::new(VirtualBackend::with_test_patterns(1)).init();
    h.page.update(Message::Tick);
    h.page.click(ElementId::Preview);

    // grayscale, sepia, blur, invert
    for _ in 0..4 {
        h.page.click(ElementId::ImageFilterTrigger);
    }
    assert_eq!(
        h.page.page().canvas.classes.as_attribute(),
        "view--snapshot__canvas invert"
    );

    h.page.click(ElementId::Canvas);

    let saved = image::open(h.downloads().join("mySelfie.jpg"))
        .unwrap()
        .to_rgb8();
    // First bar of the test pattern is 75% gray; inverted it would be ~64
    let [r, g, b] = saved.get_pixel(2, 20).0;
    for channel in [r, g, b] {
        assert!((181..=201).contains(&channel), "channel {}", channel);
    }
}

#[test]
fn test_failed_save_is_reported() {
    let mut h = Harness::new(VirtualBackend::with_test_patterns(1)).init();
    // A file where the download directory should be
    std::fs::write(h.downloads(), b"not a directory").unwrap();

    h.page.update(Message::Tick);
    h.page.click(ElementId::Preview);
    h.page.click(ElementId::Canvas);

    let errors = &h.page.page().errors;
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("ERROR: Unable to save photo: "));
    assert!(!h.page.photo_ready());
}

// ===== Filters =====

#[test]
fn test_video_filter_cycle_returns_to_start() {
    let mut h = Harness::new(VirtualBackend::with_test_patterns(1)).init();
    let start = h.page.page().preview.classes.as_attribute();

    h.page.click(ElementId::VideoFilterTrigger);
    assert_eq!(
        h.page.page().preview.classes.as_attribute(),
        "view--video__video grayscale"
    );

    for _ in 1..7 {
        h.page.click(ElementId::VideoFilterTrigger);
    }
    assert_eq!(h.page.page().preview.classes.as_attribute(), start);
    assert_eq!(h.page.filter_index(), 7);
}

#[test]
fn test_shared_filter_counter() {
    let mut h = Harness::new(VirtualBackend::with_test_patterns(1)).init();

    h.page.click(ElementId::VideoFilterTrigger);
    h.page.click(ElementId::ImageFilterTrigger);

    assert_eq!(
        h.page.page().canvas.classes.as_attribute(),
        "view--snapshot__canvas sepia"
    );
}

#[test]
fn test_independent_filter_counters() {
    let config = Config {
        shared_filter_cycle: false,
        ..small_config()
    };
    let mut h = Harness::with_config(VirtualBackend::with_test_patterns(1), config).init();

    h.page.click(ElementId::VideoFilterTrigger);
    h.page.click(ElementId::ImageFilterTrigger);

    assert_eq!(
        h.page.page().canvas.classes.as_attribute(),
        "view--snapshot__canvas grayscale"
    );
}
