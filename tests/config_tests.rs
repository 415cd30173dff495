// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use selfie_cam::Config;
use selfie_cam::backends::camera::{CameraBackendManager, CameraBackendType};
use selfie_cam::pipelines::photo::{EncodingQuality, ExportMethod};
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.backend, CameraBackendType::V4l2);
    assert_eq!((config.target_width, config.target_height), (1280, 720));
    assert_eq!(config.photo_filename, "mySelfie.jpg");
    assert_eq!(config.jpeg_quality, EncodingQuality::High);
    assert_eq!(config.export_method, ExportMethod::Auto);
    assert!(
        config.shared_filter_cycle,
        "Filter triggers should share one counter by default"
    );
    assert!(config.save_directory.is_none());
    assert!(config.virtual_image_sources.is_empty());
}

#[test]
fn test_config_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        backend: CameraBackendType::Virtual,
        save_directory: Some(dir.path().join("photos")),
        photo_filename: "booth.jpg".to_string(),
        jpeg_quality: EncodingQuality::Maximum,
        export_method: ExportMethod::AnchorDownload,
        shared_filter_cycle: false,
        virtual_device_count: 4,
        virtual_image_sources: vec![dir.path().join("still.png")],
        ..Config::default()
    };
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_backend_options_from_config() {
    let config = Config {
        device_poll_interval_ms: 250,
        virtual_device_count: 3,
        ..Config::default()
    };
    let options = config.backend_options();

    assert_eq!(options.device_poll_interval, Duration::from_millis(250));
    assert_eq!(options.virtual_device_count, 3);
}

#[test]
fn test_virtual_image_sources_reach_backend() {
    let dir = tempfile::tempdir().unwrap();
    let still = dir.path().join("portrait.jpg");
    image::RgbImage::from_pixel(8, 8, image::Rgb([200, 180, 160]))
        .save(&still)
        .unwrap();

    let config = Config {
        backend: CameraBackendType::Virtual,
        virtual_device_count: 0,
        virtual_image_sources: vec![still],
        ..Config::default()
    };
    let manager = CameraBackendManager::new(config.backend, config.backend_options());

    let devices = manager.enumerate_devices().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].device_id, "virtual:image:0");
    assert_eq!(devices[0].label, "portrait.jpg");
}

#[test]
fn test_configured_save_directory_wins() {
    let config = Config {
        save_directory: Some("/srv/booth".into()),
        ..Config::default()
    };
    assert_eq!(
        config.resolved_save_directory(),
        std::path::PathBuf::from("/srv/booth")
    );
}
