// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Listing available cameras
//! - Taking a photo without the interactive page

use chrono::Local;
use selfie_cam::backends::camera::{
    CameraBackendManager, CameraFrame, DeviceKind, MediaDeviceInfo, MediaStream,
    StreamConstraints,
};
use selfie_cam::config::Config;
use selfie_cam::constants::timing::{SNAP_TIMEOUT, SNAP_WARMUP};
use selfie_cam::errors::{CameraError, PhotoError};
use selfie_cam::pipelines::photo::PhotoEncoder;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Sleep between polls while waiting for frames
const SNAP_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// List all available cameras
pub fn list_cameras(manager: &CameraBackendManager) -> Result<(), Box<dyn std::error::Error>> {
    let cameras = video_inputs(manager)?;

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", manager.backend_type());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.label);
        println!("      Device: {}", camera.device_id);
        if let Some(driver) = &camera.driver {
            println!("      Driver: {}", driver);
        }
        println!();
    }

    Ok(())
}

/// Take a photo with the specified camera
pub fn snap(
    manager: &CameraBackendManager,
    config: &Config,
    camera_index: usize,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let cameras = video_inputs(manager)?;
    if cameras.is_empty() {
        return Err(CameraError::NoCameraFound.into());
    }

    if camera_index >= cameras.len() {
        return Err(format!(
            "Camera index {} out of range (0-{})",
            camera_index,
            cameras.len() - 1
        )
        .into());
    }

    let camera = &cameras[camera_index];
    println!("Using camera: {}", camera.label);

    let constraints = StreamConstraints::exact_device(
        camera.device_id.clone(),
        config.target_width,
        config.target_height,
    );
    let mut stream = manager.open_stream(&constraints).map_err(CameraError::from)?;

    // Wait for frames to stabilize (camera warm-up)
    println!("Capturing...");
    let frame = wait_for_frame(stream.as_mut(), SNAP_WARMUP, SNAP_TIMEOUT, SNAP_POLL_INTERVAL);
    stream.stop_video_track();

    let frame = frame.ok_or(CameraError::NoFrame)?;
    let image = frame
        .to_rgba_image()
        .ok_or_else(|| PhotoError::EncodingFailed("malformed frame".to_string()))?;
    let data = PhotoEncoder::new(config.jpeg_quality).encode_jpeg(&image)?;

    let output_path = resolve_output(output, config)?;
    std::fs::write(&output_path, data).map_err(PhotoError::from)?;

    info!(path = %output_path.display(), width = frame.width, height = frame.height, "Snapshot saved");
    println!("Photo saved: {}", output_path.display());
    Ok(())
}

/// Poll `stream` until the warm-up has passed, keeping the newest frame
///
/// Sleeps `poll` between pulls whether or not a frame arrived, so sources
/// that always have a frame ready are not spun on.
fn wait_for_frame(
    stream: &mut dyn MediaStream,
    warmup: Duration,
    timeout: Duration,
    poll: Duration,
) -> Option<CameraFrame> {
    let start = Instant::now();
    let mut frame = None;

    while start.elapsed() < timeout {
        if let Some(f) = stream.latest_frame() {
            frame = Some(f);
            // After warmup period, use the next good frame
            if start.elapsed() > warmup {
                break;
            }
        }
        std::thread::sleep(poll);
    }

    frame
}

fn video_inputs(
    manager: &CameraBackendManager,
) -> Result<Vec<MediaDeviceInfo>, Box<dyn std::error::Error>> {
    let devices = manager.enumerate_devices().map_err(CameraError::from)?;
    Ok(devices
        .into_iter()
        .filter(|d| d.kind == DeviceKind::VideoInput)
        .collect())
}

/// A directory gets a timestamped name; anything else is used as given
fn resolve_output(
    output: Option<PathBuf>,
    config: &Config,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let timestamped = || format!("IMG_{}.jpg", Local::now().format("%Y%m%d_%H%M%S"));

    let path = match output {
        Some(path) if path.is_dir() => path.join(timestamped()),
        Some(path) => path,
        None => config.resolved_save_directory().join(timestamped()),
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(path)
}
