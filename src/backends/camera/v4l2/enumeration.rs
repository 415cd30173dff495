// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 device discovery
//!
//! Scans `/dev/video*` and keeps the nodes that can capture video. UVC
//! cameras usually expose a second metadata node per camera; those are
//! skipped because they never deliver frames.

use crate::backends::camera::types::{DeviceKind, MediaDeviceInfo};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use v4l::capability::Flags;
use v4l::prelude::*;

/// List all `/dev/video*` nodes, sorted by their numeric suffix
pub fn list_video_nodes(dev_dir: &Path) -> Vec<PathBuf> {
    let mut nodes: Vec<(u32, PathBuf)> = std::fs::read_dir(dev_dir)
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let index = name.to_str()?.strip_prefix("video")?.parse::<u32>().ok()?;
            Some((index, entry.path()))
        })
        .collect();

    nodes.sort_by_key(|(index, _)| *index);
    nodes.into_iter().map(|(_, path)| path).collect()
}

/// Snapshot of the current node set, used to detect hotplug
pub fn video_node_set(dev_dir: &Path) -> BTreeSet<PathBuf> {
    list_video_nodes(dev_dir).into_iter().collect()
}

/// Enumerate capture-capable V4L2 devices
pub fn enumerate_v4l2_cameras(dev_dir: &Path) -> Vec<MediaDeviceInfo> {
    let mut cameras = Vec::new();

    for path in list_video_nodes(dev_dir) {
        let dev = match Device::with_path(&path) {
            Ok(dev) => dev,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping unopenable video node");
                continue;
            }
        };

        let caps = match dev.query_caps() {
            Ok(caps) => caps,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping node without capabilities");
                continue;
            }
        };

        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            debug!(path = %path.display(), card = %caps.card, "Skipping non-capture node");
            continue;
        }

        let device_id = path.to_string_lossy().to_string();
        debug!(device_id = %device_id, card = %caps.card, driver = %caps.driver, "Found camera");

        cameras.push(MediaDeviceInfo {
            device_id,
            kind: DeviceKind::VideoInput,
            label: caps.card.clone(),
            driver: Some(caps.driver.clone()),
        });
    }

    cameras
}
