// SPDX-License-Identifier: GPL-3.0-only

//! Camera hotplug detection
//!
//! Polls the device directory and emits a notification whenever the set of
//! `/dev/video*` nodes changes.

use super::enumeration::video_node_set;
use crate::backends::camera::types::{DeviceChangeReceiver, DeviceChangeSender};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Granularity of the stop check while sleeping between scans
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Background thread watching a device directory
pub struct DeviceWatcher {
    running: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl DeviceWatcher {
    /// Start watching `dev_dir`
    pub fn spawn(
        dev_dir: PathBuf,
        poll_interval: Duration,
    ) -> std::io::Result<(Self, DeviceChangeReceiver)> {
        let (sender, receiver) = futures::channel::mpsc::channel(1);
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);

        let thread_handle = std::thread::Builder::new()
            .name("camera-hotplug".to_string())
            .spawn(move || watch_loop(dev_dir, poll_interval, sender, &thread_running))?;

        Ok((
            Self {
                running,
                thread_handle: Some(thread_handle),
            },
            receiver,
        ))
    }

    /// Stop the watcher and wait for its thread
    pub fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take()
            && handle.join().is_err()
        {
            warn!("Hotplug thread panicked");
        }
    }
}

impl Drop for DeviceWatcher {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

fn watch_loop(
    dev_dir: PathBuf,
    poll_interval: Duration,
    mut sender: DeviceChangeSender,
    running: &AtomicBool,
) {
    let mut known = video_node_set(&dev_dir);
    debug!(nodes = known.len(), "Hotplug watcher started");

    while running.load(Ordering::SeqCst) {
        let mut slept = Duration::ZERO;
        while slept < poll_interval && running.load(Ordering::SeqCst) {
            std::thread::sleep(STOP_CHECK_INTERVAL);
            slept += STOP_CHECK_INTERVAL;
        }

        let current = video_node_set(&dev_dir);
        if current == known {
            continue;
        }

        info!(
            before = known.len(),
            after = current.len(),
            "Video device set changed"
        );
        known = current;

        match sender.try_send(()) {
            // A full channel already holds an undelivered notification
            Ok(()) => {}
            Err(e) if e.is_disconnected() => break,
            Err(_) => {}
        }
    }

    debug!("Hotplug watcher stopped");
}
