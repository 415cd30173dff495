// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 capture stream
//!
//! The device is opened and its format negotiated on the caller's thread so
//! that open failures surface as a rejected stream request. Buffer
//! streaming then moves to a dedicated thread which decodes every buffer to
//! RGBA and hands it to the controller over a bounded channel.

use super::format_converters::{CaptureFormat, decode_to_rgba};
use crate::backends::camera::types::*;
use crate::backends::camera::{MediaStream, drain_latest};
use crate::constants::timing::DEQUEUE_TIMEOUT;
use crate::constants::{CAPTURE_BUFFER_COUNT, FRAME_CHANNEL_CAPACITY};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, error, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::{CaptureStream, Stream as _};
use v4l::prelude::*;
use v4l::video::Capture;

/// A live V4L2 stream with one video track
pub struct V4l2Stream {
    id: String,
    device_id: String,
    running: Arc<AtomicBool>,
    ended: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
    receiver: FrameReceiver,
}

impl V4l2Stream {
    /// Open a device and start streaming
    pub fn open(device_path: &str, constraints: &StreamConstraints) -> BackendResult<Self> {
        let dev = Device::with_path(device_path)
            .map_err(|e| BackendError::from_io(&format!("Failed to open {}", device_path), &e))?;

        let layout = negotiate_format(&dev, constraints)?;

        info!(
            device_path,
            width = layout.width,
            height = layout.height,
            stride = layout.stride,
            format = ?layout.format,
            "Negotiated V4L2 capture format"
        );

        let running = Arc::new(AtomicBool::new(true));
        let ended = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = futures::channel::mpsc::channel(FRAME_CHANNEL_CAPACITY);

        let thread_running = Arc::clone(&running);
        let thread_ended = Arc::clone(&ended);
        let thread_path = device_path.to_string();
        let thread_handle = std::thread::Builder::new()
            .name("v4l2-capture".to_string())
            .spawn(move || {
                if let Err(e) = capture_loop(dev, layout, sender, &thread_running) {
                    error!(device_path = %thread_path, error = %e, "Capture loop failed");
                }
                thread_ended.store(true, Ordering::SeqCst);
            })
            .map_err(|e| BackendError::Other(format!("Failed to spawn capture thread: {}", e)))?;

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            device_id: device_path.to_string(),
            running,
            ended,
            thread_handle: Some(thread_handle),
            receiver,
        })
    }
}

impl MediaStream for V4l2Stream {
    fn id(&self) -> &str {
        &self.id
    }

    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn stop_video_track(&mut self) {
        if self.thread_handle.is_none() {
            return;
        }

        info!(stream = %self.id, device = %self.device_id, "Stopping video track");
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.take() {
            match handle.join() {
                Ok(_) => debug!("Capture thread stopped"),
                Err(_) => warn!("Capture thread panicked"),
            }
        }
        self.ended.store(true, Ordering::SeqCst);
    }

    fn track_state(&self) -> TrackState {
        if self.ended.load(Ordering::SeqCst) {
            TrackState::Ended
        } else {
            TrackState::Live
        }
    }

    fn latest_frame(&mut self) -> Option<CameraFrame> {
        drain_latest(&mut self.receiver)
    }
}

impl Drop for V4l2Stream {
    fn drop(&mut self) {
        // Don't wait for the thread here, it exits within one dequeue timeout
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Negotiated buffer layout
#[derive(Debug, Clone, Copy)]
struct BufferLayout {
    format: CaptureFormat,
    width: u32,
    height: u32,
    /// Bytes per line as reported by the driver
    stride: u32,
}

impl BufferLayout {
    fn from_format(format: CaptureFormat, applied: &v4l::Format) -> Self {
        Self {
            format,
            width: applied.width,
            height: applied.height,
            stride: applied.stride,
        }
    }
}

/// Pick a decodable format as close as possible to the requested size
fn negotiate_format(dev: &Device, constraints: &StreamConstraints) -> BackendResult<BufferLayout> {
    let current = dev
        .format()
        .map_err(|e| BackendError::from_io("Failed to query format", &e))?;

    let width = constraints.width.unwrap_or(current.width);
    let height = constraints.height.unwrap_or(current.height);

    for candidate in CaptureFormat::PREFERRED {
        let requested = v4l::Format::new(width, height, candidate.fourcc());
        match dev.set_format(&requested) {
            Ok(applied) => {
                if let Some(format) = CaptureFormat::from_fourcc(&applied.fourcc) {
                    return Ok(BufferLayout::from_format(format, &applied));
                }
                debug!(?candidate, got = ?applied.fourcc, "Device substituted an unsupported format");
            }
            Err(e) => debug!(?candidate, error = %e, "Format rejected"),
        }
    }

    // Keep whatever the device is already configured for, if we can decode it
    CaptureFormat::from_fourcc(&current.fourcc)
        .map(|format| BufferLayout::from_format(format, &current))
        .ok_or_else(|| {
            BackendError::FormatNotSupported(format!(
                "No decodable pixel format (device uses {})",
                current.fourcc
            ))
        })
}

/// Main capture loop running in a separate thread
fn capture_loop(
    mut dev: Device,
    layout: BufferLayout,
    mut frame_sender: FrameSender,
    running: &AtomicBool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

    let mut stream = MmapStream::with_buffers(&mut dev, Type::VideoCapture, CAPTURE_BUFFER_COUNT)
        .map_err(|e| format!("Failed to create buffer stream: {}", e))?;
    // Bound every dequeue so a device that never fills a buffer can still be stopped
    stream.set_timeout(DEQUEUE_TIMEOUT);

    let mut sequence = 0u64;
    while running.load(Ordering::SeqCst) {
        let decoded = match stream.next() {
            Ok((buf, _meta)) => {
                decode_to_rgba(layout.format, buf, layout.width, layout.height, layout.stride)
            }
            Err(e) if is_dequeue_timeout(&e) => {
                debug!(timeout_ms = DEQUEUE_TIMEOUT.as_millis() as u64, "No buffer within timeout");
                // After a timed out dequeue every buffer is still queued, and
                // re-entering next() would queue one twice. STREAMOFF hands
                // them all back so the next call restarts cleanly.
                stream
                    .stop()
                    .map_err(|e| format!("Failed to restart stream: {}", e))?;
                continue;
            }
            Err(e) => return Err(format!("Failed to dequeue buffer: {}", e).into()),
        };

        let (w, h, rgba) = match decoded {
            Ok(decoded) => decoded,
            Err(e) => {
                // MJPEG webcams occasionally hand out a truncated first frame
                debug!(error = %e, "Dropping undecodable buffer");
                continue;
            }
        };

        let frame = CameraFrame::from_rgba(w, h, rgba, sequence);
        sequence += 1;

        let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
        match frame_sender.try_send(frame) {
            Ok(()) => {
                if frame_num % 60 == 0 {
                    debug!(frame = frame_num, width = w, height = h, "Captured frame");
                }
            }
            Err(e) if e.is_disconnected() => {
                debug!("Frame receiver dropped, ending capture");
                break;
            }
            // Consumer is behind, drop this frame
            Err(_) => {}
        }
    }

    Ok(())
}

fn is_dequeue_timeout(error: &std::io::Error) -> bool {
    error.kind() == std::io::ErrorKind::TimedOut
}
