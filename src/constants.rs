// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Directory name used under the user's config and cache directories
pub const APP_DIR_NAME: &str = "selfie-cam";

/// Resolution requested when rotating to a camera
pub const TARGET_WIDTH: u32 = 1280;
pub const TARGET_HEIGHT: u32 = 720;

/// Download name for exported photos
pub const DEFAULT_PHOTO_FILENAME: &str = "mySelfie.jpg";

/// Size of virtual test pattern frames when the request names no size
pub const VIRTUAL_DEFAULT_WIDTH: u32 = 640;
pub const VIRTUAL_DEFAULT_HEIGHT: u32 = 480;

/// Frames queued between the capture thread and the controller
pub const FRAME_CHANNEL_CAPACITY: usize = 4;

/// Memory-mapped buffers requested from V4L2 drivers
pub const CAPTURE_BUFFER_COUNT: u32 = 4;

/// Default rescan interval for camera hotplug
pub const DEVICE_POLL_INTERVAL_MS: u64 = 1000;

/// User facing messages
pub mod messages {
    /// Prefix of every line in the error container
    pub const ERROR_PREFIX: &str = "ERROR: ";

    pub const WEBCAM_NOT_FOUND: &str = "Webcam not found.";

    pub const MEDIA_CAPTURE_UNSUPPORTED: &str =
        "This camera backend does not support the media capture API";

    pub const ENUMERATION_UNSUPPORTED: &str = "Unable to switch webcams. Device enumeration is not supported by this camera backend.";

    pub const SAVE_PROMPT: &str = "Click or tap below to save as .jpg";

    /// Message for a rejected stream request, other than "not found"
    pub fn access_failure(error_name: &str) -> String {
        format!(
            "The following error occurred: \"{}\" Please check your webcam and try again.",
            error_name
        )
    }

    /// Message for a failed photo export
    pub fn save_failure(reason: &str) -> String {
        format!("Unable to save photo: {}", reason)
    }
}

/// Base classes of the two filter targets
pub mod classes {
    /// Preview surface
    pub const VIDEO_BASE_CLASS: &str = "view--video__video";

    /// Snapshot canvas
    pub const SNAPSHOT_BASE_CLASS: &str = "view--snapshot__canvas";
}

/// Supported file formats for still image sources
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Timing constants
pub mod timing {
    use std::time::Duration;

    /// Front end event poll interval (roughly one frame at 60 Hz)
    pub const UI_POLL_INTERVAL: Duration = Duration::from_millis(16);

    /// Frames are ignored for this long after a headless snap starts (auto exposure settles)
    pub const SNAP_WARMUP: Duration = Duration::from_millis(500);

    /// Give up on a headless snap when no frame arrives within this time
    pub const SNAP_TIMEOUT: Duration = Duration::from_secs(5);

    /// Longest a V4L2 capture thread waits for one buffer before re-checking
    /// whether it was asked to stop
    pub const DEQUEUE_TIMEOUT: Duration = Duration::from_secs(1);
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
