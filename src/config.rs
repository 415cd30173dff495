// SPDX-License-Identifier: GPL-3.0-only

//! Persistent settings, stored as JSON under the user's config directory

use crate::backends::camera::{BackendOptions, CameraBackendType};
use crate::constants::{
    APP_DIR_NAME, DEFAULT_PHOTO_FILENAME, DEVICE_POLL_INTERVAL_MS, TARGET_HEIGHT, TARGET_WIDTH,
};
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::{EncodingQuality, ExportMethod};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera backend to use (V4L2 or virtual)
    pub backend: CameraBackendType,
    /// Resolution requested when switching cameras
    pub target_width: u32,
    pub target_height: u32,
    /// Where exported photos land (None = downloads directory)
    pub save_directory: Option<PathBuf>,
    /// Download name offered for exported photos
    pub photo_filename: String,
    pub jpeg_quality: EncodingQuality,
    pub export_method: ExportMethod,
    /// Video and image filter triggers advance one shared counter
    pub shared_filter_cycle: bool,
    /// Hotplug rescan interval for the V4L2 backend
    pub device_poll_interval_ms: u64,
    /// Synthetic cameras offered by the virtual backend
    pub virtual_device_count: usize,
    /// Still images the virtual backend offers as additional cameras
    pub virtual_image_sources: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: CameraBackendType::default(),
            target_width: TARGET_WIDTH,
            target_height: TARGET_HEIGHT,
            save_directory: None,
            photo_filename: DEFAULT_PHOTO_FILENAME.to_string(),
            jpeg_quality: EncodingQuality::default(),
            export_method: ExportMethod::default(),
            shared_filter_cycle: true,
            device_poll_interval_ms: DEVICE_POLL_INTERVAL_MS,
            virtual_device_count: 2,
            virtual_image_sources: Vec::new(),
        }
    }
}

impl Config {
    /// Default location: `<config_dir>/selfie-cam/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load settings from `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), backend = %config.backend, "Loaded config");
        Ok(config)
    }

    /// Load from the default location, or defaults when there is none
    pub fn load_default() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Write settings as pretty-printed JSON, creating parent directories
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Backend construction options derived from these settings
    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            device_poll_interval: Duration::from_millis(self.device_poll_interval_ms.max(1)),
            virtual_device_count: self.virtual_device_count,
            virtual_image_sources: self.virtual_image_sources.clone(),
        }
    }

    /// Effective save directory
    pub fn resolved_save_directory(&self) -> PathBuf {
        self.save_directory
            .clone()
            .unwrap_or_else(crate::storage::default_save_directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str(r#"{"backend":"Virtual"}"#).unwrap();
        assert_eq!(config.backend, CameraBackendType::Virtual);
        assert_eq!(config.target_width, 1280);
        assert_eq!(config.photo_filename, "mySelfie.jpg");
        assert!(config.shared_filter_cycle);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(&path), Err(AppError::Config(_))));
    }
}
