// SPDX-License-Identifier: GPL-3.0-only

//! Selfie Cam - a webcam photo booth
//!
//! Live preview, rotation through the connected cameras, display filters,
//! and capture of a still that can be saved as JPEG.
//!
//! # Architecture
//!
//! - [`app`]: Page controller, page elements and display filters
//! - [`backends`]: Camera backend abstraction (V4L2 and virtual cameras)
//! - [`pipelines`]: JPEG encoding and photo export
//! - [`config`]: User configuration handling
//! - [`storage`]: Save locations and download naming
//! - [`terminal`]: Interactive terminal front end
//!
//! # Example
//!
//! ```no_run
//! use selfie_cam::app::{ElementId, Message, PageController};
//! use selfie_cam::backends::camera::{CameraBackendManager, CameraBackendType};
//! use selfie_cam::config::Config;
//!
//! let config = Config::default();
//! let manager = CameraBackendManager::new(CameraBackendType::Virtual, config.backend_options());
//! let mut page = PageController::new(manager, config);
//! page.update(Message::Init);
//! page.update(Message::Tick);
//! page.click(ElementId::Preview);
//! page.click(ElementId::Canvas);
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{ElementId, FilterType, Message, PageController};
pub use config::Config;
