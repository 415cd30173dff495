// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines for captured photos
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │    Canvas    │ ──▶ │  Photo Pipeline   │ ──▶ │  JPEG File   │
//! │    (RGBA)    │     │  - Encoding       │     │              │
//! │              │     │  - Export         │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: JPEG encoding and export routes

pub mod photo;
