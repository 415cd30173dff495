// SPDX-License-Identifier: GPL-3.0-only

//! Photo pipeline
//!
//! ```text
//! Canvas (RGBA) → Encoding (JPEG) → Export (blob save | anchor download) → Disk
//! ```
//!
//! Display filters never reach this pipeline; exports carry the raw frame.

pub mod encoding;
pub mod export;

pub use encoding::{EncodingQuality, PhotoEncoder};
pub use export::{ExportMethod, PhotoExporter, SaveLink};
