// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic test pattern frames

use crate::backends::camera::types::CameraFrame;

/// Classic 75% color bars
const COLOR_BARS: [[u8; 3]; 7] = [
    [191, 191, 191],
    [191, 191, 0],
    [0, 191, 191],
    [0, 191, 0],
    [191, 0, 191],
    [191, 0, 0],
    [0, 0, 191],
];

/// Test pattern parameters for one synthetic camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestPattern {
    /// Rotates the bar order so every camera looks different
    pub bar_offset: usize,
}

impl TestPattern {
    pub fn new(bar_offset: usize) -> Self {
        Self { bar_offset }
    }

    /// Render frame number `sequence`
    ///
    /// Color bars with a white marker line sweeping down one row per frame,
    /// so a frozen preview is easy to spot.
    pub fn render(&self, width: u32, height: u32, sequence: u64) -> CameraFrame {
        let w = width.max(1) as usize;
        let h = height.max(1) as usize;
        let marker_row = (sequence as usize) % h;
        let mut data = Vec::with_capacity(w * h * 4);

        for y in 0..h {
            for x in 0..w {
                let rgb = if y == marker_row {
                    [255, 255, 255]
                } else {
                    let bar = (x * COLOR_BARS.len() / w + self.bar_offset) % COLOR_BARS.len();
                    COLOR_BARS[bar]
                };
                data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
            }
        }

        CameraFrame::from_rgba(w as u32, h as u32, data, sequence)
    }
}
