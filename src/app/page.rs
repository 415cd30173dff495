// SPDX-License-Identifier: GPL-3.0-only

//! Page elements the controller reads and writes
//!
//! Front ends render these; they never mutate them directly.

use crate::app::filters::FilterType;
use crate::backends::camera::CameraFrame;
use crate::constants::classes::{SNAPSHOT_BASE_CLASS, VIDEO_BASE_CLASS};
use crate::constants::messages::ERROR_PREFIX;
use crate::pipelines::photo::SaveLink;
use image::RgbaImage;

/// Size of a canvas nothing has been drawn to yet
const DEFAULT_CANVAS_WIDTH: u32 = 300;
const DEFAULT_CANVAS_HEIGHT: u32 = 150;

/// Elements that can receive clicks or be referenced by front ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    /// Live video preview
    Preview,
    /// Snapshot canvas
    Canvas,
    /// "Switch camera" button
    SwitchButton,
    /// Cycles the preview filter
    VideoFilterTrigger,
    /// Cycles the canvas filter
    ImageFilterTrigger,
    ErrorList,
    SaveLink,
    Status,
    Tooltip,
}

/// Class attribute of an element with a fixed base class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassList {
    base: &'static str,
    extra: Vec<String>,
}

impl ClassList {
    pub fn new(base: &'static str) -> Self {
        Self {
            base,
            extra: Vec::new(),
        }
    }

    pub fn base(&self) -> &'static str {
        self.base
    }

    /// Drop everything but the base class
    pub fn reset(&mut self) {
        self.extra.clear();
    }

    pub fn add(&mut self, class: &str) {
        if !class.is_empty() && !self.contains(class) {
            self.extra.push(class.to_string());
        }
    }

    pub fn contains(&self, class: &str) -> bool {
        self.base == class || self.extra.iter().any(|c| c == class)
    }

    /// Space separated, as it would appear in a `class` attribute
    pub fn as_attribute(&self) -> String {
        std::iter::once(self.base)
            .chain(self.extra.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Filter named by the most recently added class
    pub fn active_filter(&self) -> FilterType {
        self.extra
            .iter()
            .rev()
            .find_map(|c| FilterType::from_class_name(c))
            .unwrap_or_default()
    }
}

/// What the preview element is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewSource {
    /// Stream bound directly, by stream id
    Stream(String),
    /// Stream reached through a registered object URL
    ObjectUrl(String),
}

#[derive(Debug, Clone)]
pub struct VideoElement {
    pub src: Option<PreviewSource>,
    pub classes: ClassList,
    /// Most recent frame of the bound stream
    pub frame: Option<CameraFrame>,
}

impl VideoElement {
    fn new() -> Self {
        Self {
            src: None,
            classes: ClassList::new(VIDEO_BASE_CLASS),
            frame: None,
        }
    }

    /// Detach from the current stream
    pub fn unbind(&mut self) {
        self.src = None;
        self.frame = None;
    }

    /// Intrinsic size of the current frame
    pub fn video_dimensions(&self) -> Option<(u32, u32)> {
        self.frame.as_ref().map(CameraFrame::dimensions)
    }
}

#[derive(Debug, Clone)]
pub struct CanvasElement {
    image: RgbaImage,
    pub classes: ClassList,
}

impl CanvasElement {
    fn new() -> Self {
        Self {
            image: RgbaImage::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT),
            classes: ClassList::new(SNAPSHOT_BASE_CLASS),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Draw `frame` at its native size, resizing the canvas first if needed
    ///
    /// Returns false when the frame data is malformed.
    pub fn draw_frame(&mut self, frame: &CameraFrame) -> bool {
        let Some(pixels) = frame.to_rgba_image() else {
            return false;
        };
        if self.image.dimensions() != pixels.dimensions() {
            self.image = RgbaImage::new(pixels.width(), pixels.height());
        }
        image::imageops::replace(&mut self.image, &pixels, 0, 0);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchButton {
    pub disabled: bool,
}

/// Everything a front end shows
#[derive(Debug, Clone)]
pub struct Page {
    pub preview: VideoElement,
    pub canvas: CanvasElement,
    pub switch_button: SwitchButton,
    /// Lines of the error container, each already prefixed
    pub errors: Vec<String>,
    pub save_link: SaveLink,
    pub status: String,
    pub tooltip: Option<String>,
}

impl Page {
    pub fn new() -> Self {
        Self {
            preview: VideoElement::new(),
            canvas: CanvasElement::new(),
            switch_button: SwitchButton { disabled: true },
            errors: Vec::new(),
            save_link: SaveLink::default(),
            status: String::new(),
            tooltip: None,
        }
    }

    /// Append a line to the error container
    pub fn append_error(&mut self, message: &str) {
        self.errors.push(format!("{}{}", ERROR_PREFIX, message));
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}
