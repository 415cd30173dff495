// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` is a dispatcher; the handlers live in the `handlers`
//! submodules, grouped by what they touch:
//!
//! - `handlers::camera`: bootstrap, enumeration, rotation, stream binding, hotplug
//! - `handlers::capture`: drawing to the canvas and exporting it
//! - `handlers::filter`: filter class cycling

use crate::app::page::ElementId;
use crate::app::state::{Message, PageController};
use tracing::debug;

impl PageController {
    /// Main message handler
    pub fn update(&mut self, message: Message) {
        match message {
            // ===== Lifecycle =====
            Message::Init => self.init(),
            Message::Tick => self.tick(),

            // ===== Input =====
            Message::Click(element) => self.handle_click(element),

            // ===== Listener targets =====
            Message::CaptureFrame => self.capture(),
            Message::SavePhoto => self.save_photo(),
            Message::NextWebcam => self.next_webcam(),
            Message::CycleVideoFilter => self.cycle_video_filter(),
            Message::CycleImageFilter => self.cycle_image_filter(),

            // ===== Host events =====
            Message::DeviceChanged => self.device_changed(),
        }
    }

    /// Convenience for front ends and tests
    pub fn click(&mut self, element: ElementId) {
        self.update(Message::Click(element));
    }

    fn handle_click(&mut self, element: ElementId) {
        if element == ElementId::SwitchButton && self.page.switch_button.disabled {
            debug!("Switch button is disabled");
            return;
        }

        match self.listeners.get(&element).cloned() {
            Some(message) => self.update(message),
            None => debug!(element = ?element, "No listener attached"),
        }
    }

    /// Pull the newest frame and pending hotplug notifications
    fn tick(&mut self) {
        self.pump_frames();

        if self.poll_device_changes() {
            self.update(Message::DeviceChanged);
        }
    }
}
