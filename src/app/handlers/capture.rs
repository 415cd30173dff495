// SPDX-License-Identifier: GPL-3.0-only

//! Capture operations handlers
//!
//! A preview click draws the current frame to the canvas and arms the
//! canvas; a canvas click exports it.

use crate::app::page::ElementId;
use crate::app::state::{Message, PageController};
use crate::constants::messages;
use tracing::{debug, error, info};

impl PageController {
    pub(crate) fn capture(&mut self) {
        if self.media_stream.is_none() {
            debug!("Capture ignored, no active stream");
            return;
        }

        self.pump_frames();
        let Some(frame) = self.page.preview.frame.clone() else {
            debug!("Capture ignored, no frame received yet");
            return;
        };

        self.disarm_canvas();

        if !self.page.canvas.draw_frame(&frame) {
            error!(width = frame.width, height = frame.height, "Malformed frame, nothing drawn");
            return;
        }

        self.photo_ready = true;
        self.page.status = messages::SAVE_PROMPT.to_string();
        self.arm_canvas();
        info!(
            width = frame.width,
            height = frame.height,
            sequence = frame.sequence,
            "Frame captured to canvas"
        );
    }

    pub(crate) fn save_photo(&mut self) {
        if !self.photo_ready {
            debug!("Save ignored, nothing captured");
            return;
        }

        let method = self.config.export_method.resolve(&self.capabilities);
        match self
            .exporter
            .export(self.page.canvas.image(), method, &mut self.page.save_link)
        {
            Ok(path) => self.last_saved = Some(path),
            Err(e) => {
                error!(error = %e, "Failed to save photo");
                self.page
                    .append_error(&messages::save_failure(&e.to_string()));
            }
        }

        self.disarm_canvas();
        self.page.status.clear();
        self.photo_ready = false;
    }

    fn arm_canvas(&mut self) {
        self.listeners.insert(ElementId::Canvas, Message::SavePhoto);
    }

    fn disarm_canvas(&mut self) {
        self.listeners.remove(&ElementId::Canvas);
    }
}
