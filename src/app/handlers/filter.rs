// SPDX-License-Identifier: GPL-3.0-only

//! Filter cycling handlers

use crate::app::filters::FilterType;
use crate::app::page::ClassList;
use crate::app::state::PageController;
use tracing::debug;

impl PageController {
    pub(crate) fn cycle_video_filter(&mut self) {
        let index = self.filter_index;
        self.filter_index += 1;
        let filter = FilterType::for_counter(index);
        apply_filter_class(&mut self.page.preview.classes, filter);
        debug!(filter = %filter, index, "Preview filter");
    }

    pub(crate) fn cycle_image_filter(&mut self) {
        let counter = if self.config.shared_filter_cycle {
            &mut self.filter_index
        } else {
            &mut self.image_filter_index
        };
        let index = *counter;
        *counter += 1;
        let filter = FilterType::for_counter(index);
        apply_filter_class(&mut self.page.canvas.classes, filter);
        debug!(filter = %filter, index, "Canvas filter");
    }
}

fn apply_filter_class(classes: &mut ClassList, filter: FilterType) {
    classes.reset();
    classes.add(filter.class_name());
}
