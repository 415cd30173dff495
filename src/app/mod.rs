// SPDX-License-Identifier: GPL-3.0-only

//! Page controller
//!
//! The controller owns the page elements and the one live stream, and is
//! driven entirely by [`Message`]s from a front end:
//!
//! ```text
//! front end ──Click/Tick──▶ PageController::update ──▶ handlers::{camera, capture, filter}
//!     ▲                                                        │
//!     └──────────────────── Page (elements) ◀──────────────────┘
//! ```
//!
//! Failures never leave the controller; they end up as lines in
//! [`Page::errors`].

pub mod filters;
mod handlers;
pub mod page;
pub mod state;
mod update;

pub use filters::{FILTER_CYCLE, FilterType};
pub use page::{ClassList, ElementId, Page, PreviewSource};
pub use state::{Message, PageController};
