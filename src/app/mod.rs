// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/mod.rs
//
// Application layer: crop view facade, input events and preview loading.

#[cfg(feature = "async")]
pub mod loader;
pub mod message;
pub mod model;
pub mod view;

pub use message::{ScaleEvent, TouchEvent};
pub use model::{CropView, LoadTicket, PreviewOutcome, PreviewRequest};
