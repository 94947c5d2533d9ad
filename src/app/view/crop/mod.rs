// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/view/crop/mod.rs
//
// Crop view parts: frame geometry, overlay renderer, pan/zoom viewport and
// the position-correction animation.

pub mod animation;
pub mod frame;
pub mod overlay;
pub mod viewport;

pub use animation::PositionCorrection;
pub use frame::{FrameGeometry, FrameShape, OverlayStyle, parse_ratio};
pub use overlay::{CropOverlay, fit_frame, grid_lines};
pub use viewport::{InteractionMode, TranslationBounds, Viewport, ViewportState, fit_preview};
