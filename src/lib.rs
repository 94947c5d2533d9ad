// SPDX-License-Identifier: GPL-3.0-or-later
// src/lib.rs
//
// cropframe: embeddable image crop view with memory-aware region cropping.

pub mod app;
pub mod config;
pub mod constant;
pub mod domain;
pub mod error;

pub use app::view::canvas::{Canvas, Color, DisplayList, DrawCommand, Line, Shape, Stroke, Surface};
pub use app::view::crop::{FrameGeometry, FrameShape, InteractionMode, OverlayStyle};
pub use app::{CropView, LoadTicket, PreviewOutcome, PreviewRequest, ScaleEvent, TouchEvent};
pub use config::CropViewConfig;
pub use domain::geometry::{Point, Rect, Size};
pub use domain::media::{MediaFolder, MediaItem};
pub use domain::orientation::Orientation;
pub use domain::region::CropRegion;
pub use domain::sizing::{HeapBudget, MemoryProbe, subsample_factor};
pub use domain::source::{FsResolver, ImageSource, SourceKind, SourceResolver};
pub use error::{ConfigError, CropError, DecodeError};
