// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/view/crop/frame.rs
//
// Frame geometry and overlay style.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::app::view::canvas::{Color, Stroke};
use crate::constant::{
    DEFAULT_FRAME_MARGIN, DEFAULT_FRAME_THICKNESS, DEFAULT_GRID_ROWS, DEFAULT_GRID_THICKNESS,
};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameShape {
    #[default]
    Rectangle,
    Oval,
}

impl FromStr for FrameShape {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rectangle" | "rect" => Ok(Self::Rectangle),
            "oval" | "circle" => Ok(Self::Oval),
            _ => Err(ConfigError::InvalidShape(s.to_string())),
        }
    }
}

impl fmt::Display for FrameShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rectangle => f.write_str("rectangle"),
            Self::Oval => f.write_str("oval"),
        }
    }
}

/// Parse a `"W:H"` ratio string into width / height.
///
/// A missing height counts as 1. Anything unparsable, non-finite or not
/// strictly positive falls back to 1:1.
pub fn parse_ratio(value: &str) -> f32 {
    let mut parts = value.split(':');
    let width = parts.next().map(str::trim).and_then(|w| w.parse::<f32>().ok());
    let height = match parts.next() {
        Some(h) => h.trim().parse::<f32>().ok(),
        None => Some(1.0),
    };

    match (width, height, parts.next()) {
        (Some(w), Some(h), None) if w > 0.0 && h > 0.0 && (w / h).is_finite() => w / h,
        _ => {
            log::debug!("Unparsable frame ratio {value:?}, using 1:1");
            1.0
        }
    }
}

/// Shape and placement of the crop frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    pub shape: FrameShape,
    /// Width / height, always > 0.
    pub ratio: f32,
    pub margin: f32,
    /// Rows and columns of the alignment grid.
    pub grid_rows: u32,
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self {
            shape: FrameShape::Rectangle,
            ratio: 1.0,
            margin: DEFAULT_FRAME_MARGIN,
            grid_rows: DEFAULT_GRID_ROWS,
        }
    }
}

impl FrameGeometry {
    /// Copy with out-of-range values replaced by their defaults.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let ratio = if self.ratio.is_finite() && self.ratio > 0.0 {
            self.ratio
        } else {
            1.0
        };
        let margin = if self.margin.is_finite() {
            self.margin.max(0.0)
        } else {
            DEFAULT_FRAME_MARGIN
        };
        Self {
            shape: self.shape,
            ratio,
            margin,
            grid_rows: self.grid_rows.max(1),
        }
    }
}

/// Colors and stroke widths of the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub overlay_color: Color,
    pub frame_color: Color,
    pub frame_thickness: f32,
    pub grid_color: Color,
    pub grid_thickness: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            overlay_color: Color(0xCC00_0000),
            frame_color: Color::WHITE,
            frame_thickness: DEFAULT_FRAME_THICKNESS,
            grid_color: Color::WHITE,
            grid_thickness: DEFAULT_GRID_THICKNESS,
        }
    }
}

impl OverlayStyle {
    pub fn frame_stroke(&self) -> Stroke {
        Stroke {
            color: self.frame_color,
            width: self.frame_thickness,
        }
    }

    pub fn grid_stroke(&self) -> Stroke {
        Stroke {
            color: self.grid_color,
            width: self.grid_thickness,
        }
    }
}
