// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/region.rs
//
// Crop region domain model.

/// Crop region in source pixel coordinates.
///
/// Pure domain model - a rectangle handed to the region decoder. The origin is
/// signed so a region that strays outside the source can be represented and
/// rejected instead of silently wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRegion {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn as_tuple(&self) -> (i64, i64, u32, u32) {
        (self.x, self.y, self.width, self.height)
    }

    /// Check if region has valid dimensions.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn right(&self) -> i64 {
        self.x + i64::from(self.width)
    }

    pub fn bottom(&self) -> i64 {
        self.y + i64::from(self.height)
    }

    /// Whether the region lies fully inside a `width` x `height` image.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.right() <= i64::from(width)
            && self.bottom() <= i64::from(height)
    }

    /// Shrink and shift the region so it fits inside a `width` x `height` image.
    #[must_use]
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let w = self.width.min(width);
        let h = self.height.min(height);
        let x = self.x.clamp(0, i64::from(width - w));
        let y = self.y.clamp(0, i64::from(height - h));
        Self::new(x, y, w, h)
    }
}
