// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/orientation.rs
//
// EXIF orientation: tag mapping, bitmap correction and rectangle mapping.

use std::io::{BufRead, Seek};

use image::DynamicImage;

use super::region::CropRegion;

/// Orientation of the stored pixels relative to the upright picture.
///
/// Each variant is one of the eight EXIF orientation tags. Every one of them
/// is a 0/90/180/270 degree clockwise rotation, optionally followed by a
/// horizontal mirror:
///
/// | Tag | Variant        | Rotation | Mirror | Swaps axes |
/// |-----|----------------|----------|--------|------------|
/// | 1   | Normal         | 0        | no     | no         |
/// | 2   | FlipHorizontal | 0        | yes    | no         |
/// | 3   | Rotate180      | 180      | no     | no         |
/// | 4   | FlipVertical   | 180      | yes    | no         |
/// | 5   | Transpose      | 90       | yes    | yes        |
/// | 6   | Rotate90       | 90       | no     | yes        |
/// | 7   | Transverse     | 270      | yes    | yes        |
/// | 8   | Rotate270      | 270      | no     | yes        |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    Transpose,
    Rotate90,
    Transverse,
    Rotate270,
}

impl Orientation {
    pub const ALL: [Orientation; 8] = [
        Self::Normal,
        Self::FlipHorizontal,
        Self::Rotate180,
        Self::FlipVertical,
        Self::Transpose,
        Self::Rotate90,
        Self::Transverse,
        Self::Rotate270,
    ];

    /// Map an EXIF orientation tag. `0` ("undefined") and unknown values yield `None`.
    #[must_use]
    pub fn from_exif(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(Self::Normal),
            2 => Some(Self::FlipHorizontal),
            3 => Some(Self::Rotate180),
            4 => Some(Self::FlipVertical),
            5 => Some(Self::Transpose),
            6 => Some(Self::Rotate90),
            7 => Some(Self::Transverse),
            8 => Some(Self::Rotate270),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_exif(self) -> u32 {
        match self {
            Self::Normal => 1,
            Self::FlipHorizontal => 2,
            Self::Rotate180 => 3,
            Self::FlipVertical => 4,
            Self::Transpose => 5,
            Self::Rotate90 => 6,
            Self::Transverse => 7,
            Self::Rotate270 => 8,
        }
    }

    /// Map a media-store orientation column (clockwise degrees).
    /// Anything that is not a multiple of 90 is treated as upright.
    #[must_use]
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => Self::Rotate90,
            180 => Self::Rotate180,
            270 => Self::Rotate270,
            _ => Self::Normal,
        }
    }

    #[must_use]
    pub fn swaps_axes(self) -> bool {
        matches!(
            self,
            Self::Transpose | Self::Rotate90 | Self::Transverse | Self::Rotate270
        )
    }

    /// Dimensions of the upright picture for a stored `width` x `height` bitmap.
    #[must_use]
    pub fn display_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Turn a stored bitmap upright.
    #[must_use]
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Self::Normal => img,
            Self::FlipHorizontal => img.fliph(),
            Self::Rotate180 => img.rotate180(),
            Self::FlipVertical => img.flipv(),
            Self::Transpose => img.rotate90().fliph(),
            Self::Rotate90 => img.rotate90(),
            Self::Transverse => img.rotate270().fliph(),
            Self::Rotate270 => img.rotate270(),
        }
    }

    /// Map a rectangle of the upright picture back into stored pixel space.
    ///
    /// `width`/`height` are the stored (pre-rotation) dimensions. Decoding the
    /// returned region and passing it through [`Orientation::apply`] yields exactly
    /// the pixels of `rect`.
    #[must_use]
    pub fn rect_to_source(self, rect: CropRegion, width: u32, height: u32) -> CropRegion {
        let (x, y) = (rect.x, rect.y);
        let (w, h) = (i64::from(rect.width), i64::from(rect.height));
        let (sw, sh) = (i64::from(width), i64::from(height));

        match self {
            Self::Normal => rect,
            Self::FlipHorizontal => CropRegion::new(sw - x - w, y, rect.width, rect.height),
            Self::Rotate180 => CropRegion::new(sw - x - w, sh - y - h, rect.width, rect.height),
            Self::FlipVertical => CropRegion::new(x, sh - y - h, rect.width, rect.height),
            Self::Transpose => CropRegion::new(y, x, rect.height, rect.width),
            Self::Rotate90 => CropRegion::new(y, sh - x - w, rect.height, rect.width),
            Self::Transverse => CropRegion::new(sw - y - h, sh - x - w, rect.height, rect.width),
            Self::Rotate270 => CropRegion::new(sw - y - h, x, rect.height, rect.width),
        }
    }
}

/// Read the EXIF orientation tag from an encoded image stream.
///
/// Returns `Normal` when the container has no EXIF block or the tag is
/// missing, undefined or malformed.
#[cfg(feature = "exif")]
pub fn read_exif_orientation<R: BufRead + Seek>(reader: &mut R) -> Orientation {
    let exif = match exif::Reader::new().read_from_container(reader) {
        Ok(exif) => exif,
        Err(e) => {
            log::debug!("No EXIF orientation: {e}");
            return Orientation::Normal;
        }
    };

    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .and_then(Orientation::from_exif)
        .unwrap_or_default()
}

#[cfg(not(feature = "exif"))]
pub fn read_exif_orientation<R: BufRead + Seek>(_reader: &mut R) -> Orientation {
    Orientation::Normal
}
