// SPDX-License-Identifier: GPL-3.0-or-later
// src/error.rs
//
// Error taxonomy for decoding and cropping.

use std::io;

use thiserror::Error;

use crate::domain::region::CropRegion;

/// Failure while reading or decoding an image source.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open image stream: {0}")]
    Open(#[source] io::Error),

    #[error("failed to read image stream: {0}")]
    Read(#[source] io::Error),

    #[error("failed to decode image: {0}")]
    Format(#[from] image::ImageError),

    #[error("failed to decode png: {0}")]
    Png(#[from] png::DecodingError),

    #[error("failed to decode jpeg: {0}")]
    Jpeg(#[from] jpeg_decoder::Error),

    #[error("malformed image data: {0}")]
    Malformed(String),

    #[error("not enough memory to decode: need {required} bytes, {available} available")]
    OutOfMemory { required: u64, available: u64 },

    #[error("region {rect:?} lies outside the {width}x{height} source")]
    RegionOutOfBounds {
        rect: CropRegion,
        width: u32,
        height: u32,
    },

    #[error("region {0:?} is empty")]
    EmptyRegion(CropRegion),

    #[error("decode task did not complete: {0}")]
    Interrupted(String),
}

impl DecodeError {
    /// Whether the caller can retry or carry on (everything but a stream that
    /// can no longer be opened).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Open(_))
    }

    /// Map an `image` error, folding allocation-limit rejections into
    /// [`DecodeError::OutOfMemory`].
    pub(crate) fn from_image(err: image::ImageError, required: u64, available: u64) -> Self {
        match err {
            image::ImageError::Limits(_) => Self::OutOfMemory {
                required,
                available,
            },
            other => Self::Format(other),
        }
    }
}

/// Failure of [`crate::CropView::crop`].
#[derive(Debug, Error)]
pub enum CropError {
    /// `crop()` was called before any image source was set.
    #[error("crop requested before an image source was set")]
    NoSource,

    /// The source stream can no longer be opened (file deleted, permission revoked).
    #[error("image source is no longer available: {0}")]
    SourceUnavailable(#[source] DecodeError),
}

/// A configuration value that could not be parsed.
///
/// Only surfaced while reading a configuration file; the view setters fall
/// back to defaults instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid color {0:?}: expected #RRGGBB or #AARRGGBB")]
    InvalidColor(String),

    #[error("invalid frame shape {0:?}: expected rectangle or oval")]
    InvalidShape(String),
}

pub type DecodeResult<T> = Result<T, DecodeError>;
