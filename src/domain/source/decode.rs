// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/source/decode.rs
//
// Reduced-size decoders: PNG rows are streamed and strided, JPEG frames are
// DCT-scaled, so the full stored bitmap is never materialised.

use std::io::Read;

use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, Luma, LumaA, Rgb, Rgba};
use jpeg_decoder::PixelFormat;

use crate::domain::region::CropRegion;
use crate::domain::sizing::estimated_bytes;
use crate::error::{DecodeError, DecodeResult};

/// Divisors the JPEG IDCT can scale by.
const DCT_DIVISORS: [u32; 4] = [1, 2, 4, 8];

/// Rectangle of the stored image to decode, already validated against its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Window {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Window {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Caller has checked `region` lies inside the source.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_region(region: CropRegion) -> Self {
        Self {
            x: region.x as u32,
            y: region.y as u32,
            width: region.width,
            height: region.height,
        }
    }

    pub fn covers(&self, width: u32, height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.width == width && self.height == height
    }

    /// Output size when every `stride`-th row and column is kept, never below 1x1.
    pub fn strided(&self, stride: u32) -> (u32, u32) {
        let stride = stride.max(1);
        ((self.width / stride).max(1), (self.height / stride).max(1))
    }
}

fn check_budget(required: u64, available: u64) -> DecodeResult<()> {
    if required > available {
        return Err(DecodeError::OutOfMemory {
            required,
            available,
        });
    }
    Ok(())
}

/// Decode `window` of a PNG keeping every `stride`-th row and column. Only the
/// output bitmap counts against `available`.
///
/// Returns `Ok(None)` for interlaced images, whose rows arrive in passes.
pub(super) fn png_window<R: Read>(
    stream: R,
    window: Window,
    stride: u32,
    available: u64,
) -> DecodeResult<Option<DynamicImage>> {
    let mut decoder = png::Decoder::new(stream);
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder.read_info()?;
    if reader.info().interlaced {
        return Ok(None);
    }

    let stride = stride.max(1);
    let (out_width, out_height) = window.strided(stride);
    check_budget(estimated_bytes(out_width, out_height), available)?;

    let (color, depth) = reader.output_color_type();
    let wide = depth == png::BitDepth::Sixteen;
    let channels = color.samples();
    let pixel_bytes = channels * if wide { 2 } else { 1 };

    let mut pixels = Vec::with_capacity(out_width as usize * out_height as usize * pixel_bytes);
    let first = window.x as usize * pixel_bytes;
    let mut kept = 0;
    let mut y = 0u32;

    while kept < out_height {
        let Some(row) = reader.next_row()? else {
            break;
        };
        if y >= window.y && (y - window.y) % stride == 0 {
            let data = row.data().get(first..).unwrap_or_default();
            for pixel in data
                .chunks_exact(pixel_bytes)
                .step_by(stride as usize)
                .take(out_width as usize)
            {
                pixels.extend_from_slice(pixel);
            }
            kept += 1;
        }
        y += 1;
    }

    if kept < out_height {
        return Err(DecodeError::Malformed(format!(
            "png ended after {y} rows, window needs {}",
            window.y + window.height
        )));
    }

    let samples = if wide {
        Samples::Wide(
            pixels
                .chunks_exact(2)
                .map(|b| u16::from_be_bytes([b[0], b[1]]))
                .collect(),
        )
    } else {
        Samples::Narrow(pixels)
    };
    samples
        .into_image(out_width, out_height, channels)
        .map(Some)
        .ok_or_else(|| DecodeError::Malformed("png row layout".into()))
}

/// Decode `window` of a JPEG at the finest DCT scale that is no finer than
/// `stride` and fits in `available` bytes together with the output.
///
/// When memory forces a coarser scale than `stride`, the output shrinks with it.
pub(super) fn jpeg_window<R: Read>(
    stream: R,
    stored: (u32, u32),
    window: Window,
    stride: u32,
    available: u64,
) -> DecodeResult<DynamicImage> {
    let stride = stride.max(1);
    let finest = DCT_DIVISORS
        .into_iter()
        .rev()
        .find(|divisor| *divisor <= stride)
        .unwrap_or(1);

    let mut required = 0;
    for divisor in DCT_DIVISORS.into_iter().filter(|divisor| *divisor >= finest) {
        let frame = estimated_bytes(stored.0.div_ceil(divisor), stored.1.div_ceil(divisor));
        let output = if divisor == stride && window.covers(stored.0, stored.1) {
            0
        } else {
            let (width, height) = window.strided(stride.max(divisor));
            estimated_bytes(width, height)
        };
        required = frame + output;
        if required <= available {
            if divisor > finest {
                log::debug!("JPEG window {window:?} scaled 1/{divisor} to fit {available} bytes");
            }
            return jpeg_scaled(stream, stored, window, stride.max(divisor), divisor);
        }
    }

    Err(DecodeError::OutOfMemory {
        required,
        available,
    })
}

fn jpeg_scaled<R: Read>(
    stream: R,
    stored: (u32, u32),
    window: Window,
    stride: u32,
    divisor: u32,
) -> DecodeResult<DynamicImage> {
    let mut decoder = jpeg_decoder::Decoder::new(stream);
    if divisor > 1 {
        let wanted = |len: u32| u16::try_from(len.div_ceil(divisor)).unwrap_or(u16::MAX);
        decoder.scale(wanted(stored.0), wanted(stored.1))?;
    }
    let pixels = decoder.decode()?;
    let info = decoder
        .info()
        .ok_or_else(|| DecodeError::Malformed("jpeg without frame header".into()))?;
    let (width, height) = (u32::from(info.width), u32::from(info.height));

    let samples = match info.pixel_format {
        PixelFormat::L8 => Samples::Narrow(pixels).into_image(width, height, 1),
        PixelFormat::L16 => Samples::Wide(
            pixels
                .chunks_exact(2)
                .map(|b| u16::from_ne_bytes([b[0], b[1]]))
                .collect(),
        )
        .into_image(width, height, 1),
        PixelFormat::RGB24 => Samples::Narrow(pixels).into_image(width, height, 3),
        PixelFormat::CMYK32 => Samples::Narrow(cmyk_to_rgb(&pixels)).into_image(width, height, 3),
    };
    let frame = samples.ok_or_else(|| DecodeError::Malformed("jpeg pixel layout".into()))?;

    // Map the window into the scaled frame.
    let scale = |pos: u32, stored_len: u32, frame_len: u32| -> u32 {
        let scaled = u64::from(pos) * u64::from(frame_len) / u64::from(stored_len.max(1));
        u32::try_from(scaled).unwrap_or(u32::MAX).min(frame_len)
    };
    let left = scale(window.x, stored.0, width).min(width.saturating_sub(1));
    let top = scale(window.y, stored.1, height).min(height.saturating_sub(1));
    let right = scale(window.x + window.width, stored.0, width).max(left + 1);
    let bottom = scale(window.y + window.height, stored.1, height).max(top + 1);

    let cropped = if (left, top, right, bottom) == (0, 0, width, height) {
        frame
    } else {
        frame.crop_imm(left, top, right - left, bottom - top)
    };

    let (out_width, out_height) = window.strided(stride);
    if (cropped.width(), cropped.height()) == (out_width, out_height) {
        Ok(cropped)
    } else {
        Ok(cropped.resize_exact(out_width, out_height, FilterType::Nearest))
    }
}

/// Inverted (Adobe) CMYK to RGB.
fn cmyk_to_rgb(input: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len() / 4 * 3);
    for pixel in input.chunks_exact(4) {
        let k = u16::from(pixel[3]);
        for channel in &pixel[..3] {
            #[allow(clippy::cast_possible_truncation)]
            output.push((u16::from(*channel) * k / 255) as u8);
        }
    }
    output
}

enum Samples {
    Narrow(Vec<u8>),
    Wide(Vec<u16>),
}

impl Samples {
    fn into_image(self, width: u32, height: u32, channels: usize) -> Option<DynamicImage> {
        match (self, channels) {
            (Self::Narrow(raw), 1) => {
                ImageBuffer::<Luma<u8>, _>::from_raw(width, height, raw).map(DynamicImage::ImageLuma8)
            }
            (Self::Narrow(raw), 2) => ImageBuffer::<LumaA<u8>, _>::from_raw(width, height, raw)
                .map(DynamicImage::ImageLumaA8),
            (Self::Narrow(raw), 3) => {
                ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, raw).map(DynamicImage::ImageRgb8)
            }
            (Self::Narrow(raw), 4) => ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, raw)
                .map(DynamicImage::ImageRgba8),
            (Self::Wide(raw), 1) => ImageBuffer::<Luma<u16>, _>::from_raw(width, height, raw)
                .map(DynamicImage::ImageLuma16),
            (Self::Wide(raw), 2) => ImageBuffer::<LumaA<u16>, _>::from_raw(width, height, raw)
                .map(DynamicImage::ImageLumaA16),
            (Self::Wide(raw), 3) => ImageBuffer::<Rgb<u16>, _>::from_raw(width, height, raw)
                .map(DynamicImage::ImageRgb16),
            (Self::Wide(raw), 4) => ImageBuffer::<Rgba<u16>, _>::from_raw(width, height, raw)
                .map(DynamicImage::ImageRgba16),
            _ => None,
        }
    }
}
