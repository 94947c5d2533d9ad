// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/source/mod.rs
//
// Image sources: asset / content URI / resource, with memoized bounds and orientation.

mod decode;
pub mod resolver;

use std::fmt;
use std::sync::{Arc, OnceLock};

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Limits};

use crate::domain::orientation::{self, Orientation};
use crate::domain::region::CropRegion;
use crate::domain::sizing::{DecodeOptions, MemoryProbe, estimated_bytes};
use decode::Window;
use crate::error::{DecodeError, DecodeResult};

pub use resolver::{FsResolver, ReadSeek, SourceResolver, SourceStream};

/// Where the encoded bytes of an image live.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Asset(String),
    ContentUri(String),
    Resource(u32),
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asset(name) => write!(f, "asset:{name}"),
            Self::ContentUri(uri) => write!(f, "{uri}"),
            Self::Resource(id) => write!(f, "resource:{id}"),
        }
    }
}

/// Result of the bounds-only decode pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceBounds {
    /// Stored (pre-rotation) pixel width.
    pub width: u32,
    /// Stored (pre-rotation) pixel height.
    pub height: u32,
    pub mime_type: Option<&'static str>,
}

/// A selected image.
///
/// Holds no bitmap: every decode opens a fresh stream through the resolver.
/// Bounds and orientation are computed once and cached for the lifetime of
/// the instance; selecting another image creates a new `ImageSource`.
///
/// Decodes may run on a worker thread, one at a time per instance.
pub struct ImageSource {
    kind: SourceKind,
    resolver: Arc<dyn SourceResolver>,
    bounds: OnceLock<SourceBounds>,
    orientation: OnceLock<Orientation>,
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSource")
            .field("kind", &self.kind)
            .field("bounds", &self.bounds.get())
            .field("orientation", &self.orientation.get())
            .finish()
    }
}

impl ImageSource {
    pub fn new(kind: SourceKind, resolver: Arc<dyn SourceResolver>) -> Self {
        Self {
            kind,
            resolver,
            bounds: OnceLock::new(),
            orientation: OnceLock::new(),
        }
    }

    pub fn asset(name: impl Into<String>, resolver: Arc<dyn SourceResolver>) -> Self {
        Self::new(SourceKind::Asset(name.into()), resolver)
    }

    pub fn content(uri: impl Into<String>, resolver: Arc<dyn SourceResolver>) -> Self {
        Self::new(SourceKind::ContentUri(uri.into()), resolver)
    }

    pub fn resource(id: u32, resolver: Arc<dyn SourceResolver>) -> Self {
        Self::new(SourceKind::Resource(id), resolver)
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    fn open(&self) -> DecodeResult<SourceStream> {
        let stream = match &self.kind {
            SourceKind::Asset(name) => self.resolver.open_asset(name),
            SourceKind::ContentUri(uri) => self.resolver.open_content(uri),
            SourceKind::Resource(id) => self.resolver.open_resource(*id),
        };
        stream.map_err(DecodeError::Open)
    }

    fn reader(&self) -> DecodeResult<ImageReader<SourceStream>> {
        ImageReader::new(self.open()?)
            .with_guessed_format()
            .map_err(DecodeError::Read)
    }

    /// Bounds-only pass: stored pixel dimensions and MIME type.
    pub fn decode_bounds(&self) -> DecodeResult<SourceBounds> {
        if let Some(bounds) = self.bounds.get() {
            return Ok(*bounds);
        }

        let reader = self.reader()?;
        let mime_type = reader.format().map(|format| format.to_mime_type());
        let (width, height) = reader.into_dimensions()?;
        let bounds = SourceBounds {
            width,
            height,
            mime_type,
        };
        log::debug!("Bounds of {}: {width}x{height} ({mime_type:?})", self.kind);

        Ok(*self.bounds.get_or_init(|| bounds))
    }

    /// Orientation correction for this source. Never fails: anything unreadable
    /// counts as upright.
    pub fn orientation(&self) -> Orientation {
        *self.orientation.get_or_init(|| self.read_orientation())
    }

    fn read_orientation(&self) -> Orientation {
        if let SourceKind::ContentUri(uri) = &self.kind
            && let Some(orientation) = self.resolver.content_orientation(uri)
        {
            return orientation;
        }

        match self.open() {
            Ok(mut stream) => orientation::read_exif_orientation(&mut stream),
            Err(e) => {
                log::warn!("Cannot read orientation of {}: {e}", self.kind);
                Orientation::Normal
            }
        }
    }

    /// Dimensions of the upright picture.
    pub fn display_dimensions(&self) -> DecodeResult<(u32, u32)> {
        let bounds = self.decode_bounds()?;
        Ok(self
            .orientation()
            .display_dimensions(bounds.width, bounds.height))
    }

    /// Decode the full stored bitmap, refusing to allocate past `available` bytes.
    fn decode_full(&self, bounds: SourceBounds, available: u64) -> DecodeResult<DynamicImage> {
        let required = estimated_bytes(bounds.width, bounds.height);
        if required > available {
            return Err(DecodeError::OutOfMemory {
                required,
                available,
            });
        }

        let mut reader = self.reader()?;
        let mut limits = Limits::default();
        limits.max_alloc = Some(available);
        reader.limits(limits);

        reader
            .decode()
            .map_err(|e| DecodeError::from_image(e, required, available))
    }

    /// Decode `window` of the stored image sub-sampled by `options.subsample`.
    ///
    /// PNG and JPEG never hold the full stored bitmap; other formats (and
    /// interlaced PNG) are decoded in full under the same memory limit.
    fn decode_window(
        &self,
        bounds: SourceBounds,
        window: Window,
        options: &DecodeOptions,
    ) -> DecodeResult<DynamicImage> {
        let stored = (bounds.width, bounds.height);
        match bounds.mime_type {
            Some("image/png") => {
                let stream = self.open()?;
                if let Some(img) =
                    decode::png_window(stream, window, options.subsample, options.available)?
                {
                    return Ok(img);
                }
                log::debug!("{} is interlaced, decoding in full", self.kind);
            }
            Some("image/jpeg") => {
                return decode::jpeg_window(
                    self.open()?,
                    stored,
                    window,
                    options.subsample,
                    options.available,
                );
            }
            _ => {}
        }

        let decoded = self.decode_full(bounds, options.available)?;
        let windowed = if window.covers(stored.0, stored.1) {
            decoded
        } else {
            let cropped = decoded.crop_imm(window.x, window.y, window.width, window.height);
            drop(decoded);
            cropped
        };
        Ok(subsample(windowed, window, options.subsample))
    }

    /// Sub-sampled, upright preview covering a `max_width` x `max_height` view.
    pub fn preview_bitmap(
        &self,
        max_width: u32,
        max_height: u32,
        probe: &dyn MemoryProbe,
    ) -> DecodeResult<DynamicImage> {
        let bounds = self.decode_bounds()?;
        let options =
            DecodeOptions::for_preview((bounds.width, bounds.height), max_width, max_height, probe);

        let window = Window::full(bounds.width, bounds.height);
        let sampled = self.decode_window(bounds, window, &options)?;

        Ok(self.orientation().apply(sampled))
    }

    /// Decode `region` (stored, pre-rotation pixel space) at the highest
    /// resolution memory allows, then turn it upright.
    pub fn cropped_bitmap(
        &self,
        region: CropRegion,
        probe: &dyn MemoryProbe,
    ) -> DecodeResult<DynamicImage> {
        if !region.is_valid() {
            return Err(DecodeError::EmptyRegion(region));
        }

        let bounds = self.decode_bounds()?;
        if !region.is_within(bounds.width, bounds.height) {
            return Err(DecodeError::RegionOutOfBounds {
                rect: region,
                width: bounds.width,
                height: bounds.height,
            });
        }

        let options = DecodeOptions::for_region(region.width, region.height, probe);
        let cropped = self.decode_window(bounds, Window::from_region(region), &options)?;

        Ok(self.orientation().apply(cropped))
    }
}

fn subsample(img: DynamicImage, window: Window, stride: u32) -> DynamicImage {
    if stride <= 1 {
        return img;
    }
    let (width, height) = window.strided(stride);
    img.resize_exact(width, height, FilterType::Nearest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sizing::HeapBudget;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> &'static [u8] {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 0, 255])
        });
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        Box::leak(buf.into_inner().into_boxed_slice())
    }

    fn resource(width: u32, height: u32) -> ImageSource {
        let resolver = FsResolver::default().with_embedded_resource(1, png_bytes(width, height));
        ImageSource::resource(1, Arc::new(resolver))
    }

    #[test]
    fn bounds_report_size_and_mime() {
        let source = resource(40, 30);
        let bounds = source.decode_bounds().unwrap();
        assert_eq!((bounds.width, bounds.height), (40, 30));
        assert_eq!(bounds.mime_type, Some("image/png"));
    }

    #[test]
    fn garbage_stream_is_a_decode_error() {
        static JUNK: &[u8] = b"definitely not an image";
        let resolver = FsResolver::default().with_embedded_resource(1, JUNK);
        let source = ImageSource::resource(1, Arc::new(resolver));
        assert!(source.decode_bounds().is_err());
        assert_eq!(source.orientation(), Orientation::Normal);
    }

    #[test]
    fn missing_stream_is_fatal_but_orientation_is_not() {
        let source = ImageSource::resource(9, Arc::new(FsResolver::default()));
        let err = source.decode_bounds().unwrap_err();
        assert!(!err.is_recoverable());
        assert_eq!(source.orientation(), Orientation::Normal);
    }

    #[test]
    fn preview_is_subsampled_to_view() {
        let source = resource(400, 200);
        let budget = HeapBudget::new(64 * 1024 * 1024);
        let preview = source.preview_bitmap(50, 50, &budget).unwrap();
        // 400 / 4 = 100 <= 2 * 50
        assert_eq!((preview.width(), preview.height()), (100, 50));
    }

    #[test]
    fn preview_is_stable_across_calls() {
        let source = resource(120, 90);
        let budget = HeapBudget::new(64 * 1024 * 1024);
        let first = source.preview_bitmap(60, 60, &budget).unwrap();
        let second = source.preview_bitmap(60, 60, &budget).unwrap();
        assert_eq!((first.width(), first.height()), (second.width(), second.height()));
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn exhausted_budget_is_recoverable() {
        let source = resource(100, 100);
        let budget = HeapBudget::new(0);
        let err = source.preview_bitmap(100, 100, &budget).unwrap_err();
        assert!(matches!(err, DecodeError::OutOfMemory { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn memory_pressure_strides_the_preview() {
        // 160000 bytes in full, 40000 at factor 2.
        let source = resource(200, 200);
        let budget = HeapBudget::new(100_000);
        let preview = source.preview_bitmap(200, 200, &budget).unwrap();
        assert_eq!((preview.width(), preview.height()), (100, 100));
        let rgba = preview.to_rgba8();
        assert_eq!(rgba.get_pixel(10, 30)[0], 20);
        assert_eq!(rgba.get_pixel(10, 30)[1], 60);
    }

    #[test]
    fn small_region_of_large_image_fits_tight_memory() {
        let source = resource(200, 200);
        let budget = HeapBudget::new(100_000);
        let cropped = source
            .cropped_bitmap(CropRegion::new(30, 40, 10, 10), &budget)
            .unwrap();
        assert_eq!((cropped.width(), cropped.height()), (10, 10));
        let rgba = cropped.to_rgba8();
        assert_eq!(rgba.get_pixel(0, 0)[0], 30);
        assert_eq!(rgba.get_pixel(9, 9)[1], 49);
    }

    #[test]
    fn region_is_subsampled_only_when_it_exceeds_memory() {
        // Region is 80000 bytes, 20000 at factor 2.
        let source = resource(200, 200);
        let budget = HeapBudget::new(50_000);
        let cropped = source
            .cropped_bitmap(CropRegion::new(0, 100, 200, 100), &budget)
            .unwrap();
        assert_eq!((cropped.width(), cropped.height()), (100, 50));
        let rgba = cropped.to_rgba8();
        assert_eq!(rgba.get_pixel(5, 5)[0], 10);
        assert_eq!(rgba.get_pixel(5, 5)[1], 110);
    }

    #[test]
    fn region_outside_source_is_rejected() {
        let source = resource(50, 50);
        let budget = HeapBudget::new(64 * 1024 * 1024);
        let err = source
            .cropped_bitmap(CropRegion::new(40, 40, 20, 20), &budget)
            .unwrap_err();
        assert!(matches!(err, DecodeError::RegionOutOfBounds { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn region_decode_keeps_full_resolution() {
        let source = resource(64, 48);
        let budget = HeapBudget::new(64 * 1024 * 1024);
        let cropped = source
            .cropped_bitmap(CropRegion::new(10, 5, 20, 30), &budget)
            .unwrap();
        assert_eq!((cropped.width(), cropped.height()), (20, 30));
        let rgba = cropped.to_rgba8();
        assert_eq!(rgba.get_pixel(0, 0)[0], 10);
        assert_eq!(rgba.get_pixel(0, 0)[1], 5);
    }
}
