// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/mapper.rs
//
// Maps the on-screen frame at the current pan/zoom back to stored source pixels.

use super::geometry::{Point, Rect, Size};
use super::orientation::Orientation;
use super::region::CropRegion;

/// Pan/zoom state captured at crop time.
///
/// `preview` is the size the preview occupies on screen at scale 1, `frame`
/// the size of the crop frame. Image and frame are both centered in the view,
/// so `translation` is the offset of the image center from the frame center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSnapshot {
    pub scale: f32,
    pub translation: Point,
    pub preview: Size,
    pub frame: Size,
}

impl ViewportSnapshot {
    pub fn is_degenerate(&self) -> bool {
        self.scale <= 0.0 || self.preview.is_empty() || self.frame.is_empty()
    }

    /// The frame expressed in unscaled preview coordinates (origin at the
    /// preview's top-left corner).
    pub fn frame_in_preview(&self) -> Rect {
        let center = Point::new(
            self.preview.width / 2.0 - self.translation.x / self.scale,
            self.preview.height / 2.0 - self.translation.y / self.scale,
        );
        let size = Size::new(self.frame.width / self.scale, self.frame.height / self.scale);
        Rect::centered(center, size)
    }
}

/// Rectangle of the upright picture (display pixel space) under the frame.
///
/// Rounded to whole pixels and pulled back inside `display` so float error
/// never asks the decoder for pixels outside the source.
pub fn display_crop_region(display: (u32, u32), snapshot: &ViewportSnapshot) -> Option<CropRegion> {
    if snapshot.is_degenerate() || display.0 == 0 || display.1 == 0 {
        return None;
    }

    let frame = snapshot.frame_in_preview();
    let kx = f64::from(display.0) / f64::from(snapshot.preview.width);
    let ky = f64::from(display.1) / f64::from(snapshot.preview.height);

    let left = (f64::from(frame.left) * kx).round();
    let top = (f64::from(frame.top) * ky).round();
    let width = (f64::from(frame.width()) * kx).round().max(1.0);
    let height = (f64::from(frame.height()) * ky).round().max(1.0);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let region = CropRegion::new(
        left as i64,
        top as i64,
        width.min(f64::from(u32::MAX)) as u32,
        height.min(f64::from(u32::MAX)) as u32,
    );

    Some(region.clamp_to(display.0, display.1))
}

/// Pre-rotation source rectangle whose decode, once turned upright by
/// `orientation`, shows exactly what the frame covers.
///
/// `stored` holds the encoded (pre-rotation) dimensions.
pub fn source_crop_region(
    orientation: Orientation,
    stored: (u32, u32),
    snapshot: &ViewportSnapshot,
) -> Option<CropRegion> {
    let display = orientation.display_dimensions(stored.0, stored.1);
    let upright = display_crop_region(display, snapshot)?;
    let region = orientation.rect_to_source(upright, stored.0, stored.1);
    log::debug!(
        "Crop {:?} upright -> {:?} stored ({orientation:?}, scale {})",
        upright.as_tuple(),
        region.as_tuple(),
        snapshot.scale
    );
    Some(region)
}
