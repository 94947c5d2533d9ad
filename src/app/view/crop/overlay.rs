// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/view/crop/overlay.rs
//
// Crop overlay renderer: dimmed surround, frame outline and alignment grid.
// Inspired by cosmic-viewer (https://codeberg.org/bhh by Bryan Hyland

use crate::app::view::canvas::{Canvas, Line, Shape};
use crate::app::view::crop::frame::{FrameGeometry, FrameShape, OverlayStyle};
use crate::domain::geometry::{Point, Rect, Size};

/// Largest rectangle of aspect `ratio` that fits inside `bounds` shrunk by
/// `margin` on every side, centered. `None` when nothing fits.
pub fn fit_frame(bounds: Size, ratio: f32, margin: f32) -> Option<Rect> {
    let available_w = bounds.width - 2.0 * margin;
    let available_h = bounds.height - 2.0 * margin;
    if available_w <= 0.0 || available_h <= 0.0 || ratio <= 0.0 || !ratio.is_finite() {
        return None;
    }

    let size = if available_w / available_h > ratio {
        // Height bound.
        Size::new(available_h * ratio, available_h)
    } else {
        Size::new(available_w, available_w / ratio)
    };

    Some(Rect::centered(
        Point::new(bounds.width / 2.0, bounds.height / 2.0),
        size,
    ))
}

/// Interior grid lines: `rows - 1` verticals then `rows - 1` horizontals.
pub fn grid_lines(frame: &Rect, rows: u32) -> Vec<Line> {
    let rows = rows.max(1);
    #[allow(clippy::cast_precision_loss)]
    let step = |extent: f32, i: u32| extent * i as f32 / rows as f32;

    let verticals = (1..rows).map(|i| {
        let x = frame.left + step(frame.width(), i);
        Line::new(Point::new(x, frame.top), Point::new(x, frame.bottom))
    });
    let horizontals = (1..rows).map(|i| {
        let y = frame.top + step(frame.height(), i);
        Line::new(Point::new(frame.left, y), Point::new(frame.right, y))
    });

    verticals.chain(horizontals).collect()
}

/// Paints the crop frame over the image.
///
/// Holds no gesture state. The frame rectangle and the grid are derived from
/// (bounds, geometry) and cached until either changes.
#[derive(Debug, Clone)]
pub struct CropOverlay {
    geometry: FrameGeometry,
    style: OverlayStyle,
    bounds: Size,
    show_grid: bool,
    frame: Option<Rect>,
    grid: Vec<Line>,
}

impl Default for CropOverlay {
    fn default() -> Self {
        Self::new(FrameGeometry::default(), OverlayStyle::default())
    }
}

impl CropOverlay {
    pub fn new(geometry: FrameGeometry, style: OverlayStyle) -> Self {
        Self {
            geometry: geometry.sanitized(),
            style,
            bounds: Size::default(),
            show_grid: false,
            frame: None,
            grid: Vec::new(),
        }
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    /// Replace the frame geometry; returns whether the frame rectangle moved.
    pub fn set_geometry(&mut self, geometry: FrameGeometry) -> bool {
        self.geometry = geometry.sanitized();
        self.recompute()
    }

    pub fn set_style(&mut self, style: OverlayStyle) {
        self.style = style;
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.show_grid = show;
    }

    /// Lay the overlay out at a new size; returns whether the frame rectangle moved.
    pub fn set_bounds(&mut self, bounds: Size) -> bool {
        self.bounds = bounds;
        self.recompute()
    }

    fn recompute(&mut self) -> bool {
        let frame = fit_frame(self.bounds, self.geometry.ratio, self.geometry.margin);
        self.grid = frame
            .map(|rect| grid_lines(&rect, self.geometry.grid_rows))
            .unwrap_or_default();

        let changed = frame != self.frame;
        if changed {
            log::debug!(
                "Frame {:?} in {}x{} (ratio {}, margin {})",
                frame,
                self.bounds.width,
                self.bounds.height,
                self.geometry.ratio,
                self.geometry.margin
            );
        }
        self.frame = frame;
        changed
    }

    /// Frame rectangle in view coordinates, once the bounds can hold one.
    pub fn frame_rect(&self) -> Option<Rect> {
        self.frame
    }

    pub fn frame_outline(&self) -> Option<Shape> {
        self.frame.map(|rect| match self.geometry.shape {
            FrameShape::Rectangle => Shape::Rect(rect),
            FrameShape::Oval => Shape::Oval(rect),
        })
    }

    pub fn grid(&self) -> &[Line] {
        &self.grid
    }

    pub fn paint(&self, canvas: &mut dyn Canvas) {
        let Some(outline) = self.frame_outline() else {
            canvas.fill(self.style.overlay_color);
            return;
        };

        canvas.save();
        canvas.clip_out(&outline);
        canvas.fill(self.style.overlay_color);
        canvas.restore();

        if self.show_grid && !self.grid.is_empty() {
            canvas.save();
            canvas.clip_in(&outline);
            canvas.draw_lines(&self.grid, self.style.grid_stroke());
            canvas.restore();
        }

        canvas.stroke(&outline, self.style.frame_stroke());
    }
}
