// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/view/crop/viewport.rs
//
// Pan/zoom state machine over the displayed preview.

use crate::constant::{DEFAULT_SCALE_FACTOR, OFFSET_EPSILON};
use crate::domain::geometry::{Point, Rect, Size};
use crate::domain::mapper::ViewportSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Dragging,
    Scaling,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub scale: f32,
    /// Offset of the image center from the frame center, view pixels.
    pub translation: Point,
    pub mode: InteractionMode,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translation: Point::ORIGIN,
            mode: InteractionMode::Idle,
        }
    }
}

/// Range the translation may take without uncovering the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslationBounds {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl TranslationBounds {
    /// Bounds for a `preview` shown at `scale` behind a `frame`.
    pub fn new(preview: Size, frame: Size, scale: f32) -> Self {
        let half_x = (preview.width * scale - frame.width) / 2.0;
        let half_y = (preview.height * scale - frame.height) / 2.0;
        Self {
            x_min: (-half_x).min(0.0),
            x_max: half_x.max(0.0),
            y_min: (-half_y).min(0.0),
            y_max: half_y.max(0.0),
        }
    }

    pub fn clamp(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(self.x_min, self.x_max),
            point.y.clamp(self.y_min, self.y_max),
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        let clamped = self.clamp(point);
        (clamped.x - point.x).abs() <= OFFSET_EPSILON && (clamped.y - point.y).abs() <= OFFSET_EPSILON
    }
}

/// Size the preview takes on screen at scale 1: contained in `view`, never upscaled.
pub fn fit_preview(bitmap: (u32, u32), view: Size) -> Size {
    let bitmap = Size::from_pixels(bitmap.0, bitmap.1);
    if bitmap.is_empty() || view.is_empty() {
        return Size::default();
    }
    let fit = (view.width / bitmap.width)
        .min(view.height / bitmap.height)
        .min(1.0);
    Size::new(bitmap.width * fit, bitmap.height * fit)
}

/// Gesture-driven pan/zoom controller.
///
/// Touch and scale events arrive on the UI thread; nothing else mutates the
/// state. Scale limits follow the preview and frame sizes and are recomputed
/// whenever either changes.
#[derive(Debug, Clone)]
pub struct Viewport {
    state: ViewportState,
    preview: Size,
    frame: Size,
    scale_factor: f32,
    min_scale: f32,
    max_scale: f32,
    drag_anchor: Option<Point>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE_FACTOR)
    }
}

impl Viewport {
    pub fn new(scale_factor: f32) -> Self {
        Self {
            state: ViewportState::default(),
            preview: Size::default(),
            frame: Size::default(),
            scale_factor: sanitize_factor(scale_factor),
            min_scale: 1.0,
            max_scale: 1.0,
            drag_anchor: None,
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn scale(&self) -> f32 {
        self.state.scale
    }

    pub fn translation(&self) -> Point {
        self.state.translation
    }

    pub fn mode(&self) -> InteractionMode {
        self.state.mode
    }

    pub fn min_scale(&self) -> f32 {
        self.min_scale
    }

    pub fn max_scale(&self) -> f32 {
        self.max_scale
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn preview(&self) -> Size {
        self.preview
    }

    pub fn frame(&self) -> Size {
        self.frame
    }

    /// Whether there is something to pan over.
    pub fn is_ready(&self) -> bool {
        !self.preview.is_empty() && !self.frame.is_empty()
    }

    pub fn set_scale_factor(&mut self, factor: f32) {
        self.scale_factor = sanitize_factor(factor);
        self.recompute(self.preview, self.frame);
    }

    /// Recompute the scale limits for a new preview or frame size.
    ///
    /// Always resets the scale to the new minimum and re-clamps the translation
    /// right away, so no stale pan/zoom combination survives a geometry change.
    pub fn recompute(&mut self, preview: Size, frame: Size) {
        self.preview = preview;
        self.frame = frame;

        if self.is_ready() {
            self.min_scale = (frame.width / preview.width).max(frame.height / preview.height);
            self.max_scale = self.min_scale * self.scale_factor;
        } else {
            self.min_scale = 1.0;
            self.max_scale = self.scale_factor;
        }

        self.state.scale = self.min_scale;
        self.state.translation = self.bounds().clamp(self.state.translation);
        log::debug!(
            "Scale range [{}, {}] for preview {:?} / frame {:?}",
            self.min_scale,
            self.max_scale,
            preview,
            frame
        );
    }

    /// Back to the initial state for a new image: centered, minimum zoom, idle.
    pub fn reset(&mut self) {
        self.state = ViewportState {
            scale: self.min_scale,
            translation: Point::ORIGIN,
            mode: InteractionMode::Idle,
        };
        self.drag_anchor = None;
    }

    pub fn bounds(&self) -> TranslationBounds {
        TranslationBounds::new(self.preview, self.frame, self.state.scale)
    }

    /// Pan by `(dx, dy)`, clamped so the frame stays covered.
    pub fn add(&mut self, dx: f32, dy: f32) {
        let moved = Point::new(self.state.translation.x + dx, self.state.translation.y + dy);
        self.state.translation = self.bounds().clamp(moved);
    }

    /// Set the translation as is (used by the correction animation).
    pub fn set_translation(&mut self, translation: Point) {
        self.state.translation = translation;
    }

    pub fn clamped_translation(&self) -> Point {
        self.bounds().clamp(self.state.translation)
    }

    pub fn needs_correction(&self) -> bool {
        !self.bounds().contains(self.state.translation)
    }

    /// Touch-down: Idle -> Dragging. Returns whether the drag started.
    pub fn touch_down(&mut self, point: Point) -> bool {
        if self.state.mode != InteractionMode::Idle {
            return false;
        }
        self.state.mode = InteractionMode::Dragging;
        self.drag_anchor = Some(point);
        true
    }

    /// Touch-move while dragging pans by the pointer delta.
    pub fn touch_move(&mut self, point: Point) {
        if self.state.mode != InteractionMode::Dragging {
            return;
        }
        if let Some(anchor) = self.drag_anchor.replace(point) {
            self.add(point.x - anchor.x, point.y - anchor.y);
        }
    }

    /// Touch-up or cancel: back to Idle. Returns the mode that ended.
    pub fn touch_up(&mut self) -> InteractionMode {
        self.drag_anchor = None;
        std::mem::take(&mut self.state.mode)
    }

    /// Scale-gesture begin; interrupts a drag.
    pub fn scale_begin(&mut self) {
        self.drag_anchor = None;
        self.state.mode = InteractionMode::Scaling;
    }

    /// Multiply the scale by an incremental gesture factor, within limits.
    pub fn scale_update(&mut self, factor: f32) {
        if self.state.mode != InteractionMode::Scaling || !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.state.scale = (self.state.scale * factor).clamp(self.min_scale, self.max_scale);
    }

    /// Scale-gesture end: back to Idle. Returns the mode that ended.
    pub fn scale_end(&mut self) -> InteractionMode {
        self.touch_up()
    }

    /// Where the scaled preview sits inside a view whose center is `view_center`.
    pub fn image_rect(&self, view_center: Point) -> Rect {
        let center = Point::new(
            view_center.x + self.state.translation.x,
            view_center.y + self.state.translation.y,
        );
        Rect::centered(
            center,
            Size::new(
                self.preview.width * self.state.scale,
                self.preview.height * self.state.scale,
            ),
        )
    }

    /// Pan/zoom as the mapper needs it, with the translation clamped.
    pub fn snapshot(&self) -> ViewportSnapshot {
        ViewportSnapshot {
            scale: self.state.scale,
            translation: self.clamped_translation(),
            preview: self.preview,
            frame: self.frame,
        }
    }
}

fn sanitize_factor(factor: f32) -> f32 {
    if factor.is_finite() && factor >= 1.0 {
        factor
    } else {
        log::debug!("Invalid scale factor {factor}, using {DEFAULT_SCALE_FACTOR}");
        DEFAULT_SCALE_FACTOR
    }
}
