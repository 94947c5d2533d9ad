// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/model.rs
//
// Crop view state: the facade hosts talk to.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::DynamicImage;

use crate::app::message::{ScaleEvent, TouchEvent};
use crate::app::view::canvas::{Canvas, Color, Surface};
use crate::app::view::crop::{
    CropOverlay, FrameShape, InteractionMode, PositionCorrection, Viewport, fit_preview,
};
use crate::config::CropViewConfig;
use crate::domain::geometry::{Point, Rect, Size};
use crate::domain::mapper;
use crate::domain::region::CropRegion;
use crate::domain::sizing::{HeapBudget, MemoryProbe, estimated_bytes};
use crate::domain::source::{ImageSource, SourceResolver};
use crate::error::{CropError, DecodeError, DecodeResult};

// =============================================================================
// Loading
// =============================================================================

/// Identifies one image selection. Results carrying an older ticket are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

/// Everything a worker needs to decode a preview off the UI thread.
#[derive(Debug, Clone)]
pub struct PreviewRequest {
    ticket: LoadTicket,
    source: Arc<ImageSource>,
    max_width: u32,
    max_height: u32,
    memory: HeapBudget,
}

impl PreviewRequest {
    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// Decode the preview. Blocking: file I/O plus CPU-bound decode.
    pub fn run(self) -> PreviewOutcome {
        let result = self
            .source
            .preview_bitmap(self.max_width, self.max_height, &self.memory);
        PreviewOutcome {
            ticket: self.ticket,
            result,
        }
    }
}

/// A decoded (or failed) preview, ready to hand back to the view.
#[derive(Debug)]
pub struct PreviewOutcome {
    pub ticket: LoadTicket,
    pub result: DecodeResult<DynamicImage>,
}

// =============================================================================
// Model
// =============================================================================

type LoadedCallback = Box<dyn FnMut() + Send>;

/// Crop widget core.
///
/// Owns the configuration and pushes every change into the overlay and the
/// viewport. Events, painting and preview application belong on the UI
/// thread; only [`PreviewRequest::run`] is meant for a worker.
pub struct CropView {
    config: CropViewConfig,
    resolver: Arc<dyn SourceResolver>,
    memory: HeapBudget,
    overlay: CropOverlay,
    viewport: Viewport,
    bounds: Size,

    source: Option<Arc<ImageSource>>,
    generation: u64,
    preview: Option<DynamicImage>,
    preview_charge: u64,

    correction: Option<PositionCorrection>,
    on_image_loaded: Option<LoadedCallback>,
    redraw: bool,
}

impl fmt::Debug for CropView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CropView")
            .field("config", &self.config)
            .field("bounds", &self.bounds)
            .field("source", &self.source)
            .field("generation", &self.generation)
            .field("viewport", &self.viewport.state())
            .field("has_preview", &self.preview.is_some())
            .finish_non_exhaustive()
    }
}

impl CropView {
    pub fn new(config: CropViewConfig, resolver: Arc<dyn SourceResolver>) -> Self {
        let memory = HeapBudget::new(config.heap_budget_bytes);
        Self {
            overlay: CropOverlay::new(config.frame_geometry(), config.overlay_style()),
            viewport: Viewport::new(config.scale_factor),
            config,
            resolver,
            memory,
            bounds: Size::default(),
            source: None,
            generation: 0,
            preview: None,
            preview_charge: 0,
            correction: None,
            on_image_loaded: None,
            redraw: false,
        }
    }

    /// Share a heap budget with other consumers in the process.
    #[must_use]
    pub fn with_memory(mut self, memory: HeapBudget) -> Self {
        self.memory.release(self.preview_charge);
        memory.charge(self.preview_charge);
        self.memory = memory;
        self
    }

    pub fn memory(&self) -> &HeapBudget {
        &self.memory
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    pub fn config(&self) -> &CropViewConfig {
        &self.config
    }

    /// Replace the whole configuration.
    pub fn set_config(&mut self, config: CropViewConfig) {
        self.config = config;
        self.apply_config();
    }

    fn update_config(&mut self, change: impl FnOnce(&mut CropViewConfig)) {
        change(&mut self.config);
        self.apply_config();
    }

    /// Only frame moves and zoom-limit changes touch the viewport; style
    /// changes keep the current pan/zoom.
    fn apply_config(&mut self) {
        self.overlay.set_style(self.config.overlay_style());
        let frame_moved = self.overlay.set_geometry(self.config.frame_geometry());

        if self.viewport.scale_factor() != self.config.scale_factor {
            self.correction = None;
            self.viewport.set_scale_factor(self.config.scale_factor);
        }
        if frame_moved {
            self.correction = None;
            self.relayout();
        }
        self.redraw = true;
    }

    pub fn set_frame_color(&mut self, color: Color) {
        self.update_config(|c| c.frame_color = color);
    }

    pub fn set_frame_margin(&mut self, margin: f32) {
        self.update_config(|c| c.frame_margin = margin);
    }

    /// Aspect ratio as `"W:H"`; unparsable strings mean 1:1.
    pub fn set_frame_ratio(&mut self, ratio: &str) {
        self.update_config(|c| c.frame_ratio = ratio.to_string());
    }

    pub fn set_frame_shape(&mut self, shape: FrameShape) {
        self.update_config(|c| c.frame_shape = shape);
    }

    pub fn set_frame_thickness(&mut self, thickness: f32) {
        self.update_config(|c| c.frame_thickness = thickness);
    }

    pub fn set_grid_color(&mut self, color: Color) {
        self.update_config(|c| c.grid_color = color);
    }

    pub fn set_grid_rows(&mut self, rows: u32) {
        self.update_config(|c| c.grid_rows = rows);
    }

    pub fn set_grid_thickness(&mut self, thickness: f32) {
        self.update_config(|c| c.grid_thickness = thickness);
    }

    pub fn set_overlay_color(&mut self, color: Color) {
        self.update_config(|c| c.overlay_color = color);
    }

    pub fn set_grid_enabled(&mut self, enabled: bool) {
        self.update_config(|c| c.grid_enabled = enabled);
    }

    /// Max zoom as a multiple of the minimum zoom.
    pub fn set_scale_factor(&mut self, factor: f32) {
        self.update_config(|c| c.scale_factor = factor);
    }

    pub fn overlay(&self) -> &CropOverlay {
        &self.overlay
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    // -------------------------------------------------------------------------
    // Image selection
    // -------------------------------------------------------------------------

    pub fn set_image_asset(&mut self, name: &str) -> LoadTicket {
        let source = ImageSource::asset(name, Arc::clone(&self.resolver));
        self.set_image_source(source)
    }

    pub fn set_image_uri(&mut self, uri: &str) -> LoadTicket {
        let source = ImageSource::content(uri, Arc::clone(&self.resolver));
        self.set_image_source(source)
    }

    pub fn set_image_resource(&mut self, id: u32) -> LoadTicket {
        let source = ImageSource::resource(id, Arc::clone(&self.resolver));
        self.set_image_source(source)
    }

    /// Select an image; the previous selection and its preview are dropped.
    pub fn set_image_source(&mut self, source: ImageSource) -> LoadTicket {
        self.generation += 1;
        log::debug!("Image source {} (load #{})", source.kind(), self.generation);

        self.source = Some(Arc::new(source));
        self.drop_preview();
        self.correction = None;
        self.viewport.touch_up();
        self.overlay.set_show_grid(false);
        self.relayout();
        self.viewport.reset();
        self.redraw = true;

        LoadTicket(self.generation)
    }

    pub fn source(&self) -> Option<&ImageSource> {
        self.source.as_deref()
    }

    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }

    pub fn preview(&self) -> Option<&DynamicImage> {
        self.preview.as_ref()
    }

    /// Fired after each successfully applied preview.
    pub fn set_on_image_loaded(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_image_loaded = Some(Box::new(callback));
    }

    /// Decode job for the current selection, sized to the view.
    ///
    /// `None` until a source is set and the view has been laid out.
    pub fn preview_request(&self) -> Option<PreviewRequest> {
        let source = self.source.as_ref()?;
        if self.bounds.is_empty() {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (max_width, max_height) = (self.bounds.width.ceil() as u32, self.bounds.height.ceil() as u32);
        Some(PreviewRequest {
            ticket: LoadTicket(self.generation),
            source: Arc::clone(source),
            max_width,
            max_height,
            memory: self.memory.clone(),
        })
    }

    /// Install a decoded preview. Returns whether it was applied.
    ///
    /// Outcomes for a superseded selection are dropped. A failed decode leaves
    /// the view in its pre-load state and does not fire the callback.
    pub fn apply_preview(&mut self, outcome: PreviewOutcome) -> bool {
        if outcome.ticket != LoadTicket(self.generation) {
            log::debug!("Discarding stale preview {:?}", outcome.ticket);
            return false;
        }

        let preview = match outcome.result {
            Ok(preview) => preview,
            Err(e) => {
                log::warn!("Preview decode failed: {e}");
                return false;
            }
        };

        self.drop_preview();
        self.preview_charge = estimated_bytes(preview.width(), preview.height());
        self.memory.charge(self.preview_charge);
        log::debug!("Preview {}x{} applied", preview.width(), preview.height());
        self.preview = Some(preview);

        self.relayout();
        self.viewport.reset();
        self.redraw = true;

        if let Some(callback) = self.on_image_loaded.as_mut() {
            callback();
        }
        true
    }

    /// Decode and apply the preview on the calling thread.
    pub fn load_preview(&mut self) -> bool {
        match self.preview_request() {
            Some(request) => {
                let outcome = request.run();
                self.apply_preview(outcome)
            }
            None => false,
        }
    }

    fn drop_preview(&mut self) {
        if self.preview.take().is_some() {
            self.memory.release(self.preview_charge);
        }
        self.preview_charge = 0;
    }

    /// Push bounds, frame and preview sizes into the viewport.
    fn relayout(&mut self) {
        let frame = self
            .overlay
            .frame_rect()
            .map(|rect| rect.size())
            .unwrap_or_default();
        let preview = self
            .preview
            .as_ref()
            .map(|img| fit_preview((img.width(), img.height()), self.bounds))
            .unwrap_or_default();
        self.viewport.recompute(preview, frame);
        self.redraw = true;
    }

    // -------------------------------------------------------------------------
    // Gestures
    // -------------------------------------------------------------------------

    pub fn on_touch(&mut self, event: TouchEvent) {
        match event {
            TouchEvent::Down(point) => {
                self.correction = None;
                if self.viewport.touch_down(point) {
                    self.overlay.set_show_grid(self.config.grid_enabled);
                    self.redraw = true;
                }
            }
            TouchEvent::Move(point) => {
                if self.viewport.mode() == InteractionMode::Dragging {
                    self.viewport.touch_move(point);
                    self.redraw = true;
                }
            }
            TouchEvent::Up | TouchEvent::Cancel => {
                let ended = self.viewport.touch_up();
                self.end_gesture(ended);
            }
        }
    }

    pub fn on_scale(&mut self, event: ScaleEvent) {
        match event {
            ScaleEvent::Begin => {
                self.correction = None;
                self.viewport.scale_begin();
                self.overlay.set_show_grid(false);
            }
            ScaleEvent::Update(factor) => self.viewport.scale_update(factor),
            ScaleEvent::End => {
                let ended = self.viewport.scale_end();
                self.end_gesture(ended);
                return;
            }
        }
        self.redraw = true;
    }

    fn end_gesture(&mut self, ended: InteractionMode) {
        if ended == InteractionMode::Idle {
            return;
        }
        self.overlay.set_show_grid(false);
        self.redraw = true;

        if self.viewport.needs_correction() {
            self.correction = Some(PositionCorrection::new(
                self.viewport.translation(),
                self.viewport.clamped_translation(),
                Instant::now(),
                Duration::from_millis(self.config.correction_duration_ms),
            ));
        }
    }

    pub fn is_animating(&self) -> bool {
        self.correction.is_some()
    }

    /// Advance the position correction. Returns whether another frame is needed.
    pub fn on_frame(&mut self, now: Instant) -> bool {
        let Some(correction) = self.correction else {
            return false;
        };
        self.viewport.set_translation(correction.value_at(now));
        self.redraw = true;

        if correction.is_finished(now) {
            self.correction = None;
            return false;
        }
        true
    }

    /// Jump straight to the end of a running correction.
    pub fn finish_animation(&mut self) {
        if let Some(correction) = self.correction.take() {
            self.viewport.set_translation(correction.target());
            self.redraw = true;
        }
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    pub fn needs_redraw(&self) -> bool {
        self.redraw
    }

    /// Read and clear the redraw flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    /// Where the host draws the preview bitmap, in view coordinates.
    pub fn image_placement(&self) -> Option<Rect> {
        self.preview.as_ref()?;
        let center = Point::new(self.bounds.width / 2.0, self.bounds.height / 2.0);
        Some(self.viewport.image_rect(center))
    }

    // -------------------------------------------------------------------------
    // Cropping
    // -------------------------------------------------------------------------

    /// Source-pixel rectangle (pre-rotation) under the frame right now.
    ///
    /// `Ok(None)` while no preview is shown or the bounds cannot be read.
    pub fn crop_region(&self) -> Result<Option<CropRegion>, CropError> {
        let Some(source) = self.source.as_ref() else {
            log::error!("crop requested before an image source was set");
            return Err(CropError::NoSource);
        };
        if self.preview.is_none() || !self.viewport.is_ready() {
            log::warn!("Nothing to crop: no preview of {} is shown", source.kind());
            return Ok(None);
        }

        let bounds = match source.decode_bounds() {
            Ok(bounds) => bounds,
            Err(e) => return recoverable(e).map(|()| None),
        };

        Ok(mapper::source_crop_region(
            source.orientation(),
            (bounds.width, bounds.height),
            &self.viewport.snapshot(),
        ))
    }

    /// Crop the source at full resolution to what the frame shows.
    ///
    /// `Ok(None)` when nothing is loaded or the decode fails in a way the
    /// caller may retry. `Err` for cropping without a source or a source
    /// that can no longer be opened.
    pub fn crop(&self) -> Result<Option<DynamicImage>, CropError> {
        self.crop_with(&self.memory)
    }

    /// [`CropView::crop`] against a caller-supplied memory probe.
    pub fn crop_with(&self, probe: &dyn MemoryProbe) -> Result<Option<DynamicImage>, CropError> {
        let Some(region) = self.crop_region()? else {
            return Ok(None);
        };
        let Some(source) = self.source.as_ref() else {
            return Err(CropError::NoSource);
        };

        match source.cropped_bitmap(region, probe) {
            Ok(bitmap) => {
                log::info!(
                    "Cropped {} to {}x{}",
                    source.kind(),
                    bitmap.width(),
                    bitmap.height()
                );
                Ok(Some(bitmap))
            }
            Err(e) => recoverable(e).map(|()| None),
        }
    }
}

/// Log a recoverable decode failure, escalate the rest.
fn recoverable(err: DecodeError) -> Result<(), CropError> {
    if err.is_recoverable() {
        log::warn!("Crop failed: {err}");
        Ok(())
    } else {
        log::error!("Image source unavailable: {err}");
        Err(CropError::SourceUnavailable(err))
    }
}

impl Surface for CropView {
    fn on_bounds_changed(&mut self, width: f32, height: f32) {
        let bounds = Size::new(width.max(0.0), height.max(0.0));
        if bounds == self.bounds {
            return;
        }
        self.bounds = bounds;
        if self.overlay.set_bounds(bounds) {
            self.correction = None;
        }
        self.relayout();
    }

    fn on_paint(&mut self, canvas: &mut dyn Canvas) {
        self.overlay.paint(canvas);
        self.redraw = false;
    }
}

impl Drop for CropView {
    fn drop(&mut self) {
        self.drop_preview();
    }
}
