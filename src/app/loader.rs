// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/loader.rs
//
// Background preview decoding on the tokio blocking pool.

use crate::app::model::{PreviewOutcome, PreviewRequest};
use crate::error::DecodeError;

/// Decode a preview on a blocking worker.
///
/// The outcome keeps its ticket; hand it to `CropView::apply_preview` on the
/// UI thread, which drops it if another image was selected meanwhile.
pub async fn load_preview(request: PreviewRequest) -> PreviewOutcome {
    let ticket = request.ticket();
    tokio::task::spawn_blocking(move || request.run())
        .await
        .unwrap_or_else(|e| {
            log::error!("Preview worker failed: {e}");
            PreviewOutcome {
                ticket,
                result: Err(DecodeError::Interrupted(e.to_string())),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CropView;
    use crate::app::view::canvas::Surface;
    use crate::config::CropViewConfig;
    use crate::domain::source::FsResolver;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;
    use std::sync::Arc;

    fn png() -> &'static [u8] {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(RgbaImage::new(64, 32))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        Box::leak(buf.into_inner().into_boxed_slice())
    }

    #[tokio::test]
    async fn background_preview_applies_on_return() {
        let resolver = FsResolver::default().with_embedded_resource(3, png());
        let mut view = CropView::new(CropViewConfig::default(), Arc::new(resolver));
        view.on_bounds_changed(100.0, 100.0);
        view.set_image_resource(3);

        let outcome = load_preview(view.preview_request().unwrap()).await;
        assert!(outcome.result.is_ok());
        assert!(view.apply_preview(outcome));
        assert!(view.has_preview());
    }

    #[tokio::test]
    async fn superseded_background_preview_is_dropped() {
        let resolver = FsResolver::default().with_embedded_resource(3, png());
        let mut view = CropView::new(CropViewConfig::default(), Arc::new(resolver));
        view.on_bounds_changed(100.0, 100.0);
        view.set_image_resource(3);

        let pending = tokio::spawn(load_preview(view.preview_request().unwrap()));
        view.set_image_resource(3);
        let outcome = pending.await.unwrap();
        assert!(!view.apply_preview(outcome));
        assert!(!view.has_preview());
    }
}
