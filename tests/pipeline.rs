// SPDX-License-Identifier: GPL-3.0-or-later
// tests/pipeline.rs
//
// End-to-end: files on disk -> preview -> gestures -> full-resolution crop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cropframe::app::view::crop::{Viewport, fit_frame, fit_preview};
use cropframe::domain::sizing::DecodeOptions;
use cropframe::{
    CropError, CropRegion, CropView, CropViewConfig, FsResolver, HeapBudget, ImageSource, MediaItem,
    Orientation, ScaleEvent, Size, Surface, TouchEvent,
};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

const RED: Rgb<u8> = Rgb([255, 0, 0]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// 32x16 image split into red / green (top) and blue / black (bottom) quadrants.
fn quadrants() -> RgbImage {
    RgbImage::from_fn(32, 16, |x, y| match (x < 16, y < 8) {
        (true, true) => RED,
        (false, true) => GREEN,
        (true, false) => BLUE,
        (false, false) => BLACK,
    })
}

/// Baseline JPEG with an EXIF APP1 segment carrying `tag`.
fn jpeg_with_orientation(tag: u16) -> Vec<u8> {
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, 95)
        .encode_image(&quadrants())
        .unwrap();

    let mut app1 = vec![0xFF, 0xE1, 0x00, 34];
    app1.extend_from_slice(b"Exif\0\0");
    app1.extend_from_slice(&[b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08]);
    app1.extend_from_slice(&[0x00, 0x01]);
    app1.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
    app1.extend_from_slice(&tag.to_be_bytes());
    app1.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

    // Right after SOI.
    let mut out = encoded[..2].to_vec();
    out.extend_from_slice(&app1);
    out.extend_from_slice(&encoded[2..]);
    out
}

fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn write_png(dir: &TempDir, name: &str, img: &DynamicImage) -> PathBuf {
    let path = dir.path().join(name);
    img.save_with_format(&path, ImageFormat::Png).unwrap();
    path
}

fn uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

fn dominant(img: &DynamicImage, quadrant: Quadrant) -> Rgb<u8> {
    let (w, h) = img.dimensions();
    let (x, y) = match quadrant {
        Quadrant::TopLeft => (w / 4, h / 4),
        Quadrant::TopRight => (3 * w / 4, h / 4),
        Quadrant::BottomLeft => (w / 4, 3 * h / 4),
        Quadrant::BottomRight => (3 * w / 4, 3 * h / 4),
    };
    let px = img.to_rgb8().get_pixel(x, y).0;
    let snap = |c: u8| if c > 127 { 255 } else { 0 };
    Rgb([snap(px[0]), snap(px[1]), snap(px[2])])
}

#[test]
fn every_exif_tag_comes_out_upright() {
    use Quadrant::*;
    // Where the stored red (top-left) and green (top-right) quadrants land.
    let expected = [
        (1, TopLeft, TopRight),
        (2, TopRight, TopLeft),
        (3, BottomRight, BottomLeft),
        (4, BottomLeft, BottomRight),
        (5, TopLeft, BottomLeft),
        (6, TopRight, BottomRight),
        (7, BottomRight, TopRight),
        (8, BottomLeft, TopLeft),
    ];

    let dir = TempDir::new().unwrap();
    let budget = HeapBudget::new(64 * 1024 * 1024);
    for (tag, red_at, green_at) in expected {
        let path = write(&dir, &format!("tag{tag}.jpg"), &jpeg_with_orientation(tag));
        let source = ImageSource::content(uri(&path), Arc::new(FsResolver::default()));

        let orientation = source.orientation();
        assert_eq!(orientation.to_exif(), u32::from(tag));

        let preview = source.preview_bitmap(64, 64, &budget).unwrap();
        let expected_dims = if orientation.swaps_axes() { (16, 32) } else { (32, 16) };
        assert_eq!(preview.dimensions(), expected_dims, "tag {tag}");
        assert_eq!(dominant(&preview, red_at), RED, "tag {tag}");
        assert_eq!(dominant(&preview, green_at), GREEN, "tag {tag}");
    }
}

#[test]
fn crop_of_rotated_jpeg_is_upright() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "rot90.jpg", &jpeg_with_orientation(6));

    let config = CropViewConfig {
        frame_ratio: "1:2".into(),
        frame_margin: 0.0,
        ..CropViewConfig::default()
    };
    let mut view = CropView::new(config, Arc::new(FsResolver::default()));
    view.on_bounds_changed(100.0, 200.0);
    view.set_image_uri(&uri(&path));
    assert!(view.load_preview());

    // Frame matches the upright 16x32 picture, so the whole stored image is decoded.
    assert_eq!(
        view.crop_region().unwrap().map(|r| r.as_tuple()),
        Some((0, 0, 32, 16))
    );
    let cropped = view.crop().unwrap().unwrap();
    assert_eq!(cropped.dimensions(), (16, 32));
    assert_eq!(dominant(&cropped, Quadrant::TopRight), RED);
    assert_eq!(dominant(&cropped, Quadrant::BottomRight), GREEN);
    assert_eq!(dominant(&cropped, Quadrant::TopLeft), BLUE);
}

#[test]
fn pan_and_zoom_select_the_matching_pixels() {
    let dir = TempDir::new().unwrap();
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(800, 400, |x, y| {
        Rgb([(x / 4) as u8, (y / 2) as u8, 0])
    }));
    let path = write_png(&dir, "gradient.png", &img);

    let config = CropViewConfig {
        frame_margin: 0.0,
        ..CropViewConfig::default()
    };
    let mut view = CropView::new(config, Arc::new(FsResolver::default()));
    view.on_bounds_changed(200.0, 200.0);
    view.set_image_uri(&uri(&path));
    assert!(view.load_preview());

    // 800x400 shown as 200x100; min scale 2, so the frame covers 100x100 preview px.
    assert_eq!(view.viewport().preview(), Size::new(200.0, 100.0));
    assert_eq!(view.viewport().min_scale(), 2.0);

    view.on_scale(ScaleEvent::Begin);
    view.on_scale(ScaleEvent::Update(2.0));
    view.on_scale(ScaleEvent::End);
    view.on_touch(TouchEvent::Down(cropframe::Point::new(100.0, 100.0)));
    view.on_touch(TouchEvent::Move(cropframe::Point::new(200.0, 100.0)));
    view.on_touch(TouchEvent::Up);

    // Scale 4: frame spans 50 preview px = 200 source px. Image moved right by
    // 100 view px = 25 preview px, so the frame looks 100 source px left of center.
    let region = view.crop_region().unwrap().unwrap();
    assert_eq!(region.as_tuple(), (200, 100, 200, 200));

    let cropped = view.crop().unwrap().unwrap().to_rgb8();
    assert_eq!(cropped.dimensions(), (200, 200));
    assert_eq!(cropped.get_pixel(0, 0).0, [50, 50, 0]);
}

#[test]
fn vanished_file_is_fatal_on_crop() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir, "gone.png", &DynamicImage::ImageRgb8(quadrants()));

    let mut view = CropView::new(CropViewConfig::default(), Arc::new(FsResolver::default()));
    view.on_bounds_changed(300.0, 300.0);
    view.set_image_uri(&uri(&path));
    assert!(view.load_preview());

    std::fs::remove_file(&path).unwrap();
    let err = view.crop().unwrap_err();
    assert!(matches!(err, CropError::SourceUnavailable(_)), "{err:?}");
}

#[test]
fn missing_file_never_shows_a_preview() {
    let dir = TempDir::new().unwrap();
    let mut view = CropView::new(CropViewConfig::default(), Arc::new(FsResolver::default()));
    view.on_bounds_changed(300.0, 300.0);
    view.set_image_uri(&uri(&dir.path().join("nope.png")));
    assert!(!view.load_preview());
    assert!(!view.has_preview());
    assert!(matches!(view.crop(), Ok(None)));
}

#[test]
fn tight_memory_budget_is_a_recoverable_crop_failure() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir, "big.png", &DynamicImage::ImageRgb8(quadrants()));

    let mut view = CropView::new(CropViewConfig::default(), Arc::new(FsResolver::default()));
    view.on_bounds_changed(300.0, 300.0);
    view.set_image_uri(&uri(&path));
    assert!(view.load_preview());

    let starved = HeapBudget::new(0);
    assert!(matches!(view.crop_with(&starved), Ok(None)));
    assert!(view.crop().unwrap().is_some());
}

#[test]
fn tight_memory_still_decodes_what_fits() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir, "tight.png", &DynamicImage::ImageRgb8(quadrants()));
    let source = ImageSource::content(uri(&path), Arc::new(FsResolver::default()));
    // Full bitmap is 2048 bytes, one quadrant 512.
    let budget = HeapBudget::new(1024);

    let cropped = source
        .cropped_bitmap(CropRegion::new(16, 0, 16, 8), &budget)
        .unwrap();
    assert_eq!(cropped.dimensions(), (16, 8));
    assert_eq!(dominant(&cropped, Quadrant::TopLeft), GREEN);
    assert_eq!(dominant(&cropped, Quadrant::BottomRight), GREEN);

    let preview = source.preview_bitmap(32, 16, &budget).unwrap();
    assert_eq!(preview.dimensions(), (16, 8));
    assert_eq!(dominant(&preview, Quadrant::BottomLeft), BLUE);
    assert_eq!(dominant(&preview, Quadrant::TopRight), GREEN);
}

#[test]
fn tight_memory_scales_jpeg_regions_down() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "tight.jpg", &jpeg_with_orientation(1));
    let source = ImageSource::content(uri(&path), Arc::new(FsResolver::default()));

    let roomy = source
        .cropped_bitmap(CropRegion::new(16, 0, 16, 8), &HeapBudget::new(1 << 20))
        .unwrap();
    assert_eq!(roomy.dimensions(), (16, 8));

    // The full frame does not fit next to the region, a half-scale frame does.
    let cropped = source
        .cropped_bitmap(CropRegion::new(16, 0, 16, 8), &HeapBudget::new(1024))
        .unwrap();
    assert_eq!(cropped.dimensions(), (8, 4));
    assert_eq!(dominant(&cropped, Quadrant::TopLeft), GREEN);
}

#[test]
fn store_orientation_wins_for_media_items() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir, "store.png", &DynamicImage::ImageRgb8(quadrants()));
    let media = MediaItem {
        id: 42,
        display_name: "store.png".into(),
        mime_type: "image/png".into(),
        size: 0,
        width: 32,
        height: 16,
        orientation: 270,
        date_modified: 0,
        folder_id: 1,
        folder_name: "tmp".into(),
        content_ref: uri(&path),
    };
    let resolver =
        FsResolver::default().with_content_orientation(media.content_ref.clone(), media.orientation);

    let source = media.image_source(Arc::new(resolver));
    assert_eq!(source.orientation(), Orientation::Rotate270);
    assert_eq!(source.display_dimensions().unwrap(), media.display_dimensions());

    let preview = source
        .preview_bitmap(64, 64, &HeapBudget::new(1 << 20))
        .unwrap();
    assert_eq!(preview.dimensions(), (16, 32));
    assert_eq!(dominant(&preview, Quadrant::BottomLeft), RED);
}

#[test]
fn assets_resolve_under_their_root() {
    let dir = TempDir::new().unwrap();
    write_png(&dir, "asset.png", &DynamicImage::ImageRgb8(quadrants()));

    let mut view = CropView::new(CropViewConfig::default(), Arc::new(FsResolver::new(dir.path())));
    view.on_bounds_changed(300.0, 300.0);
    view.set_image_asset("asset.png");
    assert!(view.load_preview());

    view.set_image_asset("../asset.png");
    assert!(!view.load_preview());
}

#[test]
fn large_photo_on_square_view() {
    // 4000x3000 source, 1:1 frame in a 1080x1080 view with margin 100.
    let frame = fit_frame(Size::new(1080.0, 1080.0), 1.0, 100.0).unwrap();
    assert_eq!(frame.size(), Size::new(880.0, 880.0));

    let options = DecodeOptions::for_preview((4000, 3000), 1080, 1080, &HeapBudget::new(256 << 20));
    assert_eq!(options.subsample, 2);
    let decoded = options.output_size(4000, 3000);
    assert_eq!(decoded, (2000, 1500));

    let preview = fit_preview(decoded, Size::new(1080.0, 1080.0));
    assert!((preview.width - 1080.0).abs() < 0.01);
    assert!((preview.height - 810.0).abs() < 0.01);

    let mut viewport = Viewport::default();
    viewport.recompute(preview, frame.size());
    let expected = (880.0 / preview.width).max(880.0 / preview.height);
    assert_eq!(viewport.min_scale(), expected);
    assert_eq!(viewport.max_scale(), expected * 4.0);
}
