// SPDX-License-Identifier: GPL-3.0-or-later
// src/main.rs
//
// Command-line front end: crop one image through the crop view pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;

use cropframe::{
    CropView, CropViewConfig, FrameShape, FsResolver, Point, ScaleEvent, Surface, TouchEvent,
};

#[derive(Parser, Debug)]
#[command(name = "cropframe", version, about = "Crop an image the way the crop view would")]
struct Args {
    /// Image to crop
    input: PathBuf,

    /// Frame aspect ratio as W:H
    #[arg(long)]
    ratio: Option<String>,

    /// Frame shape: rectangle or oval
    #[arg(long)]
    shape: Option<FrameShape>,

    /// View size as WxH
    #[arg(long, value_parser = parse_view, default_value = "1080x1080")]
    view: (f32, f32),

    /// Frame margin in pixels
    #[arg(long)]
    margin: Option<f32>,

    /// Zoom relative to the minimum zoom
    #[arg(long, default_value_t = 1.0)]
    zoom: f32,

    /// Pan in view pixels as X,Y
    #[arg(long, value_parser = parse_pan, allow_hyphen_values = true)]
    pan: Option<(f32, f32)>,

    /// Output path (default: <input stem>_cropped.png next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (default: platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the source-space crop rectangle and exit
    #[arg(long)]
    dry_run: bool,
}

fn parse_pair(value: &str, separator: char) -> Result<(f32, f32), String> {
    let (a, b) = value
        .split_once(separator)
        .ok_or_else(|| format!("expected two numbers separated by '{separator}'"))?;
    let a = a.trim().parse::<f32>().map_err(|e| e.to_string())?;
    let b = b.trim().parse::<f32>().map_err(|e| e.to_string())?;
    Ok((a, b))
}

fn parse_view(value: &str) -> Result<(f32, f32), String> {
    let (w, h) = parse_pair(value, 'x')?;
    if w <= 0.0 || h <= 0.0 {
        return Err("view size must be positive".into());
    }
    Ok((w, h))
}

fn parse_pan(value: &str) -> Result<(f32, f32), String> {
    parse_pair(value, ',')
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{stem}_cropped.png"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = CropViewConfig::load_or_default(args.config.as_deref())?;
    if let Some(ratio) = args.ratio {
        config.frame_ratio = ratio;
    }
    if let Some(shape) = args.shape {
        config.frame_shape = shape;
    }
    if let Some(margin) = args.margin {
        config.frame_margin = margin;
    }

    let mut view = CropView::new(config, Arc::new(FsResolver::default()));
    let (width, height) = args.view;
    view.on_bounds_changed(width, height);

    view.set_image_uri(&args.input.to_string_lossy());
    if !view.load_preview() {
        bail!("failed to load a preview of {}", args.input.display());
    }

    if (args.zoom - 1.0).abs() > f32::EPSILON {
        view.on_scale(ScaleEvent::Begin);
        view.on_scale(ScaleEvent::Update(args.zoom));
        view.on_scale(ScaleEvent::End);
        view.finish_animation();
    }

    if let Some((dx, dy)) = args.pan {
        let center = Point::new(width / 2.0, height / 2.0);
        view.on_touch(TouchEvent::Down(center));
        view.on_touch(TouchEvent::Move(Point::new(center.x + dx, center.y + dy)));
        view.on_touch(TouchEvent::Up);
        view.finish_animation();
    }

    let region = view
        .crop_region()?
        .ok_or_else(|| anyhow!("nothing to crop in {}", args.input.display()))?;
    log::info!(
        "Frame covers {}x{} at ({}, {}) of the stored image",
        region.width,
        region.height,
        region.x,
        region.y
    );

    if args.dry_run {
        println!("{} {} {} {}", region.x, region.y, region.width, region.height);
        return Ok(());
    }

    let bitmap = view
        .crop()?
        .ok_or_else(|| anyhow!("failed to crop {}", args.input.display()))?;

    let output = args.output.unwrap_or_else(|| default_output(&args.input));
    bitmap
        .save(&output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    log::info!(
        "Saved {}x{} crop to {}",
        bitmap.width(),
        bitmap.height(),
        output.display()
    );

    Ok(())
}
