// SPDX-License-Identifier: GPL-3.0-or-later
// src/config.rs
//
// Configuration of the crop view, loadable from a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::app::view::canvas::Color;
use crate::app::view::crop::{FrameGeometry, FrameShape, OverlayStyle, parse_ratio};
use crate::constant::{
    CONFIG_DIR, CONFIG_FILE, CORRECTION_DURATION_MS, DEFAULT_FRAME_MARGIN,
    DEFAULT_FRAME_THICKNESS, DEFAULT_GRID_ROWS, DEFAULT_GRID_THICKNESS, DEFAULT_HEAP_BUDGET,
    DEFAULT_SCALE_FACTOR,
};

/// Every host-facing property of the crop view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CropViewConfig {
    pub frame_color: Color,
    /// Distance between the view edge and the frame, pixels.
    pub frame_margin: f32,
    /// Aspect ratio as `"W:H"`; unparsable values mean 1:1.
    pub frame_ratio: String,
    pub frame_shape: FrameShape,
    pub frame_thickness: f32,
    pub grid_color: Color,
    /// Rows (and columns) of the alignment grid.
    pub grid_rows: u32,
    pub grid_thickness: f32,
    pub overlay_color: Color,
    /// Show the grid while the image is dragged.
    pub grid_enabled: bool,
    /// Max zoom as a multiple of the minimum zoom.
    pub scale_factor: f32,
    /// Memory budget of the bundled heap probe.
    pub heap_budget_bytes: u64,
    /// Duration of the slide back into bounds after a gesture.
    pub correction_duration_ms: u64,
}

impl Default for CropViewConfig {
    fn default() -> Self {
        Self {
            frame_color: Color::WHITE,
            frame_margin: DEFAULT_FRAME_MARGIN,
            frame_ratio: "1:1".to_string(),
            frame_shape: FrameShape::Rectangle,
            frame_thickness: DEFAULT_FRAME_THICKNESS,
            grid_color: Color::WHITE,
            grid_rows: DEFAULT_GRID_ROWS,
            grid_thickness: DEFAULT_GRID_THICKNESS,
            overlay_color: Color(0xCC00_0000),
            grid_enabled: false,
            scale_factor: DEFAULT_SCALE_FACTOR,
            heap_budget_bytes: DEFAULT_HEAP_BUDGET,
            correction_duration_ms: CORRECTION_DURATION_MS,
        }
    }
}

impl CropViewConfig {
    /// Platform location: `<config dir>/cropframe/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, else the platform file if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn frame_geometry(&self) -> FrameGeometry {
        FrameGeometry {
            shape: self.frame_shape,
            ratio: parse_ratio(&self.frame_ratio),
            margin: self.frame_margin,
            grid_rows: self.grid_rows,
        }
        .sanitized()
    }

    pub fn overlay_style(&self) -> OverlayStyle {
        OverlayStyle {
            overlay_color: self.overlay_color,
            frame_color: self.frame_color,
            frame_thickness: self.frame_thickness,
            grid_color: self.grid_color,
            grid_thickness: self.grid_thickness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: CropViewConfig =
            serde_json::from_str(r##"{ "frame_ratio": "16:9", "frame_shape": "oval", "overlay_color": "#80000000" }"##)
                .unwrap();
        assert_eq!(config.frame_shape, FrameShape::Oval);
        assert_eq!(config.overlay_color, Color(0x8000_0000));
        assert_eq!(config.grid_rows, 3);
        assert_eq!(config.scale_factor, 4.0);
        assert!((config.frame_geometry().ratio - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn bad_color_is_rejected() {
        let parsed = serde_json::from_str::<CropViewConfig>(r#"{ "frame_color": "white" }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn bad_ratio_falls_back() {
        let config = CropViewConfig {
            frame_ratio: "wide".into(),
            ..CropViewConfig::default()
        };
        assert_eq!(config.frame_geometry().ratio, 1.0);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = CropViewConfig {
            grid_enabled: true,
            frame_margin: 40.0,
            ..CropViewConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(CropViewConfig::load(&path).unwrap(), config);
        assert!(CropViewConfig::load(&dir.path().join("missing.json")).is_err());
    }
}
