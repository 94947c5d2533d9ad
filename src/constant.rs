// SPDX-License-Identifier: GPL-3.0-or-later
// src/constant.rs
//
// Crate constants that should not be changed by the host.

/// Bytes per decoded pixel (ARGB_8888 / RGBA8).
pub const BYTES_PER_PIXEL: u64 = 4;

/// Preview decode keeps at least this multiple of the larger target dimension.
pub const PREVIEW_OVERSAMPLE: u32 = 2;

/// Upper bound for the sub-sample factor (keeps the doubling loop finite).
pub const MAX_SUBSAMPLE: u32 = 1 << 30;

/// Default max-zoom multiplier (`max_scale = min_scale * factor`).
pub const DEFAULT_SCALE_FACTOR: f32 = 4.0;

/// Default grid rows/columns.
pub const DEFAULT_GRID_ROWS: u32 = 3;

/// Default frame margin in pixels.
pub const DEFAULT_FRAME_MARGIN: f32 = 16.0;

/// Default frame stroke thickness in pixels.
pub const DEFAULT_FRAME_THICKNESS: f32 = 1.0;

/// Default grid stroke thickness in pixels.
pub const DEFAULT_GRID_THICKNESS: f32 = 0.5;

/// Duration of the position-correction animation in milliseconds.
pub const CORRECTION_DURATION_MS: u64 = 200;

/// Default heap budget used by the bundled memory probe (256 MiB).
pub const DEFAULT_HEAP_BUDGET: u64 = 256 * 1024 * 1024;

/// Tolerance for translation comparisons.
pub const OFFSET_EPSILON: f32 = 0.01;

/// Config directory name under the platform config dir.
pub const CONFIG_DIR: &str = "cropframe";

/// Config file name.
pub const CONFIG_FILE: &str = "config.json";
