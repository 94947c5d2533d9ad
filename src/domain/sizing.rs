// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/sizing.rs
//
// Adaptive decode sizing: memory probes and power-of-two sub-sampling.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::constant::{BYTES_PER_PIXEL, MAX_SUBSAMPLE, PREVIEW_OVERSAMPLE};

/// Source of the "how much memory may the next decode use" snapshot.
///
/// Sampled on every decode call; the value is best-effort and may race with
/// allocations elsewhere in the process.
pub trait MemoryProbe: Send + Sync {
    fn available_bytes(&self) -> u64;
}

/// Fixed heap budget minus the bytes currently charged against it.
///
/// Clones share the same counter, so the view and background loaders see the
/// same headroom.
#[derive(Debug, Clone)]
pub struct HeapBudget {
    budget: u64,
    in_use: Arc<AtomicU64>,
}

impl HeapBudget {
    pub fn new(budget: u64) -> Self {
        Self {
            budget,
            in_use: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn in_use(&self) -> u64 {
        self.in_use.load(Ordering::Relaxed)
    }

    /// Record `bytes` as held (e.g. a preview bitmap kept on screen).
    pub fn charge(&self, bytes: u64) {
        self.in_use.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Give back bytes previously charged.
    pub fn release(&self, bytes: u64) {
        let _ = self
            .in_use
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |held| {
                Some(held.saturating_sub(bytes))
            });
    }
}

impl MemoryProbe for HeapBudget {
    fn available_bytes(&self) -> u64 {
        self.budget.saturating_sub(self.in_use())
    }
}

/// Estimated size of a decoded `width` x `height` bitmap.
pub fn estimated_bytes(width: u32, height: u32) -> u64 {
    u64::from(width) * u64::from(height) * BYTES_PER_PIXEL
}

/// Smallest power-of-two sub-sample factor such that
///
/// - the larger source dimension divided by the factor is at most twice the
///   larger target dimension, and
/// - the decoded size divided by the factor squared fits in `available` bytes.
///
/// Zero target dimensions are treated as 1.
pub fn subsample_factor(
    source_width: u32,
    source_height: u32,
    target_width: u32,
    target_height: u32,
    available: u64,
) -> u32 {
    let max_size = u64::from(target_width.max(target_height).max(1)) * u64::from(PREVIEW_OVERSAMPLE);
    let max_dimension = u64::from(source_width.max(source_height));
    let bitmap_size = estimated_bytes(source_width, source_height);

    let mut factor: u32 = if bitmap_size > available { 2 } else { 1 };

    while factor < MAX_SUBSAMPLE {
        let f = u64::from(factor);
        let too_large = max_dimension / f > max_size;
        let too_heavy = bitmap_size / (f * f) > available;
        if !too_large && !too_heavy {
            break;
        }
        factor *= 2;
    }

    factor
}

/// Parameters for one decode call, derived from a fresh memory snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Power-of-two stride, at least 1.
    pub subsample: u32,
    /// Bounds the decode was sized for.
    pub target: (u32, u32),
    /// Memory snapshot the factor was computed against.
    pub available: u64,
}

impl DecodeOptions {
    /// Options for a preview that should cover a `max_width` x `max_height` view.
    pub fn for_preview(
        source: (u32, u32),
        max_width: u32,
        max_height: u32,
        probe: &dyn MemoryProbe,
    ) -> Self {
        let available = probe.available_bytes();
        let subsample = subsample_factor(source.0, source.1, max_width, max_height, available);
        log::debug!(
            "Preview of {}x{} for {}x{}: subsample {} ({} bytes available)",
            source.0,
            source.1,
            max_width,
            max_height,
            subsample,
            available
        );
        Self {
            subsample,
            target: (max_width, max_height),
            available,
        }
    }

    /// Options for a full-resolution region decode. Only memory can force
    /// sub-sampling here.
    pub fn for_region(width: u32, height: u32, probe: &dyn MemoryProbe) -> Self {
        let available = probe.available_bytes();
        let subsample = subsample_factor(width, height, width, height, available);
        log::debug!(
            "Region of {width}x{height}: subsample {subsample} ({available} bytes available)"
        );
        Self {
            subsample,
            target: (width, height),
            available,
        }
    }

    /// Output dimensions after sub-sampling, never below 1x1.
    pub fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        ((width / self.subsample).max(1), (height / self.subsample).max(1))
    }
}
