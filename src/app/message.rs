// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/message.rs
//
// Input events delivered by the host: pointer and pinch gestures.

use crate::domain::geometry::Point;

/// Single-pointer events in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchEvent {
    Down(Point),
    Move(Point),
    Up,
    Cancel,
}

/// Pinch gesture events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleEvent {
    Begin,
    /// Incremental factor since the previous update.
    Update(f32),
    End,
}
