// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/view/crop/animation.rs
//
// Position correction: slides the image back inside the frame after a gesture.

use std::time::{Duration, Instant};

use crate::domain::geometry::Point;

/// Linear interpolation of the translation toward its nearest in-bounds value.
///
/// Each axis moves independently; an axis already in range stays put.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionCorrection {
    from: Point,
    to: Point,
    started: Instant,
    duration: Duration,
}

impl PositionCorrection {
    pub fn new(from: Point, to: Point, started: Instant, duration: Duration) -> Self {
        Self {
            from,
            to,
            started,
            duration,
        }
    }

    pub fn target(&self) -> Point {
        self.to
    }

    /// Fraction of the animation elapsed at `now`, in `[0, 1]`.
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn value_at(&self, now: Instant) -> Point {
        let t = self.progress(now);
        Point::new(
            self.from.x + (self.to.x - self.from.x) * t,
            self.from.y + (self.to.y - self.from.y) * t,
        )
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_each_axis_linearly() {
        let start = Instant::now();
        let anim = PositionCorrection::new(
            Point::new(100.0, 10.0),
            Point::new(50.0, 10.0),
            start,
            Duration::from_millis(200),
        );

        assert_eq!(anim.value_at(start), Point::new(100.0, 10.0));
        let half = anim.value_at(start + Duration::from_millis(100));
        assert!((half.x - 75.0).abs() < 1e-3);
        assert_eq!(half.y, 10.0);
        assert!(!anim.is_finished(start + Duration::from_millis(100)));

        let end = start + Duration::from_millis(250);
        assert_eq!(anim.value_at(end), anim.target());
        assert!(anim.is_finished(end));
    }

    #[test]
    fn zero_duration_jumps_to_target() {
        let start = Instant::now();
        let anim = PositionCorrection::new(Point::ORIGIN, Point::new(3.0, 4.0), start, Duration::ZERO);
        assert!(anim.is_finished(start));
        assert_eq!(anim.value_at(start), Point::new(3.0, 4.0));
    }
}
