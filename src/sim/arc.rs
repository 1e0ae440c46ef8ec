//! Angular ranges for sliced fruit halves
//!
//! A slice arc is a body-local angular interval `[start, end]` (radians,
//! `end >= start`). A debris body draws the wedge `center → arc → center`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::direction;

/// Angular interval of a half-disc, in the owning body's local frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliceArc {
    /// Start angle (radians)
    pub start: f32,
    /// End angle (radians, `>= start`)
    pub end: f32,
}

impl SliceArc {
    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Split a full disc along the line through its center at angle `cut`
    ///
    /// Returns `[cut, cut + π]` and `[cut + π, cut + 2π]`: they share both
    /// endpoints and together cover exactly one turn.
    pub fn bisect(cut: f32) -> [SliceArc; 2] {
        let pi = std::f32::consts::PI;
        [
            SliceArc::new(cut, cut + pi),
            SliceArc::new(cut + pi, cut + 2.0 * pi),
        ]
    }

    /// Angular span of the arc
    #[inline]
    pub fn span(&self) -> f32 {
        self.end - self.start
    }

    #[inline]
    pub fn mid_angle(&self) -> f32 {
        self.start + self.span() * 0.5
    }

    /// World-space unit vector from the center through the middle of the arc
    /// for a body rotated by `body_angle`
    pub fn outward_normal(&self, body_angle: f32) -> Vec2 {
        direction(self.mid_angle() + body_angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::{PI, TAU};

    #[test]
    fn test_bisect_at_zero() {
        let [a, b] = SliceArc::bisect(0.0);
        assert_eq!(a, SliceArc::new(0.0, PI));
        assert_eq!(b, SliceArc::new(PI, TAU));
    }

    #[test]
    fn test_halves_point_opposite() {
        let [a, b] = SliceArc::bisect(0.3);
        let dot = a.outward_normal(1.0).dot(b.outward_normal(1.0));
        assert!((dot + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_outward_normal_follows_body_angle() {
        let arc = SliceArc::new(0.0, PI);
        assert!((arc.outward_normal(0.0) - Vec2::Y).length() < 1e-5);
        // A quarter turn clockwise on screen points the bulge to -x
        assert!((arc.outward_normal(PI / 2.0) - Vec2::NEG_X).length() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_bisect_covers_disc_once(cut in -10.0f32..10.0) {
            let [a, b] = SliceArc::bisect(cut);
            // Contiguous, no gap
            prop_assert_eq!(a.end, b.start);
            prop_assert_eq!(a.start, cut);
            // Each half is exactly π wide, together one turn
            prop_assert!((a.span() - PI).abs() < 1e-4);
            prop_assert!((b.span() - PI).abs() < 1e-4);
            prop_assert!((b.end - a.start - TAU).abs() < 1e-4);
        }

        #[test]
        fn prop_halves_push_apart(cut in -10.0f32..10.0, body_angle in -10.0f32..10.0) {
            let [a, b] = SliceArc::bisect(cut);
            let dot = a.outward_normal(body_angle).dot(b.outward_normal(body_angle));
            prop_assert!((dot + 1.0).abs() < 1e-3);
        }
    }
}
