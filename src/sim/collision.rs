//! Narrow-phase collision tests for circles and axis-aligned boxes
//!
//! Used by the reference engine for contact generation and by segment
//! queries (swipe slicing).

use glam::Vec2;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact normal, pointing from the first shape toward the second
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }

    /// Same contact seen from the other shape
    pub fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        self
    }
}

/// Check overlap between two circles
pub fn circle_circle_collision(
    pos_a: Vec2,
    radius_a: f32,
    pos_b: Vec2,
    radius_b: f32,
) -> CollisionResult {
    let delta = pos_b - pos_a;
    let dist_sq = delta.length_squared();
    let radii = radius_a + radius_b;

    if dist_sq >= radii * radii {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    // Concentric circles: push apart vertically
    let normal = if dist > 1e-4 { delta / dist } else { Vec2::Y };

    CollisionResult {
        hit: true,
        normal,
        penetration: radii - dist,
    }
}

/// Check overlap between a circle and an axis-aligned box
///
/// The normal points from the box toward the circle.
pub fn rect_circle_collision(
    rect_center: Vec2,
    half_extents: Vec2,
    circle_pos: Vec2,
    radius: f32,
) -> CollisionResult {
    let local = circle_pos - rect_center;
    let clamped = local.clamp(-half_extents, half_extents);

    if clamped != local {
        // Circle center outside the box
        let delta = local - clamped;
        let dist_sq = delta.length_squared();
        if dist_sq >= radius * radius {
            return CollisionResult::miss();
        }
        let dist = dist_sq.sqrt();
        let normal = if dist > 1e-4 { delta / dist } else { Vec2::Y };
        return CollisionResult {
            hit: true,
            normal,
            penetration: radius - dist,
        };
    }

    // Circle center inside the box: exit through the nearest face
    let to_x = half_extents.x - local.x.abs();
    let to_y = half_extents.y - local.y.abs();
    let (normal, depth) = if to_x < to_y {
        (Vec2::new(local.x.signum(), 0.0), to_x)
    } else {
        (Vec2::new(0.0, local.y.signum()), to_y)
    };

    CollisionResult {
        hit: true,
        normal,
        penetration: depth + radius,
    }
}

/// Closest point to `p` on the segment `a`-`b`
pub fn closest_point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-8 {
        return a; // Degenerate segment
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Does the segment `from`-`to` touch the circle?
pub fn segment_hits_circle(from: Vec2, to: Vec2, center: Vec2, radius: f32) -> bool {
    let closest = closest_point_on_segment(from, to, center);
    (closest - center).length_squared() <= radius * radius
}

/// Does the segment `from`-`to` touch the axis-aligned box? (slab test)
pub fn segment_hits_rect(from: Vec2, to: Vec2, center: Vec2, half_extents: Vec2) -> bool {
    let min = center - half_extents;
    let max = center + half_extents;
    let dir = to - from;

    let mut t_min = 0.0_f32;
    let mut t_max = 1.0_f32;

    for axis in 0..2 {
        let (o, d, lo, hi) = if axis == 0 {
            (from.x, dir.x, min.x, max.x)
        } else {
            (from.y, dir.y, min.y, max.y)
        };

        if d.abs() < 1e-8 {
            if o < lo || o > hi {
                return false;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t1 = (lo - o) * inv;
        let mut t2 = (hi - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        t_min = t_min.max(t1);
        t_max = t_max.min(t2);
        if t_min > t_max {
            return false;
        }
    }

    true
}
