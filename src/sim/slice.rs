//! Swipe trail and fruit slicing for the cut variant
//!
//! A swipe is a short list of pointer samples. Each new sample forms a
//! segment with the previous one; every eligible fruit on that segment is
//! replaced by two non-colliding half-disc debris bodies flying apart.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;

use super::arc::SliceArc;
use super::body::{BodyTable, debris_body};
use super::levels::LevelTable;
use super::physics::{BodyId, Material, PhysicsWorld};
use crate::error::GameResult;
use crate::tuning::CutTuning;

/// Symmetric random value in `[-width/2, width/2)`
pub(crate) fn spread<R: Rng>(rng: &mut R, width: f32) -> f32 {
    if width > 0.0 {
        (rng.random::<f32>() - 0.5) * width
    } else {
        0.0
    }
}

/// Pointer samples of the current swipe (oldest first)
#[derive(Debug, Clone)]
pub struct SliceTrail {
    points: VecDeque<Vec2>,
    capacity: usize,
    active: bool,
}

impl Default for SliceTrail {
    fn default() -> Self {
        Self::new(crate::consts::TRAIL_LENGTH)
    }
}

impl SliceTrail {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity: capacity.max(2),
            active: false,
        }
    }

    /// Start a new swipe at `point`
    pub fn begin(&mut self, point: Vec2) {
        self.points.clear();
        self.active = true;
        self.points.push_back(point);
    }

    /// Append a sample; returns the segment from the previous sample
    pub fn extend(&mut self, point: Vec2) -> Option<(Vec2, Vec2)> {
        if !self.active || !point.is_finite() {
            return None;
        }
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
        let n = self.points.len();
        if n < 2 {
            return None;
        }
        Some((self.points[n - 2], self.points[n - 1]))
    }

    /// Finish the swipe and forget its samples
    pub fn end(&mut self) {
        self.active = false;
        self.points.clear();
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn points(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.points.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// A fruit that was cut in two
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceOutcome {
    pub body: BodyId,
    pub level: usize,
    pub debris: [BodyId; 2],
    /// Points awarded for the cut
    pub score: u64,
}

/// Cut `body` along the swipe direction `from → to`
///
/// Only live, non-held fruit can be cut; anything else returns `Ok(None)`.
/// The fruit is removed and two debris halves are inserted with its
/// position and angle. Each half keeps the fruit's velocity plus a push
/// along its own outward normal. `spin` adds a random angular velocity.
#[allow(clippy::too_many_arguments)]
pub fn slice_body<W: PhysicsWorld + ?Sized, R: Rng>(
    world: &mut W,
    table: &mut BodyTable,
    levels: &LevelTable,
    material: Material,
    body: BodyId,
    from: Vec2,
    to: Vec2,
    tuning: &CutTuning,
    spin: bool,
    rng: &mut R,
) -> GameResult<Option<SliceOutcome>> {
    let Some(level) = table.get(body).and_then(|meta| meta.fruit_level()) else {
        return Ok(None);
    };
    let Some(state) = world.body(body) else {
        return Ok(None);
    };

    let swipe = to - from;
    let world_cut = if swipe.length_squared() > 0.0 {
        swipe.y.atan2(swipe.x)
    } else {
        0.0
    };
    let local_cut = world_cut - state.angle;
    let arcs = SliceArc::bisect(local_cut);

    let normals = [arcs[0].outward_normal(state.angle), arcs[1].outward_normal(state.angle)];

    // Build both halves before touching the world so a bad level leaves it intact
    let halves = [
        debris_body(levels, material, state.position, state.angle, level, arcs[0])?,
        debris_body(levels, material, state.position, state.angle, level, arcs[1])?,
    ];
    let score = levels.get(level)?.score;

    table.despawn(world, body);

    let mut debris = [body; 2];
    for (i, (mut desc, meta)) in halves.into_iter().enumerate() {
        desc.velocity = state.velocity + normals[i] * tuning.debris_impulse;
        desc.angular_velocity = if spin {
            state.angular_velocity + spread(rng, tuning.debris_spin)
        } else {
            0.0
        };
        debris[i] = table.spawn(world, (desc, meta));
    }

    log::debug!("Sliced {} (level {}) into {} and {}", body, level, debris[0], debris[1]);
    Ok(Some(SliceOutcome {
        body,
        level,
        debris,
        score,
    }))
}
