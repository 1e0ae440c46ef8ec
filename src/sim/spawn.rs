//! Held-fruit state machine for the drop variant
//!
//! `Ready → Held → Dropping → (cooldown) → Ready`. Input only moves or
//! releases the held body; the cooldown is checked against the clock every
//! step.

use std::ops::Range;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::body::{BodyTable, fruit_body};
use super::levels::LevelTable;
use super::physics::{BodyId, Material, Motion, PhysicsWorld};
use super::state::GameEvent;
use crate::error::GameResult;
use crate::tuning::DropTuning;

/// Spawner phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnPhase {
    /// Nothing held, a new fruit may appear
    Ready,
    /// A kinematic fruit follows the pointer
    Held { body: BodyId, level: usize },
    /// The last fruit was released; next spawn waits until `ready_at_ms`
    Dropping { ready_at_ms: f64 },
}

/// Level window `[min, max)` for the next spawn at a given score
///
/// Every threshold reached is considered; the highest `min_level` wins. The
/// window keeps its width unless it would run past the table.
pub fn difficulty_window(score: u64, levels: &LevelTable, tuning: &DropTuning) -> Range<usize> {
    let min = tuning
        .difficulty_steps
        .iter()
        .filter(|step| score >= step.score)
        .map(|step| step.min_level)
        .max()
        .unwrap_or(0);

    let max = (min + tuning.level_window.max(1)).min(levels.len());
    let min = min.min(max.saturating_sub(1));
    min..max
}

/// Clamp a held fruit's x so the whole disc stays inside `[0, width]`
///
/// Non-finite input returns `None`. A playfield narrower than the fruit pins
/// it to the middle.
pub fn clamp_x(x: f32, radius: f32, width: f32) -> Option<f32> {
    if !x.is_finite() {
        return None;
    }
    if width < radius * 2.0 {
        return Some(width * 0.5);
    }
    Some(x.clamp(radius, width - radius))
}

/// Drop-variant spawner
#[derive(Debug, Clone)]
pub struct SpawnController {
    phase: SpawnPhase,
    next_level: usize,
    rng: Pcg32,
    spawn_y: f32,
    cooldown_ms: f64,
}

impl SpawnController {
    pub fn new(seed: u64, levels: &LevelTable, tuning: &DropTuning) -> Self {
        let mut spawner = Self {
            phase: SpawnPhase::Ready,
            next_level: 0,
            rng: Pcg32::seed_from_u64(seed),
            spawn_y: tuning.spawn_y,
            cooldown_ms: tuning.drop_cooldown_ms,
        };
        spawner.pick_next_level(0, levels, tuning);
        spawner
    }

    #[inline]
    pub fn phase(&self) -> SpawnPhase {
        self.phase
    }

    /// Level of the fruit that will appear next
    #[inline]
    pub fn next_level(&self) -> usize {
        self.next_level
    }

    pub fn held(&self) -> Option<BodyId> {
        match self.phase {
            SpawnPhase::Held { body, .. } => Some(body),
            _ => None,
        }
    }

    #[inline]
    pub fn is_dropping(&self) -> bool {
        matches!(self.phase, SpawnPhase::Dropping { .. })
    }

    #[inline]
    pub fn spawn_y(&self) -> f32 {
        self.spawn_y
    }

    /// Roll the level of the following spawn
    pub fn pick_next_level(&mut self, score: u64, levels: &LevelTable, tuning: &DropTuning) -> usize {
        let window = difficulty_window(score, levels, tuning);
        self.next_level = self.rng.random_range(window);
        self.next_level
    }

    /// Ready → Held: create the held fruit at the top center
    ///
    /// Returns `None` unless the spawner is ready.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_held<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        table: &mut BodyTable,
        levels: &LevelTable,
        material: Material,
        width: f32,
        score: u64,
        tuning: &DropTuning,
    ) -> GameResult<Option<GameEvent>> {
        if self.phase != SpawnPhase::Ready {
            return Ok(None);
        }

        let level = self.next_level;
        let position = Vec2::new(width * 0.5, self.spawn_y);
        let body = table.spawn(world, fruit_body(levels, material, position, level, true)?);
        self.phase = SpawnPhase::Held { body, level };
        let next_level = self.pick_next_level(score, levels, tuning);

        log::debug!("Spawned held fruit {} (level {}), next {}", body, level, next_level);
        Ok(Some(GameEvent::Spawned {
            body,
            level,
            next_level,
        }))
    }

    /// Place the held fruit at `x` (clamped) on the spawn line
    ///
    /// Returns false when nothing is held or `x` is not finite.
    pub fn move_held<W: PhysicsWorld + ?Sized>(
        &self,
        world: &mut W,
        table: &BodyTable,
        x: f32,
        width: f32,
    ) -> bool {
        let Some(body) = self.held() else {
            return false;
        };
        let Some(radius) = table.get(body).and_then(|m| m.render).map(|r| r.radius) else {
            return false;
        };
        let Some(x) = clamp_x(x, radius, width) else {
            return false;
        };
        world.set_position(body, Vec2::new(x, self.spawn_y));
        true
    }

    /// Held → Dropping: hand the fruit to the engine
    pub fn release_held<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        table: &mut BodyTable,
        x: f32,
        width: f32,
        now_ms: f64,
    ) -> Option<GameEvent> {
        let body = self.held()?;
        self.move_held(world, table, x, width);

        world.set_velocity(body, Vec2::ZERO);
        world.set_angular_velocity(body, 0.0);
        world.set_motion(body, Motion::Dynamic, false);
        if let Some(meta) = table.get_mut(body) {
            meta.is_held = false;
        }

        self.phase = SpawnPhase::Dropping {
            ready_at_ms: now_ms + self.cooldown_ms,
        };
        log::debug!("Dropped fruit {}", body);
        Some(GameEvent::Dropped { body })
    }

    /// Dropping → Ready once the cooldown has elapsed. Returns true on the transition.
    pub fn update(&mut self, now_ms: f64) -> bool {
        if let SpawnPhase::Dropping { ready_at_ms } = self.phase
            && now_ms >= ready_at_ms
        {
            self.phase = SpawnPhase::Ready;
            return true;
        }
        false
    }

    /// Forget the held fruit without touching the world
    pub fn take_held(&mut self) -> Option<BodyId> {
        let body = self.held()?;
        self.phase = SpawnPhase::Ready;
        Some(body)
    }

    /// Back to Ready with a freshly rolled next level (score 0)
    pub fn reset(&mut self, levels: &LevelTable, tuning: &DropTuning) {
        self.phase = SpawnPhase::Ready;
        self.spawn_y = tuning.spawn_y;
        self.cooldown_ms = tuning.drop_cooldown_ms;
        self.pick_next_level(0, levels, tuning);
    }
}
