//! Slice session
//!
//! Fruit is tossed up from below the playfield at a slowly increasing rate.
//! Swiping across a fruit cuts it in two for its level's score; a fruit that
//! falls back out unsliced costs a life.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::body::{BodyKind, BodyTable, fruit_body};
use super::levels::LevelTable;
use super::physics::{BodyId, Material, PhysicsWorld};
use super::slice::{SliceTrail, slice_body, spread};
use super::state::{ArcadeGame, GameEvent, GameMode, reproject_bodies, sweep_out_of_bounds};
use crate::settings::Settings;
use crate::tuning::{CutTuning, Tuning};

/// Schedules tosses with a shrinking interval
#[derive(Debug, Clone)]
pub struct TossSpawner {
    interval_ms: f64,
    next_toss_at_ms: Option<f64>,
    active: bool,
}

impl TossSpawner {
    pub fn new(tuning: &CutTuning) -> Self {
        Self {
            interval_ms: tuning.toss_interval_ms,
            next_toss_at_ms: None,
            active: true,
        }
    }

    /// Restart the schedule; the first toss comes one interval after `now_ms`
    pub fn start(&mut self, tuning: &CutTuning, now_ms: f64) {
        self.interval_ms = tuning.toss_interval_ms;
        self.next_toss_at_ms = Some(now_ms + self.interval_ms);
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    #[inline]
    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// True when a toss is due; the next one is scheduled from `now_ms`
    pub fn poll(&mut self, tuning: &CutTuning, now_ms: f64) -> bool {
        if !self.active {
            return false;
        }
        let Some(next_at) = self.next_toss_at_ms else {
            // First poll after construction anchors the schedule
            self.next_toss_at_ms = Some(now_ms + self.interval_ms);
            return false;
        };
        if now_ms < next_at {
            return false;
        }
        self.interval_ms =
            (self.interval_ms * tuning.toss_interval_decay).max(tuning.toss_interval_min_ms);
        self.next_toss_at_ms = Some(now_ms + self.interval_ms);
        true
    }
}

/// One cut-variant game
pub struct CutGame<W: PhysicsWorld> {
    world: W,
    table: BodyTable,
    levels: LevelTable,
    tuning: Tuning,
    material: Material,
    spawner: TossSpawner,
    rng: Pcg32,
    trail: SliceTrail,
    size: Vec2,
    score: u64,
    lives: u8,
    game_over: bool,
    debris_spin: bool,
}

impl<W: PhysicsWorld> CutGame<W> {
    pub fn new(mut world: W, tuning: &Tuning, width: f32, height: f32, seed: u64) -> Self {
        world.clear();
        world.set_gravity(tuning.cut_game.gravity_vec());

        log::info!("Cut game started ({}x{}, seed {})", width, height, seed);
        Self {
            world,
            table: BodyTable::new(),
            levels: LevelTable::standard(),
            tuning: tuning.clone(),
            material: tuning.physics.fruit_material(),
            spawner: TossSpawner::new(&tuning.cut_game),
            rng: Pcg32::seed_from_u64(seed),
            trail: SliceTrail::default(),
            size: Vec2::new(width, height),
            score: 0,
            lives: tuning.cut_game.starting_lives,
            game_over: false,
            debris_spin: true,
        }
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn spawner(&self) -> &TossSpawner {
        &self.spawner
    }

    /// Random spin on debris halves (off for reduced motion)
    pub fn set_debris_spin(&mut self, enabled: bool) {
        self.debris_spin = enabled;
    }

    /// Launch one fruit from below the playfield
    pub fn toss(&mut self) -> Option<GameEvent> {
        let cut = &self.tuning.cut_game;
        let level = self
            .rng
            .random_range(0..cut.toss_levels.clamp(1, self.levels.len()));
        let x = self.size.x * (0.2 + 0.6 * self.rng.random::<f32>());
        let position = Vec2::new(x, self.size.y + 50.0);

        let (mut desc, meta) = match fruit_body(&self.levels, self.material, position, level, false)
        {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Could not toss fruit: {}", e);
                return None;
            }
        };
        let lift = cut.toss_speed_min
            + self.rng.random::<f32>() * (cut.toss_speed_max - cut.toss_speed_min);
        desc.velocity = Vec2::new(spread(&mut self.rng, cut.toss_sway), -lift);
        desc.angular_velocity = spread(&mut self.rng, cut.toss_spin);

        let body = self.table.spawn(&mut self.world, (desc, meta));
        log::debug!("Tossed fruit {} (level {})", body, level);
        Some(GameEvent::Tossed { body, level })
    }

    /// Cut every eligible fruit crossing `from → to`
    fn slice_segment(&mut self, from: Vec2, to: Vec2) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for id in self.world.segment_query(from, to) {
            let outcome = slice_body(
                &mut self.world,
                &mut self.table,
                &self.levels,
                self.material,
                id,
                from,
                to,
                &self.tuning.cut_game,
                self.debris_spin,
                &mut self.rng,
            );
            match outcome {
                Ok(Some(outcome)) => {
                    self.score += outcome.score;
                    events.push(GameEvent::Sliced {
                        body: outcome.body,
                        debris: outcome.debris,
                        level: outcome.level,
                    });
                    events.push(GameEvent::ScoreChanged { score: self.score });
                }
                Ok(None) => {}
                Err(e) => log::warn!("Could not slice {}: {}", id, e),
            }
        }
        events
    }

    fn end_game(&mut self, events: &mut Vec<GameEvent>) {
        self.game_over = true;
        self.spawner.stop();
        self.trail.end();
        log::info!("Game over with score {}", self.score);
        events.push(GameEvent::GameOver { score: self.score });
    }

    /// Live fruits (debris excluded)
    pub fn fruit_ids(&self) -> Vec<BodyId> {
        self.table.ids_where(|meta| meta.kind.is_fruit())
    }

    /// Live debris halves
    pub fn debris_ids(&self) -> Vec<BodyId> {
        self.table
            .ids_where(|meta| matches!(meta.kind, BodyKind::Debris { .. }))
    }
}

impl<W: PhysicsWorld> ArcadeGame for CutGame<W> {
    fn mode(&self) -> GameMode {
        GameMode::Cut
    }

    fn step(&mut self, now_ms: f64, dt: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if !self.game_over
            && self.spawner.poll(&self.tuning.cut_game, now_ms)
            && let Some(event) = self.toss()
        {
            events.push(event);
        }

        // Keep simulating after game over so debris can clear the screen
        self.world.step(dt);

        let removed = sweep_out_of_bounds(
            &mut self.world,
            &mut self.table,
            self.size,
            self.tuning.physics.offscreen_margin,
        );
        for (body, meta) in removed {
            if !meta.kind.is_fruit() || self.game_over {
                continue;
            }
            self.lives = self.lives.saturating_sub(1);
            log::debug!("Missed fruit {}, {} lives left", body, self.lives);
            events.push(GameEvent::FruitMissed {
                body,
                lives_left: self.lives,
            });
            if self.lives == 0 {
                self.end_game(&mut events);
            }
        }

        events
    }

    fn restart(&mut self, now_ms: f64) -> Vec<GameEvent> {
        self.world.clear();
        self.table.clear();
        self.trail.end();
        self.score = 0;
        self.lives = self.tuning.cut_game.starting_lives;
        self.game_over = false;
        self.spawner.start(&self.tuning.cut_game, now_ms);
        log::info!("Cut game restarted");
        vec![GameEvent::Restarted, GameEvent::ScoreChanged { score: 0 }]
    }

    fn resize(&mut self, width: f32, height: f32) {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return;
        }
        let new_size = Vec2::new(width, height);
        reproject_bodies(&mut self.world, &self.table, self.size, new_size);
        self.size = new_size;
        self.trail.end();
        log::debug!("Cut game resized to {}x{}", width, height);
    }

    fn pointer_down(&mut self, pos: Vec2, _now_ms: f64) -> Vec<GameEvent> {
        if !self.game_over && pos.is_finite() {
            self.trail.begin(pos);
        }
        Vec::new()
    }

    fn pointer_move(&mut self, pos: Vec2, _now_ms: f64) -> Vec<GameEvent> {
        if self.game_over {
            return Vec::new();
        }
        match self.trail.extend(pos) {
            Some((from, to)) => self.slice_segment(from, to),
            None => Vec::new(),
        }
    }

    fn pointer_up(&mut self, _pos: Vec2, _now_ms: f64) -> Vec<GameEvent> {
        self.trail.end();
        Vec::new()
    }

    fn score(&self) -> u64 {
        self.score
    }

    fn is_game_over(&self) -> bool {
        self.game_over
    }

    fn lives(&self) -> Option<u8> {
        Some(self.lives)
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn world(&self) -> &dyn PhysicsWorld {
        &self.world
    }

    fn bodies(&self) -> &BodyTable {
        &self.table
    }

    fn trail(&self) -> Option<&SliceTrail> {
        Some(&self.trail)
    }

    fn apply_settings(&mut self, settings: &Settings) {
        self.set_debris_spin(settings.debris_spin());
    }

    fn clear(&mut self) {
        self.world.clear();
        self.table.clear();
        self.trail.end();
        self.spawner.stop();
    }
}
