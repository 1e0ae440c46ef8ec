//! Data-driven game balance
//!
//! Every gameplay constant lives here so balance can be changed without a
//! rebuild. Defaults reproduce the shipped feel; a JSON override can be
//! stored in LocalStorage on the web.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};
use crate::sim::Material;

/// Shared physical constants for fruit bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    pub fruit_restitution: f32,
    pub fruit_friction: f32,
    pub fruit_density: f32,
    /// Thickness of the boundary walls (px)
    pub wall_thickness: f32,
    /// Bodies further than this outside the playfield are swept (px)
    pub offscreen_margin: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            fruit_restitution: 0.2,
            fruit_friction: 0.1,
            fruit_density: 0.002,
            wall_thickness: 60.0,
            offscreen_margin: 100.0,
        }
    }
}

impl PhysicsTuning {
    /// Material used for every fruit and debris body of a session
    pub fn fruit_material(&self) -> Material {
        Material {
            restitution: self.fruit_restitution,
            friction: self.fruit_friction,
            density: self.fruit_density,
        }
    }
}

/// Score threshold that shifts the next-level window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyStep {
    pub score: u64,
    pub min_level: usize,
}

/// Drop-and-merge variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropTuning {
    /// Downward gravity (px/s²)
    pub gravity: f32,
    /// Height of the held fruit (px from top)
    pub spawn_y: f32,
    /// Delay between a release and the next held fruit (ms)
    pub drop_cooldown_ms: f64,
    /// Danger band just below the spawn line (exclusive bounds, px)
    pub danger_band_top: f32,
    pub danger_band_bottom: f32,
    /// Speed below which a fruit in the band counts as stuck (px/s)
    pub stuck_speed: f32,
    /// How long a fruit must stay stuck before the game ends (ms)
    pub stuck_duration_ms: f64,
    /// Width of the next-level window
    pub level_window: usize,
    /// Window shifts, checked independently; the highest reached wins
    pub difficulty_steps: Vec<DifficultyStep>,
}

impl Default for DropTuning {
    fn default() -> Self {
        Self {
            gravity: 4000.0,
            spawn_y: 50.0,
            drop_cooldown_ms: 600.0,
            danger_band_top: 70.0,
            danger_band_bottom: 80.0,
            stuck_speed: 12.0,
            stuck_duration_ms: 1000.0,
            level_window: 5,
            difficulty_steps: vec![
                DifficultyStep {
                    score: 2500,
                    min_level: 1,
                },
                DifficultyStep {
                    score: 5000,
                    min_level: 2,
                },
            ],
        }
    }
}

impl DropTuning {
    pub fn gravity_vec(&self) -> Vec2 {
        Vec2::new(0.0, self.gravity)
    }
}

/// Cut (slice) variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutTuning {
    /// Downward gravity (px/s²)
    pub gravity: f32,
    pub starting_lives: u8,
    /// Initial delay between tosses (ms)
    pub toss_interval_ms: f64,
    /// Interval never shrinks below this (ms)
    pub toss_interval_min_ms: f64,
    /// Interval multiplier applied after each toss
    pub toss_interval_decay: f64,
    /// Tossed fruit levels are drawn from [0, toss_levels)
    pub toss_levels: usize,
    /// Upward launch speed range (px/s)
    pub toss_speed_min: f32,
    pub toss_speed_max: f32,
    /// Horizontal launch speed spread, total width (px/s)
    pub toss_sway: f32,
    /// Angular velocity spread, total width (rad/s)
    pub toss_spin: f32,
    /// Outward push given to each debris half (px/s)
    pub debris_impulse: f32,
    /// Angular velocity spread of debris, total width (rad/s)
    pub debris_spin: f32,
}

impl Default for CutTuning {
    fn default() -> Self {
        Self {
            gravity: 1000.0,
            starting_lives: 3,
            toss_interval_ms: 2000.0,
            toss_interval_min_ms: 500.0,
            toss_interval_decay: 0.99,
            toss_levels: 5,
            toss_speed_min: 900.0,
            toss_speed_max: 1200.0,
            toss_sway: 300.0,
            toss_spin: 12.0,
            debris_impulse: 120.0,
            debris_spin: 30.0,
        }
    }
}

impl CutTuning {
    pub fn gravity_vec(&self) -> Vec2 {
        Vec2::new(0.0, self.gravity)
    }
}

/// Complete tuning set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub physics: PhysicsTuning,
    #[serde(rename = "drop")]
    pub drop_game: DropTuning,
    #[serde(rename = "cut")]
    pub cut_game: CutTuning,
}

fn check(ok: bool, field: &'static str, reason: &'static str) -> GameResult<()> {
    if ok {
        Ok(())
    } else {
        Err(GameError::InvalidTuning { field, reason })
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON document; missing fields keep their defaults
    pub fn from_json(json: &str) -> GameResult<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> GameResult<()> {
        let p = &self.physics;
        check(
            p.fruit_density > 0.0 && p.fruit_density.is_finite(),
            "physics.fruit_density",
            "must be positive",
        )?;
        check(
            (0.0..=1.0).contains(&p.fruit_restitution),
            "physics.fruit_restitution",
            "must be within [0, 1]",
        )?;
        check(p.fruit_friction >= 0.0, "physics.fruit_friction", "must not be negative")?;
        check(p.wall_thickness > 0.0, "physics.wall_thickness", "must be positive")?;
        check(p.offscreen_margin >= 0.0, "physics.offscreen_margin", "must not be negative")?;

        let d = &self.drop_game;
        check(d.gravity.is_finite(), "drop.gravity", "must be finite")?;
        check(d.drop_cooldown_ms >= 0.0, "drop.drop_cooldown_ms", "must not be negative")?;
        check(
            d.danger_band_top < d.danger_band_bottom,
            "drop.danger_band_top",
            "must be above danger_band_bottom",
        )?;
        check(d.stuck_speed > 0.0, "drop.stuck_speed", "must be positive")?;
        check(d.stuck_duration_ms > 0.0, "drop.stuck_duration_ms", "must be positive")?;
        check(d.level_window >= 1, "drop.level_window", "must be at least 1")?;
        check(
            d.difficulty_steps.windows(2).all(|w| w[0].score <= w[1].score),
            "drop.difficulty_steps",
            "thresholds must be ascending",
        )?;

        let c = &self.cut_game;
        check(c.gravity.is_finite(), "cut.gravity", "must be finite")?;
        check(c.starting_lives >= 1, "cut.starting_lives", "must be at least 1")?;
        check(
            c.toss_interval_min_ms > 0.0 && c.toss_interval_min_ms <= c.toss_interval_ms,
            "cut.toss_interval_min_ms",
            "must be positive and not above toss_interval_ms",
        )?;
        check(
            c.toss_interval_decay > 0.0 && c.toss_interval_decay <= 1.0,
            "cut.toss_interval_decay",
            "must be within (0, 1]",
        )?;
        check(c.toss_levels >= 1, "cut.toss_levels", "must be at least 1")?;
        check(
            c.toss_speed_min <= c.toss_speed_max,
            "cut.toss_speed_min",
            "must not exceed toss_speed_max",
        )?;
        Ok(())
    }

    /// LocalStorage key for an optional override
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "fruit_fusion_tuning";

    /// Load the override from LocalStorage (WASM only), falling back to defaults
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(tuning) => {
                        log::info!("Loaded tuning override from LocalStorage");
                        return tuning;
                    }
                    Err(e) => log::warn!("Ignoring tuning override: {}", e),
                }
            }
        }

        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
