//! Session-level types shared by both game variants
//!
//! Sessions report what happened during a step as a list of [`GameEvent`]s;
//! the host turns those into notifications.

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{BodyKind, BodyTable, GameBodyMeta};
use super::physics::{BodyDesc, BodyId, PhysicsWorld};
use super::slice::SliceTrail;
use crate::settings::Settings;

/// Something observable that happened during a step or input call
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A held fruit appeared; `next_level` is the preview for the following one
    Spawned {
        body: BodyId,
        level: usize,
        next_level: usize,
    },
    /// The held fruit was released
    Dropped { body: BodyId },
    /// Two fruits of `level - 1` became `created`
    Merged {
        consumed: [BodyId; 2],
        created: BodyId,
        level: usize,
    },
    ScoreChanged { score: u64 },
    /// A fruit started resting in the danger band
    BodyStuck { body: BodyId },
    /// Terminal; emitted once per session
    GameOver { score: u64 },
    /// A fruit was launched from below (cut variant)
    Tossed { body: BodyId, level: usize },
    Sliced {
        body: BodyId,
        debris: [BodyId; 2],
        level: usize,
    },
    /// A fruit fell out unsliced (cut variant)
    FruitMissed { body: BodyId, lives_left: u8 },
    Restarted,
}

/// Which game a session plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Drop fruit into a box and merge equal levels
    #[default]
    Drop,
    /// Slice fruit tossed from below
    Cut,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMode::Drop => write!(f, "drop"),
            GameMode::Cut => write!(f, "cut"),
        }
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" | "merge" => Ok(GameMode::Drop),
            "cut" | "slice" => Ok(GameMode::Cut),
            other => Err(format!("unknown game mode '{}'", other)),
        }
    }
}

/// A running game session as seen by the host
///
/// Pointer positions are in canvas pixels, `now_ms` is a monotonic clock.
pub trait ArcadeGame {
    fn mode(&self) -> GameMode;

    /// Advance one fixed step of `dt` seconds
    fn step(&mut self, now_ms: f64, dt: f32) -> Vec<GameEvent>;

    /// Clear every body and start over with score 0
    fn restart(&mut self, now_ms: f64) -> Vec<GameEvent>;

    /// Adapt to a new playfield size; non-positive sizes are ignored
    fn resize(&mut self, width: f32, height: f32);

    fn pointer_down(&mut self, pos: Vec2, now_ms: f64) -> Vec<GameEvent>;

    fn pointer_move(&mut self, pos: Vec2, now_ms: f64) -> Vec<GameEvent>;

    fn pointer_up(&mut self, pos: Vec2, now_ms: f64) -> Vec<GameEvent>;

    fn score(&self) -> u64;

    fn is_game_over(&self) -> bool;

    /// Remaining lives, for variants that have them
    fn lives(&self) -> Option<u8> {
        None
    }

    /// Level of the upcoming fruit, for variants that preview it
    fn next_level(&self) -> Option<usize> {
        None
    }

    /// Playfield size in pixels
    fn size(&self) -> Vec2;

    fn world(&self) -> &dyn PhysicsWorld;

    fn bodies(&self) -> &BodyTable;

    /// Current swipe, for variants that have one
    fn trail(&self) -> Option<&SliceTrail> {
        None
    }

    /// Pick up player preferences that affect the simulation
    fn apply_settings(&mut self, _settings: &Settings) {}

    /// Remove every body (unmount)
    fn clear(&mut self);
}

/// Insert the ground and side walls around a `width × height` playfield
///
/// Walls sit just outside the visible area.
pub fn spawn_walls<W: PhysicsWorld + ?Sized>(
    world: &mut W,
    table: &mut BodyTable,
    width: f32,
    height: f32,
    thickness: f32,
) -> Vec<BodyId> {
    let t = thickness;
    let walls = [
        // Ground
        (
            Vec2::new(width * 0.5, height + t * 0.5),
            Vec2::new(width + t * 2.0, t),
        ),
        // Left
        (Vec2::new(-t * 0.5, height * 0.5), Vec2::new(t, height * 2.0)),
        // Right
        (
            Vec2::new(width + t * 0.5, height * 0.5),
            Vec2::new(t, height * 2.0),
        ),
    ];

    walls
        .into_iter()
        .map(|(center, size)| {
            table.spawn(
                world,
                (BodyDesc::static_rect(center, size), GameBodyMeta::wall()),
            )
        })
        .collect()
}

/// Remove bodies that left the playfield by more than `margin`
///
/// Debris goes in any direction, fruit only below the bottom. Held fruit and
/// walls are never swept. Returns what was removed, ascending by id.
pub fn sweep_out_of_bounds<W: PhysicsWorld + ?Sized>(
    world: &mut W,
    table: &mut BodyTable,
    size: Vec2,
    margin: f32,
) -> Vec<(BodyId, GameBodyMeta)> {
    let doomed: Vec<BodyId> = table
        .iter()
        .filter_map(|(id, meta)| {
            let pos = world.body(id)?.position;
            let gone = match meta.kind {
                BodyKind::Debris { .. } => {
                    pos.x < -margin
                        || pos.x > size.x + margin
                        || pos.y < -margin
                        || pos.y > size.y + margin
                }
                BodyKind::Fruit { .. } => !meta.is_held && pos.y > size.y + margin,
                BodyKind::Wall => false,
            };
            gone.then_some(id)
        })
        .collect();

    doomed
        .into_iter()
        .filter_map(|id| table.despawn(world, id).map(|meta| (id, meta)))
        .collect()
}

/// Scale every non-wall body position from `old` to `new` playfield size
pub fn reproject_bodies<W: PhysicsWorld + ?Sized>(
    world: &mut W,
    table: &BodyTable,
    old: Vec2,
    new: Vec2,
) {
    if old.x <= 0.0 || old.y <= 0.0 {
        return;
    }
    let scale = new / old;
    for (id, meta) in table.iter() {
        if meta.kind == BodyKind::Wall {
            continue;
        }
        if let Some(state) = world.body(id) {
            world.set_position(id, state.position * scale);
        }
    }
}
