//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering
//! and platform dependencies:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body id)
//! - Engine access only through [`PhysicsWorld`]

pub mod arc;
pub mod body;
pub mod circle_world;
pub mod collision;
pub mod cut_game;
pub mod drop_game;
pub mod game_over;
pub mod levels;
pub mod merge;
pub mod physics;
pub mod slice;
pub mod spawn;
pub mod state;

pub use arc::SliceArc;
pub use body::{BodyKind, BodyTable, GameBodyMeta, RenderMeta, debris_body, fruit_body};
pub use circle_world::CircleWorld;
pub use collision::CollisionResult;
pub use cut_game::{CutGame, TossSpawner};
pub use drop_game::DropGame;
pub use game_over::{Candidate, GameOverDetector};
pub use levels::{FRUIT_LEVELS, LevelDefinition, LevelTable};
pub use merge::resolve_merges;
pub use physics::{BodyDesc, BodyId, BodyState, ContactPair, Material, Motion, PhysicsWorld, Shape};
pub use slice::{SliceOutcome, SliceTrail, slice_body};
pub use spawn::{SpawnController, SpawnPhase, clamp_x, difficulty_window};
pub use state::{ArcadeGame, GameEvent, GameMode};

use crate::tuning::Tuning;

/// Build a fresh session of `mode` on the reference engine
pub fn new_session(
    mode: GameMode,
    tuning: &Tuning,
    width: f32,
    height: f32,
    seed: u64,
) -> Box<dyn ArcadeGame> {
    match mode {
        GameMode::Drop => Box::new(DropGame::new(CircleWorld::default(), tuning, width, height, seed)),
        GameMode::Cut => Box::new(CutGame::new(CircleWorld::default(), tuning, width, height, seed)),
    }
}
