//! Fruit Fusion - merge-physics arcade games
//!
//! Core modules:
//! - `sim`: Simulation layer (engine seam, merge/spawn/game-over/slice logic, sessions)
//! - `renderer`: Canvas drawing of fruit and debris bodies
//! - `app`: Lifecycle host (mount/unmount/restart, fixed-step loop, notifications)
//! - `platform`: Browser shell (canvas, pointer input, animation frames, sprites)
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences

pub mod app;
pub mod error;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use app::{GameHost, HostListener};
pub use error::{GameError, GameResult};
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for stable stacking)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta fed into the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Number of pointer samples kept in a swipe trail
    pub const TRAIL_LENGTH: usize = 20;
}

/// Unit vector pointing along `theta`
#[inline]
pub fn direction(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}
