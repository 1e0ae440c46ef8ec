//! Platform layer
//!
//! The browser shell lives in `web` (wasm32 only). Native builds drive
//! [`crate::app::GameHost`] directly.

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::FruitFusion;
