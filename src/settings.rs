//! Player preferences
//!
//! Persisted separately from tuning in LocalStorage.

use serde::{Deserialize, Serialize};

/// Visual preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Fruit ===
    /// Draw level sprites over the flat fill once loaded
    pub sprites: bool,
    /// Outline width of fruit and debris (px)
    pub border_width: f32,

    // === Swipe ===
    /// Draw the swipe trail in the cut variant
    pub show_trail: bool,
    /// Trail stroke width (px)
    pub trail_width: f32,
    /// Trail stroke color
    pub trail_color: String,

    // === Accessibility ===
    /// Reduced motion (no debris spin)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sprites: true,
            border_width: 2.0,

            show_trail: true,
            trail_width: 5.0,
            trail_color: "#ffffff".to_string(),

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Effective outline width (never negative)
    pub fn effective_border_width(&self) -> f64 {
        self.border_width.max(0.0) as f64
    }

    /// Effective trail visibility (a zero-width trail is hidden)
    pub fn effective_trail(&self) -> bool {
        self.show_trail && self.trail_width > 0.0
    }

    /// Debris gets a random spin unless motion is reduced
    pub fn debris_spin(&self) -> bool {
        !self.reduced_motion
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "fruit_fusion_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage
            && let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY)
        {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring stored settings: {}", e),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage
            && let Ok(json) = serde_json::to_string(self)
        {
            let _ = storage.set_item(Self::STORAGE_KEY, &json);
            log::info!("Settings saved");
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
