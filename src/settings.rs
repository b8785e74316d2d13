//! Player preferences and the live threshold
//!
//! Persisted in LocalStorage. The threshold is also exposed as a shared cell
//! so the slider and the frame loop see the same value.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_THRESHOLD, THRESHOLD_MAX, THRESHOLD_MIN, THRESHOLD_STEP};

/// Clamp to the slider range and snap to its step
pub fn sanitize_threshold(value: f32) -> f32 {
    if !value.is_finite() {
        return DEFAULT_THRESHOLD;
    }
    let snapped = (value / THRESHOLD_STEP).round() * THRESHOLD_STEP;
    snapped.clamp(THRESHOLD_MIN, THRESHOLD_MAX)
}

/// Threshold cell shared between the slider handler and the frame loop.
///
/// Clones point at the same cell, so the loop never holds a stale copy.
#[derive(Debug, Clone)]
pub struct SharedThreshold(Rc<Cell<f32>>);

impl Default for SharedThreshold {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl SharedThreshold {
    pub fn new(value: f32) -> Self {
        Self(Rc::new(Cell::new(sanitize_threshold(value))))
    }

    pub fn get(&self) -> f32 {
        self.0.get()
    }

    /// Store a new value (sanitized) and return what was stored
    pub fn set(&self, value: f32) -> f32 {
        let value = sanitize_threshold(value);
        self.0.set(value);
        value
    }
}

/// Player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bounce threshold (linear RMS)
    pub threshold: f32,
    /// Spawn a firework on every bounce
    pub fireworks: bool,
    /// Show FPS counter
    pub show_fps: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            fireworks: true,
            show_fps: false,
        }
    }
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "mic_bounce_settings";

    /// Fresh shared cell seeded with this threshold
    pub fn threshold_cell(&self) -> SharedThreshold {
        SharedThreshold::new(self.threshold)
    }

    /// Parse persisted JSON, sanitizing the threshold
    pub fn from_json(json: &str) -> Option<Self> {
        let mut settings: Settings = serde_json::from_str(json).ok()?;
        settings.threshold = sanitize_threshold(settings.threshold);
        Some(settings)
    }

    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Some(settings) = Self::from_json(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
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

        if let (Some(storage), Some(json)) = (storage, self.to_json()) {
            let _ = storage.set_item(Self::STORAGE_KEY, &json);
            log::debug!("Settings saved");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_clamps_and_snaps() {
        assert_eq!(sanitize_threshold(0.0), THRESHOLD_MIN);
        assert_eq!(sanitize_threshold(1.0), THRESHOLD_MAX);
        assert!((sanitize_threshold(0.1234) - 0.123).abs() < 1e-6);
        assert_eq!(sanitize_threshold(f32::NAN), DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_shared_threshold_clones_see_writes() {
        let slider = SharedThreshold::default();
        let frame_loop = slider.clone();
        assert!((frame_loop.get() - DEFAULT_THRESHOLD).abs() < 1e-6);

        slider.set(0.2);
        assert!((frame_loop.get() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_settings_json_roundtrip_sanitizes() {
        let json = r#"{"threshold": 0.9, "fireworks": false}"#;
        let settings = Settings::from_json(json).expect("valid json");
        assert_eq!(settings.threshold, THRESHOLD_MAX);
        assert!(!settings.fireworks);
        assert!(!settings.show_fps);

        assert!(Settings::from_json("not json").is_none());
    }
}
