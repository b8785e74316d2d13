//! Mic Bounce - a microphone-driven bouncing ball toy
//!
//! Core modules:
//! - `meter`: Audio level acquisition (RMS + decibels)
//! - `sim`: Ball physics, game phases and fireworks particles
//! - `frame`: Per-frame driver tying meter, physics and fireworks together
//! - `renderer`: WebGPU rendering of the fireworks layer
//! - `platform`: Browser glue and synthetic signal sources
//! - `settings`: Persisted preferences and the shared threshold cell

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod frame;
pub mod meter;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use frame::{FrameLoop, FrameSnapshot, RestartTimer};
pub use meter::{AudioFrame, LevelMeter, LoudnessSample, SignalSource};
pub use settings::{Settings, SharedThreshold};

/// Game configuration constants
pub mod consts {
    /// Downward acceleration added to the ball velocity every frame step
    pub const GRAVITY: f32 = 0.05;
    /// Ball diameter in CSS pixels
    pub const BALL_SIZE: f32 = 60.0;
    /// How far past the floor the ball may sink before the run ends
    pub const FLOOR_TOLERANCE: f32 = 8.0;
    /// Upper bound on the upward impulse (more negative = stronger)
    pub const MIN_IMPULSE: f32 = -6.0;

    /// Level bar display range (dB)
    pub const DB_MIN: f32 = -60.0;
    pub const DB_MAX: f32 = -6.0;

    /// A loud moment stays "active" this long after it was last seen (ms)
    pub const OVER_LATCH_MS: f64 = 80.0;
    /// Longest frame step the loop will integrate (ms)
    pub const MAX_FRAME_DT_MS: f64 = 48.0;
    /// Delay between game over and the automatic restart (ms)
    pub const RESTART_DELAY_MS: f64 = 3000.0;

    /// Samples per audio frame
    pub const FRAME_SIZE: usize = 2048;
    /// Exponential smoothing applied by the analyser feeding the meter
    pub const ANALYSER_SMOOTHING: f64 = 0.2;
    /// Floor for the dB conversion so silence stays finite
    pub const RMS_EPSILON: f32 = 1e-8;

    /// Threshold slider range and resolution (linear RMS)
    pub const THRESHOLD_MIN: f32 = 0.005;
    pub const THRESHOLD_MAX: f32 = 0.35;
    pub const THRESHOLD_STEP: f32 = 0.001;
    pub const DEFAULT_THRESHOLD: f32 = 0.12;

    /// Fireworks layer height in CSS pixels
    pub const FX_HEIGHT: f32 = 320.0;
    /// Maximum concurrent bursts
    pub const MAX_BURSTS: usize = 8;
}

/// Convert a linear RMS level to decibels.
///
/// Always finite: the level is floored at [`consts::RMS_EPSILON`] (which also
/// absorbs NaN) and capped at `f32::MAX`.
#[inline]
pub fn rms_to_db(rms: f32) -> f32 {
    20.0 * rms.max(consts::RMS_EPSILON).min(f32::MAX).log10()
}

/// Map a dB value onto the 0..1 range of the level bar
#[inline]
pub fn db_to_unit(db: f32) -> f32 {
    use consts::{DB_MAX, DB_MIN};
    ((db - DB_MIN) / (DB_MAX - DB_MIN)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rms_to_db_known_values() {
        assert!((rms_to_db(1.0) - 0.0).abs() < 1e-5);
        assert!((rms_to_db(0.1) + 20.0).abs() < 1e-4);
        assert!((rms_to_db(0.0) + 160.0).abs() < 1e-3);
    }

    #[test]
    fn test_rms_to_db_degenerate_inputs_are_finite() {
        assert!(rms_to_db(f32::NAN).is_finite());
        assert!(rms_to_db(f32::INFINITY).is_finite());
        assert!(rms_to_db(-1.0).is_finite());
    }

    #[test]
    fn test_db_to_unit_clamps() {
        assert_eq!(db_to_unit(-100.0), 0.0);
        assert_eq!(db_to_unit(0.0), 1.0);
        assert!((db_to_unit(-33.0) - 0.5).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_rms_to_db_matches_formula(r in 0.0f32..10.0) {
            let expected = 20.0 * r.max(1e-8).log10();
            let db = rms_to_db(r);
            prop_assert!(db.is_finite());
            prop_assert!((db - expected).abs() < 1e-3);
        }
    }
}
