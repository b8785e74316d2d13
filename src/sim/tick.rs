//! Per-frame ball physics
//!
//! Advances the ball by one frame step. Gravity and impulses are applied per
//! step rather than scaled by frame time.

use super::state::{GameState, Phase};
use crate::consts::*;

/// Inputs for a single frame step
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Frame timestamp (ms, monotonic)
    pub now_ms: f64,
    /// Current loudness (linear RMS)
    pub rms: f32,
    /// Threshold read this frame
    pub threshold: f32,
    /// Floor position for the current lane size
    pub floor: f32,
}

/// What happened during a step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// An upward impulse was applied (spawn a firework)
    pub bounced: bool,
    /// The ball breached the floor and the run ended
    pub game_over: bool,
}

/// Velocity that carries the ball from `y` back up to the lane top under
/// [`GRAVITY`], with a one-unit margin. Never weaker than [`MIN_IMPULSE`].
#[inline]
pub fn impulse_to_reach_top(y: f32) -> f32 {
    let u = -(2.0 * GRAVITY * (y + 1.0)).max(0.0).sqrt();
    u.min(MIN_IMPULSE)
}

/// Advance the game state by one frame step.
///
/// Loud frames are recorded in every phase; the ball itself only moves while
/// playing. An impulse fires only while falling (or on the first falling
/// frame), so a sustained sound yields one bounce per descent rather than
/// holding the ball up.
pub fn tick(state: &mut GameState, input: &TickInput) -> TickOutcome {
    let mut outcome = TickOutcome::default();

    let over = input.rms >= input.threshold;
    if over {
        state.last_over_ms = Some(input.now_ms);
    }

    if state.phase != Phase::Playing {
        return outcome;
    }

    let is_falling = state.ball.is_falling();
    let just_started_falling = !state.was_falling && is_falling;
    state.was_falling = is_falling;

    let recently_over = state.recently_over(input.now_ms);
    if (over || recently_over) && (is_falling || just_started_falling) {
        state.ball.vel = impulse_to_reach_top(state.ball.y);
        state.bounces += 1;
        outcome.bounced = true;
    } else {
        state.ball.vel += GRAVITY;
    }

    state.ball.y += state.ball.vel;
    state.ball.clamp_to_ceiling();

    if state.floor_breached(input.floor) {
        state.phase = Phase::GameOver;
        outcome.game_over = true;
        log::info!(
            "Game over at y={:.1} (floor {:.1}) after {} bounces",
            state.ball.y,
            input.floor,
            state.bounces
        );
    }

    outcome
}
