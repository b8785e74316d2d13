//! Game state and core simulation types
//!
//! The ball's phase, position and velocity live here and nowhere else; the
//! display layer reads a snapshot of them each frame.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the start action
    #[default]
    Idle,
    /// Active gameplay
    Playing,
    /// Ball sank through the floor; restart is pending
    GameOver,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Playing => "playing",
            Phase::GameOver => "gameover",
        }
    }
}

/// The ball, measured down from the top of the lane
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    /// Distance from the lane top (never negative after a step)
    pub y: f32,
    /// Positive = falling
    pub vel: f32,
}

impl Ball {
    pub fn is_falling(&self) -> bool {
        self.vel > 0.0
    }

    /// Keep the ball inside the ceiling; it cannot be pushed through it
    pub fn clamp_to_ceiling(&mut self) {
        if self.y < 0.0 {
            self.y = 0.0;
            self.vel = self.vel.max(0.0);
        }
    }
}

/// Lane dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub width: f32,
    pub height: f32,
}

impl Default for Lane {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
        }
    }
}

impl Lane {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Resting position of the ball's top edge on the lane bottom
    pub fn floor(&self) -> f32 {
        self.height - BALL_SIZE
    }
}

/// Complete ball state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameState {
    pub phase: Phase,
    pub ball: Ball,
    /// Timestamp (ms) of the last frame whose level reached the threshold
    pub last_over_ms: Option<f64>,
    /// Whether the ball was falling on the previous playing frame
    pub was_falling: bool,
    /// Bounces since the last (re)start
    pub bounces: u32,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start action: fresh ball, playing
    pub fn start(&mut self) {
        self.ball = Ball::default();
        self.bounces = 0;
        self.phase = Phase::Playing;
    }

    /// Automatic restart after game over
    pub fn restart(&mut self) {
        self.start();
    }

    /// Whether the ball has sunk far enough past `floor` to end the run
    pub fn floor_breached(&self, floor: f32) -> bool {
        self.ball.y > floor + FLOOR_TOLERANCE
    }

    /// Whether a loud moment was seen within the latch window before `now_ms`
    pub fn recently_over(&self, now_ms: f64) -> bool {
        self.last_over_ms
            .is_some_and(|t| now_ms - t <= OVER_LATCH_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = GameState::new();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.ball, Ball::default());
        assert!(!state.recently_over(0.0));
    }

    #[test]
    fn test_start_resets_ball() {
        let mut state = GameState::new();
        state.ball = Ball { y: 120.0, vel: 3.0 };
        state.phase = Phase::GameOver;
        state.start();
        assert_eq!(state.phase, Phase::Playing);
        assert_eq!(state.ball.y, 0.0);
        assert_eq!(state.ball.vel, 0.0);
    }

    #[test]
    fn test_ceiling_clamp_floors_velocity() {
        let mut ball = Ball { y: -4.0, vel: -6.0 };
        ball.clamp_to_ceiling();
        assert_eq!(ball.y, 0.0);
        assert_eq!(ball.vel, 0.0);

        let mut ball = Ball { y: 10.0, vel: -6.0 };
        ball.clamp_to_ceiling();
        assert_eq!(ball.y, 10.0);
        assert_eq!(ball.vel, -6.0);
    }

    #[test]
    fn test_floor_breach_tolerance() {
        let lane = Lane::new(800.0, 500.0);
        assert_eq!(lane.floor(), 440.0);

        let mut state = GameState::new();
        state.ball.y = 448.0;
        assert!(!state.floor_breached(lane.floor()));
        state.ball.y = 448.5;
        assert!(state.floor_breached(lane.floor()));
    }

    #[test]
    fn test_latch_window() {
        let mut state = GameState::new();
        state.last_over_ms = Some(1000.0);
        assert!(state.recently_over(1050.0));
        assert!(state.recently_over(1080.0));
        assert!(!state.recently_over(1080.5));
    }
}
