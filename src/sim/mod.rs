//! Simulation module
//!
//! Ball physics, game phases and fireworks particles. Nothing here touches the
//! platform: time, audio levels and randomness are all passed in.

pub mod fireworks;
pub mod state;
pub mod tick;

pub use fireworks::{Burst, Fireworks, Particle};
pub use state::{Ball, GameState, Lane, Phase};
pub use tick::{TickInput, TickOutcome, impulse_to_reach_top, tick};
