//! Platform abstraction layer
//!
//! - `synthetic`: scripted signal source for the native demo and tests
//! - `web` (wasm32): animation-frame handle, clock and DOM helpers

pub mod synthetic;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use synthetic::SyntheticSource;
