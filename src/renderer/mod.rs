//! WebGPU rendering module
//!
//! Simulation code draws through the [`DrawSurface`] trait; [`Batch`] turns
//! those calls into vertex lists and [`RenderState`] puts them on screen.

pub mod batch;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use batch::Batch;
pub use pipeline::{RenderError, RenderState};

use glam::Vec2;

/// How newly drawn shapes combine with what is already on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Normal "over" compositing
    #[default]
    Alpha,
    /// Colors add up, so overlapping shapes brighten
    Additive,
}

/// A 2D drawing target in CSS pixel coordinates (origin top-left, y down)
pub trait DrawSurface {
    /// Erase everything drawn so far
    fn clear(&mut self);
    /// Blend mode for subsequent draws
    fn set_blend(&mut self, blend: BlendMode);
    /// Filled circle
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]);
}

/// A circle recorded by [`RecordingSurface`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedCircle {
    pub center: Vec2,
    pub radius: f32,
    pub color: [f32; 4],
    pub blend: BlendMode,
}

/// Headless surface that remembers what was drawn since the last clear
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub circles: Vec<RecordedCircle>,
    pub blend: BlendMode,
    pub clears: u32,
}

impl DrawSurface for RecordingSurface {
    fn clear(&mut self) {
        self.circles.clear();
        self.clears += 1;
    }

    fn set_blend(&mut self, blend: BlendMode) {
        self.blend = blend;
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        self.circles.push(RecordedCircle {
            center,
            radius,
            color,
            blend: self.blend,
        });
    }
}
