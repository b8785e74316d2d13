//! Vertex batch: a [`DrawSurface`] that collects triangles per blend mode

use glam::Vec2;

use super::shapes::{push_circle, segments_for_radius};
use super::vertex::Vertex;
use super::{BlendMode, DrawSurface};

/// Triangles collected for one frame, split by blend mode
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub alpha: Vec<Vertex>,
    pub additive: Vec<Vertex>,
    blend: BlendMode,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty() && self.additive.is_empty()
    }
}

impl DrawSurface for Batch {
    fn clear(&mut self) {
        self.alpha.clear();
        self.additive.clear();
    }

    fn set_blend(&mut self, blend: BlendMode) {
        self.blend = blend;
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        let target = match self.blend {
            BlendMode::Alpha => &mut self.alpha,
            BlendMode::Additive => &mut self.additive,
        };
        push_circle(target, center, radius, color, segments_for_radius(radius));
    }
}
