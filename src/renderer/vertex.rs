//! Vertex format shared by the batch and the pipelines

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Position (CSS pixels until uploaded, NDC after) and straight RGBA
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn at(point: Vec2, color: [f32; 4]) -> Self {
        Self::new(point.x, point.y, color)
    }

    /// Map from a layer of `css_size` pixels (origin top-left, y down) into
    /// clip space (origin centre, y up)
    pub fn to_ndc(self, css_size: Vec2) -> Self {
        let size = css_size.max(Vec2::ONE);
        let [x, y] = self.position;
        Self::new(x / size.x * 2.0 - 1.0, 1.0 - y / size.y * 2.0, self.color)
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

pub mod colors {
    /// The layer sits over the page, so it clears to transparent
    pub const CLEAR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];
}
