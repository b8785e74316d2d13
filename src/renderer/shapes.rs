//! Shape generation for 2D primitives

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::Vertex;

/// Fewest segments used for any circle
pub const MIN_SEGMENTS: u32 = 8;
/// Most segments used for any circle
pub const MAX_SEGMENTS: u32 = 48;

/// Segment count that keeps edges smooth without wasting vertices on sparks
pub fn segments_for_radius(radius: f32) -> u32 {
    ((radius * 2.0).ceil() as u32).clamp(MIN_SEGMENTS, MAX_SEGMENTS)
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);
    push_circle(&mut vertices, center, radius, color, segments);
    vertices
}

/// Append a filled circle as a triangle fan (one triangle per segment)
pub fn push_circle(
    vertices: &mut Vec<Vertex>,
    center: Vec2,
    radius: f32,
    color: [f32; 4],
    segments: u32,
) {
    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        vertices.push(Vertex::at(center, color));
        vertices.push(Vertex::at(center + radius * Vec2::from_angle(theta1), color));
        vertices.push(Vertex::at(center + radius * Vec2::from_angle(theta2), color));
    }
}
