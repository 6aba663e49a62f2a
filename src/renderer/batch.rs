//! CPU-side frame batching
//!
//! [`VertexCanvas`] turns canvas calls into one triangle list per frame,
//! still in logical pixels. The GPU surface maps it to clip space.

use glam::Vec2;

use super::canvas::Canvas;
use super::shapes;
use super::vertex::Vertex;

/// Canvas that tessellates into a vertex list
#[derive(Debug, Default)]
pub struct VertexCanvas {
    vertices: Vec<Vertex>,
    size: (f32, f32),
}

impl VertexCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Logical size passed to the last `clear`
    pub fn logical_size(&self) -> (f32, f32) {
        self.size
    }
}

impl Canvas for VertexCanvas {
    fn clear(&mut self, width: f32, height: f32) {
        self.vertices.clear();
        self.size = (width, height);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        if color[3] <= 0.0 {
            return;
        }
        self.vertices.extend(shapes::circle(
            center,
            radius,
            color,
            shapes::segments_for(radius),
        ));
    }

    fn radial_glow(&mut self, center: Vec2, radius: f32, inner: [f32; 4], outer: [f32; 4]) {
        if inner[3] <= 0.0 && outer[3] <= 0.0 {
            return;
        }
        self.vertices.extend(shapes::radial_gradient(
            center,
            radius,
            inner,
            outer,
            shapes::segments_for(radius),
        ));
    }
}
