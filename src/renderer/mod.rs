//! Rendering module
//!
//! `draw_scene` paints through the [`Canvas`] trait; [`VertexCanvas`]
//! tessellates the frame and [`GpuSurface`] uploads it with WebGPU.

pub mod batch;
pub mod canvas;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use batch::VertexCanvas;
pub use canvas::{Canvas, draw_scene};
pub use pipeline::{GpuError, GpuSurface};
pub use vertex::Vertex;
