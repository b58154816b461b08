//! # Vertex Formats
//!
//! A [`VertexLayout`] describes one interleaved vertex record. A pool stores
//! meshes of exactly one layout.

mod formats;

pub use formats::{BlockVertex, PosTexNormalVertex};

use bytemuck::Pod;

/// Interleaved vertex record layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    /// Bytes per vertex.
    pub stride: u32,
    /// Shader-visible attributes, in shader location order.
    pub attributes: &'static [wgpu::VertexAttribute],
}

impl VertexLayout {
    /// Creates a layout.
    #[must_use]
    pub const fn new(stride: u32, attributes: &'static [wgpu::VertexAttribute]) -> Self {
        Self { stride, attributes }
    }

    /// Stride as a buffer address.
    #[must_use]
    pub fn array_stride(&self) -> wgpu::BufferAddress {
        wgpu::BufferAddress::from(self.stride)
    }

    /// Vertex buffer layout descriptor for pipeline creation.
    #[must_use]
    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: self.array_stride(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: self.attributes,
        }
    }
}

/// A plain-data vertex with a known layout.
pub trait Vertex: Pod {
    /// Layout of this vertex type.
    const LAYOUT: VertexLayout;

    /// Object-space position, used for bounding volumes.
    fn position(&self) -> [f32; 3];
}
