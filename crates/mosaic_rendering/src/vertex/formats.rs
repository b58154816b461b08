//! Stock vertex formats.

use bytemuck::{Pod, Zeroable};

use super::{Vertex, VertexLayout};

/// Vertex for block and block-entity geometry.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BlockVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// RGBA tint.
    pub color: [u8; 4],
    /// Texture atlas coordinates.
    pub uv: [f32; 2],
    /// Block and sky light, packed.
    pub light: u32,
    /// Normal, signed-normalized; w is padding.
    pub normal: [i8; 4],
}

impl BlockVertex {
    /// Vertex buffer attributes.
    pub const ATTRIBS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3,  // position
        1 => Unorm8x4,   // color
        2 => Float32x2,  // uv
        3 => Uint32,     // light
        4 => Snorm8x4,   // normal
    ];
}

impl Vertex for BlockVertex {
    const LAYOUT: VertexLayout = VertexLayout::new(32, &Self::ATTRIBS);

    fn position(&self) -> [f32; 3] {
        self.position
    }
}

/// Minimal lit, textured vertex.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PosTexNormalVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
    /// Normal, signed-normalized; w is padding.
    pub normal: [i8; 4],
}

impl PosTexNormalVertex {
    /// Vertex buffer attributes.
    pub const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,  // position
        1 => Float32x2,  // uv
        2 => Snorm8x4,   // normal
    ];

    /// Creates a vertex with a unit normal given as floats.
    #[must_use]
    pub fn new(position: [f32; 3], uv: [f32; 2], normal: [f32; 3]) -> Self {
        Self {
            position,
            uv,
            normal: [pack_snorm(normal[0]), pack_snorm(normal[1]), pack_snorm(normal[2]), 0],
        }
    }
}

impl Vertex for PosTexNormalVertex {
    const LAYOUT: VertexLayout = VertexLayout::new(24, &Self::ATTRIBS);

    fn position(&self) -> [f32; 3] {
        self.position
    }
}

#[allow(clippy::cast_possible_truncation)]
fn pack_snorm(value: f32) -> i8 {
    (value.clamp(-1.0, 1.0) * 127.0).round() as i8
}
