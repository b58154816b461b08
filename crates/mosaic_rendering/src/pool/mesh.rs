//! The mesh contract.

use std::fmt;
use std::sync::Arc;

use mosaic_core::BoundingSphere;

use super::index::IndexSequence;
use crate::error::{PoolError, PoolResult};
use crate::vertex::{Vertex, VertexLayout};

/// Immutable geometry the pool can pack.
///
/// Meshes are shared as `Arc<dyn Mesh>` and are identified by allocation, not
/// by content: two equal meshes in different `Arc`s get two slots.
pub trait Mesh: Send + Sync {
    /// Layout of the vertex records [`write`](Self::write) produces.
    fn vertex_layout(&self) -> VertexLayout;

    /// Number of vertex records.
    fn vertex_count(&self) -> u32;

    /// Number of indices drawn.
    fn index_count(&self) -> u32;

    /// How the indices are generated.
    fn index_sequence(&self) -> &IndexSequence;

    /// Object-space bounds.
    fn bounding_sphere(&self) -> BoundingSphere;

    /// Vertex bytes: `vertex_count * stride`.
    fn size(&self) -> usize {
        self.vertex_count() as usize * self.vertex_layout().stride as usize
    }

    /// Serializes the vertices. `dst` is exactly [`size`](Self::size) bytes.
    fn write(&self, dst: &mut [u8]);
}

/// A mesh owning its vertex bytes.
#[derive(Clone)]
pub struct SimpleMesh {
    layout: VertexLayout,
    vertex_count: u32,
    vertices: Vec<u8>,
    index_sequence: IndexSequence,
    index_count: u32,
    bounds: BoundingSphere,
}

impl SimpleMesh {
    /// Builds a mesh from typed vertices.
    pub fn new<V: Vertex>(
        vertices: &[V],
        index_sequence: IndexSequence,
        index_count: u32,
    ) -> PoolResult<Self> {
        let vertex_count = u32::try_from(vertices.len()).map_err(|_| PoolError::IndexOverflow {
            count: vertices.len() as u64,
        })?;
        let positions: Vec<[f32; 3]> = vertices.iter().map(V::position).collect();
        Ok(Self {
            layout: V::LAYOUT,
            vertex_count,
            vertices: bytemuck::cast_slice(vertices).to_vec(),
            index_sequence,
            index_count,
            bounds: BoundingSphere::from_points(&positions),
        })
    }

    /// Four vertices per quad, shared quad indices.
    pub fn quads<V: Vertex>(vertices: &[V]) -> PoolResult<Self> {
        let vertex_count = u32::try_from(vertices.len()).map_err(|_| PoolError::IndexOverflow {
            count: vertices.len() as u64,
        })?;
        let index_count = IndexSequence::Quads.index_count_for(vertex_count);
        Self::new(vertices, IndexSequence::Quads, index_count)
    }

    /// Three vertices per triangle.
    pub fn triangles<V: Vertex>(vertices: &[V]) -> PoolResult<Self> {
        let index_count = u32::try_from(vertices.len()).map_err(|_| PoolError::IndexOverflow {
            count: vertices.len() as u64,
        })?;
        Self::new(vertices, IndexSequence::Linear, index_count)
    }

    /// Indexed triangles with their own index list.
    pub fn indexed<V: Vertex>(vertices: &[V], indices: Vec<u32>) -> PoolResult<Self> {
        let index_count = u32::try_from(indices.len()).map_err(|_| PoolError::IndexOverflow {
            count: indices.len() as u64,
        })?;
        Self::new(vertices, IndexSequence::Explicit(indices.into()), index_count)
    }

    /// Builds a mesh from raw vertex bytes.
    ///
    /// # Panics
    ///
    /// Panics if `vertices` is not a whole number of `layout.stride` records,
    /// or holds more than `u32::MAX` of them.
    #[must_use]
    pub fn from_bytes(
        layout: VertexLayout,
        vertices: Vec<u8>,
        index_sequence: IndexSequence,
        index_count: u32,
        bounds: BoundingSphere,
    ) -> Self {
        let stride = layout.stride as usize;
        assert!(
            stride > 0 && vertices.len() % stride == 0,
            "{} vertex bytes is not a multiple of stride {stride}",
            vertices.len()
        );
        let vertex_count =
            u32::try_from(vertices.len() / stride).expect("vertex count exceeds u32::MAX");
        Self {
            layout,
            vertex_count,
            vertices,
            index_sequence,
            index_count,
            bounds,
        }
    }

    /// Wraps the mesh for pool allocation.
    #[must_use]
    pub fn shared(self) -> Arc<dyn Mesh> {
        Arc::new(self)
    }
}

impl Mesh for SimpleMesh {
    fn vertex_layout(&self) -> VertexLayout {
        self.layout
    }

    fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    fn index_count(&self) -> u32 {
        self.index_count
    }

    fn index_sequence(&self) -> &IndexSequence {
        &self.index_sequence
    }

    fn bounding_sphere(&self) -> BoundingSphere {
        self.bounds
    }

    fn size(&self) -> usize {
        self.vertices.len()
    }

    fn write(&self, dst: &mut [u8]) {
        dst.copy_from_slice(&self.vertices);
    }
}

impl fmt::Debug for SimpleMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleMesh")
            .field("stride", &self.layout.stride)
            .field("vertex_count", &self.vertex_count)
            .field("index_count", &self.index_count)
            .field("index_sequence", &self.index_sequence)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::PosTexNormalVertex;

    fn quad_vertices() -> Vec<PosTexNormalVertex> {
        [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
            .into_iter()
            .map(|[x, y]| PosTexNormalVertex::new([x, y, 0.0], [x, y], [0.0, 0.0, 1.0]))
            .collect()
    }

    #[test]
    fn test_quads_mesh() {
        let mesh = SimpleMesh::quads(&quad_vertices()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(mesh.size(), 4 * 24);
        assert!(mesh.index_sequence().is_shared());
        assert_eq!(mesh.bounding_sphere().center, [0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_write_copies_vertex_bytes() {
        let vertices = quad_vertices();
        let mesh = SimpleMesh::triangles(&vertices[..3]).unwrap();
        let mut dst = vec![0u8; mesh.size()];
        mesh.write(&mut dst);
        assert_eq!(dst, bytemuck::cast_slice::<_, u8>(&vertices[..3]));
    }

    #[test]
    fn test_indexed_mesh() {
        let mesh = SimpleMesh::indexed(&quad_vertices(), vec![0, 1, 2, 0, 2, 3]).unwrap();
        assert_eq!(mesh.index_count(), 6);
        assert!(!mesh.index_sequence().is_shared());
    }

    #[test]
    fn test_from_bytes_zero_size() {
        let mesh = SimpleMesh::from_bytes(
            PosTexNormalVertex::LAYOUT,
            Vec::new(),
            IndexSequence::Linear,
            0,
            BoundingSphere::default(),
        );
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.size(), 0);
    }

    #[test]
    #[should_panic(expected = "not a multiple of stride")]
    fn test_from_bytes_rejects_partial_vertex() {
        let _ = SimpleMesh::from_bytes(
            PosTexNormalVertex::LAYOUT,
            vec![0; 25],
            IndexSequence::Linear,
            1,
            BoundingSphere::default(),
        );
    }
}
