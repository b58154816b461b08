//! Index generation strategies.

use std::sync::Arc;

/// How a mesh's indices are produced.
///
/// [`IndexSequence::Quads`] depends only on the index count, never on the
/// geometry, so the pool writes it once and every quad mesh shares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSequence {
    /// Two triangles per four vertices: quad `q` is `4q + [0, 1, 2, 2, 3, 0]`.
    Quads,
    /// `0, 1, 2, ...`: vertices already form triangles.
    Linear,
    /// Indices stored with the mesh.
    Explicit(Arc<[u32]>),
}

impl IndexSequence {
    /// Per-quad index template.
    pub const QUAD_PATTERN: [u32; 6] = [0, 1, 2, 2, 3, 0];

    /// Returns true if the pool may share one run of this sequence between
    /// meshes.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Quads)
    }

    /// Writes the first `dst.len()` indices of this sequence.
    ///
    /// A quad fill that is not a multiple of six ends mid-pattern. Explicit
    /// storage shorter than `dst` continues linearly.
    pub fn fill(&self, dst: &mut [u32]) {
        match self {
            Self::Quads => {
                let mut base = 0u32;
                for quad in dst.chunks_mut(Self::QUAD_PATTERN.len()) {
                    for (slot, offset) in quad.iter_mut().zip(Self::QUAD_PATTERN) {
                        *slot = base + offset;
                    }
                    base = base.wrapping_add(4);
                }
            }
            Self::Linear => {
                for (slot, value) in dst.iter_mut().zip(0u32..) {
                    *slot = value;
                }
            }
            Self::Explicit(indices) => {
                for (slot, value) in dst.iter_mut().zip(0u32..) {
                    *slot = indices.get(value as usize).copied().unwrap_or(value);
                }
            }
        }
    }

    /// Index count covering `vertex_count` vertices with this sequence.
    #[must_use]
    pub fn index_count_for(&self, vertex_count: u32) -> u32 {
        match self {
            Self::Quads => vertex_count / 4 * 6,
            Self::Linear => vertex_count,
            Self::Explicit(indices) => u32::try_from(indices.len()).unwrap_or(u32::MAX),
        }
    }
}
