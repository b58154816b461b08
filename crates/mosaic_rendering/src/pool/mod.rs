//! # Mesh Pool
//!
//! ```text
//! vertex buffer:  [ mesh 0 ][ mesh 1 ][ mesh 2 ] ...      insertion order, no gaps
//! index buffer:   [ shared quad run ][ run 1 ][ run 2 ]   non-quad meshes only
//!                   ^ first_index = 0 for every quad mesh
//! ```
//!
//! Registration is identity-keyed and grow-only. A flush repacks everything
//! when the set of meshes changed, and is free otherwise.

mod index;
mod mesh;
mod mesh_pool;
mod sink;

pub use index::IndexSequence;
pub use mesh::{Mesh, SimpleMesh};
pub use mesh_pool::{BufferedMesh, MeshHandle, MeshId, MeshPool};
pub use sink::{HostMeshBuffers, MeshBufferSink, WgpuMeshBuffers};
