//! # MOSAIC Rendering
//!
//! Packs many small meshes into one vertex buffer and one index buffer per
//! vertex layout, so every instance of every mesh draws out of the same two
//! buffers with per-draw offsets.
//!
//! ## Architecture
//!
//! ```text
//! Arc<dyn Mesh> ──alloc──► MeshPool ──flush (only when dirty)──► MeshBufferSink
//!                             │         repack: vertices in insertion order,
//!                             │         one shared quad index run at offset 0,
//!                             │         private index runs after it
//!                             ▼
//!                     MeshHandle ──draw_args──► DrawIndexedIndirectArgs
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut pool = MeshPool::new(BlockVertex::LAYOUT, WgpuMeshBuffers::new(device));
//! let handle = pool.alloc(&cube);
//! pool.flush()?;
//! pool.bind_for_draw(&mut pass);
//! let args = pool.draw_args(handle, instances, 0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod draw;
pub mod error;
pub mod pool;
pub mod stats;
pub mod vertex;

pub use draw::{DrawCommands, DrawIndexedIndirectArgs};
pub use error::{BufferKind, PoolError, PoolResult};
pub use pool::{
    BufferedMesh, HostMeshBuffers, IndexSequence, Mesh, MeshBufferSink, MeshHandle, MeshId,
    MeshPool, SimpleMesh, WgpuMeshBuffers,
};
pub use stats::PoolStats;
pub use vertex::{BlockVertex, PosTexNormalVertex, Vertex, VertexLayout};
