//! The packing mesh arena.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tracing::{debug, debug_span, info, warn};

use super::mesh::Mesh;
use super::sink::{MeshBufferSink, WgpuMeshBuffers};
use crate::draw::DrawIndexedIndirectArgs;
use crate::error::{BufferKind, PoolError, PoolResult};
use crate::stats::PoolStats;
use crate::vertex::VertexLayout;

static NEXT_POOL_ID: AtomicU32 = AtomicU32::new(0);

/// Identity of a mesh: the address of its `Arc` allocation.
///
/// The pool keeps every registered `Arc` alive, so an id is never reused
/// while the pool exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(usize);

impl MeshId {
    /// Identity of `mesh`.
    #[must_use]
    pub fn of(mesh: &Arc<dyn Mesh>) -> Self {
        Self(Arc::as_ptr(mesh).cast::<()>() as usize)
    }
}

/// Refers to one mesh slot of one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle {
    pool: u32,
    slot: u32,
}

impl MeshHandle {
    /// Position of the mesh in the pool's insertion order.
    #[must_use]
    pub const fn slot(self) -> usize {
        self.slot as usize
    }
}

/// Where a mesh lives after packing.
pub struct BufferedMesh {
    mesh: Arc<dyn Mesh>,
    byte_index: u64,
    base_vertex: i32,
    first_index: u32,
}

impl BufferedMesh {
    fn new(mesh: Arc<dyn Mesh>) -> Self {
        Self {
            mesh,
            byte_index: 0,
            base_vertex: 0,
            first_index: 0,
        }
    }

    /// The packed mesh.
    #[must_use]
    pub fn mesh(&self) -> &Arc<dyn Mesh> {
        &self.mesh
    }

    /// Byte offset of the first vertex in the vertex buffer.
    #[must_use]
    pub const fn byte_index(&self) -> u64 {
        self.byte_index
    }

    /// Vertex offset added to every index.
    #[must_use]
    pub const fn base_vertex(&self) -> i32 {
        self.base_vertex
    }

    /// Offset of the first index in the index buffer.
    #[must_use]
    pub const fn first_index(&self) -> u32 {
        self.first_index
    }

    /// Indices to draw.
    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.mesh.index_count()
    }

    /// Vertex bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.mesh.size()
    }
}

impl fmt::Debug for BufferedMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedMesh")
            .field("byte_index", &self.byte_index)
            .field("base_vertex", &self.base_vertex)
            .field("first_index", &self.first_index)
            .field("index_count", &self.index_count())
            .finish()
    }
}

/// Placement computed by a repack, committed only once the upload worked.
#[derive(Clone, Copy)]
struct Placement {
    byte_index: u64,
    base_vertex: i32,
    first_index: u32,
}

/// Packs every registered mesh into one vertex and one index buffer.
///
/// Vertices are laid out back to back in registration order. Quad meshes
/// all read one shared index run at offset 0, as long as the longest quad
/// mesh; every other mesh gets a private run after it.
///
/// Meshes registered since the last successful flush have no placement yet.
/// Everything placed before keeps its placement, and the sink keeps the
/// matching buffers, until the next flush succeeds.
pub struct MeshPool<S> {
    id: u32,
    layout: VertexLayout,
    sink: S,
    lookup: HashMap<MeshId, u32>,
    meshes: Vec<BufferedMesh>,
    dirty: bool,
    /// Slots placed by the last successful repack.
    committed: usize,
    stats: PoolStats,
}

impl<S: MeshBufferSink> MeshPool<S> {
    /// Creates an empty pool for meshes of `layout`.
    pub fn new(layout: VertexLayout, sink: S) -> Self {
        Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            layout,
            sink,
            lookup: HashMap::new(),
            meshes: Vec::new(),
            dirty: false,
            committed: 0,
            stats: PoolStats::default(),
        }
    }

    /// Registers `mesh`, or returns its existing handle.
    ///
    /// Only a new mesh marks the pool dirty.
    ///
    /// # Panics
    ///
    /// Panics if the mesh's vertex layout differs from the pool's.
    pub fn alloc(&mut self, mesh: &Arc<dyn Mesh>) -> MeshHandle {
        let id = MeshId::of(mesh);
        if let Some(&slot) = self.lookup.get(&id) {
            return self.handle(slot);
        }

        assert_eq!(
            mesh.vertex_layout(),
            self.layout,
            "mesh vertex layout does not match the pool"
        );
        let slot = u32::try_from(self.meshes.len()).expect("mesh pool slot overflow");
        self.meshes.push(BufferedMesh::new(Arc::clone(mesh)));
        self.lookup.insert(id, slot);
        self.dirty = true;
        self.handle(slot)
    }

    /// Handle of an already registered mesh.
    #[must_use]
    pub fn get(&self, mesh: &Arc<dyn Mesh>) -> Option<MeshHandle> {
        self.lookup
            .get(&MeshId::of(mesh))
            .map(|&slot| self.handle(slot))
    }

    fn handle(&self, slot: u32) -> MeshHandle {
        MeshHandle { pool: self.id, slot }
    }

    /// Placement of a mesh.
    ///
    /// # Panics
    ///
    /// Panics if the mesh was registered after the last successful flush,
    /// or if `handle` belongs to another pool.
    #[must_use]
    pub fn buffered(&self, handle: MeshHandle) -> &BufferedMesh {
        assert_eq!(handle.pool, self.id, "mesh handle belongs to another pool");
        assert!(
            handle.slot() < self.committed,
            "mesh pool must be flushed before reading placements"
        );
        &self.meshes[handle.slot()]
    }

    /// Indirect draw arguments for `instance_count` instances of a mesh.
    ///
    /// # Panics
    ///
    /// Same conditions as [`buffered`](Self::buffered).
    #[must_use]
    pub fn draw_args(
        &self,
        handle: MeshHandle,
        instance_count: u32,
        first_instance: u32,
    ) -> DrawIndexedIndirectArgs {
        let mesh = self.buffered(handle);
        DrawIndexedIndirectArgs {
            index_count: mesh.index_count(),
            instance_count,
            first_index: mesh.first_index(),
            base_vertex: mesh.base_vertex(),
            first_instance,
        }
    }

    /// Returns true if meshes were added since the last successful flush.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Registered meshes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Returns true if no mesh is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Vertex layout of every mesh in the pool.
    #[must_use]
    pub const fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// The buffer sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// The buffer sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            meshes: self.meshes.len(),
            ..self.stats
        }
    }

    /// Repacks and uploads both buffers if the pool is dirty.
    ///
    /// # Errors
    ///
    /// [`PoolError::IndexOverflow`] if the packed buffers cannot be addressed
    /// with 32-bit draws, or whatever the sink reports. On error nothing
    /// changes: the pool stays dirty and keeps its previous placements.
    pub fn flush(&mut self) -> PoolResult<()> {
        if !self.dirty {
            return Ok(());
        }
        let _span = debug_span!("mesh_pool_flush", meshes = self.meshes.len()).entered();

        match self.repack() {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(err) => {
                warn!(%err, "mesh pool flush failed, keeping previous buffers");
                Err(err)
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn repack(&mut self) -> PoolResult<()> {
        // Pass 1: sizes.
        let mut vertex_bytes = 0u64;
        let mut vertex_count = 0u64;
        let mut max_quad_indices = 0u32;
        let mut private_indices = 0u64;
        for buffered in &self.meshes {
            let mesh = &buffered.mesh;
            vertex_bytes += mesh.size() as u64;
            vertex_count += u64::from(mesh.vertex_count());
            if mesh.index_sequence().is_shared() {
                max_quad_indices = max_quad_indices.max(mesh.index_count());
            } else {
                private_indices += u64::from(mesh.index_count());
            }
        }

        let total_indices = u64::from(max_quad_indices) + private_indices;
        let total_indices = u32::try_from(total_indices).map_err(|_| PoolError::IndexOverflow {
            count: total_indices,
        })?;
        if i32::try_from(vertex_count).is_err() {
            return Err(PoolError::IndexOverflow {
                count: vertex_count,
            });
        }
        let vertex_len = usize::try_from(vertex_bytes).map_err(|_| PoolError::BufferTooLarge {
            kind: BufferKind::Vertex,
            requested: vertex_bytes,
            limit: usize::MAX as u64,
        })?;

        // Scratch lives for this call only.
        let mut vertices = vec![0u8; vertex_len];
        let mut indices = vec![0u32; total_indices as usize];
        let mut placements = Vec::with_capacity(self.meshes.len());

        // Pass 2: write and place.
        let mut byte_index = 0usize;
        let mut base_vertex = 0i32;
        let mut next_private = max_quad_indices;
        for buffered in &self.meshes {
            let mesh = &buffered.mesh;
            let size = mesh.size();
            mesh.write(&mut vertices[byte_index..byte_index + size]);

            let first_index = if mesh.index_sequence().is_shared() {
                0
            } else {
                let start = next_private;
                next_private += mesh.index_count();
                mesh.index_sequence()
                    .fill(&mut indices[start as usize..next_private as usize]);
                start
            };

            placements.push(Placement {
                byte_index: byte_index as u64,
                base_vertex,
                first_index,
            });

            byte_index += size;
            // Bounded by the vertex count check above.
            base_vertex += mesh.vertex_count() as i32;
        }

        if max_quad_indices > 0 {
            super::IndexSequence::Quads.fill(&mut indices[..max_quad_indices as usize]);
        }

        self.sink.upload(&vertices, &indices)?;

        for (buffered, placement) in self.meshes.iter_mut().zip(placements) {
            buffered.byte_index = placement.byte_index;
            buffered.base_vertex = placement.base_vertex;
            buffered.first_index = placement.first_index;
        }
        self.committed = self.meshes.len();
        self.stats.vertex_bytes = vertex_bytes;
        self.stats.index_count = total_indices;
        self.stats.shared_quad_indices = max_quad_indices;
        self.stats.uploads += 1;

        debug!(
            meshes = self.meshes.len(),
            vertex_bytes,
            indices = total_indices,
            shared_quad_indices = max_quad_indices,
            "repacked mesh pool"
        );
        Ok(())
    }

    /// Frees the GPU buffers and every registration, returning the sink.
    pub fn delete(mut self) -> S {
        info!(
            meshes = self.meshes.len(),
            uploads = self.stats.uploads,
            "deleting mesh pool"
        );
        self.sink.release();
        self.meshes.clear();
        self.lookup.clear();
        self.committed = 0;
        self.sink
    }
}

impl MeshPool<WgpuMeshBuffers> {
    /// Binds the pool's buffers for indexed drawing.
    ///
    /// Binds the buffers of the last successful flush, which match every
    /// placement [`buffered`](MeshPool::buffered) hands out. Returns false if
    /// nothing was uploaded yet or the pool is empty.
    pub fn bind_for_draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) -> bool {
        if self.committed == 0 {
            return false;
        }
        self.sink.bind_for_draw(pass)
    }
}

impl<S: fmt::Debug> fmt::Debug for MeshPool<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshPool")
            .field("layout_stride", &self.layout.stride)
            .field("meshes", &self.meshes.len())
            .field("dirty", &self.dirty)
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{HostMeshBuffers, IndexSequence, SimpleMesh};
    use crate::vertex::{BlockVertex, PosTexNormalVertex, Vertex};
    use mosaic_core::BoundingSphere;

    /// Sink recording every upload.
    #[derive(Default)]
    struct RecordingSink {
        uploads: Vec<(usize, Vec<u32>)>,
        released: bool,
    }

    impl MeshBufferSink for RecordingSink {
        fn upload(&mut self, vertices: &[u8], indices: &[u32]) -> PoolResult<()> {
            self.uploads.push((vertices.len(), indices.to_vec()));
            Ok(())
        }

        fn release(&mut self) {
            self.released = true;
        }
    }

    const STRIDE: usize = 24;

    fn mesh(vertex_count: usize, sequence: IndexSequence, index_count: u32) -> Arc<dyn Mesh> {
        // Every byte of vertex i is i, so packing order is visible.
        let bytes = (0..vertex_count)
            .flat_map(|i| std::iter::repeat(i as u8).take(STRIDE))
            .collect();
        SimpleMesh::from_bytes(
            PosTexNormalVertex::LAYOUT,
            bytes,
            sequence,
            index_count,
            BoundingSphere::default(),
        )
        .shared()
    }

    fn pool() -> MeshPool<RecordingSink> {
        MeshPool::new(PosTexNormalVertex::LAYOUT, RecordingSink::default())
    }

    #[test]
    fn test_alloc_is_identity_keyed() {
        let mut pool = pool();
        let a = mesh(4, IndexSequence::Quads, 6);
        let twin = mesh(4, IndexSequence::Quads, 6);

        let first = pool.alloc(&a);
        pool.flush().unwrap();
        assert_eq!(pool.alloc(&a), first);
        assert!(!pool.is_dirty());

        assert_ne!(pool.alloc(&twin), first);
        assert!(pool.is_dirty());
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(&a), Some(first));
    }

    #[test]
    fn test_get_unknown_mesh() {
        let pool = pool();
        assert_eq!(pool.get(&mesh(3, IndexSequence::Linear, 3)), None);
    }

    #[test]
    fn test_packing_offsets() {
        let mut pool = pool();
        let counts = [3usize, 5, 0, 2];
        let handles: Vec<_> = counts
            .iter()
            .map(|&n| pool.alloc(&mesh(n, IndexSequence::Linear, n as u32)))
            .collect();
        pool.flush().unwrap();

        let mut bytes = 0;
        let mut vertices = 0;
        for (&handle, &n) in handles.iter().zip(&counts) {
            let buffered = pool.buffered(handle);
            assert_eq!(buffered.byte_index(), bytes as u64);
            assert_eq!(buffered.base_vertex(), vertices);
            bytes += n * STRIDE;
            vertices += n as i32;
        }
        assert_eq!(pool.sink().uploads[0].0, 10 * STRIDE);
    }

    #[test]
    fn test_shared_quad_run() {
        let mut pool = pool();
        let a = pool.alloc(&mesh(8, IndexSequence::Quads, 12));
        let b = pool.alloc(&mesh(16, IndexSequence::Quads, 24));
        let c = pool.alloc(&mesh(10, IndexSequence::Linear, 10));
        pool.flush().unwrap();

        assert_eq!(pool.buffered(a).first_index(), 0);
        assert_eq!(pool.buffered(b).first_index(), 0);
        assert_eq!(pool.buffered(c).first_index(), 24);

        let indices = &pool.sink().uploads[0].1;
        assert_eq!(indices.len(), 34);
        assert_eq!(indices[..6], [0, 1, 2, 2, 3, 0]);
        assert_eq!(indices[18..24], [12, 13, 14, 14, 15, 12]);
        assert_eq!(indices[24..], (0..10).collect::<Vec<u32>>()[..]);
        assert_eq!(pool.stats().shared_quad_indices, 24);
    }

    #[test]
    fn test_flush_only_when_dirty() {
        let mut pool = pool();
        pool.alloc(&mesh(3, IndexSequence::Linear, 3));
        pool.flush().unwrap();
        pool.flush().unwrap();
        assert_eq!(pool.sink().uploads.len(), 1);
        assert_eq!(pool.stats().uploads, 1);
    }

    #[test]
    fn test_empty_flush() {
        let mut pool = pool();
        pool.flush().unwrap();
        assert!(pool.sink().uploads.is_empty());
        assert!(pool.is_empty());
    }

    #[test]
    #[should_panic(expected = "must be flushed")]
    fn test_placement_requires_flush() {
        let mut pool = pool();
        let handle = pool.alloc(&mesh(3, IndexSequence::Linear, 3));
        let _ = pool.buffered(handle);
    }

    #[test]
    #[should_panic(expected = "another pool")]
    fn test_foreign_handle() {
        let mut first = pool();
        let mut second = pool();
        let handle = first.alloc(&mesh(3, IndexSequence::Linear, 3));
        second.alloc(&mesh(3, IndexSequence::Linear, 3));
        second.flush().unwrap();
        let _ = second.buffered(handle);
    }

    #[test]
    #[should_panic(expected = "vertex layout")]
    fn test_layout_mismatch() {
        let mut pool = pool();
        let block = SimpleMesh::triangles(&[BlockVertex::default(); 3])
            .unwrap()
            .shared();
        pool.alloc(&block);
    }

    #[test]
    fn test_draw_args() {
        let mut pool = pool();
        pool.alloc(&mesh(4, IndexSequence::Quads, 6));
        let tri = pool.alloc(&mesh(3, IndexSequence::Linear, 3));
        pool.flush().unwrap();

        let args = pool.draw_args(tri, 16, 32);
        assert_eq!(args.index_count, 3);
        assert_eq!(args.instance_count, 16);
        assert_eq!(args.first_index, 6);
        assert_eq!(args.base_vertex, 4);
        assert_eq!(args.first_instance, 32);
    }

    #[test]
    fn test_failed_flush_keeps_state() {
        // Room for exactly one 4-vertex mesh
        let sink = HostMeshBuffers::with_limit(4 * STRIDE as u64);
        let mut pool = MeshPool::new(PosTexNormalVertex::LAYOUT, sink);
        pool.alloc(&mesh(4, IndexSequence::Quads, 6));
        pool.flush().unwrap();
        let vertices_before = pool.sink().vertices().to_vec();
        let stats_before = pool.stats();

        pool.alloc(&mesh(2, IndexSequence::Linear, 2));
        let err = pool.flush().unwrap_err();
        assert!(matches!(
            err,
            PoolError::BufferTooLarge {
                kind: BufferKind::Vertex,
                requested: 144,
                limit: 96
            }
        ));

        assert!(pool.is_dirty());
        assert_eq!(pool.sink().vertices(), &vertices_before[..]);
        assert_eq!(pool.sink().indices(), &[0, 1, 2, 2, 3, 0]);
        assert_eq!(pool.stats().uploads, stats_before.uploads);
        assert_eq!(pool.stats().vertex_bytes, stats_before.vertex_bytes);
    }

    #[test]
    fn test_failed_flush_keeps_old_placements_drawable() {
        let sink = HostMeshBuffers::with_limit(4 * STRIDE as u64);
        let mut pool = MeshPool::new(PosTexNormalVertex::LAYOUT, sink);
        let first = pool.alloc(&mesh(3, IndexSequence::Linear, 3));
        pool.flush().unwrap();
        let before = pool.draw_args(first, 1, 0);
        assert_eq!(before.index_count, 3);

        pool.alloc(&mesh(3, IndexSequence::Linear, 3));
        assert!(pool.flush().is_err());
        assert!(pool.is_dirty());
        assert_eq!(pool.draw_args(first, 1, 0), before);
        assert_eq!(pool.buffered(first).byte_index(), 0);
    }

    #[test]
    #[should_panic(expected = "must be flushed")]
    fn test_unplaced_mesh_after_failed_flush() {
        let sink = HostMeshBuffers::with_limit(4 * STRIDE as u64);
        let mut pool = MeshPool::new(PosTexNormalVertex::LAYOUT, sink);
        pool.alloc(&mesh(3, IndexSequence::Linear, 3));
        pool.flush().unwrap();

        let second = pool.alloc(&mesh(3, IndexSequence::Linear, 3));
        let _ = pool.flush();
        let _ = pool.buffered(second);
    }

    #[test]
    fn test_delete_releases_sink() {
        let mut pool = pool();
        pool.alloc(&mesh(3, IndexSequence::Linear, 3));
        pool.flush().unwrap();
        let sink = pool.delete();
        assert!(sink.released);
    }
}
