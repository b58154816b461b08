//! Where packed buffers go.

use std::fmt;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::error::{BufferKind, PoolError, PoolResult};

/// Receives the two packed buffers of a pool.
///
/// An upload is all or nothing: on error the sink must still hold the
/// buffers from the previous successful upload.
pub trait MeshBufferSink {
    /// Replaces both buffers.
    fn upload(&mut self, vertices: &[u8], indices: &[u32]) -> PoolResult<()>;

    /// Frees both buffers. The sink is not used for drawing afterwards.
    fn release(&mut self);
}

fn check_limit(kind: BufferKind, bytes: usize, limit: u64) -> PoolResult<()> {
    let requested = bytes as u64;
    if requested > limit {
        return Err(PoolError::BufferTooLarge {
            kind,
            requested,
            limit,
        });
    }
    Ok(())
}

/// Host-memory sink.
///
/// Keeps a copy of the last upload. Used by CPU-side batching and anywhere a
/// device is not available.
#[derive(Debug, Clone)]
pub struct HostMeshBuffers {
    vertices: Vec<u8>,
    indices: Vec<u32>,
    uploads: u64,
    max_buffer_size: u64,
}

impl HostMeshBuffers {
    /// Creates an empty sink with no size limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(u64::MAX)
    }

    /// Creates an empty sink refusing buffers larger than `max_buffer_size`
    /// bytes.
    #[must_use]
    pub fn with_limit(max_buffer_size: u64) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            uploads: 0,
            max_buffer_size,
        }
    }

    /// Packed vertex bytes from the last upload.
    #[must_use]
    pub fn vertices(&self) -> &[u8] {
        &self.vertices
    }

    /// Packed indices from the last upload.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Successful uploads so far.
    #[must_use]
    pub const fn uploads(&self) -> u64 {
        self.uploads
    }
}

impl Default for HostMeshBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshBufferSink for HostMeshBuffers {
    fn upload(&mut self, vertices: &[u8], indices: &[u32]) -> PoolResult<()> {
        check_limit(BufferKind::Vertex, vertices.len(), self.max_buffer_size)?;
        check_limit(
            BufferKind::Index,
            std::mem::size_of_val(indices),
            self.max_buffer_size,
        )?;

        self.vertices.clear();
        self.vertices.extend_from_slice(vertices);
        self.indices.clear();
        self.indices.extend_from_slice(indices);
        self.uploads += 1;
        Ok(())
    }

    fn release(&mut self) {
        self.vertices = Vec::new();
        self.indices = Vec::new();
    }
}

/// GPU sink: one vertex buffer and one `Uint32` index buffer.
pub struct WgpuMeshBuffers {
    device: Arc<wgpu::Device>,
    label: &'static str,
    vertex: Option<wgpu::Buffer>,
    index: Option<wgpu::Buffer>,
}

impl WgpuMeshBuffers {
    /// Creates a sink with no buffers yet.
    #[must_use]
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self::with_label(device, "Mesh pool")
    }

    /// Creates a sink whose buffers carry `label` in debuggers.
    #[must_use]
    pub fn with_label(device: Arc<wgpu::Device>, label: &'static str) -> Self {
        Self {
            device,
            label,
            vertex: None,
            index: None,
        }
    }

    /// The packed vertex buffer, if anything was uploaded.
    #[must_use]
    pub fn vertex_buffer(&self) -> Option<&wgpu::Buffer> {
        self.vertex.as_ref()
    }

    /// The packed index buffer, if anything was uploaded.
    #[must_use]
    pub fn index_buffer(&self) -> Option<&wgpu::Buffer> {
        self.index.as_ref()
    }

    /// Binds the vertex buffer to slot 0 and the index buffer as `Uint32`.
    ///
    /// Returns false, binding nothing, if there is nothing to draw.
    pub fn bind_for_draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) -> bool {
        let (Some(vertex), Some(index)) = (&self.vertex, &self.index) else {
            return false;
        };
        if vertex.size() == 0 || index.size() == 0 {
            return false;
        }
        pass.set_vertex_buffer(0, vertex.slice(..));
        pass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint32);
        true
    }
}

impl MeshBufferSink for WgpuMeshBuffers {
    fn upload(&mut self, vertices: &[u8], indices: &[u32]) -> PoolResult<()> {
        let limit = self.device.limits().max_buffer_size;
        check_limit(BufferKind::Vertex, vertices.len(), limit)?;
        check_limit(BufferKind::Index, std::mem::size_of_val(indices), limit)?;

        let vertex = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(self.label),
                contents: vertices,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        let index = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(self.label),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            });

        self.release();
        self.vertex = Some(vertex);
        self.index = Some(index);
        Ok(())
    }

    fn release(&mut self) {
        for buffer in [self.vertex.take(), self.index.take()].into_iter().flatten() {
            buffer.destroy();
        }
    }
}

impl fmt::Debug for WgpuMeshBuffers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WgpuMeshBuffers")
            .field("label", &self.label)
            .field("vertex_bytes", &self.vertex.as_ref().map(wgpu::Buffer::size))
            .field("index_bytes", &self.index.as_ref().map(wgpu::Buffer::size))
            .finish_non_exhaustive()
    }
}
