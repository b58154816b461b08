//! Pool statistics.

/// Snapshot of a mesh pool, for diagnostics overlays and logs.
///
/// Buffer sizes describe the last successful flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Distinct meshes registered.
    pub meshes: usize,
    /// Bytes in the packed vertex buffer.
    pub vertex_bytes: u64,
    /// Elements in the packed index buffer.
    pub index_count: u32,
    /// Length of the shared quad index run at the front of the index buffer.
    pub shared_quad_indices: u32,
    /// Completed repacks.
    pub uploads: u64,
}

impl PoolStats {
    /// Bytes in the packed index buffer.
    #[must_use]
    pub fn index_bytes(&self) -> u64 {
        u64::from(self.index_count) * 4
    }

    /// Total GPU memory held by the pool.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.vertex_bytes + self.index_bytes()
    }
}
