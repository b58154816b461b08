//! Indirect draw commands.
//!
//! One [`DrawIndexedIndirectArgs`] per mesh, built from pool placements and
//! consumed by `draw_indexed_indirect` / `multi_draw_indexed_indirect`.

use bytemuck::{Pod, Zeroable};

/// Arguments of one indexed indirect draw, in the layout the GPU reads.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedIndirectArgs {
    /// Indices per instance.
    pub index_count: u32,
    /// Number of instances to draw.
    pub instance_count: u32,
    /// First index in the index buffer.
    pub first_index: u32,
    /// Vertex offset added to each index.
    pub base_vertex: i32,
    /// First instance ID.
    pub first_instance: u32,
}

impl DrawIndexedIndirectArgs {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Host-side list of draw commands, uploaded as one indirect buffer.
#[derive(Debug, Clone, Default)]
pub struct DrawCommands {
    commands: Vec<DrawIndexedIndirectArgs>,
}

impl DrawCommands {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the list for the next frame, keeping its allocation.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Appends a draw. Draws with no instances are skipped.
    pub fn push(&mut self, args: DrawIndexedIndirectArgs) {
        if args.instance_count > 0 {
            self.commands.push(args);
        }
    }

    /// Number of queued draws.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Queued draws.
    #[must_use]
    pub fn commands(&self) -> &[DrawIndexedIndirectArgs] {
        &self.commands
    }

    /// Commands as bytes for GPU upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_layout() {
        // draw_indexed_indirect reads five 32-bit words
        assert_eq!(DrawIndexedIndirectArgs::SIZE, 20);
        let args = DrawIndexedIndirectArgs {
            index_count: 6,
            instance_count: 2,
            first_index: 12,
            base_vertex: -1,
            first_instance: 7,
        };
        let words: &[u32] = bytemuck::cast_slice(std::slice::from_ref(&args));
        assert_eq!(words, &[6, 2, 12, u32::MAX, 7]);
    }

    #[test]
    fn test_commands_skip_empty_draws() {
        let mut commands = DrawCommands::new();
        commands.push(DrawIndexedIndirectArgs {
            index_count: 6,
            instance_count: 0,
            ..Default::default()
        });
        commands.push(DrawIndexedIndirectArgs {
            index_count: 6,
            instance_count: 3,
            ..Default::default()
        });
        assert_eq!(commands.len(), 1);
        assert_eq!(commands.as_bytes().len(), 20);

        commands.clear();
        assert!(commands.is_empty());
    }
}
