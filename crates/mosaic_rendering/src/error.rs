//! Mesh pool errors.

use std::fmt;

use thiserror::Error;

/// Which of the two pool buffers an error is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// The packed vertex buffer.
    Vertex,
    /// The packed index buffer.
    Index,
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Index => f.write_str("index"),
        }
    }
}

/// Errors that can occur while repacking a pool.
///
/// A failed flush leaves the pool dirty with its previous placements and
/// buffers intact.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The packed buffer exceeds what the device (or host) can allocate.
    #[error("{kind} buffer needs {requested} bytes, limit is {limit}")]
    BufferTooLarge {
        /// Buffer that overflowed.
        kind: BufferKind,
        /// Bytes the repack needed.
        requested: u64,
        /// Largest allowed buffer.
        limit: u64,
    },

    /// More indices or vertices than a 32-bit draw can address.
    #[error("{count} elements do not fit in a 32-bit index")]
    IndexOverflow {
        /// Element count that overflowed.
        count: u64,
    },
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
