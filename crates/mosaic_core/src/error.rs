//! # Core Error Types
//!
//! All recoverable errors raised by the core crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring the core.
#[derive(Error, Debug)]
pub enum MosaicError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for [`crate::MosaicConfig`].
    #[error("invalid configuration: {0}")]
    ConfigParse(String),

    /// A backend name did not match any known backend.
    #[error("unknown backend {found:?}, expected one of: {}", valid.join(", "))]
    UnknownBackend {
        /// The name that was given.
        found: String,
        /// Every accepted name.
        valid: Vec<&'static str>,
    },

    /// The worker pool for parallel plan execution could not be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for core operations.
pub type MosaicResult<T> = Result<T, MosaicError>;
