//! Error types for glbsplice

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for glbsplice operations
pub type Result<T> = std::result::Result<T, GlbError>;

/// Errors that can occur while reading, writing or repairing a container
#[derive(Debug, Error)]
pub enum GlbError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input is not a GLB container, or its first chunk is not JSON
    #[error("Invalid GLB format: {0}")]
    InvalidFormat(String),

    /// Chunk payload extends past the end of the input (strict reads only)
    #[error(
        "Truncated {tag} chunk: declared {declared} bytes, only {available} available"
    )]
    TruncatedChunk {
        /// Printable chunk tag
        tag: String,
        /// Declared payload length
        declared: u32,
        /// Bytes actually present
        available: usize,
    },

    /// Backup container has no usable BIN chunk
    #[error("Backup {} has no BIN chunk; aborting to avoid data loss", .0.display())]
    DataLossGuard(PathBuf),

    /// Container would not fit the 32-bit length fields
    #[error("Data too large: {size} bytes exceeds limit of {limit} bytes")]
    DataTooLarge {
        /// Actual size
        size: usize,
        /// Size limit
        limit: usize,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
