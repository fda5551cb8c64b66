//! Error types for engine operations.

use thiserror::Error;

/// Error type for engine operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// A required argument is missing or unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Buffers have incompatible sizes.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A quantizer produced an index outside its palette.
    #[error("corrupt quantizer result: index {index} at ({x}, {y}) with palette of {palette_len} entries")]
    CorruptResult {
        /// Offending index value.
        index: u8,
        /// Palette length at the time of the check.
        palette_len: usize,
        /// Region-relative column.
        x: u32,
        /// Region-relative row.
        y: u32,
    },

    /// A quantizer returned an empty or oversized palette.
    #[error("quantizer returned a palette of {len} colors, expected 1..=256")]
    InvalidPalette {
        /// Palette length returned.
        len: usize,
    },

    /// The transform matrix has no inverse.
    #[error("transform matrix is not invertible")]
    NonInvertibleTransform,

    /// Error from core buffer or allocator operations.
    #[error(transparent)]
    Core(#[from] pxl_core::Error),
}

/// Result type for engine operations.
pub type OpsResult<T> = Result<T, OpsError>;
