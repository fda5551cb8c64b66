//! Error types for pxl-core operations.
//!
//! The [`Error`] enum covers the failure modes of the foundational types:
//! - Buffer construction and bounds checking
//! - Region resolution against buffer bounds
//! - Scratch and 2D buffer allocation through [`crate::BufferAllocator`]
//! - Worker pool construction in [`crate::ExecutionSettings`]
//!
//! # Usage
//!
//! ```rust
//! use pxl_core::{Error, Result};
//!
//! fn check_rows(first: u32, last: u32, width: u32, height: u32) -> Result<()> {
//!     if first > last || last > height {
//!         return Err(Error::invalid_region(0, first, width, last.saturating_sub(first), width, height));
//!     }
//!     Ok(())
//! }
//! assert!(check_rows(2, 9, 4, 4).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by buffers, regions, allocation and settings.
///
/// # Categories
///
/// - **Bounds errors**: [`InvalidRegion`](Error::InvalidRegion)
/// - **Allocation errors**: [`AllocationFailed`](Error::AllocationFailed)
/// - **Dimension errors**: [`DimensionMismatch`](Error::DimensionMismatch), [`InvalidDimensions`](Error::InvalidDimensions)
/// - **Pool errors**: [`ThreadPool`](Error::ThreadPool)
#[derive(Debug, Error)]
pub enum Error {
    /// Region of interest extends beyond buffer bounds.
    #[error("region ({rx}, {ry}, {rw}x{rh}) exceeds buffer bounds {width}x{height}")]
    InvalidRegion {
        /// Region X origin
        rx: u32,
        /// Region Y origin
        ry: u32,
        /// Region width
        rw: u32,
        /// Region height
        rh: u32,
        /// Buffer width
        width: u32,
        /// Buffer height
        height: u32,
    },

    /// Allocation was refused by the allocator or would overflow.
    #[error("failed to allocate {requested} bytes: {reason}")]
    AllocationFailed {
        /// Bytes requested
        requested: usize,
        /// Failure reason
        reason: String,
    },

    /// Buffer dimensions don't match for the operation.
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First buffer width
        a_width: u32,
        /// First buffer height
        a_height: u32,
        /// Second buffer width
        b_width: u32,
        /// Second buffer height
        b_height: u32,
    },

    /// Invalid buffer dimensions.
    ///
    /// Returned when backing storage length doesn't match `width * height`,
    /// or when the size computation overflows.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// The dedicated worker pool could not be built.
    #[error("thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Creates an [`Error::InvalidRegion`] error.
    #[inline]
    pub fn invalid_region(rx: u32, ry: u32, rw: u32, rh: u32, width: u32, height: u32) -> Self {
        Self::InvalidRegion {
            rx,
            ry,
            rw,
            rh,
            width,
            height,
        }
    }

    /// Creates an [`Error::AllocationFailed`] error.
    #[inline]
    pub fn allocation_failed(requested: usize, reason: impl Into<String>) -> Self {
        Self::AllocationFailed {
            requested,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (u32, u32), b: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        }
    }

    /// Returns `true` if this is a bounds-related error.
    #[inline]
    pub fn is_bounds_error(&self) -> bool {
        matches!(self, Self::InvalidRegion { .. })
    }

    /// Returns `true` if this is an allocation error.
    #[inline]
    pub fn is_allocation_error(&self) -> bool {
        matches!(self, Self::AllocationFailed { .. })
    }
}
