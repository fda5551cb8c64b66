//! # pxl-core
//!
//! Core types for the pxl parallel pixel-processing engines.
//!
//! - [`Buffer2D`], [`RowsMut`] - row-major pixel storage and disjoint row bands
//! - [`Pixel`], [`PixelFormat`] - pixel capability (normalized RGBA round trip)
//! - [`Rect`] - regions of interest
//! - [`ExecutionSettings`], [`BufferAllocator`] - parallelism knobs and scoped allocation
//! - [`Error`] - shared error type
//!
//! ## Crate Structure
//!
//! ```text
//! pxl-core (this crate)
//!    ^
//!    +-- pxl-math (projective matrices)
//!    +-- pxl-ops  (row scheduler, quantize, projective transform)
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Serialize/Deserialize for [`Rect`] and [`ExecutionConfig`]

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod error;
pub mod pixel;
pub mod rect;
pub mod settings;

pub use buffer::{Buffer2D, RowsMut};
pub use error::{Error, Result};
pub use pixel::{Gray8, Pixel, PixelFormat, Rgb8, Rgba16, Rgba8, RgbaF16, RgbaF32};
pub use rect::Rect;
pub use settings::{BufferAllocator, ExecutionConfig, ExecutionSettings, DEFAULT_MIN_PIXELS_PER_TASK};

/// Prelude module for convenient imports.
///
/// ```
/// use pxl_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::buffer::{Buffer2D, RowsMut};
    pub use crate::error::{Error, Result};
    pub use crate::pixel::{Pixel, PixelFormat, Rgb8, Rgba8, RgbaF32};
    pub use crate::rect::Rect;
    pub use crate::settings::{BufferAllocator, ExecutionSettings};
}
