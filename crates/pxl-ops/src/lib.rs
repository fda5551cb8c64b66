//! # pxl-ops
//!
//! Parallel pixel-processing engines.
//!
//! # Modules
//!
//! - [`parallel`] - fork-join row scheduler shared by every engine
//! - [`quantize`] - palette quantization of a region, in place
//! - [`resample`] - sampling kernels
//! - [`transform`] - projective (homography) resampling
//!
//! # Example
//!
//! ```rust
//! use pxl_core::{Buffer2D, ExecutionSettings, Rgba8};
//! use pxl_math::ProjectiveTransformBuilder;
//! use pxl_ops::{transform_with_filter, Filter};
//!
//! let src: Buffer2D<Rgba8> = Buffer2D::filled(64, 48, [90, 120, 200, 255]);
//! let mut dst: Buffer2D<Rgba8> = Buffer2D::new(64, 48);
//! let m = ProjectiveTransformBuilder::new()
//!     .append_rotation_degrees(10.0)
//!     .build(64, 48)
//!     .unwrap();
//! transform_with_filter(&ExecutionSettings::default(), Filter::Bicubic, &src, &mut dst, m).unwrap();
//! ```
//!
//! # Feature Flags
//!
//! - `parallel` (default) - dispatch row intervals on rayon; without it
//!   intervals run one after another on the calling thread

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod parallel;
pub mod quantize;
pub mod resample;
pub mod transform;

pub use error::{OpsError, OpsResult};
pub use parallel::{iterate_rows, iterate_rows_with_scratch, RowInterval};
pub use quantize::{
    quantize, FrameQuantizer, MedianCutQuantizer, PaletteQuantizer, QuantizeProcessor,
    QuantizedResult, Quantizer, QuantizerOptions,
};
pub use resample::{Filter, Resampler};
pub use transform::{
    projective_transform, transform_to_new, transform_with_filter, ProjectiveTransformProcessor,
};
