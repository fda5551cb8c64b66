//! # pxl-math
//!
//! Projective (homography) math for 2D image transforms.
//!
//! - [`project`] - map a point through a homogeneous matrix, dividing by `w`
//! - [`try_inverse`] - inversion that reports singular matrices
//! - [`is_degenerate`] - zero/identity detection for the copy fast path
//! - [`ProjectiveTransformBuilder`] - compose translation, scale, rotation,
//!   skew, taper and quad distortion into one matrix
//! - [`quad_distortion`] - homography from four point correspondences
//! - [`transformed_size`] - destination size that holds a projected image
//!
//! # Design
//!
//! Matrices are [`glam::Mat4`] with **column vectors**: a 2D point `(x, y)`
//! is lifted to `(x, y, 0, 1)` and transformed as `m * v`. Composing "apply
//! `a`, then `b`" is therefore `b * a`.
//!
//! ```rust
//! use pxl_math::{project, Mat4, Vec3};
//!
//! let m = Mat4::from_translation(Vec3::new(5.0, -2.0, 0.0));
//! let p = project(1.0, 1.0, &m);
//! assert_eq!((p.x, p.y), (6.0, -1.0));
//! ```
//!
//! # Dependencies
//!
//! - [`glam`] - SIMD-accelerated matrix and vector types
//! - `pxl-core` - [`Rect`](pxl_core::Rect)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod builder;
mod projective;

pub use builder::*;
pub use projective::*;

/// Re-export of the glam types used in public signatures.
pub use ::glam::{Mat4, Vec2, Vec3, Vec4};
