//! Pixel capability traits.
//!
//! Engines never inspect channel layouts directly. Everything they need from a
//! pixel is the ability to round-trip through a normalized 4-channel float
//! vector `[r, g, b, a]`, which is what [`Pixel`] provides.
//!
//! # Types
//!
//! - [`PixelFormat`] - component types (u8, u16, f16, f32)
//! - [`Pixel`] - implemented for `[T; 1]` (gray), `[T; 3]` (RGB) and `[T; 4]` (RGBA)
//!
//! ```
//! use pxl_core::{Pixel, Rgba8};
//!
//! let px: Rgba8 = [255, 0, 0, 255];
//! assert_eq!(px.to_vec4(), [1.0, 0.0, 0.0, 1.0]);
//! assert_eq!(Rgba8::from_vec4([1.0, 0.0, 0.0, 1.0]), px);
//! ```
//!
//! # Dependencies
//!
//! - `half` crate for `f16` support

use half::f16;
use std::fmt;

/// Rec.709 luminance coefficient for red channel.
pub const REC709_LUMA_R: f32 = 0.2126;

/// Rec.709 luminance coefficient for green channel.
pub const REC709_LUMA_G: f32 = 0.7152;

/// Rec.709 luminance coefficient for blue channel.
pub const REC709_LUMA_B: f32 = 0.0722;

/// Calculate Rec.709 luminance from RGB values.
///
/// ```
/// use pxl_core::pixel::luminance_rec709;
/// let luma = luminance_rec709([0.5, 0.3, 0.2]);
/// assert!((luma - 0.3353).abs() < 0.0001);
/// ```
#[inline]
pub fn luminance_rec709(rgb: [f32; 3]) -> f32 {
    rgb[0] * REC709_LUMA_R + rgb[1] * REC709_LUMA_G + rgb[2] * REC709_LUMA_B
}

/// Trait for pixel component types.
///
/// Integers normalize to `[0.0, 1.0]`; floats pass through unchanged.
///
/// ```
/// use pxl_core::PixelFormat;
///
/// let v: u8 = 128;
/// assert!((v.to_f32() - 0.502).abs() < 0.01);
///
/// let back: u16 = PixelFormat::from_f32(0.5);
/// assert_eq!(back, 32768);
/// ```
pub trait PixelFormat: Copy + Default + PartialEq + Send + Sync + fmt::Debug + 'static {
    /// Convert to f32, normalizing integers to `[0.0, 1.0]`.
    fn to_f32(self) -> f32;

    /// Convert from f32. Integer formats clamp to `[0.0, 1.0]` and round.
    fn from_f32(v: f32) -> Self;
}

impl PixelFormat for u8 {
    #[inline]
    fn to_f32(self) -> f32 {
        self as f32 / 255.0
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

impl PixelFormat for u16 {
    #[inline]
    fn to_f32(self) -> f32 {
        self as f32 / 65535.0
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        (v.clamp(0.0, 1.0) * 65535.0).round() as u16
    }
}

impl PixelFormat for f16 {
    #[inline]
    fn to_f32(self) -> f32 {
        f16::to_f32(self)
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        f16::from_f32(v)
    }
}

impl PixelFormat for f32 {
    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        v
    }
}

/// A pixel representation that converts to and from normalized `[r, g, b, a]`.
///
/// Hot loops are generic over `P: Pixel`, so every concrete layout gets its
/// own monomorphized copy.
pub trait Pixel: Copy + Default + PartialEq + Send + Sync + fmt::Debug + 'static {
    /// Expand to a normalized RGBA vector.
    fn to_vec4(self) -> [f32; 4];

    /// Pack from a normalized RGBA vector.
    fn from_vec4(v: [f32; 4]) -> Self;
}

impl<T: PixelFormat> Pixel for [T; 4] {
    #[inline]
    fn to_vec4(self) -> [f32; 4] {
        [self[0].to_f32(), self[1].to_f32(), self[2].to_f32(), self[3].to_f32()]
    }

    #[inline]
    fn from_vec4(v: [f32; 4]) -> Self {
        [T::from_f32(v[0]), T::from_f32(v[1]), T::from_f32(v[2]), T::from_f32(v[3])]
    }
}

impl<T: PixelFormat> Pixel for [T; 3] {
    #[inline]
    fn to_vec4(self) -> [f32; 4] {
        [self[0].to_f32(), self[1].to_f32(), self[2].to_f32(), 1.0]
    }

    #[inline]
    fn from_vec4(v: [f32; 4]) -> Self {
        [T::from_f32(v[0]), T::from_f32(v[1]), T::from_f32(v[2])]
    }
}

impl<T: PixelFormat> Pixel for [T; 1] {
    #[inline]
    fn to_vec4(self) -> [f32; 4] {
        let v = self[0].to_f32();
        [v, v, v, 1.0]
    }

    #[inline]
    fn from_vec4(v: [f32; 4]) -> Self {
        [T::from_f32(luminance_rec709([v[0], v[1], v[2]]))]
    }
}

/// 8-bit RGBA.
pub type Rgba8 = [u8; 4];
/// 8-bit RGB.
pub type Rgb8 = [u8; 3];
/// 8-bit grayscale.
pub type Gray8 = [u8; 1];
/// 16-bit RGBA.
pub type Rgba16 = [u16; 4];
/// Half-float RGBA.
pub type RgbaF16 = [f16; 4];
/// 32-bit float RGBA.
pub type RgbaF32 = [f32; 4];
