//! Sampling kernels for the projective transform.
//!
//! A [`Resampler`] exposes a support radius and a 1D weight function; the
//! transform evaluates it separably in x and y around every projected
//! sample position. [`NearestNeighbor`] is recognized as a special case and
//! never builds kernel weights.
//!
//! # Kernels
//!
//! - [`NearestNeighbor`] - no interpolation
//! - [`BoxKernel`] - unit-width box
//! - [`Triangle`] - bilinear
//! - [`Bicubic`] - Catmull-Rom cubic (a = -0.5)
//! - [`MitchellNetravali`] - B = C = 1/3, softer than Catmull-Rom
//! - [`Lanczos3`] - windowed sinc
//!
//! The transform is generic over `R: Resampler`, so each kernel gets its own
//! monomorphized inner loop. [`Filter`] picks one at runtime.

use std::f32::consts::PI;

/// A separable sampling kernel.
///
/// Implementations hold no mutable state; `weight` is called concurrently
/// from every worker.
pub trait Resampler: Sync {
    /// Support radius at unit scale. Weights are zero beyond it.
    fn radius(&self) -> f32;

    /// Kernel value at signed offset `x`.
    fn weight(&self, x: f32) -> f32;

    /// `true` for nearest-neighbor sampling, which bypasses kernel weights.
    fn is_nearest(&self) -> bool {
        false
    }
}

/// Number of taps on each side of the sample for a `src -> dst` resize along one axis.
///
/// Downscaling widens the kernel by `src / dst` so every source pixel
/// contributes; upscaling keeps the unit radius.
///
/// ```rust
/// use pxl_ops::resample::{sampling_radius, Triangle};
///
/// assert_eq!(sampling_radius(&Triangle, 100, 200), 1);
/// assert_eq!(sampling_radius(&Triangle, 400, 100), 4);
/// ```
pub fn sampling_radius<R: Resampler + ?Sized>(resampler: &R, src: u32, dst: u32) -> u32 {
    (resampler.radius() * axis_scale(src, dst)).ceil().max(0.0) as u32
}

/// Kernel stretch factor for one axis: `max(1, src / dst)`.
#[inline]
pub(crate) fn axis_scale(src: u32, dst: u32) -> f32 {
    (src as f32 / dst.max(1) as f32).max(1.0)
}

/// Nearest-neighbor sampling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NearestNeighbor;

impl Resampler for NearestNeighbor {
    fn radius(&self) -> f32 {
        0.0
    }

    #[inline]
    fn weight(&self, x: f32) -> f32 {
        if x.abs() < 0.5 { 1.0 } else { 0.0 }
    }

    fn is_nearest(&self) -> bool {
        true
    }
}

/// Box kernel over `(-0.5, 0.5]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoxKernel;

impl Resampler for BoxKernel {
    fn radius(&self) -> f32 {
        0.5
    }

    #[inline]
    fn weight(&self, x: f32) -> f32 {
        // Half-open so a sample exactly between two taps picks one.
        if x > -0.5 && x <= 0.5 { 1.0 } else { 0.0 }
    }
}

/// Triangle (bilinear) kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Triangle;

impl Resampler for Triangle {
    fn radius(&self) -> f32 {
        1.0
    }

    #[inline]
    fn weight(&self, x: f32) -> f32 {
        let ax = x.abs();
        if ax < 1.0 { 1.0 - ax } else { 0.0 }
    }
}

/// Catmull-Rom cubic (Keys, a = -0.5).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bicubic;

impl Resampler for Bicubic {
    fn radius(&self) -> f32 {
        2.0
    }

    #[inline]
    fn weight(&self, x: f32) -> f32 {
        const A: f32 = -0.5;
        let ax = x.abs();
        if ax <= 1.0 {
            ((A + 2.0) * ax - (A + 3.0)) * ax * ax + 1.0
        } else if ax < 2.0 {
            ((A * ax - 5.0 * A) * ax + 8.0 * A) * ax - 4.0 * A
        } else {
            0.0
        }
    }
}

/// Mitchell-Netravali cubic with B = C = 1/3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MitchellNetravali;

impl Resampler for MitchellNetravali {
    fn radius(&self) -> f32 {
        2.0
    }

    #[inline]
    fn weight(&self, x: f32) -> f32 {
        const B: f32 = 1.0 / 3.0;
        const C: f32 = 1.0 / 3.0;

        let ax = x.abs();
        if ax < 1.0 {
            ((12.0 - 9.0 * B - 6.0 * C) * ax * ax * ax
                + (-18.0 + 12.0 * B + 6.0 * C) * ax * ax
                + (6.0 - 2.0 * B))
                / 6.0
        } else if ax < 2.0 {
            ((-B - 6.0 * C) * ax * ax * ax
                + (6.0 * B + 30.0 * C) * ax * ax
                + (-12.0 * B - 48.0 * C) * ax
                + (8.0 * B + 24.0 * C))
                / 6.0
        } else {
            0.0
        }
    }
}

/// Lanczos windowed sinc with three lobes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lanczos3;

impl Resampler for Lanczos3 {
    fn radius(&self) -> f32 {
        3.0
    }

    #[inline]
    fn weight(&self, x: f32) -> f32 {
        const A: f32 = 3.0;
        let ax = x.abs();
        if ax < 1e-8 {
            1.0
        } else if ax < A {
            let pi_x = PI * ax;
            let pi_x_a = pi_x / A;
            (pi_x.sin() / pi_x) * (pi_x_a.sin() / pi_x_a)
        } else {
            0.0
        }
    }
}

/// Runtime kernel selection.
///
/// Implements [`Resampler`] itself for convenience, but
/// [`transform_with_filter`](crate::transform::transform_with_filter)
/// dispatches to the concrete kernel types so the inner loop stays
/// monomorphized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    /// [`NearestNeighbor`].
    Nearest,
    /// [`BoxKernel`].
    Box,
    /// [`Triangle`].
    Bilinear,
    /// [`Bicubic`].
    #[default]
    Bicubic,
    /// [`MitchellNetravali`].
    Mitchell,
    /// [`Lanczos3`].
    Lanczos3,
}

impl Filter {
    /// Every filter, in declaration order.
    pub const ALL: [Filter; 6] = [
        Filter::Nearest,
        Filter::Box,
        Filter::Bilinear,
        Filter::Bicubic,
        Filter::Mitchell,
        Filter::Lanczos3,
    ];

    /// Lowercase name, e.g. `"lanczos3"`.
    pub fn name(&self) -> &'static str {
        match self {
            Filter::Nearest => "nearest",
            Filter::Box => "box",
            Filter::Bilinear => "bilinear",
            Filter::Bicubic => "bicubic",
            Filter::Mitchell => "mitchell",
            Filter::Lanczos3 => "lanczos3",
        }
    }
}

impl std::str::FromStr for Filter {
    type Err = crate::OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::OpsError::InvalidParameter(format!("unknown filter '{s}'")))
    }
}

impl Resampler for Filter {
    fn radius(&self) -> f32 {
        match self {
            Filter::Nearest => NearestNeighbor.radius(),
            Filter::Box => BoxKernel.radius(),
            Filter::Bilinear => Triangle.radius(),
            Filter::Bicubic => Bicubic.radius(),
            Filter::Mitchell => MitchellNetravali.radius(),
            Filter::Lanczos3 => Lanczos3.radius(),
        }
    }

    fn weight(&self, x: f32) -> f32 {
        match self {
            Filter::Nearest => NearestNeighbor.weight(x),
            Filter::Box => BoxKernel.weight(x),
            Filter::Bilinear => Triangle.weight(x),
            Filter::Bicubic => Bicubic.weight(x),
            Filter::Mitchell => MitchellNetravali.weight(x),
            Filter::Lanczos3 => Lanczos3.weight(x),
        }
    }

    fn is_nearest(&self) -> bool {
        matches!(self, Filter::Nearest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_at_zero() {
        for f in Filter::ALL.into_iter().filter(|f| *f != Filter::Mitchell) {
            assert_relative_eq!(f.weight(0.0), 1.0, epsilon = 1e-6);
        }
        assert_relative_eq!(MitchellNetravali.weight(0.0), 8.0 / 9.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_beyond_radius() {
        for f in Filter::ALL.into_iter().filter(|f| !f.is_nearest()) {
            let r = f.radius();
            assert_eq!(f.weight(r + 0.01), 0.0, "{}", f.name());
            assert_eq!(f.weight(-r - 0.01), 0.0, "{}", f.name());
        }
    }

    #[test]
    fn test_interpolating_kernels_vanish_at_integers() {
        for r in [&Triangle as &dyn Resampler, &Bicubic, &Lanczos3] {
            assert_relative_eq!(r.weight(1.0), 0.0, epsilon = 1e-6);
            assert_relative_eq!(r.weight(-1.0), 0.0, epsilon = 1e-6);
        }
        assert_relative_eq!(Bicubic.weight(2.0), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_partition_of_unity() {
        // Taps at integer offsets around a fractional sample sum to one.
        for r in [&Triangle as &dyn Resampler, &Bicubic, &MitchellNetravali] {
            for frac in [0.0f32, 0.25, 0.5, 0.8] {
                let sum: f32 = (-3..=3).map(|k| r.weight(k as f32 - frac)).sum();
                assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_box_half_open() {
        assert_eq!(BoxKernel.weight(0.5), 1.0);
        assert_eq!(BoxKernel.weight(-0.5), 0.0);
    }

    #[test]
    fn test_sampling_radius() {
        assert_eq!(sampling_radius(&NearestNeighbor, 10, 10), 0);
        assert_eq!(sampling_radius(&BoxKernel, 10, 10), 1);
        assert_eq!(sampling_radius(&Bicubic, 10, 20), 2);
        assert_eq!(sampling_radius(&Bicubic, 30, 10), 6);
        assert_eq!(sampling_radius(&Lanczos3, 10, 0), 30);
    }

    #[test]
    fn test_filter_dispatch() {
        assert!(Filter::Nearest.is_nearest());
        assert!(!Filter::Lanczos3.is_nearest());
        assert_eq!(Filter::Mitchell.weight(0.7), MitchellNetravali.weight(0.7));
        assert_eq!("Lanczos3".parse::<Filter>().unwrap(), Filter::Lanczos3);
        assert!("sinc".parse::<Filter>().is_err());
    }
}
