//! Projective (homography) transform of a pixel buffer.
//!
//! Every destination pixel `(x, y)` is mapped back into the source through
//! the inverse of the transform matrix, then either copied from the nearest
//! source pixel or reconstructed by a separable kernel evaluated around the
//! projected position. Projective maps aren't affine, so weights are
//! recomputed for every pixel.
//!
//! # Boundary policy
//!
//! - Nearest-neighbor: a projected point outside the source leaves the
//!   destination pixel untouched.
//! - Weighted: taps past the border clamp to the edge ([`SourceExtents`]).
//!   A pixel whose whole sampling window lies outside the source is left
//!   untouched, like the nearest-neighbor case.
//!
//! # Example
//!
//! ```rust
//! use pxl_core::{Buffer2D, ExecutionSettings, Rgba8};
//! use pxl_math::{Mat4, Vec3};
//! use pxl_ops::resample::Bicubic;
//! use pxl_ops::transform::projective_transform;
//!
//! let src: Buffer2D<Rgba8> = Buffer2D::filled(32, 32, [200, 10, 10, 255]);
//! let mut dst: Buffer2D<Rgba8> = Buffer2D::new(32, 32);
//! let m = Mat4::from_translation(Vec3::new(4.0, 0.0, 0.0));
//! projective_transform(&ExecutionSettings::default(), &Bicubic, &src, &mut dst, m).unwrap();
//! assert_eq!(dst.get(10, 10), Some([200, 10, 10, 255]));
//! ```

use crate::parallel::{iterate_rows, iterate_rows_with_scratch};
use crate::resample::{
    axis_scale, sampling_radius, Bicubic, BoxKernel, Filter, Lanczos3, MitchellNetravali,
    NearestNeighbor, Resampler, Triangle,
};
use crate::{OpsError, OpsResult};
use pxl_core::{Buffer2D, BufferAllocator, ExecutionSettings, Pixel};
use pxl_math::{
    is_degenerate, project, transformed_size, try_inverse, Mat4, ProjectiveTransformBuilder, Vec2,
    Vec4,
};
use tracing::{debug, trace};

/// Inclusive clamp bounds `(min_x, min_y, max_x, max_y)` for tap coordinates.
///
/// For a `W x H` source this is `(0, 0, W - 1, H - 1)`. An empty source has
/// `max < min` on the empty axis; [`projective_transform`] never samples one,
/// and [`clamp`](Self::clamp) then pins to `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceExtents {
    /// Leftmost valid column.
    pub min_x: i64,
    /// Topmost valid row.
    pub min_y: i64,
    /// Rightmost valid column.
    pub max_x: i64,
    /// Bottom valid row.
    pub max_y: i64,
}

impl SourceExtents {
    /// Extents of `buffer`.
    pub fn of<P>(buffer: &Buffer2D<P>) -> Self {
        Self {
            min_x: 0,
            min_y: 0,
            max_x: buffer.width() as i64 - 1,
            max_y: buffer.height() as i64 - 1,
        }
    }

    /// Clamps `(x, y)` into the extents.
    #[inline]
    pub fn clamp(&self, x: i64, y: i64) -> (i64, i64) {
        (x.min(self.max_x).max(self.min_x), y.min(self.max_y).max(self.min_y))
    }
}

/// Tap layout along one axis.
#[derive(Debug, Clone, Copy)]
struct AxisSampler {
    radius: i64,
    scale: f32,
    min: i64,
    max: i64,
}

impl AxisSampler {
    fn new<R: Resampler + ?Sized>(resampler: &R, src: u32, dst: u32, min: i64, max: i64) -> Self {
        Self {
            radius: sampling_radius(resampler, src, dst) as i64,
            scale: axis_scale(src, dst),
            min,
            max,
        }
    }

    #[inline]
    fn taps(&self) -> usize {
        2 * self.radius as usize + 1
    }

    #[inline]
    fn clamp(&self, tap: i64) -> i64 {
        tap.min(self.max).max(self.min)
    }

    /// Writes normalized weights for taps `floor(center) - r ..= floor(center) + r` into `out`.
    ///
    /// Returns the first tap, or `None` when every tap lies outside the
    /// source or every weight is zero.
    fn weights<R: Resampler + ?Sized>(&self, resampler: &R, center: f32, out: &mut [f32]) -> Option<i64> {
        let base = center.floor() as i64;
        let first = base.saturating_sub(self.radius);
        let last = base.saturating_add(self.radius);
        if last < self.min || first > self.max {
            return None;
        }

        let mut sum = 0.0f32;
        for (k, w) in out.iter_mut().enumerate() {
            let tap = (first + k as i64) as f32;
            *w = resampler.weight((tap - center) / self.scale);
            sum += *w;
        }
        if sum == 0.0 {
            return None;
        }
        if sum != 1.0 {
            out.iter_mut().for_each(|w| *w /= sum);
        }
        Some(first)
    }
}

/// Kernel weight rows for one interval, `2 * radius + 1` wide per axis.
///
/// Allocated through the settings' allocator when an interval starts and
/// released when it ends.
struct KernelWeights {
    x: Buffer2D<f32>,
    y: Buffer2D<f32>,
}

impl KernelWeights {
    fn allocate(allocator: &BufferAllocator, ax: &AxisSampler, ay: &AxisSampler) -> OpsResult<Self> {
        Ok(Self {
            x: allocator.allocate_2d(ax.taps() as u32, 1)?,
            y: allocator.allocate_2d(ay.taps() as u32, 1)?,
        })
    }
}

/// Transforms `source` into `dest` through `matrix`.
///
/// The zero and identity matrices copy `source` verbatim (sizes must
/// match). Otherwise `dest` keeps its previous value wherever no source
/// pixel maps.
///
/// # Errors
///
/// - [`OpsError::SizeMismatch`] if the copy path sees different sizes
/// - [`OpsError::NonInvertibleTransform`] if `matrix` is singular
/// - allocation failures for scratch rows and kernel weights
pub fn projective_transform<P, R>(
    settings: &ExecutionSettings,
    resampler: &R,
    source: &Buffer2D<P>,
    dest: &mut Buffer2D<P>,
    matrix: Mat4,
) -> OpsResult<()>
where
    P: Pixel,
    R: Resampler + ?Sized,
{
    if is_degenerate(&matrix) {
        if source.dimensions() != dest.dimensions() {
            return Err(OpsError::SizeMismatch(format!(
                "copy transform needs equal sizes, got {}x{} -> {}x{}",
                source.width(),
                source.height(),
                dest.width(),
                dest.height()
            )));
        }
        debug!("degenerate matrix, copying source");
        dest.copy_from(source)?;
        return Ok(());
    }

    let inverse = try_inverse(&matrix).ok_or(OpsError::NonInvertibleTransform)?;
    if dest.is_empty() {
        return Ok(());
    }
    if source.is_empty() {
        debug!(src = ?source.dimensions(), "empty source, destination left as is");
        return Ok(());
    }

    if resampler.is_nearest() {
        debug!(
            src = ?source.dimensions(),
            dst = ?dest.dimensions(),
            "nearest-neighbor projective transform"
        );
        transform_nearest(settings, source, dest, &inverse)
    } else {
        transform_weighted(settings, resampler, source, dest, &inverse)
    }
}

/// [`projective_transform`] with a runtime-selected [`Filter`].
pub fn transform_with_filter<P: Pixel>(
    settings: &ExecutionSettings,
    filter: Filter,
    source: &Buffer2D<P>,
    dest: &mut Buffer2D<P>,
    matrix: Mat4,
) -> OpsResult<()> {
    match filter {
        Filter::Nearest => projective_transform(settings, &NearestNeighbor, source, dest, matrix),
        Filter::Box => projective_transform(settings, &BoxKernel, source, dest, matrix),
        Filter::Bilinear => projective_transform(settings, &Triangle, source, dest, matrix),
        Filter::Bicubic => projective_transform(settings, &Bicubic, source, dest, matrix),
        Filter::Mitchell => projective_transform(settings, &MitchellNetravali, source, dest, matrix),
        Filter::Lanczos3 => projective_transform(settings, &Lanczos3, source, dest, matrix),
    }
}

/// Renders into a freshly allocated `width x height` buffer.
///
/// The caller only sees the result once the whole transform succeeded.
pub fn transform_to_new<P, R>(
    settings: &ExecutionSettings,
    resampler: &R,
    source: &Buffer2D<P>,
    matrix: Mat4,
    width: u32,
    height: u32,
) -> OpsResult<Buffer2D<P>>
where
    P: Pixel,
    R: Resampler + ?Sized,
{
    let mut dest = settings.allocator().allocate_2d::<P>(width, height)?;
    projective_transform(settings, resampler, source, &mut dest, matrix)?;
    Ok(dest)
}

/// A transform bound to a kernel, matrix and target size.
#[derive(Debug, Clone)]
pub struct ProjectiveTransformProcessor<R> {
    resampler: R,
    matrix: Mat4,
    target: (u32, u32),
}

impl<R: Resampler> ProjectiveTransformProcessor<R> {
    /// Processor rendering into `width x height`.
    pub fn new(resampler: R, matrix: Mat4, width: u32, height: u32) -> Self {
        Self {
            resampler,
            matrix,
            target: (width, height),
        }
    }

    /// Builds the matrix for a `width x height` source and sizes the target to fit it.
    ///
    /// # Errors
    ///
    /// [`OpsError::NonInvertibleTransform`] if a builder step has no valid
    /// matrix or the composed matrix is singular.
    pub fn from_builder(
        resampler: R,
        builder: &ProjectiveTransformBuilder,
        width: u32,
        height: u32,
    ) -> OpsResult<Self> {
        let matrix = builder
            .build(width, height)
            .filter(|m| is_degenerate(m) || try_inverse(m).is_some())
            .ok_or(OpsError::NonInvertibleTransform)?;
        let (tw, th) = transformed_size(&matrix, width, height);
        Ok(Self::new(resampler, matrix, tw, th))
    }

    /// The forward matrix.
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// Target `(width, height)`.
    pub fn target_size(&self) -> (u32, u32) {
        self.target
    }

    /// Renders `source` into a new buffer of the target size.
    pub fn apply<P: Pixel>(&self, settings: &ExecutionSettings, source: &Buffer2D<P>) -> OpsResult<Buffer2D<P>> {
        let (w, h) = self.target;
        transform_to_new(settings, &self.resampler, source, self.matrix, w, h)
    }

    /// Renders `source` into an existing buffer.
    pub fn apply_into<P: Pixel>(
        &self,
        settings: &ExecutionSettings,
        source: &Buffer2D<P>,
        dest: &mut Buffer2D<P>,
    ) -> OpsResult<()> {
        projective_transform(settings, &self.resampler, source, dest, self.matrix)
    }
}

fn transform_nearest<P: Pixel>(
    settings: &ExecutionSettings,
    source: &Buffer2D<P>,
    dest: &mut Buffer2D<P>,
    inverse: &Mat4,
) -> OpsResult<()> {
    let bounds = source.bounds();
    let height = dest.height();
    iterate_rows(settings, 0..height, dest, |_, mut rows| {
        for (y, row) in rows.iter_mut() {
            for (x, out) in row.iter_mut().enumerate() {
                let p = project(x as f32, y as f32, inverse);
                let (sx, sy) = (p.x.round_ties_even(), p.y.round_ties_even());
                if !(sx.is_finite() && sy.is_finite()) {
                    continue;
                }
                let (sx, sy) = (sx as i64, sy as i64);
                if bounds.contains_signed(sx, sy) {
                    if let Some(px) = source.get(sx as u32, sy as u32) {
                        *out = px;
                    }
                }
            }
        }
        Ok(())
    })
}

fn transform_weighted<P, R>(
    settings: &ExecutionSettings,
    resampler: &R,
    source: &Buffer2D<P>,
    dest: &mut Buffer2D<P>,
    inverse: &Mat4,
) -> OpsResult<()>
where
    P: Pixel,
    R: Resampler + ?Sized,
{
    let (dw, dh) = dest.dimensions();
    let extents = SourceExtents::of(source);
    let ax = AxisSampler::new(resampler, source.width(), dw, extents.min_x, extents.max_x);
    let ay = AxisSampler::new(resampler, source.height(), dh, extents.min_y, extents.max_y);
    debug!(
        src = ?source.dimensions(),
        dst = ?dest.dimensions(),
        radius_x = ax.radius,
        radius_y = ay.radius,
        "weighted projective transform"
    );

    let allocator = settings.allocator();
    iterate_rows_with_scratch::<P, Option<[f32; 4]>, _>(
        settings,
        0..dh,
        dest,
        dw as usize,
        |interval, mut rows, scratch| {
            let mut weights = KernelWeights::allocate(allocator, &ax, &ay)?;
            trace!(rows = ?interval, "weighted interval");
            for (y, row) in rows.iter_mut() {
                for (x, out) in scratch.iter_mut().enumerate() {
                    let p = project(x as f32, y as f32, inverse);
                    *out = sample(resampler, source, p, &ax, &ay, &mut weights).map(|v| v.to_array());
                }
                // Only sampled pixels are repacked; the rest keep their exact bits.
                for (px, v) in row.iter_mut().zip(scratch.iter()) {
                    if let Some(v) = v {
                        *px = P::from_vec4(*v);
                    }
                }
            }
            Ok(())
        },
    )
}

/// Kernel-weighted sample of `source` around `p`, in straight (non-premultiplied) alpha.
fn sample<P, R>(
    resampler: &R,
    source: &Buffer2D<P>,
    p: Vec2,
    ax: &AxisSampler,
    ay: &AxisSampler,
    weights: &mut KernelWeights,
) -> Option<Vec4>
where
    P: Pixel,
    R: Resampler + ?Sized,
{
    if !p.is_finite() {
        return None;
    }
    let first_x = ax.weights(resampler, p.x, weights.x.row_mut(0))?;
    let first_y = ay.weights(resampler, p.y, weights.y.row_mut(0))?;
    let (wx, wy) = (weights.x.row(0), weights.y.row(0));

    let mut acc = Vec4::ZERO;
    for (j, &wy) in wy.iter().enumerate() {
        if wy == 0.0 {
            continue;
        }
        let src_row = source.row(ay.clamp(first_y + j as i64) as u32);
        for (i, &wx) in wx.iter().enumerate() {
            if wx == 0.0 {
                continue;
            }
            let px = src_row[ax.clamp(first_x + i as i64) as usize];
            acc += premultiply(Vec4::from_array(px.to_vec4())) * (wx * wy);
        }
    }
    Some(unpremultiply(acc))
}

#[inline]
fn premultiply(v: Vec4) -> Vec4 {
    Vec4::new(v.x * v.w, v.y * v.w, v.z * v.w, v.w)
}

#[inline]
fn unpremultiply(v: Vec4) -> Vec4 {
    if v.w > 0.0 {
        Vec4::new(v.x / v.w, v.y / v.w, v.z / v.w, v.w)
    } else {
        Vec4::ZERO
    }
}
