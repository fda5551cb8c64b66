//! Homogeneous 2D projection helpers.
//!
//! # Convention
//!
//! ```text
//! | m00 m01 m02 m03 |   | x |   | x' |
//! | m10 m11 m12 m13 | * | y | = | y' |     p = (x' / w, y' / w)
//! | m20 m21 m22 m23 |   | 0 |   | z' |
//! | m30 m31 m32 m33 |   | 1 |   | w  |
//! ```

use glam::{Mat4, Vec2, Vec4};
use pxl_core::Rect;

/// Smallest homogeneous `w` used as a divisor when projecting.
pub const PROJECTION_EPSILON: f32 = f32::EPSILON;

/// Projects `(x, y)` through `m`, dividing by the homogeneous component.
///
/// `w` is clamped to [`PROJECTION_EPSILON`] so points on or behind the
/// horizon land far away instead of producing NaN.
///
/// ```rust
/// use pxl_math::{project, Mat4};
///
/// let p = project(3.0, 4.0, &Mat4::IDENTITY);
/// assert_eq!((p.x, p.y), (3.0, 4.0));
/// ```
#[inline]
pub fn project(x: f32, y: f32, m: &Mat4) -> Vec2 {
    let v = *m * Vec4::new(x, y, 0.0, 1.0);
    Vec2::new(v.x, v.y) / v.w.max(PROJECTION_EPSILON)
}

/// `true` for the zero and identity matrices, which transform by plain copy.
#[inline]
pub fn is_degenerate(m: &Mat4) -> bool {
    *m == Mat4::ZERO || *m == Mat4::IDENTITY
}

/// Inverts `m`, returning `None` when it is singular or not finite.
///
/// ```rust
/// use pxl_math::{try_inverse, Mat4, Vec3};
///
/// assert!(try_inverse(&Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0))).is_some());
/// assert!(try_inverse(&Mat4::from_scale(Vec3::new(0.0, 2.0, 1.0))).is_none());
/// ```
pub fn try_inverse(m: &Mat4) -> Option<Mat4> {
    if !m.is_finite() {
        return None;
    }
    let det = m.determinant();
    if !det.is_finite() || det.abs() < f32::MIN_POSITIVE {
        return None;
    }
    let inv = m.inverse();
    inv.is_finite().then_some(inv)
}

/// Axis-aligned float bounds `(min, max)` of the projected image corners.
pub fn transformed_bounds(m: &Mat4, width: u32, height: u32) -> (Vec2, Vec2) {
    let (w, h) = (width as f32, height as f32);
    let corners = [
        project(0.0, 0.0, m),
        project(w, 0.0, m),
        project(w, h, m),
        project(0.0, h, m),
    ];
    let min = corners.iter().fold(Vec2::splat(f32::INFINITY), |acc, c| acc.min(*c));
    let max = corners
        .iter()
        .fold(Vec2::splat(f32::NEG_INFINITY), |acc, c| acc.max(*c));
    (min, max)
}

/// Size of the destination needed to hold a `width x height` image projected by `m`.
///
/// Degenerate matrices keep the source size. The result is at least 1x1.
pub fn transformed_size(m: &Mat4, width: u32, height: u32) -> (u32, u32) {
    if is_degenerate(m) {
        return (width, height);
    }
    let (min, max) = transformed_bounds(m, width, height);
    let extent = (max - min).ceil();
    let clamp = |v: f32| {
        if v.is_finite() {
            v.clamp(1.0, u32::MAX as f32) as u32
        } else {
            1
        }
    };
    (clamp(extent.x), clamp(extent.y))
}

/// Pixel rectangle covered by the projected image, clipped to `bounds`.
pub fn transformed_rect(m: &Mat4, width: u32, height: u32, bounds: Rect) -> Option<Rect> {
    let (min, max) = transformed_bounds(m, width, height);
    if !(min.is_finite() && max.is_finite()) {
        return Some(bounds);
    }
    let left = min.x.floor().max(0.0) as u32;
    let top = min.y.floor().max(0.0) as u32;
    let right = max.x.ceil().max(0.0).min(u32::MAX as f32) as u32;
    let bottom = max.y.ceil().max(0.0).min(u32::MAX as f32) as u32;
    Rect::from_corners(left, top, right, bottom).intersect(&bounds)
}

/// Homography mapping each `src[i]` onto `dst[i]`.
///
/// Returns `None` if the correspondences are degenerate (e.g. three collinear
/// points), in which case no projective map exists.
///
/// ```rust
/// use pxl_math::{project, quad_distortion, Vec2};
///
/// let src = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0), Vec2::new(0.0, 10.0)];
/// let dst = [Vec2::new(1.0, 1.0), Vec2::new(9.0, 0.0), Vec2::new(10.0, 10.0), Vec2::new(0.0, 9.0)];
/// let m = quad_distortion(src, dst).unwrap();
/// let p = project(10.0, 0.0, &m);
/// assert!((p.x - 9.0).abs() < 1e-3 && p.y.abs() < 1e-3);
/// ```
pub fn quad_distortion(src: [Vec2; 4], dst: [Vec2; 4]) -> Option<Mat4> {
    // Unknowns [a b c d e f g h]:
    //   u = (a x + b y + c) / (g x + h y + 1)
    //   v = (d x + e y + f) / (g x + h y + 1)
    let mut a = [[0.0f64; 9]; 8];
    for i in 0..4 {
        let (x, y) = (src[i].x as f64, src[i].y as f64);
        let (u, v) = (dst[i].x as f64, dst[i].y as f64);
        a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y, u];
        a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y, v];
    }
    let p = solve_augmented(&mut a)?;

    let m = Mat4::from_cols(
        Vec4::new(p[0] as f32, p[3] as f32, 0.0, p[6] as f32),
        Vec4::new(p[1] as f32, p[4] as f32, 0.0, p[7] as f32),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(p[2] as f32, p[5] as f32, 0.0, 1.0),
    );
    m.is_finite().then_some(m)
}

/// Gauss-Jordan elimination with partial pivoting on an 8x9 augmented system.
fn solve_augmented(a: &mut [[f64; 9]; 8]) -> Option<[f64; 8]> {
    const N: usize = 8;
    for col in 0..N {
        let pivot = (col..N).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);

        let inv = 1.0 / a[col][col];
        for k in col..=N {
            a[col][k] *= inv;
        }
        for row in 0..N {
            if row != col {
                let factor = a[row][col];
                if factor != 0.0 {
                    for k in col..=N {
                        a[row][k] -= factor * a[col][k];
                    }
                }
            }
        }
    }
    let mut out = [0.0f64; N];
    for (i, v) in out.iter_mut().enumerate() {
        *v = a[i][N];
    }
    Some(out)
}
