//! Composable construction of projective transform matrices.
//!
//! Each step is a factory evaluated against the source size when the
//! matrix is built, so steps like "rotate about the centre" don't need the
//! size up front.
//!
//! ```rust
//! use pxl_math::{ProjectiveTransformBuilder, TaperCorner, TaperSide};
//!
//! let m = ProjectiveTransformBuilder::new()
//!     .append_rotation_degrees(15.0)
//!     .append_taper(TaperSide::Right, TaperCorner::Both, 0.5)
//!     .build(640, 480)
//!     .unwrap();
//! assert!(m.is_finite());
//! ```

use crate::projective::quad_distortion;
use glam::{Mat4, Vec2, Vec3, Vec4};

/// Edge of the image that a taper shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaperSide {
    /// Left edge.
    Left,
    /// Top edge.
    Top,
    /// Right edge.
    Right,
    /// Bottom edge.
    Bottom,
}

/// Where the shrunken edge stays anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaperCorner {
    /// Anchored at the left (for top/bottom) or top (for left/right) end.
    LeftOrTop,
    /// Anchored at the right or bottom end.
    RightOrBottom,
    /// Shrinks symmetrically toward the middle.
    Both,
}

type Step = Box<dyn Fn(Vec2) -> Option<Mat4> + Send + Sync>;

/// Builds a projective matrix from an ordered list of steps.
///
/// Steps apply in the order they're appended; [`prepend_matrix`](Self::prepend_matrix)
/// inserts a step that runs first.
#[derive(Default)]
pub struct ProjectiveTransformBuilder {
    steps: Vec<Step>,
}

impl ProjectiveTransformBuilder {
    /// Empty builder (builds the identity).
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, step: impl Fn(Vec2) -> Option<Mat4> + Send + Sync + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Appends a raw matrix.
    pub fn append_matrix(self, m: Mat4) -> Self {
        self.push(move |_| Some(m))
    }

    /// Prepends a raw matrix, applied before every other step.
    pub fn prepend_matrix(mut self, m: Mat4) -> Self {
        self.steps.insert(0, Box::new(move |_| Some(m)));
        self
    }

    /// Appends a translation in pixels.
    pub fn append_translation(self, dx: f32, dy: f32) -> Self {
        self.append_matrix(Mat4::from_translation(Vec3::new(dx, dy, 0.0)))
    }

    /// Appends a scale about the origin.
    pub fn append_scale(self, sx: f32, sy: f32) -> Self {
        self.append_matrix(Mat4::from_scale(Vec3::new(sx, sy, 1.0)))
    }

    /// Appends a rotation about the image centre.
    pub fn append_rotation_degrees(self, degrees: f32) -> Self {
        let rad = degrees.to_radians();
        self.push(move |size| Some(about_center(size, Mat4::from_rotation_z(rad))))
    }

    /// Appends a skew about the image centre.
    pub fn append_skew_degrees(self, degrees_x: f32, degrees_y: f32) -> Self {
        let (tx, ty) = (degrees_x.to_radians().tan(), degrees_y.to_radians().tan());
        let shear = Mat4::from_cols(
            Vec4::new(1.0, ty, 0.0, 0.0),
            Vec4::new(tx, 1.0, 0.0, 0.0),
            Vec4::Z,
            Vec4::W,
        );
        self.push(move |size| Some(about_center(size, shear)))
    }

    /// Appends a taper that shrinks `side` to `fraction` of its length.
    pub fn append_taper(self, side: TaperSide, corner: TaperCorner, fraction: f32) -> Self {
        self.push(move |size| taper_matrix(size, side, corner, fraction))
    }

    /// Appends a distortion moving the image corners onto the given points.
    pub fn append_quad_distortion(
        self,
        top_left: Vec2,
        top_right: Vec2,
        bottom_right: Vec2,
        bottom_left: Vec2,
    ) -> Self {
        self.push(move |size| {
            quad_distortion(corners(size), [top_left, top_right, bottom_right, bottom_left])
        })
    }

    /// Composes every step for a `width x height` source.
    ///
    /// Returns `None` if any step has no valid matrix (e.g. a collapsed quad).
    pub fn build(&self, width: u32, height: u32) -> Option<Mat4> {
        let size = Vec2::new(width as f32, height as f32);
        self.steps
            .iter()
            .try_fold(Mat4::IDENTITY, |acc, step| Some(step(size)? * acc))
    }
}

impl std::fmt::Debug for ProjectiveTransformBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectiveTransformBuilder")
            .field("steps", &self.steps.len())
            .finish()
    }
}

fn corners(size: Vec2) -> [Vec2; 4] {
    [
        Vec2::ZERO,
        Vec2::new(size.x, 0.0),
        size,
        Vec2::new(0.0, size.y),
    ]
}

fn about_center(size: Vec2, m: Mat4) -> Mat4 {
    let c = Vec3::new(size.x * 0.5, size.y * 0.5, 0.0);
    Mat4::from_translation(c) * m * Mat4::from_translation(-c)
}

fn taper_matrix(size: Vec2, side: TaperSide, corner: TaperCorner, fraction: f32) -> Option<Mat4> {
    let [tl, tr, br, bl] = corners(size);
    // Offset of the shrunken edge's ends along that edge, in [0, 1].
    let (lead, trail) = match corner {
        TaperCorner::LeftOrTop => (0.0, 1.0 - fraction),
        TaperCorner::RightOrBottom => (1.0 - fraction, 0.0),
        TaperCorner::Both => ((1.0 - fraction) * 0.5, (1.0 - fraction) * 0.5),
    };
    let (w, h) = (size.x, size.y);
    let dst = match side {
        TaperSide::Left => [
            Vec2::new(0.0, h * lead),
            tr,
            br,
            Vec2::new(0.0, h - h * trail),
        ],
        TaperSide::Right => [
            tl,
            Vec2::new(w, h * lead),
            Vec2::new(w, h - h * trail),
            bl,
        ],
        TaperSide::Top => [
            Vec2::new(w * lead, 0.0),
            Vec2::new(w - w * trail, 0.0),
            br,
            bl,
        ],
        TaperSide::Bottom => [
            tl,
            tr,
            Vec2::new(w - w * trail, h),
            Vec2::new(w * lead, h),
        ],
    };
    quad_distortion([tl, tr, br, bl], dst)
}
