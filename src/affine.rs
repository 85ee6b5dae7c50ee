//! Composable 2D affine transforms.
//!
//! Every crop, rotation and coordinate-space change in this library is expressed as an
//! [`AffineTransform`] so that whole pipelines collapse into a single matrix multiply per point
//! instead of accumulating error across hand-written coordinate shuffles.

use std::ops::Mul;

use nalgebra::{Matrix3, Point2, Rotation2, Vector2};
use thiserror::Error;

/// Determinants with a smaller magnitude than this are treated as zero.
const DET_TOLERANCE: f32 = 1e-9;

/// Error returned when a required matrix inverse does not exist.
///
/// In practice this means a degenerate crop region, e.g. a rectangle whose width and height are
/// both zero. The frame that produced the region must be skipped; tracking resumes once a fresh
/// detection comes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("transform is singular and cannot be inverted")]
pub struct SingularTransform;

/// A 2D affine transform, stored as a homogeneous 3x3 matrix.
///
/// Positive rotation angles turn counterclockwise in a y-up coordinate system. Since detection
/// space is y-down, the same matrix turns detection-space points clockwise, matching the angle
/// convention of [`crate::detection::Detection`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    mat: Matrix3<f32>,
}

impl AffineTransform {
    /// The transform that maps every point to itself.
    pub fn identity() -> Self {
        Self {
            mat: Matrix3::identity(),
        }
    }

    /// A transform that moves every point by `offset`.
    pub fn translation(offset: Vector2<f32>) -> Self {
        Self {
            mat: Matrix3::new_translation(&offset),
        }
    }

    /// A transform that rotates every point around the origin by `radians`.
    pub fn rotation(radians: f32) -> Self {
        Self {
            mat: Rotation2::new(radians).to_homogeneous(),
        }
    }

    /// A transform that scales every point's distance from the origin, per axis.
    ///
    /// Negative factors mirror the respective axis.
    pub fn scaling(x: f32, y: f32) -> Self {
        Self {
            mat: Matrix3::new_nonuniform_scaling(&Vector2::new(x, y)),
        }
    }

    /// Builds the transform `Translate(translation) · Rotate(radians) · Scale(scale)`.
    ///
    /// The factors apply right-to-left: points are scaled first, then rotated, then translated.
    /// Mirror flags negate the respective scale factor. This fixed order is what every crop
    /// transform in the library is built from; do not reorder it.
    pub fn compose(
        translation: Vector2<f32>,
        radians: f32,
        scale: Vector2<f32>,
        mirror_h: bool,
        mirror_v: bool,
    ) -> Self {
        let sx = if mirror_h { -scale.x } else { scale.x };
        let sy = if mirror_v { -scale.y } else { scale.y };
        Self::translation(translation) * Self::rotation(radians) * Self::scaling(sx, sy)
    }

    /// Returns the inverse transform, or [`SingularTransform`] if none exists.
    pub fn invert(&self) -> Result<Self, SingularTransform> {
        if self.mat.determinant().abs() < DET_TOLERANCE {
            return Err(SingularTransform);
        }

        self.mat
            .try_inverse()
            .map(|mat| Self { mat })
            .ok_or(SingularTransform)
    }

    /// Maps a 2D point through this transform.
    pub fn apply(&self, point: Point2<f32>) -> Point2<f32> {
        self.mat.transform_point(&point)
    }

    /// Maps a 3D point through this transform.
    ///
    /// Only x and y take part in the homogeneous multiply; the z coordinate is passed through
    /// unscaled.
    pub fn apply3(&self, [x, y, z]: [f32; 3]) -> [f32; 3] {
        let mapped = self.apply(Point2::new(x, y));
        [mapped.x, mapped.y, z]
    }

    /// Returns the underlying homogeneous matrix, e.g. for handing to an external texture sampler.
    #[inline]
    pub fn matrix(&self) -> &Matrix3<f32> {
        &self.mat
    }
}

impl Mul for AffineTransform {
    type Output = Self;

    /// Composes two transforms; the right-hand side is applied first.
    fn mul(self, rhs: Self) -> Self {
        Self {
            mat: self.mat * rhs.mat,
        }
    }
}
