//! Region-of-interest transform computation.
//!
//! A crop region is described by an [`AffineTransform`] pair mapping between the source texture
//! and the canonical unit square that models consume their input in. The forward direction
//! (texture to canonical) produces model input, the inverse (canonical to texture) maps model
//! output back out; both are derived once per frame from a source rectangle and a
//! [`CropContext`].

use nalgebra::Vector2;

use crate::affine::{AffineTransform, SingularTransform};
use crate::rect::Rect;

/// Per-inference crop parameters.
///
/// Bundles the rotation implied by the source detection with the tunable shift/scale offsets and
/// mirror flags of the crop policy. Lives for a single inference call.
#[derive(Debug, Clone, Copy)]
pub struct CropContext {
    /// Rotation of the crop region, in degrees, clockwise in y-down texture space.
    pub rotation_degrees: f32,
    /// Offset added to the source rectangle's center, in normalized texture units.
    pub shift: Vector2<f32>,
    /// Per-axis multiplier on `max(width, height)` of the source rectangle.
    pub scale: Vector2<f32>,
    pub mirror_h: bool,
    pub mirror_v: bool,
}

impl Default for CropContext {
    fn default() -> Self {
        Self {
            rotation_degrees: 0.0,
            shift: Vector2::zeros(),
            scale: Vector2::new(1.0, 1.0),
            mirror_h: false,
            mirror_v: false,
        }
    }
}

/// How the external sampler reconciles the texture's aspect ratio with the square model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectMode {
    /// Enlarge the sampled region so the whole crop stays visible (letterbox).
    #[default]
    Fit,
    /// Shrink the sampled region so the model input is fully covered (crop).
    Fill,
}

/// Returns the aspect-correcting base transform for a texture with the given width/height ratio.
///
/// The result scales around the canonical square's center so that the square corresponds to a
/// pixel-square region of the texture. It is meant to be composed with a crop via
/// [`RoiTransform::sampling_transform`].
pub fn aspect_transform(mode: AspectMode, aspect_ratio: f32) -> AffineTransform {
    let (fx, fy) = match mode {
        AspectMode::Fit => (
            (1.0 / aspect_ratio).max(1.0),
            aspect_ratio.max(1.0),
        ),
        AspectMode::Fill => (
            (1.0 / aspect_ratio).min(1.0),
            aspect_ratio.min(1.0),
        ),
    };

    AffineTransform::translation(Vector2::new(0.5, 0.5))
        * AffineTransform::scaling(fx, fy)
        * AffineTransform::translation(Vector2::new(-0.5, -0.5))
}

/// The affine mapping between a crop region of the source texture and the canonical unit square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiTransform {
    region: Rect,
    to_canonical: AffineTransform,
    from_canonical: AffineTransform,
}

impl RoiTransform {
    /// Computes the crop transform for `rect` under `ctx`.
    ///
    /// The crop region is `rect` recentered at `rect.center + ctx.shift`, sized
    /// `max(rect.width, rect.height) * ctx.scale` per axis, and rotated by `ctx.rotation_degrees`
    /// around its center. The returned transform pair maps that region onto the canonical unit
    /// square and back; the canonical-to-texture direction is
    /// `Translate(center) · Rotate(angle) · Scale(size) · Translate(-0.5, -0.5)`.
    ///
    /// Fails with [`SingularTransform`] when the region has zero extent (both source dimensions
    /// zero, or a zero scale factor).
    pub fn new(rect: Rect, ctx: &CropContext) -> Result<Self, SingularTransform> {
        let side = rect.width().max(rect.height());
        let center = rect.center() + ctx.shift;
        let size = Vector2::new(side * ctx.scale.x, side * ctx.scale.y);

        let from_canonical = AffineTransform::compose(
            center.coords,
            ctx.rotation_degrees.to_radians(),
            size,
            ctx.mirror_h,
            ctx.mirror_v,
        ) * AffineTransform::translation(Vector2::new(-0.5, -0.5));
        let to_canonical = from_canonical.invert()?;

        Ok(Self {
            region: Rect::from_center(center.x, center.y, size.x.abs(), size.y.abs()),
            to_canonical,
            from_canonical,
        })
    }

    /// The axis-aligned crop region before rotation is applied.
    ///
    /// Used to compare crop regions across frames (e.g. for overlap rejection when seeding new
    /// trackers).
    #[inline]
    pub fn region(&self) -> Rect {
        self.region
    }

    /// The transform from texture space into the canonical unit square.
    #[inline]
    pub fn to_canonical(&self) -> &AffineTransform {
        &self.to_canonical
    }

    /// The transform from the canonical unit square back into texture space.
    ///
    /// Decoded model output is mapped through this to obtain result coordinates.
    #[inline]
    pub fn from_canonical(&self) -> &AffineTransform {
        &self.from_canonical
    }

    /// Composes the crop inverse with an aspect-correcting base transform.
    ///
    /// The external sampler maps every model input coordinate through `base` first and through
    /// the canonical-to-texture transform second. Decoding does *not* use this; it maps through
    /// the plain crop inverse.
    pub fn sampling_transform(&self, base: &AffineTransform) -> AffineTransform {
        self.from_canonical * *base
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use nalgebra::Point2;

    use super::*;

    fn full_texture() -> Rect {
        Rect::from_center(0.5, 0.5, 1.0, 1.0)
    }

    #[test]
    fn full_texture_crop_is_identity() {
        let roi = RoiTransform::new(full_texture(), &CropContext::default()).unwrap();

        for corner in full_texture().corners() {
            assert_abs_diff_eq!(roi.from_canonical().apply(corner), corner, epsilon = 1e-6);
            assert_abs_diff_eq!(roi.to_canonical().apply(corner), corner, epsilon = 1e-6);
        }
    }

    #[test]
    fn shift_and_scale_place_the_region() {
        let ctx = CropContext {
            shift: Vector2::new(0.0, 0.15),
            scale: Vector2::new(2.9, 2.9),
            ..CropContext::default()
        };
        let roi = RoiTransform::new(Rect::from_center(0.5, 0.5, 0.3, 0.3), &ctx).unwrap();

        let region = roi.region();
        assert_abs_diff_eq!(region.center(), Point2::new(0.5, 0.65), epsilon = 1e-6);
        assert_abs_diff_eq!(region.width(), 0.87, epsilon = 1e-6);
        assert_abs_diff_eq!(region.height(), 0.87, epsilon = 1e-6);

        // The canonical center lands on the region center, canonical corners on region corners.
        assert_abs_diff_eq!(
            roi.from_canonical().apply(Point2::new(0.5, 0.5)),
            Point2::new(0.5, 0.65),
            epsilon = 1e-6,
        );
        assert_abs_diff_eq!(
            roi.from_canonical().apply(Point2::new(0.0, 0.0)),
            region.corners()[0],
            epsilon = 1e-6,
        );
    }

    #[test]
    fn non_square_rects_use_the_longer_side() {
        let roi = RoiTransform::new(
            Rect::from_center(0.5, 0.5, 0.1, 0.4),
            &CropContext::default(),
        )
        .unwrap();
        assert_abs_diff_eq!(roi.region().width(), 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(roi.region().height(), 0.4, epsilon = 1e-6);
    }

    #[test]
    fn rotation_spins_the_canonical_square() {
        let ctx = CropContext {
            rotation_degrees: 90.0,
            ..CropContext::default()
        };
        let roi = RoiTransform::new(Rect::from_center(0.5, 0.5, 0.5, 0.5), &ctx).unwrap();

        // Rotating by a quarter turn moves the (0, 0) canonical corner onto the (1, 0) one.
        let rotated = roi.from_canonical().apply(Point2::new(0.0, 0.0));
        let reference = RoiTransform::new(Rect::from_center(0.5, 0.5, 0.5, 0.5), &CropContext::default())
            .unwrap()
            .from_canonical()
            .apply(Point2::new(1.0, 0.0));
        assert_abs_diff_eq!(rotated, reference, epsilon = 1e-6);
    }

    #[test]
    fn mirroring_flips_around_the_center() {
        let ctx = CropContext {
            mirror_h: true,
            ..CropContext::default()
        };
        let roi = RoiTransform::new(full_texture(), &ctx).unwrap();
        assert_abs_diff_eq!(
            roi.from_canonical().apply(Point2::new(0.0, 0.5)),
            Point2::new(1.0, 0.5),
            epsilon = 1e-6,
        );
    }

    #[test]
    fn round_trip_maps_unit_square_corners_back() {
        let unit = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];

        for _ in 0..100 {
            let rect = Rect::from_center(
                fastrand::f32(),
                fastrand::f32(),
                fastrand::f32() * 0.8 + 0.01,
                fastrand::f32() * 0.8 + 0.01,
            );
            let ctx = CropContext {
                rotation_degrees: fastrand::f32() * 360.0 - 180.0,
                shift: Vector2::new(fastrand::f32() - 0.5, fastrand::f32() - 0.5),
                scale: Vector2::new(fastrand::f32() * 3.0 + 0.2, fastrand::f32() * 3.0 + 0.2),
                mirror_h: fastrand::bool(),
                mirror_v: fastrand::bool(),
            };

            let roi = RoiTransform::new(rect, &ctx).unwrap();
            for corner in unit {
                let there_and_back = roi
                    .to_canonical()
                    .apply(roi.from_canonical().apply(corner));
                assert_abs_diff_eq!(there_and_back, corner, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn degenerate_region_is_rejected() {
        assert!(RoiTransform::new(
            Rect::from_center(0.5, 0.5, 0.0, 0.0),
            &CropContext::default(),
        )
        .is_err());

        let zero_scale = CropContext {
            scale: Vector2::new(0.0, 1.0),
            ..CropContext::default()
        };
        assert!(RoiTransform::new(full_texture(), &zero_scale).is_err());
    }

    #[test]
    fn aspect_modes_scale_around_the_center() {
        let fit = aspect_transform(AspectMode::Fit, 2.0);
        assert_abs_diff_eq!(
            fit.apply(Point2::new(0.5, 0.5)),
            Point2::new(0.5, 0.5),
            epsilon = 1e-6,
        );
        assert_abs_diff_eq!(
            fit.apply(Point2::new(0.5, 1.0)),
            Point2::new(0.5, 1.5),
            epsilon = 1e-6,
        );

        let fill = aspect_transform(AspectMode::Fill, 2.0);
        assert_abs_diff_eq!(
            fill.apply(Point2::new(0.0, 0.5)),
            Point2::new(0.25, 0.5),
            epsilon = 1e-6,
        );
    }

    #[test]
    fn sampling_composes_aspect_before_crop_inverse() {
        let roi = RoiTransform::new(
            Rect::from_center(0.4, 0.6, 0.2, 0.2),
            &CropContext::default(),
        )
        .unwrap();
        let base = aspect_transform(AspectMode::Fit, 16.0 / 9.0);

        let p = Point2::new(0.25, 0.75);
        assert_abs_diff_eq!(
            roi.sampling_transform(&base).apply(p),
            roi.from_canonical().apply(base.apply(p)),
            epsilon = 1e-6,
        );
    }
}
