//! Palm detection results and the detection-to-landmark crop policy.
//!
//! The palm detector itself runs outside this crate. Its decoded results come in as
//! [`Detection`]s carrying the seven palm keypoints; this module turns such a detection into the
//! crop transform the landmark model samples its input with.

use nalgebra::{Point2, Rotation2, Vector2};

use crate::affine::SingularTransform;
use crate::detection::Detection;
use crate::roi::{AspectMode, CropContext, RoiTransform};

/// A keypoint of a palm [`Detection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keypoint {
    Wrist = 0,
    IndexFingerMcp = 1,
    MiddleFingerMcp = 2,
    RingFingerMcp = 3,
    PinkyMcp = 4,
    ThumbCmc = 5,
    ThumbMcp = 6,
}

/// A list of all [`Keypoint`]s.
pub const ALL_KEYPOINTS: &[Keypoint] = &[
    Keypoint::Wrist,
    Keypoint::IndexFingerMcp,
    Keypoint::MiddleFingerMcp,
    Keypoint::RingFingerMcp,
    Keypoint::PinkyMcp,
    Keypoint::ThumbCmc,
    Keypoint::ThumbMcp,
];

/// Computes a palm detection's clockwise rotation from its keypoints.
///
/// A rotation of 0 means that the fingers point towards the top of the texture. The angle is the
/// rotation between the +y axis and the middle-finger-MCP-to-wrist direction.
///
/// # Panics
///
/// Panics if `detection` does not carry the seven palm keypoints.
pub fn rotation_radians(detection: &Detection) -> f32 {
    let finger: Point2<f32> = detection.keypoints()[Keypoint::MiddleFingerMcp as usize].into();
    let wrist: Point2<f32> = detection.keypoints()[Keypoint::Wrist as usize].into();

    let rel = wrist - finger;
    Rotation2::rotation_between(&Vector2::y(), &rel).angle()
}

/// The fixed crop policy applied when deriving a landmark-model input region from a palm
/// detection.
///
/// The palm detector only sees the palm; the landmark model wants the whole hand. The default
/// shift and scale enlarge the palm rectangle accordingly.
#[derive(Debug, Clone, Copy)]
pub struct CropPolicy {
    /// Offset added to the detection rect's center, in normalized texture units.
    pub shift: Vector2<f32>,
    /// Per-axis multiplier on `max(width, height)` of the detection rect.
    pub scale: Vector2<f32>,
    pub mirror_h: bool,
    pub mirror_v: bool,
    /// Aspect handling for the external sampler.
    pub aspect: AspectMode,
}

impl Default for CropPolicy {
    fn default() -> Self {
        Self {
            shift: Vector2::new(0.0, 0.15),
            scale: Vector2::new(2.9, 2.9),
            mirror_h: false,
            mirror_v: false,
            aspect: AspectMode::Fit,
        }
    }
}

/// Computes the crop transform for sampling the landmark model's input from `detection`.
///
/// The rotation comes from the detection's own orientation; pass the result of
/// [`rotation_radians`] to [`Detection::set_angle`] when assembling detections by hand.
///
/// Fails with [`SingularTransform`] when the detection rectangle is degenerate; that frame
/// produces no landmark input for this hand.
pub fn detection_roi(
    detection: &Detection,
    policy: &CropPolicy,
) -> Result<RoiTransform, SingularTransform> {
    let ctx = CropContext {
        rotation_degrees: detection.angle().to_degrees(),
        shift: policy.shift,
        scale: policy.scale,
        mirror_h: policy.mirror_h,
        mirror_v: policy.mirror_v,
    };
    RoiTransform::new(detection.bounding_rect(), &ctx)
}
