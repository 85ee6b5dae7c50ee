//! Hand landmark results and the landmark-to-detection handoff.
//!
//! The landmark model locates [`JOINT_COUNT`] joints inside a crop region. Besides exposing the
//! decoded positions, this module synthesizes a palm-detection-shaped result from them
//! ([`LandmarkResult::to_detection`]), which seeds the next frame's crop region and keeps
//! tracking alive without re-running the palm detector.

use crate::detection::{self, Detection};
use crate::landmark::{Dimension, LandmarkDecoder, Landmarks, UnsupportedOutputShape};
use crate::rect::Rect;
use crate::roi::RoiTransform;

use super::detection::rotation_radians;

/// Number of joints the landmark model locates.
pub const JOINT_COUNT: usize = 21;

/// Names for the hand pose landmarks.
///
/// # Terminology
///
/// - **CMC**: Carpometacarpal joint, the lowest joint of the thumb, located near the wrist.
/// - **MCP**: Metacarpophalangeal joint, the lower joint forming the knuckles near the palm of
///   the hand.
/// - **PIP**: Proximal Interphalangeal joint, the joint between the MCP and DIP.
/// - **DIP**: Distal Interphalangeal joint, the highest joint of a finger.
/// - **Tip**: This landmark is just placed on the tip of the finger, above the DIP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// The landmarks that surround the palm.
pub const PALM_LANDMARKS: &[LandmarkIdx] = {
    use LandmarkIdx::*;
    &[
        Wrist,
        ThumbCmc,
        IndexFingerMcp,
        MiddleFingerMcp,
        RingFingerMcp,
        PinkyMcp,
    ]
};

/// The landmarks that stand in for the palm detector's keypoints when a detection is synthesized
/// from landmark output.
///
/// The order matches the discriminants of [`super::detection::Keypoint`].
const DETECTION_ANCHORS: [LandmarkIdx; 7] = [
    LandmarkIdx::Wrist,
    LandmarkIdx::IndexFingerMcp,
    LandmarkIdx::MiddleFingerMcp,
    LandmarkIdx::RingFingerMcp,
    LandmarkIdx::PinkyMcp,
    LandmarkIdx::ThumbCmc,
    LandmarkIdx::ThumbMcp,
];

/// Landmark output for a single hand, in normalized y-up texture coordinates.
///
/// One instance of this acts as the decode scratch buffer for a tracked hand: the decoder
/// overwrites it every frame. Callers that want to keep a frame's result around (e.g. to build a
/// gesture history) must [`Clone`] it before the next decode.
#[derive(Debug, Clone)]
pub struct LandmarkResult {
    landmarks: Landmarks,
    presence: f32,
}

impl Default for LandmarkResult {
    fn default() -> Self {
        LandmarkResult {
            landmarks: Landmarks::new(JOINT_COUNT),
            presence: 0.0,
        }
    }
}

impl LandmarkResult {
    /// Returns the 3D landmark positions in the input image's coordinate system.
    pub fn landmark_positions(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        (0..self.landmarks.len()).map(|index| self.landmark_position(index))
    }

    /// Returns a landmark's position in the input image's coordinate system.
    pub fn landmark_position(&self, index: usize) -> [f32; 3] {
        self.landmarks.get(index)
    }

    /// Returns an iterator over the landmarks that surround the palm.
    pub fn palm_landmarks(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        PALM_LANDMARKS
            .iter()
            .map(|lm| self.landmark_position(*lm as usize))
    }

    /// Computes the center position of the hand's palm by averaging some of the landmarks.
    pub fn palm_center(&self) -> [f32; 3] {
        let mut pos = [0.0; 3];
        let mut count = 0;
        for [x, y, z] in self.palm_landmarks() {
            pos[0] += x;
            pos[1] += y;
            pos[2] += z;
            count += 1;
        }

        [
            pos[0] / count as f32,
            pos[1] / count as f32,
            pos[2] / count as f32,
        ]
    }

    /// Confidence value indicating whether the tracked hand is in view.
    ///
    /// By convention, this is in range 0.0 to 1.0, with anything above 0.5 indicating that the
    /// hand is probably still present.
    #[inline]
    pub fn confidence(&self) -> f32 {
        self.presence
    }

    #[inline]
    pub fn landmarks(&self) -> &Landmarks {
        &self.landmarks
    }

    #[inline]
    pub fn landmarks_mut(&mut self) -> &mut Landmarks {
        &mut self.landmarks
    }

    /// Synthesizes a palm-detection-shaped result from this landmark output.
    ///
    /// Seven anchor landmarks are mapped into detection space (y flipped), their bounding box is
    /// forced square by taking `max(width, height)` around the same center, and the result
    /// carries this result's confidence plus the mapped anchors as keypoints. Forcing the square
    /// keeps the region size stable across frames instead of oscillating with the hand's
    /// momentary aspect ratio.
    ///
    /// The output is a valid input to [`super::detection::detection_roi`], which closes the
    /// tracking loop.
    pub fn to_detection(&self) -> Detection {
        let keypoints: Vec<detection::Keypoint> = DETECTION_ANCHORS
            .iter()
            .map(|&idx| {
                let [x, y, _] = self.landmark_position(idx as usize);
                detection::Keypoint::new(x, 1.0 - y)
            })
            .collect();

        let rect = Rect::bounding(keypoints.iter().map(|kp| [kp.x(), kp.y()]))
            .expect("anchor keypoint list is never empty")
            .to_square();

        let mut det = Detection::with_keypoints(self.presence, rect, keypoints);
        det.set_angle(rotation_radians(&det));
        det
    }
}

/// Decodes the landmark model's raw output buffers into a [`LandmarkResult`].
#[derive(Debug, Clone)]
pub struct Decoder {
    inner: LandmarkDecoder,
}

impl Decoder {
    /// Creates a decoder from the keypoint output shape the model declares.
    ///
    /// Fails with [`UnsupportedOutputShape`] unless the shape holds [`JOINT_COUNT`]` * 2` or
    /// [`JOINT_COUNT`]` * 3` values.
    pub fn from_output_shape(shape: &[usize]) -> Result<Self, UnsupportedOutputShape> {
        Ok(Self {
            inner: LandmarkDecoder::from_output_shape(JOINT_COUNT, shape)?,
        })
    }

    #[inline]
    pub fn dimension(&self) -> Dimension {
        self.inner.dimension()
    }

    /// Decodes one frame's raw keypoint tensor and confidence into `out`.
    ///
    /// `roi` must be the crop transform the model's input was sampled with.
    ///
    /// # Panics
    ///
    /// Panics if `raw` does not match the declared output shape.
    pub fn decode(
        &self,
        raw: &[f32],
        confidence: f32,
        roi: &RoiTransform,
        out: &mut LandmarkResult,
    ) {
        out.presence = confidence;
        self.inner.decode(raw, roi, &mut out.landmarks);
    }
}
