//! Frame-to-frame hand tracking.
//!
//! The tracker owns the geometry of the per-frame pipeline: it turns palm detections into crop
//! transforms, decodes landmark output, and re-seeds every hand's crop region from its own
//! landmarks so the palm detector only needs to run while there is spare capacity.
//!
//! Everything here is synchronous and frame-driven. Inference happens outside: per hand and
//! frame, the caller samples the model input using [`HandTracker::rois`], runs the landmark
//! model, and feeds the raw output back via [`HandTracker::update`].

use std::cmp::Reverse;

use crate::detection::Detection;
use crate::num::TotalF32;
use crate::roi::RoiTransform;

use super::detection::{detection_roi, CropPolicy};
use super::landmark::{Decoder, LandmarkResult};

/// ID of a tracked hand.
///
/// The assigned [`HandId`]s are unique per [`HandTracker`] assigning them. They stay stable for
/// as long as the hand is continuously tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandId(u64);

struct TrackedHand {
    id: HandId,
    roi: RoiTransform,
    /// Decode scratch buffer, overwritten on every update. Valid once `tracked` is set.
    result: LandmarkResult,
    tracked: bool,
}

/// Tracks up to two hands across subsequent frames.
///
/// Per frame, the caller:
///
/// 1. runs the palm detector if [`HandTracker::needs_detection`] says so, and passes the decoded
///    detections to [`HandTracker::seed`];
/// 2. samples one landmark-model input per entry of [`HandTracker::rois`] (externally);
/// 3. feeds each hand's raw landmark output to [`HandTracker::update`].
///
/// A hand is dropped when its landmark confidence falls below the loss threshold or when its
/// region degenerates; it gets picked up again by a later detection.
///
/// The [`LandmarkResult`]s handed out borrow the tracker's per-hand scratch buffers. Clone a
/// result before the next call to [`HandTracker::update`] to retain it across frames.
pub struct HandTracker {
    crop: CropPolicy,
    decoder: Decoder,
    hands: Vec<TrackedHand>,
    next_id: u64,
    max_hands: usize,
    detection_thresh: f32,
    loss_thresh: f32,
    iou_thresh: f32,
}

impl HandTracker {
    /// Minimum confidence for a palm detection to seed a new hand.
    pub const DEFAULT_DETECTION_THRESHOLD: f32 = 0.8;

    /// Landmark confidence below which tracking counts as lost.
    pub const DEFAULT_LOSS_THRESHOLD: f32 = 0.5;

    /// IoU above which a detection is considered to overlap an already-tracked region.
    pub const DEFAULT_IOU_THRESHOLD: f32 = 0.3;

    /// Creates a tracker for a single hand.
    pub fn new(decoder: Decoder) -> Self {
        Self::with_max_hands(decoder, 1)
    }

    /// Creates a tracker for up to `max_hands` hands.
    ///
    /// # Panics
    ///
    /// Panics unless `max_hands` is 1 or 2.
    pub fn with_max_hands(decoder: Decoder, max_hands: usize) -> Self {
        assert!(
            (1..=2).contains(&max_hands),
            "`max_hands` must be 1 or 2, got {}",
            max_hands
        );
        Self {
            crop: CropPolicy::default(),
            decoder,
            hands: Vec::new(),
            next_id: 0,
            max_hands,
            detection_thresh: Self::DEFAULT_DETECTION_THRESHOLD,
            loss_thresh: Self::DEFAULT_LOSS_THRESHOLD,
            iou_thresh: Self::DEFAULT_IOU_THRESHOLD,
        }
    }

    pub fn set_detection_threshold(&mut self, thresh: f32) {
        self.detection_thresh = thresh;
    }

    /// Sets the tracking loss threshold.
    ///
    /// If the landmark confidence for a hand falls below this value, the hand is dropped and has
    /// to be re-seeded by a fresh detection.
    pub fn set_loss_threshold(&mut self, thresh: f32) {
        self.loss_thresh = thresh;
    }

    pub fn set_iou_threshold(&mut self, thresh: f32) {
        self.iou_thresh = thresh;
    }

    pub fn set_crop_policy(&mut self, policy: CropPolicy) {
        self.crop = policy;
    }

    /// The crop policy applied to detections and landmark-derived regions.
    pub fn crop_policy(&self) -> &CropPolicy {
        &self.crop
    }

    /// Returns whether the caller should run the palm detector for this frame.
    ///
    /// Detection is only needed while there is capacity for more hands; tracked hands sustain
    /// themselves on their own landmark output.
    pub fn needs_detection(&self) -> bool {
        self.hands.len() < self.max_hands
    }

    /// Seeds new hands from palm detections.
    ///
    /// Detections below the detection threshold are ignored. The rest are claimed
    /// highest-confidence first, skipping any whose crop region overlaps an already-tracked
    /// region by more than the IoU threshold (that hand is already being tracked). Detections
    /// with a degenerate rectangle are skipped.
    pub fn seed(&mut self, detections: &[Detection]) {
        let mut candidates: Vec<&Detection> = detections
            .iter()
            .filter(|det| det.confidence() >= self.detection_thresh)
            .collect();
        candidates.sort_by_key(|det| Reverse(TotalF32(det.confidence())));

        for det in candidates {
            if self.hands.len() >= self.max_hands {
                break;
            }

            let roi = match detection_roi(det, &self.crop) {
                Ok(roi) => roi,
                Err(_) => {
                    log::debug!("skipping degenerate detection {:?}", det.bounding_rect());
                    continue;
                }
            };

            let overlaps = self
                .hands
                .iter()
                .any(|hand| hand.roi.region().iou(&roi.region()) >= self.iou_thresh);
            if overlaps {
                continue;
            }

            let id = HandId(self.next_id);
            self.next_id += 1;
            log::trace!("seeding hand {:?} in region {:?}", id, roi.region());
            self.hands.push(TrackedHand {
                id,
                roi,
                result: LandmarkResult::default(),
                tracked: false,
            });
        }
    }

    /// Returns the crop transform to sample each hand's landmark-model input with.
    pub fn rois(&self) -> impl Iterator<Item = (HandId, &RoiTransform)> {
        self.hands.iter().map(|hand| (hand.id, &hand.roi))
    }

    /// Returns the crop transform for a single hand.
    pub fn roi(&self, id: HandId) -> Option<&RoiTransform> {
        self.hands
            .iter()
            .find(|hand| hand.id == id)
            .map(|hand| &hand.roi)
    }

    /// Feeds one hand's raw landmark output for the current frame.
    ///
    /// `raw` and `confidence` are the two output buffers of the landmark model, which must have
    /// been run on input sampled with the transform [`HandTracker::roi`] returned for `id` this
    /// frame.
    ///
    /// On success, the hand's crop region is re-seeded from the decoded landmarks and the result
    /// is returned. Returns [`None`] and drops the hand when confidence falls below the loss
    /// threshold or when the landmark-derived region is degenerate; returns [`None`] for ids
    /// that are no longer tracked.
    ///
    /// # Panics
    ///
    /// Panics if `raw` does not match the decoder's declared output shape.
    pub fn update(&mut self, id: HandId, raw: &[f32], confidence: f32) -> Option<&LandmarkResult> {
        let index = self.hands.iter().position(|hand| hand.id == id)?;

        if confidence < self.loss_thresh {
            log::trace!(
                "hand {:?}: confidence {} below loss threshold {}, tracking lost",
                id,
                confidence,
                self.loss_thresh,
            );
            self.hands.remove(index);
            return None;
        }

        let hand = &mut self.hands[index];
        self.decoder
            .decode(raw, confidence, &hand.roi, &mut hand.result);

        let next = hand.result.to_detection();
        match detection_roi(&next, &self.crop) {
            Ok(roi) => {
                hand.roi = roi;
                hand.tracked = true;
            }
            Err(_) => {
                log::debug!(
                    "hand {:?}: landmark-derived region {:?} is degenerate, dropping",
                    id,
                    next.bounding_rect(),
                );
                self.hands.remove(index);
                return None;
            }
        }

        Some(&self.hands[index].result)
    }

    /// Returns the most recent landmark result for every hand that has one.
    ///
    /// Hands that were seeded this frame but not yet updated are skipped.
    pub fn hands(&self) -> impl Iterator<Item = (HandId, &LandmarkResult)> {
        self.hands
            .iter()
            .filter(|hand| hand.tracked)
            .map(|hand| (hand.id, &hand.result))
    }
}
