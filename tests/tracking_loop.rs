//! End-to-end exercises of the detection → landmark → detection loop, with the inference stages
//! replaced by synthetic tensors.

use approx::assert_abs_diff_eq;
use nalgebra::Point2;

use handtrack::detection::{Detection, Keypoint};
use handtrack::hand::detection::{detection_roi, rotation_radians, CropPolicy, ALL_KEYPOINTS};
use handtrack::hand::landmark::{Decoder, LandmarkResult, JOINT_COUNT};
use handtrack::hand::tracking::HandTracker;
use handtrack::rect::Rect;
use handtrack::roi::RoiTransform;

fn palm_detection(confidence: f32, rect: Rect) -> Detection {
    let center = rect.center();
    let mut keypoints = Vec::new();
    for corner in rect.corners() {
        keypoints.push(Keypoint::new(corner.x, corner.y));
    }
    keypoints.push(Keypoint::new(center.x, center.y));
    keypoints.push(Keypoint::new(center.x, center.y + rect.height() * 0.5));
    keypoints.push(Keypoint::new(center.x, center.y - rect.height() * 0.5));
    assert_eq!(keypoints.len(), ALL_KEYPOINTS.len());

    let mut det = Detection::with_keypoints(confidence, rect, keypoints);
    let angle = rotation_radians(&det);
    det.set_angle(angle);
    det
}

/// Maps texture-space landmark positions into the raw tensor layout the decode stage consumes.
fn encode(points: &[[f32; 3]], roi: &RoiTransform) -> Vec<f32> {
    let mut raw = Vec::with_capacity(points.len() * 3);
    for &[x, y, z] in points {
        let canonical = roi.to_canonical().apply(Point2::new(x, y));
        raw.push(canonical.x * 255.0);
        raw.push((1.0 - canonical.y) * 255.0);
        raw.push(z * 255.0);
    }
    raw
}

#[test]
fn detection_to_landmark_crop_region() {
    // A palm detection in the middle of the texture, run through the default crop policy.
    let det = palm_detection(0.9, Rect::from_center(0.5, 0.5, 0.3, 0.3));
    let roi = detection_roi(&det, &CropPolicy::default()).unwrap();

    let region = roi.region();
    assert_abs_diff_eq!(region.center(), Point2::new(0.5, 0.65), epsilon = 1e-6);
    assert_abs_diff_eq!(region.width(), 0.87, epsilon = 1e-6);
    assert_abs_diff_eq!(region.height(), 0.87, epsilon = 1e-6);
}

#[test]
fn all_zero_tensor_decodes_to_the_mapped_origin() {
    let det = palm_detection(0.9, Rect::from_center(0.5, 0.5, 0.3, 0.3));
    let roi = detection_roi(&det, &CropPolicy::default()).unwrap();

    let decoder = Decoder::from_output_shape(&[1, JOINT_COUNT * 3]).unwrap();
    let mut result = LandmarkResult::default();
    decoder.decode(&[0.0; JOINT_COUNT * 3], 0.0, &roi, &mut result);

    assert_eq!(result.confidence(), 0.0);

    // Raw (0, 0) normalizes to (0, 1) after the y flip; every joint must land on the
    // inverse-transformed position of that corner.
    let expected = roi.from_canonical().apply3([0.0, 1.0, 0.0]);
    for pos in result.landmark_positions() {
        assert_abs_diff_eq!(pos[0], expected[0], epsilon = 1e-5);
        assert_abs_diff_eq!(pos[1], expected[1], epsilon = 1e-5);
        assert_eq!(pos[2], 0.0);
    }
}

#[test]
fn coincident_landmarks_synthesize_a_point_detection() {
    let mut result = LandmarkResult::default();
    for index in 0..JOINT_COUNT {
        result.landmarks_mut().set(index, [0.5, 0.5, 0.0]);
    }
    let decoder = Decoder::from_output_shape(&[1, JOINT_COUNT * 2]).unwrap();
    let roi = detection_roi(
        &palm_detection(0.9, Rect::from_center(0.5, 0.5, 1.0, 1.0)),
        &CropPolicy {
            shift: nalgebra::Vector2::zeros(),
            scale: nalgebra::Vector2::new(1.0, 1.0),
            ..CropPolicy::default()
        },
    )
    .unwrap();

    // Decode a tensor that places every joint at (0.5, 0.5) to get a well-defined score.
    let raw = encode(&[[0.5, 0.5, 0.0]; JOINT_COUNT], &roi);
    let raw_2d: Vec<f32> = raw
        .chunks_exact(3)
        .flat_map(|joint| [joint[0], joint[1]])
        .collect();
    decoder.decode(&raw_2d, 0.7, &roi, &mut result);

    let det = result.to_detection();
    assert_eq!(det.confidence(), 0.7);
    assert_abs_diff_eq!(det.bounding_rect().center().x, 0.5, epsilon = 1e-5);
    assert_abs_diff_eq!(det.bounding_rect().center().y, 0.5, epsilon = 1e-5);
    assert_abs_diff_eq!(det.bounding_rect().width(), 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(det.bounding_rect().height(), 0.0, epsilon = 1e-5);
}

#[test]
fn landmark_output_seeds_the_next_frame() {
    let decoder = Decoder::from_output_shape(&[1, JOINT_COUNT * 3]).unwrap();
    let mut tracker = HandTracker::new(decoder);

    // Frame 1: the palm detector finds a hand and seeds the tracker.
    assert!(tracker.needs_detection());
    tracker.seed(&[palm_detection(0.9, Rect::from_center(0.5, 0.5, 0.3, 0.3))]);
    assert!(!tracker.needs_detection());

    let (id, roi) = tracker.rois().next().unwrap();
    let roi = *roi;

    // Frame 1 landmark output: a hand spread over part of the crop region.
    let mut points = [[0.0; 3]; JOINT_COUNT];
    for (index, point) in points.iter_mut().enumerate() {
        let canonical = Point2::new(
            0.35 + 0.015 * index as f32,
            0.30 + 0.020 * index as f32,
        );
        let mapped = roi.from_canonical().apply(canonical);
        *point = [mapped.x, mapped.y, 0.01 * index as f32];
    }

    let raw = encode(&points, &roi);
    let result = tracker.update(id, &raw, 0.95).unwrap();
    assert_eq!(result.confidence(), 0.95);

    // Decoded positions reproduce the synthetic hand.
    for (decoded, expected) in result.landmark_positions().zip(points) {
        assert_abs_diff_eq!(decoded[0], expected[0], epsilon = 1e-4);
        assert_abs_diff_eq!(decoded[1], expected[1], epsilon = 1e-4);
        assert_abs_diff_eq!(decoded[2], expected[2], epsilon = 1e-4);
    }
    let result = result.clone();

    // Frame 2: no detector run; the crop region now derives from the landmark output.
    let next_roi = *tracker.roi(id).unwrap();
    let synthesized = result.to_detection();
    let expected_roi = detection_roi(&synthesized, tracker.crop_policy()).unwrap();
    assert_abs_diff_eq!(
        next_roi.region().center(),
        expected_roi.region().center(),
        epsilon = 1e-5,
    );
    assert_abs_diff_eq!(
        next_roi.region().width(),
        expected_roi.region().width(),
        epsilon = 1e-5,
    );

    // The synthesized detection is square, as the region policy requires.
    let rect = synthesized.bounding_rect();
    assert_abs_diff_eq!(rect.width(), rect.height(), epsilon = 1e-6);

    // Updating again keeps the loop running without any new detection.
    let raw = encode(&points, &next_roi);
    assert!(tracker.update(id, &raw, 0.9).is_some());
    assert_eq!(tracker.hands().count(), 1);
}

#[test]
fn y_flip_is_idempotent_across_the_bridge() {
    let mut result = LandmarkResult::default();
    for index in 0..JOINT_COUNT {
        result.landmarks_mut().set(index, [0.5, 0.1, 0.0]);
    }

    let det = result.to_detection();
    for kp in det.keypoints() {
        assert_abs_diff_eq!(kp.y(), 0.9, epsilon = 1e-6);
    }

    // Mapping the synthesized keypoints back into landmark space restores the original y.
    for kp in det.keypoints() {
        assert_abs_diff_eq!(1.0 - kp.y(), 0.1, epsilon = 1e-6);
    }
}
