//! Shoulder-relative hand features.

use std::ops::Range;

use crate::{
    frame::FrameSize,
    landmark::{Detection, HandLandmarks, HandObservation, PoseLandmarks, HAND_LANDMARKS},
};

pub const COORDS_PER_LANDMARK: usize = 3;
pub const HAND_FEATURES: usize = HAND_LANDMARKS * COORDS_PER_LANDMARK;
pub const FEATURE_DIM: usize = 2 * HAND_FEATURES;

const LEFT_RANGE: Range<usize> = 0..HAND_FEATURES;
const RIGHT_RANGE: Range<usize> = HAND_FEATURES..FEATURE_DIM;

/// Both hands of one frame: left hand in `[0, 63)`, right hand in `[63, 126)`.
///
/// A hand that was not detected is all zeros.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f32; FEATURE_DIM]);

impl FeatureVector {
    pub const fn zeros() -> Self {
        Self([0.0; FEATURE_DIM])
    }

    pub fn from_array(values: [f32; FEATURE_DIM]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn left(&self) -> &[f32] {
        &self.0[LEFT_RANGE]
    }

    pub fn right(&self) -> &[f32] {
        &self.0[RIGHT_RANGE]
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0.0)
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::zeros()
    }
}

/// Pixel position the hand coordinates are measured from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoint {
    pub x: f64,
    pub y: f64,
}

/// Midpoint of the shoulders in pixels, or `(w / 2, h / 3)` without a usable pose.
pub fn reference_point(pose: Option<&PoseLandmarks>, size: FrameSize) -> ReferencePoint {
    let w = f64::from(size.width);
    let h = f64::from(size.height);

    match pose.and_then(PoseLandmarks::shoulders) {
        Some((left, right)) => ReferencePoint {
            x: (f64::from(left.x) + f64::from(right.x)) / 2.0 * w,
            y: (f64::from(left.y) + f64::from(right.y)) / 2.0 * h,
        },
        None => ReferencePoint {
            x: w / 2.0,
            y: h / 3.0,
        },
    }
}

/// Encodes a frame's detection as a [`FeatureVector`].
///
/// Every landmark becomes `((x * w - ref_x) / w, (y * h - ref_y) / h, z)`.
pub fn normalize(detection: &Detection, size: FrameSize) -> FeatureVector {
    let (left, right) = match detection.observation() {
        HandObservation::NoDetection => return FeatureVector::zeros(),
        HandObservation::HandSet { left, right } => (left, right),
    };

    let reference = reference_point(detection.pose(), size);
    let mut features = FeatureVector::zeros();

    if let Some(hand) = left {
        encode_hand(hand, reference, size, &mut features.0[LEFT_RANGE]);
    }
    if let Some(hand) = right {
        encode_hand(hand, reference, size, &mut features.0[RIGHT_RANGE]);
    }

    features
}

fn encode_hand(hand: &HandLandmarks, reference: ReferencePoint, size: FrameSize, out: &mut [f32]) {
    let w = f64::from(size.width);
    let h = f64::from(size.height);

    for (point, chunk) in hand
        .points()
        .iter()
        .zip(out.chunks_exact_mut(COORDS_PER_LANDMARK))
    {
        let x_px = f64::from(point.x) * w;
        let y_px = f64::from(point.y) * h;

        chunk[0] = ((x_px - reference.x) / w) as f32;
        chunk[1] = ((y_px - reference.y) / h) as f32;
        chunk[2] = point.z;
    }
}
