use ndarray::{Array2, ArrayView1};

use crate::features::{FeatureVector, FEATURE_DIM};

/// One training sample: `max_frames` rows of [`FEATURE_DIM`] features.
pub type LandmarkSequence = Array2<f32>;

/// Stacks per-frame features into exactly `max_frames` rows.
///
/// Missing rows repeat the last vector (zeros if there is none); extra rows are dropped.
pub fn assemble(frames: &[FeatureVector], max_frames: usize) -> LandmarkSequence {
    let mut sequence = Array2::zeros((max_frames, FEATURE_DIM));

    let last = match frames.last() {
        Some(last) => last,
        None => return sequence,
    };

    for (index, mut row) in sequence.outer_iter_mut().enumerate() {
        let source = frames.get(index).unwrap_or(last);
        row.assign(&ArrayView1::from(source.as_slice()));
    }

    sequence
}
