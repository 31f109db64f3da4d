//! Live sample recording from a camera.

use anyhow::Result;
use log::warn;

use crate::{
    detector::LandmarkDetector,
    features::FeatureVector,
    frame::FrameReader,
    pipeline::{ExtractionPipeline, ProcessedFrame},
    sequence::{self, LandmarkSequence},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingProgress {
    /// Frames captured so far, including the one being shown.
    pub captured: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingControl {
    Continue,
    Abort,
}

/// Receives every captured frame while a sample is recorded, e.g. to show a preview.
pub trait RecordingMonitor<F> {
    fn show(
        &mut self,
        frame: &ProcessedFrame<F>,
        progress: RecordingProgress,
    ) -> Result<RecordingControl>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordingOutcome {
    Recorded(LandmarkSequence),
    /// The monitor asked to stop; the partial sample is discarded.
    Aborted,
    /// The camera stopped delivering frames after `captured` frames.
    CameraFailed { captured: usize },
}

/// Captures `pipeline.max_frames()` consecutive frames from `camera` as one sample.
pub fn record_sample<C, D, M>(
    camera: &mut C,
    pipeline: &mut ExtractionPipeline<D>,
    monitor: &mut M,
) -> Result<RecordingOutcome>
where
    C: FrameReader,
    D: LandmarkDetector<C::Frame>,
    M: RecordingMonitor<C::Frame>,
{
    let total = pipeline.max_frames();
    let mut vectors: Vec<FeatureVector> = Vec::with_capacity(total);

    while vectors.len() < total {
        let frame = match camera.read_next()? {
            Some(frame) => frame,
            None => {
                warn!("Failed to read frame from camera");
                return Ok(RecordingOutcome::CameraFailed {
                    captured: vectors.len(),
                });
            }
        };

        let processed = pipeline.process_frame(&frame)?;
        vectors.push(processed.features);

        let progress = RecordingProgress {
            captured: vectors.len(),
            total,
        };
        if monitor.show(&processed, progress)? == RecordingControl::Abort {
            return Ok(RecordingOutcome::Aborted);
        }
    }

    Ok(RecordingOutcome::Recorded(sequence::assemble(&vectors, total)))
}
