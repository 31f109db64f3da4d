use anyhow::{Context, Result};
use log::{debug, warn};
use std::convert::TryFrom;

use crate::{
    detector::LandmarkDetector,
    features::{self, FeatureVector},
    frame::{Frame, FrameReader, VideoSource, TARGET_RESOLUTION},
    landmark::Detection,
    sampler::sample_frame_indices,
    sequence::{self, LandmarkSequence},
};

/// A frame after resizing and landmark detection.
pub struct ProcessedFrame<F> {
    /// The frame at [`TARGET_RESOLUTION`].
    pub frame: F,
    /// `None` when the detector output was malformed.
    pub detection: Option<Detection>,
    pub features: FeatureVector,
}

/// Turns frames into features and videos into fixed-length sequences.
///
/// Owns the detector for the whole run; the batch and live paths both go through
/// [`ExtractionPipeline::process_frame`].
pub struct ExtractionPipeline<Detector> {
    detector: Detector,
    max_frames: usize,
}

impl<Detector> ExtractionPipeline<Detector> {
    pub fn new(detector: Detector, max_frames: usize) -> Self {
        ExtractionPipeline {
            detector,
            max_frames,
        }
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    pub fn process_frame<F>(&mut self, frame: &F) -> Result<ProcessedFrame<F>>
    where
        F: Frame,
        Detector: LandmarkDetector<F>,
    {
        let frame = frame
            .resized(TARGET_RESOLUTION)
            .context("Failed to resize frame")?;

        let raw = self
            .detector
            .detect(&frame)
            .context("Landmark detection failed")?;

        let (detection, features) = match Detection::try_from(raw) {
            Ok(detection) => {
                let features = features::normalize(&detection, frame.size());
                (Some(detection), features)
            }
            Err(err) => {
                warn!("Discarding malformed detector output: {}", err);
                (None, FeatureVector::zeros())
            }
        };

        Ok(ProcessedFrame {
            frame,
            detection,
            features,
        })
    }

    /// Extracts a `max_frames`-row sequence from `source`.
    ///
    /// A frame that fails to decode ends the video; the sequence is padded with the last
    /// extracted features, or zeros if nothing could be read.
    pub fn extract_video<S>(&mut self, source: &mut S) -> Result<LandmarkSequence>
    where
        S: VideoSource,
        Detector: LandmarkDetector<S::Frame>,
    {
        let total_frames = source.frame_count();

        let features = if total_frames > 0 {
            self.extract_sampled(source, total_frames)?
        } else {
            self.extract_buffered(source)?
        };

        Ok(sequence::assemble(&features, self.max_frames))
    }

    fn extract_sampled<S>(
        &mut self,
        source: &mut S,
        total_frames: usize,
    ) -> Result<Vec<FeatureVector>>
    where
        S: VideoSource,
        Detector: LandmarkDetector<S::Frame>,
    {
        let indices = sample_frame_indices(total_frames, self.max_frames);
        let mut features = Vec::with_capacity(indices.len());
        let mut previous: Option<(usize, FeatureVector)> = None;

        for index in indices {
            if let Some((previous_index, vector)) = previous {
                if previous_index == index {
                    features.push(vector);
                    continue;
                }
            }

            let frame = match source.read_at(index)? {
                Some(frame) => frame,
                None => {
                    debug!("Frame {} of {} could not be read", index, total_frames);
                    break;
                }
            };

            let vector = self.process_frame(&frame)?.features;
            features.push(vector);
            previous = Some((index, vector));
        }

        Ok(features)
    }

    /// For containers that do not report a frame count: decode everything, then sample.
    fn extract_buffered<S>(&mut self, source: &mut S) -> Result<Vec<FeatureVector>>
    where
        S: FrameReader,
        Detector: LandmarkDetector<S::Frame>,
    {
        let mut frames = Vec::new();
        while let Some(frame) = source.read_next()? {
            frames.push(frame);
        }
        debug!("Decoded {} frames without a reported frame count", frames.len());

        let indices = sample_frame_indices(frames.len(), self.max_frames);
        let mut features = Vec::with_capacity(indices.len());
        let mut previous: Option<(usize, FeatureVector)> = None;

        for index in indices {
            let vector = match previous {
                Some((previous_index, vector)) if previous_index == index => vector,
                _ => self.process_frame(&frames[index])?.features,
            };
            features.push(vector);
            previous = Some((index, vector));
        }

        Ok(features)
    }
}
