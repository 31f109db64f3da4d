use std::{fs, path::Path};

use anyhow::{bail, Result};
use approx::assert_abs_diff_eq;

use sign_landmarks::{
    batch,
    dataset::{LabelRule, VideoEntry},
    detector::LandmarkDetector,
    features::FEATURE_DIM,
    frame::{Frame, FrameReader, FrameSize, VideoSource},
    landmark::{RawDetection, RawHand, HAND_LANDMARKS},
    manifest::Manifest,
    npy,
    pipeline::ExtractionPipeline,
};

#[derive(Debug, Clone)]
struct StillFrame {
    id: usize,
    size: FrameSize,
}

impl Frame for StillFrame {
    fn size(&self) -> FrameSize {
        self.size
    }

    fn resized(&self, size: FrameSize) -> Result<Self> {
        Ok(StillFrame { id: self.id, size })
    }
}

/// Frames are numbered from zero; `frames` of them decode.
struct FakeVideo {
    frames: usize,
    cursor: usize,
}

impl FakeVideo {
    fn new(frames: usize) -> Self {
        FakeVideo { frames, cursor: 0 }
    }
}

impl FrameReader for FakeVideo {
    type Frame = StillFrame;

    fn read_next(&mut self) -> Result<Option<StillFrame>> {
        let index = self.cursor;
        self.cursor += 1;
        self.read_at(index)
    }
}

impl VideoSource for FakeVideo {
    fn frame_count(&self) -> usize {
        self.frames
    }

    fn read_at(&mut self, index: usize) -> Result<Option<StillFrame>> {
        Ok((index < self.frames).then(|| StillFrame {
            id: index,
            size: FrameSize::new(1280, 720),
        }))
    }
}

/// Reports a right hand whose wrist moves with the frame number.
struct MovingHand;

impl LandmarkDetector<StillFrame> for MovingHand {
    fn detect(&mut self, frame: &StillFrame) -> Result<RawDetection> {
        let x = 0.1 + frame.id as f32 * 0.05;
        Ok(RawDetection {
            hands: vec![RawHand {
                handedness: "Right".to_string(),
                landmarks: vec![vec![x, 0.5, 0.0]; HAND_LANDMARKS],
            }],
            pose: None,
        })
    }
}

fn open_by_name(path: &Path) -> Result<FakeVideo> {
    let stem = path.file_stem().unwrap().to_string_lossy();
    if stem.contains("corrupt") {
        bail!("cannot open {}", path.display());
    }
    let frames = stem.rsplit('_').next().unwrap().parse().unwrap_or(0);
    Ok(FakeVideo::new(frames))
}

fn entries(names: &[&str]) -> Vec<VideoEntry> {
    names
        .iter()
        .map(|name| VideoEntry::new(Path::new("videos").join(name), LabelRule::Underscore))
        .collect()
}

#[test]
fn short_video_repeats_its_last_frame() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = ExtractionPipeline::new(MovingHand, 30);
    let videos = entries(&["hello_10.mp4"]);

    let manifest = batch::extract_videos(&mut pipeline, &videos, dir.path(), open_by_name);

    assert_eq!(manifest.len(), 1);
    let entry = &manifest.entries()[0];
    assert_eq!(entry.label, "hello");
    assert_eq!(entry.video_id, "hello_10");
    assert_eq!(entry.num_frames, 30);

    let sequence = npy::read_npy(dir.path().join("hello_hello_10.npy")).unwrap();
    assert_eq!(sequence.dim(), (30, FEATURE_DIM));
    // Right wrist x relative to the frame-center fallback reference.
    for row in 0..10 {
        let expected = 0.1 + 0.05 * row as f32 - 0.5;
        assert_abs_diff_eq!(sequence[[row, 63]], expected, epsilon = 1e-5);
    }
    for row in 10..30 {
        assert_eq!(sequence.row(row), sequence.row(9));
    }
    assert_ne!(sequence.row(8), sequence.row(9));
    assert!(sequence.row(9).iter().any(|&value| value != 0.0));
}

#[test]
fn undecodable_video_yields_zeros() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = ExtractionPipeline::new(MovingHand, 12);
    let videos = entries(&["empty_0.mp4"]);

    let manifest = batch::extract_videos(&mut pipeline, &videos, dir.path(), open_by_name);

    assert_eq!(manifest.entries()[0].num_frames, 12);
    let sequence = npy::read_npy(dir.path().join("empty_empty_0.npy")).unwrap();
    assert_eq!(sequence.dim(), (12, FEATURE_DIM));
    assert!(sequence.iter().all(|&value| value == 0.0));
}

#[test]
fn failed_videos_are_left_out() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = ExtractionPipeline::new(MovingHand, 8);
    let videos = entries(&[
        "thanks_20.mp4",
        "corrupt_3.mp4",
        "hello_5.mov",
        "hello_corrupt.avi",
        "yes_40.mkv",
    ]);

    let manifest = batch::extract_videos(&mut pipeline, &videos, dir.path(), open_by_name);

    let labels: Vec<_> = manifest
        .entries()
        .iter()
        .map(|entry| entry.label.as_str())
        .collect();
    assert_eq!(labels, ["thanks", "hello", "yes"]);
    assert!(manifest.entries().iter().all(|entry| entry.num_frames == 8));

    let written = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(written, 3);
}

#[test]
fn manifest_survives_a_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = ExtractionPipeline::new(MovingHand, 4);
    let videos = entries(&["no_6.mp4", "yes_2.mp4", "yes_9.mp4"]);

    let manifest = batch::extract_videos(&mut pipeline, &videos, dir.path(), open_by_name);
    let csv_path = dir.path().join("meta").join("data.csv");
    manifest.write(&csv_path).unwrap();

    let header = fs::read_to_string(&csv_path).unwrap();
    assert!(header.starts_with("filepath,label,video_id,num_frames"));

    let restored = Manifest::read(&csv_path).unwrap();
    assert_eq!(restored.entries(), manifest.entries());
    assert_eq!(restored.label_counts(), [("yes", 2), ("no", 1)]);

    for entry in restored.entries() {
        let sequence = npy::read_npy(&entry.filepath).unwrap();
        assert_eq!(sequence.nrows(), entry.num_frames);
    }
}
