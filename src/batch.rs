//! Sequential extraction over a list of videos.

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;

use crate::{
    dataset::VideoEntry,
    detector::LandmarkDetector,
    frame::VideoSource,
    manifest::{Manifest, ManifestEntry},
    npy,
    pipeline::ExtractionPipeline,
};

/// A bar over `len` videos, drawn to stderr only when it is a terminal.
pub fn video_progress(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("[{elapsed_precise}] {wide_bar} {pos}/{len} videos {msg}")
    {
        pb.set_style(style);
    }
    pb
}

/// Extracts one video into `npy_path` and returns the number of rows written.
pub fn save_sample<S, D>(
    pipeline: &mut ExtractionPipeline<D>,
    source: &mut S,
    npy_path: &Path,
) -> Result<usize>
where
    S: VideoSource,
    D: LandmarkDetector<S::Frame>,
{
    let sequence = pipeline.extract_video(source)?;
    npy::write_npy(npy_path, &sequence)?;
    Ok(sequence.nrows())
}

/// Extracts every entry into `{output_dir}/{label}_{video_id}.npy`, one video at a time.
///
/// `open` acquires the decoder for a video; it is dropped before the next video is opened.
/// Videos that fail are logged and left out of the returned manifest.
pub fn extract_videos<S, D, O>(
    pipeline: &mut ExtractionPipeline<D>,
    entries: &[VideoEntry],
    output_dir: &Path,
    mut open: O,
) -> Manifest
where
    S: VideoSource,
    D: LandmarkDetector<S::Frame>,
    O: FnMut(&Path) -> Result<S>,
{
    let mut manifest = Manifest::new();
    let pb = video_progress(entries.len());

    for entry in entries {
        pb.set_message(entry.video_id.clone());

        let npy_path = output_dir.join(entry.sample_file_name());
        let result = open(&entry.path).and_then(|mut source| {
            save_sample(pipeline, &mut source, &npy_path)
                .with_context(|| format!("extracting landmarks from {}", entry.path.display()))
        });

        match result {
            Ok(num_frames) => manifest.push(ManifestEntry {
                filepath: npy_path.display().to_string(),
                label: entry.label.clone(),
                video_id: entry.video_id.clone(),
                num_frames,
            }),
            Err(err) => pb.suspend(|| warn!("Skipping {}: {:#}", entry.path.display(), err)),
        }
        pb.inc(1);
    }

    pb.finish_with_message("done");
    manifest
}
