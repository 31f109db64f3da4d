use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info, warn};

use sign_landmarks::{
    batch,
    config::ExtractorConfig,
    dataset::{self, LabelRule, VideoEntry},
    detector::ProcessDetector,
    draw,
    frame::FrameReader,
    pipeline::ExtractionPipeline,
    video::VideoFile,
};

#[derive(Debug, Parser)]
#[command(about = "Extract hand landmark sequences from sign-language videos")]
struct Args {
    /// Directory containing video files
    #[arg(long, default_value = "data/videos")]
    videos_dir: PathBuf,

    /// Output directory for landmark .npy files
    #[arg(long, default_value = "data/landmarks")]
    output_dir: PathBuf,

    /// Output CSV manifest
    #[arg(long, default_value = "data/data.csv")]
    csv_out: PathBuf,

    /// Frames per video
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..))]
    max_frames: u32,

    /// Save visualization images (green landmarks on black)
    #[arg(long)]
    visualize: bool,

    /// JSON configuration for the landmark detector
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Renders the landmarks of the video's first frame.
fn visualize(
    pipeline: &mut ExtractionPipeline<ProcessDetector>,
    entry: &VideoEntry,
    viz_dir: &Path,
) -> Result<()> {
    let mut video = VideoFile::open(&entry.path)?;
    let frame = match video.read_next()? {
        Some(frame) => frame,
        None => return Ok(()),
    };
    drop(video);

    let processed = pipeline.process_frame(&frame)?;
    draw::save_visualization(&viz_dir.join(entry.visualization_file_name()), &processed)
}

fn main() -> Result<()> {
    sign_landmarks::init_logger(env!("CARGO_CRATE_NAME"));
    let args = Args::parse();

    if !args.videos_dir.is_dir() {
        error!("Videos directory not found: {}", args.videos_dir.display());
        error!("Expected structure: {}/*.mp4", args.videos_dir.display());
        bail!("nothing to process");
    }

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let viz_dir = if args.visualize {
        let dir = args.output_dir.join("visualizations");
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        Some(dir)
    } else {
        None
    };

    let config = ExtractorConfig::load(args.config.as_deref())?;
    let detector = ProcessDetector::spawn(&config.detector)?;
    let mut pipeline = ExtractionPipeline::new(detector, args.max_frames as usize);

    let videos: Vec<_> = dataset::list_videos(&args.videos_dir)?
        .into_iter()
        .map(|path| VideoEntry::new(path, LabelRule::Underscore))
        .collect();
    info!("Found {} videos", videos.len());

    let manifest = batch::extract_videos(&mut pipeline, &videos, &args.output_dir, VideoFile::open);

    if let Some(viz_dir) = &viz_dir {
        let saved = videos.iter().filter(|entry| {
            manifest
                .entries()
                .iter()
                .any(|saved| saved.video_id == entry.video_id)
        });

        for entry in saved {
            if let Err(err) = visualize(&mut pipeline, entry, viz_dir) {
                warn!("No visualization for {}: {:#}", entry.path.display(), err);
            }
        }
    }

    manifest.write(&args.csv_out)?;

    info!("Processing complete!");
    info!("Processed: {} of {} videos", manifest.len(), videos.len());
    info!("Landmarks: {}", args.output_dir.display());
    info!("Manifest: {}", args.csv_out.display());

    if !manifest.is_empty() {
        info!("Top words:");
        for (label, count) in manifest.label_counts().into_iter().take(10) {
            info!("   {}: {} samples", label, count);
        }
    }

    Ok(())
}
