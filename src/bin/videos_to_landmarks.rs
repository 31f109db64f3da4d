use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info, warn};

use sign_landmarks::{
    batch,
    config::ExtractorConfig,
    dataset::{self, LabelRule, VideoEntry},
    detector::ProcessDetector,
    manifest::{Manifest, ManifestEntry},
    pipeline::ExtractionPipeline,
    video::VideoFile,
};

/// Saves one numbered sample per video under `<output-dir>/<label>/<label> (N).npy`.
#[derive(Debug, Parser)]
#[command(about = "Process video files into per-label landmark samples")]
struct Args {
    /// Directory with video files (mp4/mov/avi/mkv)
    #[arg(long)]
    input_dir: PathBuf,

    /// Base output directory for per-label npy files
    #[arg(long, default_value = "../dataset/landmarks")]
    output_dir: PathBuf,

    /// Number of frames per sample
    #[arg(long, default_value_t = 40, value_parser = clap::value_parser!(u32).range(1..))]
    frames: u32,

    /// Derive the label from the filename before the first '_', '-' or '.'
    #[arg(long)]
    label_from_filename: bool,

    /// Also write a CSV manifest of the saved samples
    #[arg(long)]
    csv_out: Option<PathBuf>,

    /// JSON configuration for the landmark detector
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    sign_landmarks::init_logger(env!("CARGO_CRATE_NAME"));
    let args = Args::parse();

    if !args.input_dir.is_dir() {
        error!("Input directory does not exist: {}", args.input_dir.display());
        bail!("nothing to process");
    }

    let rule = if args.label_from_filename {
        LabelRule::Separators
    } else {
        LabelRule::Stem
    };

    let videos = dataset::list_videos(&args.input_dir)?;
    if videos.is_empty() {
        info!("No video files found in {}", args.input_dir.display());
        return Ok(());
    }
    info!("Found {} videos. Processing...", videos.len());

    let config = ExtractorConfig::load(args.config.as_deref())?;
    let detector = ProcessDetector::spawn(&config.detector)?;
    let mut pipeline = ExtractionPipeline::new(detector, args.frames as usize);
    let mut manifest = Manifest::new();
    let pb = batch::video_progress(videos.len());

    for path in videos {
        let entry = VideoEntry::new(path, rule);
        let label_dir = args.output_dir.join(&entry.label);
        fs::create_dir_all(&label_dir)
            .with_context(|| format!("creating {}", label_dir.display()))?;

        let sample_index = dataset::next_sample_index(&label_dir, &entry.label)?;
        let npy_path = label_dir.join(dataset::numbered_sample_name(&entry.label, sample_index));
        pb.set_message(entry.video_id.clone());

        let result = VideoFile::open(&entry.path)
            .and_then(|mut video| batch::save_sample(&mut pipeline, &mut video, &npy_path));

        match result {
            Ok(num_frames) => {
                pb.suspend(|| info!("Saved landmarks to {}", npy_path.display()));
                manifest.push(ManifestEntry {
                    filepath: npy_path.display().to_string(),
                    label: entry.label.clone(),
                    video_id: entry.video_id.clone(),
                    num_frames,
                });
            }
            Err(err) => {
                pb.suspend(|| warn!("Failed to process {}: {:#}", entry.path.display(), err))
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    if let Some(csv_out) = &args.csv_out {
        manifest.write(csv_out)?;
        info!("Manifest: {}", csv_out.display());
    }

    Ok(())
}
