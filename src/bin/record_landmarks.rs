use std::{fs, io, path::PathBuf, thread, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use sign_landmarks::{
    config::ExtractorConfig,
    dataset,
    detector::ProcessDetector,
    draw::PreviewWindow,
    npy,
    pipeline::ExtractionPipeline,
    recorder::{self, RecordingOutcome},
    video::Camera,
};

const COUNTDOWN_SECS: u64 = 3;

/// Records webcam samples as `<output-dir>/<label>/<label> (N).npy`.
#[derive(Debug, Parser)]
#[command(about = "Record webcam samples and extract hand landmarks")]
struct Args {
    /// Label/word for the samples
    #[arg(long)]
    label: String,

    /// Number of samples to record
    #[arg(long, default_value_t = 5)]
    samples: usize,

    /// Frames per sample
    #[arg(long, default_value_t = 40, value_parser = clap::value_parser!(u32).range(1..))]
    frames: u32,

    /// Base output directory
    #[arg(long, default_value = "../dataset/landmarks")]
    output_dir: PathBuf,

    /// Auto-record samples with a countdown instead of waiting for Enter
    #[arg(long)]
    auto: bool,

    /// Camera index
    #[arg(long, default_value_t = 0)]
    camera: i32,

    /// JSON configuration for the landmark detector
    #[arg(long)]
    config: Option<PathBuf>,
}

fn wait_for_start(args: &Args, sample: usize) -> Result<()> {
    if args.auto {
        for remaining in (1..=COUNTDOWN_SECS).rev() {
            info!(
                "Recording sample {}/{} in {}...",
                sample, args.samples, remaining
            );
            thread::sleep(Duration::from_secs(1));
        }
    } else {
        println!(
            "Press Enter to start recording sample {}/{} (or Ctrl+C to cancel)",
            sample, args.samples
        );
        let mut line = String::new();
        io::stdin()
            .read_line(&mut line)
            .context("reading from stdin")?;
    }

    Ok(())
}

fn main() -> Result<()> {
    sign_landmarks::init_logger(env!("CARGO_CRATE_NAME"));
    let args = Args::parse();

    let label_dir = args.output_dir.join(&args.label);
    fs::create_dir_all(&label_dir).with_context(|| format!("creating {}", label_dir.display()))?;

    let config = ExtractorConfig::load(args.config.as_deref())?;
    let detector = ProcessDetector::spawn(&config.detector)?;
    let mut pipeline = ExtractionPipeline::new(detector, args.frames as usize);

    let mut camera = Camera::open(args.camera)?;
    let mut preview = PreviewWindow::new();

    info!(
        "Ready to record {} samples for label '{}' into: {}",
        args.samples,
        args.label,
        label_dir.display()
    );
    info!("Press Ctrl+C to quit at any time.");

    for sample in 1..=args.samples {
        let sample_index = dataset::next_sample_index(&label_dir, &args.label)?;

        wait_for_start(&args, sample)?;
        info!(
            "Recording sample {}/{} - collect {} frames...",
            sample, args.samples, args.frames
        );

        let outcome = recorder::record_sample(&mut camera, &mut pipeline, &mut preview);
        preview.close()?;

        match outcome? {
            RecordingOutcome::Recorded(sequence) => {
                let out_path =
                    label_dir.join(dataset::numbered_sample_name(&args.label, sample_index));
                npy::write_npy(&out_path, &sequence)?;
                info!("Saved sample to {}", out_path.display());
            }
            RecordingOutcome::Aborted => warn!("Sample aborted - skipping"),
            RecordingOutcome::CameraFailed { captured } => warn!(
                "Camera stopped after {} of {} frames - skipping",
                captured, args.frames
            ),
        }
    }

    Ok(())
}
