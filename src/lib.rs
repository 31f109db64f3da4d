//! Hand landmark sequence extraction for sign-language training data.
//!
//! Videos (or live camera frames) are resized to [`frame::TARGET_RESOLUTION`], run through a
//! [`detector::LandmarkDetector`], normalized into 126-dimensional [`features::FeatureVector`]s
//! and stacked into fixed-length [`sequence::LandmarkSequence`]s that are written as `.npy`
//! arrays alongside a CSV [`manifest::Manifest`].

use log::LevelFilter;

pub mod batch;
pub mod config;
pub mod dataset;
pub mod detector;
pub mod features;
pub mod frame;
pub mod landmark;
pub mod manifest;
pub mod npy;
pub mod pipeline;
pub mod recorder;
pub mod sampler;
pub mod sequence;
pub mod skeleton;

#[cfg(feature = "opencv")]
pub mod draw;
#[cfg(feature = "opencv")]
pub mod video;

/// Initializes logging to *stderr*.
///
/// This crate and the calling binary log at *info* level unless overridden through `RUST_LOG`.
/// If a global logger is already registered, this does nothing.
pub fn init_logger(calling_crate: &'static str) {
    env_logger::Builder::new()
        .filter(Some(calling_crate), LevelFilter::Info)
        .filter(Some(env!("CARGO_CRATE_NAME")), LevelFilter::Info)
        .format_timestamp_secs()
        .parse_default_env()
        .try_init()
        .ok();
}
