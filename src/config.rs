use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Run configuration, read from a JSON file. Missing fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub detector: DetectorConfig,
}

impl ExtractorConfig {
    /// Loads the configuration at `path`, or the defaults if no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => return Ok(Self::default()),
        };

        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| {
            format!(
                "parsing config file {}; the schema used may be out of date",
                path.display()
            )
        })
    }
}

/// How to start the landmark detector process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub command: String,
    pub args: Vec<String>,
    /// Quality of the JPEG frames sent to the detector.
    pub jpeg_quality: u8,
    pub settings: DetectorSettings,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            command: "landmark-detector".to_string(),
            args: Vec::new(),
            jpeg_quality: 95,
            settings: DetectorSettings::default(),
        }
    }
}

/// Model settings forwarded to the detector in its handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub max_num_hands: u8,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    pub pose_min_detection_confidence: f32,
    pub pose_min_tracking_confidence: f32,
    pub model_complexity: u8,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            max_num_hands: 2,
            min_detection_confidence: 0.7,
            min_tracking_confidence: 0.5,
            pose_min_detection_confidence: 0.5,
            pose_min_tracking_confidence: 0.5,
            model_complexity: 1,
        }
    }
}
