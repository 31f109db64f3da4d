use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const HEADER: [&str; 4] = ["filepath", "label", "video_id", "num_frames"];

/// One saved sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filepath: String,
    pub label: String,
    pub video_id: String,
    pub num_frames: usize,
}

/// Training index of every sample saved during a run.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sample counts per label, most frequent first; ties are ordered by label.
    pub fn label_counts(&self) -> Vec<(&str, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in &self.entries {
            *counts.entry(entry.label.as_str()).or_default() += 1;
        }

        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        counts
    }

    /// Writes the manifest as CSV, replacing any existing file at `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .with_context(|| format!("creating manifest {}", path.display()))?;

        writer.write_record(HEADER)?;
        for entry in &self.entries {
            writer.serialize(entry)?;
        }
        writer
            .flush()
            .with_context(|| format!("writing manifest {}", path.display()))?;

        Ok(())
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("opening manifest {}", path.display()))?;

        let entries = reader
            .deserialize()
            .collect::<Result<Vec<ManifestEntry>, _>>()
            .with_context(|| format!("parsing manifest {}", path.display()))?;

        Ok(Self { entries })
    }
}
