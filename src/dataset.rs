//! Input discovery, label derivation and sample naming.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

/// Container extensions picked up from an input directory, compared case-insensitively.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Lists the video files directly inside `dir`, sorted by file name.
pub fn list_videos(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut videos = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && is_video_file(&path) {
            videos.push(path);
        }
    }

    videos.sort();
    Ok(videos)
}

/// How a class label is derived from a video's file stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRule {
    /// Everything before the first `_`.
    Underscore,
    /// Everything before the first of `_`, `-` or `.`, tried in that order.
    Separators,
    /// The whole stem.
    Stem,
}

impl LabelRule {
    pub fn label<'a>(&self, stem: &'a str) -> &'a str {
        match self {
            LabelRule::Underscore => label_from_stem(stem),
            LabelRule::Separators => ['_', '-', '.']
                .iter()
                .find_map(|&sep| stem.split_once(sep).map(|(label, _)| label))
                .unwrap_or(stem),
            LabelRule::Stem => stem,
        }
    }
}

/// The part of `stem` before its first underscore, or all of it.
pub fn label_from_stem(stem: &str) -> &str {
    stem.split_once('_').map_or(stem, |(label, _)| label)
}

/// A video to process and the names derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEntry {
    pub path: PathBuf,
    pub label: String,
    pub video_id: String,
}

impl VideoEntry {
    pub fn new(path: PathBuf, rule: LabelRule) -> Self {
        let video_id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let label = rule.label(&video_id).to_string();

        Self {
            path,
            label,
            video_id,
        }
    }

    /// `{label}_{video_id}.npy`
    pub fn sample_file_name(&self) -> String {
        format!("{}_{}.npy", self.label, self.video_id)
    }

    /// `{label}_{video_id}_landmarks.jpg`
    pub fn visualization_file_name(&self) -> String {
        format!("{}_{}_landmarks.jpg", self.label, self.video_id)
    }
}

/// `{label} ({index}).npy`
pub fn numbered_sample_name(label: &str, index: usize) -> String {
    format!("{} ({}).npy", label, index)
}

/// One more than the highest `N` among existing `{label}*.npy` files named `... (N).npy`.
///
/// Returns 1 when `dir` holds no numbered samples for `label` or does not exist yet.
pub fn next_sample_index(dir: &Path, label: &str) -> Result<usize> {
    if !dir.exists() {
        return Ok(1);
    }

    let mut max_index = 0;
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let name = entry?.file_name();
        let name = match name.to_str() {
            Some(name) => name,
            None => continue,
        };

        let stem = match name.strip_suffix(".npy") {
            Some(stem) if stem.starts_with(label) => stem,
            _ => continue,
        };

        if let Some(index) = parse_sample_index(stem) {
            max_index = max_index.max(index);
        }
    }

    Ok(max_index + 1)
}

fn parse_sample_index(stem: &str) -> Option<usize> {
    let inner = stem.strip_suffix(')')?;
    let (_, digits) = inner.rsplit_once('(')?;
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn underscore_labels() {
        assert_eq!(label_from_stem("hello_1"), "hello");
        assert_eq!(label_from_stem("thank_you_2"), "thank");
        assert_eq!(label_from_stem("goodbye"), "goodbye");
        assert_eq!(label_from_stem("_odd"), "");
    }

    #[test]
    fn separator_labels() {
        let rule = LabelRule::Separators;
        assert_eq!(rule.label("hello-world_2"), "hello-world");
        assert_eq!(rule.label("hello-2"), "hello");
        assert_eq!(rule.label("hello.take2"), "hello");
        assert_eq!(rule.label("hello"), "hello");
        assert_eq!(LabelRule::Stem.label("hello_1"), "hello_1");
    }

    #[test]
    fn video_entry_names() {
        let entry = VideoEntry::new(PathBuf::from("data/videos/hello_3.mp4"), LabelRule::Underscore);
        assert_eq!(entry.label, "hello");
        assert_eq!(entry.video_id, "hello_3");
        assert_eq!(entry.sample_file_name(), "hello_hello_3.npy");
        assert_eq!(entry.visualization_file_name(), "hello_hello_3_landmarks.jpg");
        assert_eq!(numbered_sample_name("hello", 4), "hello (4).npy");
    }

    #[test]
    fn lists_videos_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.MP4", "a.mov", "notes.txt", "c.mkv", "d.webm"] {
            File::create(dir.path().join(name)).unwrap();
        }
        fs::create_dir(dir.path().join("e.mp4")).unwrap();

        let names: Vec<_> = list_videos(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.mov", "b.MP4", "c.mkv"]);
    }

    #[test]
    fn next_index_follows_highest_existing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(next_sample_index(dir.path(), "hello").unwrap(), 1);
        assert_eq!(next_sample_index(&dir.path().join("missing"), "hello").unwrap(), 1);

        for name in ["hello (1).npy", "hello (7).npy", "hello (x).npy", "hello.npy", "bye (12).npy"] {
            File::create(dir.path().join(name)).unwrap();
        }

        assert_eq!(next_sample_index(dir.path(), "hello").unwrap(), 8);
        assert_eq!(next_sample_index(dir.path(), "bye").unwrap(), 13);
    }
}
