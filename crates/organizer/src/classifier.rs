use chrono::{DateTime, Local};
use std::path::Path;

use crate::config::DEFAULT_VIDEO_SAMPLES;
use crate::frames::{FfmpegFrameSampler, FrameSampler};
use crate::labeler::{is_usable, majority_label, Labeler, NullLabeler};
use crate::types::{Category, Classification, UNCATEGORIZED, UNKNOWN_YEAR};
use sort_tree_core::sanitize;

/// Maps a file to `(year, category, label)`.
///
/// Only photos and videos reach the labeler. Whatever it answers, an unusable
/// label falls back to the parent folder name and then to `UNCATEGORIZED`,
/// so classification never fails.
pub struct Classifier {
    labeler: Box<dyn Labeler>,
    frames: Box<dyn FrameSampler>,
    video_samples: usize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Box::new(NullLabeler), Box::new(FfmpegFrameSampler::default()))
    }
}

impl Classifier {
    pub fn new(labeler: Box<dyn Labeler>, frames: Box<dyn FrameSampler>) -> Self {
        Self {
            labeler,
            frames,
            video_samples: DEFAULT_VIDEO_SAMPLES,
        }
    }

    pub fn with_labeler(mut self, labeler: Box<dyn Labeler>) -> Self {
        self.labeler = labeler;
        self
    }

    pub fn with_frame_sampler(mut self, frames: Box<dyn FrameSampler>) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_video_samples(mut self, samples: usize) -> Self {
        self.video_samples = samples.max(1);
        self
    }

    pub fn classify(&self, path: &Path) -> Classification {
        self.classify_at(path, modified_time(path))
    }

    /// Classify with an already-read modification time.
    pub fn classify_at(&self, path: &Path, modified: Option<DateTime<Local>>) -> Classification {
        let category = Category::from_path(path);

        let label = self
            .content_label(path, category)
            .filter(|l| is_path_worthy(l))
            .or_else(|| folder_label(path))
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        Classification {
            year: year_of(modified),
            category,
            label,
        }
    }

    fn content_label(&self, path: &Path, category: Category) -> Option<String> {
        if !self.labeler.is_active() {
            return None;
        }

        match category {
            Category::Photos => match std::fs::read(path) {
                Ok(bytes) => Some(self.labeler.label(&bytes)),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "cannot read image for labeling");
                    None
                }
            },
            Category::Videos => majority_label(
                self.frames
                    .sample(path, self.video_samples)
                    .iter()
                    .map(|frame| self.labeler.label(frame)),
            ),
            _ => None,
        }
    }
}

pub fn modified_time(path: &Path) -> Option<DateTime<Local>> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Local>::from)
}

pub fn year_of(modified: Option<DateTime<Local>>) -> String {
    modified
        .map(|m| m.format("%Y").to_string())
        .unwrap_or_else(|| UNKNOWN_YEAR.to_string())
}

/// Name of the immediate parent directory, if it makes a usable label.
pub fn folder_label(path: &Path) -> Option<String> {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().trim().to_string())
        .filter(|n| is_path_worthy(n))
}

fn is_path_worthy(label: &str) -> bool {
    is_usable(label) && !sanitize(label).is_empty()
}
