use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Pulls still frames out of a video so they can be labeled like photos.
pub trait FrameSampler: Send + Sync {
    /// Up to `count` encoded frames, evenly spaced over the video. Returns
    /// fewer (possibly none) when extraction fails.
    fn sample(&self, video: &Path, count: usize) -> Vec<Vec<u8>>;
}

/// Shells out to `ffprobe` for the duration and `ffmpeg` for PNG frames.
#[derive(Debug, Clone)]
pub struct FfmpegFrameSampler {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegFrameSampler {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl FfmpegFrameSampler {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    fn duration_secs(&self, video: &Path) -> Option<f64> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(video)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()?;

        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().parse::<f64>().ok())
            .flatten()
            .filter(|d| d.is_finite() && *d > 0.0)
    }

    fn frame_at(&self, video: &Path, at_secs: f64) -> Option<Vec<u8>> {
        let output = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-ss", &format!("{:.3}", at_secs), "-i"])
            .arg(video)
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()?;

        (output.status.success() && !output.stdout.is_empty()).then_some(output.stdout)
    }
}

impl FrameSampler for FfmpegFrameSampler {
    fn sample(&self, video: &Path, count: usize) -> Vec<Vec<u8>> {
        let Some(duration) = self.duration_secs(video) else {
            tracing::debug!(video = %video.display(), "could not read video duration");
            return Vec::new();
        };

        sample_offsets(duration, count)
            .into_iter()
            .filter_map(|at| self.frame_at(video, at))
            .collect()
    }
}

/// Midpoints of `count` equal slices of the video, so no sample lands on
/// the very first or last frame.
pub fn sample_offsets(duration_secs: f64, count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| (i as f64 + 0.5) * duration_secs / count as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn offsets_are_evenly_spaced() {
        assert_eq!(sample_offsets(30.0, 3), vec![5.0, 15.0, 25.0]);
        assert_eq!(sample_offsets(10.0, 1), vec![5.0]);
        assert!(sample_offsets(10.0, 0).is_empty());
    }

    #[test]
    fn missing_tools_yield_no_frames() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"not really a video").unwrap();

        let sampler = FfmpegFrameSampler::new(
            dir.path().join("no-ffmpeg"),
            dir.path().join("no-ffprobe"),
        );
        assert!(sampler.sample(&video, 3).is_empty());
    }
}
