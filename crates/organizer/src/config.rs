use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, IoContext, Result};

pub const DEFAULT_VIDEO_SAMPLES: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub move_files: bool,
    pub dry_run: bool,
    /// Worker threads for hashing and labeling; `None` uses every core.
    pub jobs: Option<usize>,
    pub video_samples: usize,
    pub labeler: LabelerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelerConfig {
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    pub min_score: f32,
}

impl Default for LabelerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 30,
            min_score: 0.0,
        }
    }
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            move_files: false,
            dry_run: false,
            jobs: None,
            video_samples: DEFAULT_VIDEO_SAMPLES,
            labeler: LabelerConfig::default(),
        }
    }
}

impl OrganizeConfig {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            ..Default::default()
        }
    }

    pub fn with_move(mut self, move_files: bool) -> Self {
        self.move_files = move_files;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).at(path)?;
        serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content).at(path)
    }

    /// Startup checks; nothing is processed when these fail.
    pub fn validate(&self) -> Result<()> {
        if self.source.as_os_str().is_empty() {
            return Err(Error::Config("no source folder given".into()));
        }
        if self.destination.as_os_str().is_empty() {
            return Err(Error::Config("no destination folder given".into()));
        }

        let is_dir = std::fs::metadata(&self.source)
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir || std::fs::read_dir(&self.source).is_err() {
            return Err(Error::Config(format!(
                "source folder {} does not exist or is not accessible",
                self.source.display()
            )));
        }

        if let Ok(meta) = std::fs::metadata(&self.destination) {
            if !meta.is_dir() {
                return Err(Error::Config(format!(
                    "destination {} is not a directory",
                    self.destination.display()
                )));
            }
            if same_path(&self.source, &self.destination) {
                return Err(Error::Config(
                    "source and destination are the same folder".into(),
                ));
            }
        }

        if self.jobs == Some(0) {
            return Err(Error::Config("jobs must be at least 1".into()));
        }

        Ok(())
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_save_load() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.json");

        let config = OrganizeConfig::new("/src", "/dest").with_move(true);
        config.save(&config_path).unwrap();

        let loaded = OrganizeConfig::load(&config_path).unwrap();
        assert_eq!(loaded.source, config.source);
        assert!(loaded.move_files);
        assert_eq!(loaded.video_samples, DEFAULT_VIDEO_SAMPLES);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{"labeler": {"endpoint": "http://localhost:9000/label"}}"#,
        )
        .unwrap();

        let loaded = OrganizeConfig::load(&config_path).unwrap();
        assert_eq!(
            loaded.labeler.endpoint.as_deref(),
            Some("http://localhost:9000/label")
        );
        assert_eq!(loaded.labeler.timeout_secs, 30);
        assert!(!loaded.dry_run);
    }

    #[test]
    fn malformed_config_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "{ not json").unwrap();

        assert!(matches!(
            OrganizeConfig::load(&config_path),
            Err(Error::ConfigParse { .. })
        ));
    }

    #[test]
    fn validate_accepts_existing_source() {
        let dir = TempDir::new().unwrap();
        let config = OrganizeConfig::new(dir.path(), dir.path().join("out"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_source() {
        let dir = TempDir::new().unwrap();
        let config = OrganizeConfig::new(dir.path().join("missing"), dir.path().join("out"));
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn validate_rejects_file_as_source() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();

        let config = OrganizeConfig::new(&file, dir.path().join("out"));
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn validate_rejects_same_folder() {
        let dir = TempDir::new().unwrap();
        let config = OrganizeConfig::new(dir.path(), dir.path());
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn validate_rejects_zero_jobs() {
        let dir = TempDir::new().unwrap();
        let config = OrganizeConfig::new(dir.path(), dir.path().join("out")).with_jobs(0);
        assert!(config.validate().is_err());
    }
}
