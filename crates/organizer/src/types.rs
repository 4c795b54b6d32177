use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Label used when neither the labeler nor the folder name gives one.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Year segment used when the modification time cannot be read.
pub const UNKNOWN_YEAR: &str = "UnknownYear";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Music,
    Photos,
    Videos,
    Art,
    #[serde(rename = "3D")]
    ThreeD,
    Code,
    Web,
    Other,
}

impl Category {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "mp3" | "wav" | "flac" | "aac" => Self::Music,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" => Self::Photos,
            "mp4" | "mov" | "avi" | "mkv" => Self::Videos,
            "psd" | "ai" | "svg" => Self::Art,
            "blend" | "fbx" | "obj" | "dae" | "3ds" | "stl" | "ply" | "gltf" | "glb" | "rbxl"
            | "rbxm" => Self::ThreeD,
            "py" | "js" | "ts" | "rb" => Self::Code,
            "html" | "css" | "json" | "xml" => Self::Web,
            _ => Self::Other,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Other)
    }

    /// Directory name used in the destination layout.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Music => "Music",
            Self::Photos => "Photos",
            Self::Videos => "Videos",
            Self::Art => "Art",
            Self::ThreeD => "3D",
            Self::Code => "Code",
            Self::Web => "Web",
            Self::Other => "Other",
        }
    }

    /// Photos and videos are labeled by content and renamed by capture time.
    pub fn is_media(&self) -> bool {
        matches!(self, Self::Photos | Self::Videos)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub year: String,
    pub category: Category,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Copy,
    Move,
    SkipDuplicate,
    SkipExists,
}

impl Action {
    pub fn writes(&self) -> bool {
        matches!(self, Self::Copy | Self::Move)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Copy => "copy",
            Self::Move => "move",
            Self::SkipDuplicate => "skip-duplicate",
            Self::SkipExists => "skip-exists",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementPlan {
    pub target_dir: PathBuf,
    pub final_filename: String,
    pub action: Action,
}

impl PlacementPlan {
    pub fn target_path(&self) -> PathBuf {
        self.target_dir.join(&self.final_filename)
    }
}

/// A file that was (or in a dry run, would have been) written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub source: PathBuf,
    pub target: PathBuf,
    pub action: Action,
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_from_extension() {
        assert_eq!(Category::from_extension("mp3"), Category::Music);
        assert_eq!(Category::from_extension("JPG"), Category::Photos);
        assert_eq!(Category::from_extension("Mkv"), Category::Videos);
        assert_eq!(Category::from_extension("svg"), Category::Art);
        assert_eq!(Category::from_extension("rbxm"), Category::ThreeD);
        assert_eq!(Category::from_extension("3ds"), Category::ThreeD);
        assert_eq!(Category::from_extension("rb"), Category::Code);
        assert_eq!(Category::from_extension("json"), Category::Web);
        assert_eq!(Category::from_extension("txt"), Category::Other);
        assert_eq!(Category::from_extension(""), Category::Other);
    }

    #[test]
    fn category_from_path() {
        assert_eq!(
            Category::from_path(Path::new("/a/b/Track.FLAC")),
            Category::Music
        );
        assert_eq!(Category::from_path(Path::new("/a/Makefile")), Category::Other);
        assert_eq!(
            Category::from_path(Path::new("/a/archive.tar.gz")),
            Category::Other
        );
    }

    #[test]
    fn three_d_directory_name() {
        assert_eq!(Category::ThreeD.to_string(), "3D");
        assert_eq!(serde_json::to_string(&Category::ThreeD).unwrap(), "\"3D\"");
    }

    #[test]
    fn only_photos_and_videos_are_media() {
        assert!(Category::Photos.is_media());
        assert!(Category::Videos.is_media());
        assert!(!Category::Music.is_media());
        assert!(!Category::Other.is_media());
    }

    #[test]
    fn plan_target_path() {
        let plan = PlacementPlan {
            target_dir: PathBuf::from("/dest/2023/Code/tools"),
            final_filename: "build.py".to_string(),
            action: Action::Copy,
        };

        assert_eq!(
            plan.target_path(),
            PathBuf::from("/dest/2023/Code/tools/build.py")
        );
        assert!(plan.action.writes());
        assert!(!Action::SkipExists.writes());
    }
}
