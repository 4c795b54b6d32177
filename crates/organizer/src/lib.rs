pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod frames;
pub mod labeler;
pub mod ledger;
pub mod logging;
pub mod paths;
pub mod place;
pub mod summary;
pub mod types;

pub use classifier::{folder_label, modified_time, year_of, Classifier};
pub use config::{LabelerConfig, OrganizeConfig, DEFAULT_VIDEO_SAMPLES};
pub use engine::Organizer;
pub use error::{Error, Result};
pub use frames::{FfmpegFrameSampler, FrameSampler};
pub use labeler::{majority_label, HttpLabeler, Labeler, NullLabeler};
pub use ledger::DedupLedger;
pub use paths::{build_path, resolve_collision, versioned_name, Resolution, Slot};
pub use place::{copy_file, copy_verify_remove, move_file};
pub use summary::{format_size, Counts, FileReport, Outcome, Summary};
pub use types::{
    Action, Category, Classification, PlacementPlan, PlacementRecord, UNCATEGORIZED,
    UNKNOWN_YEAR,
};
