use serde::{Deserialize, Serialize};
use sort_tree_core::Fingerprint;
use std::path::PathBuf;

use crate::types::PlacementRecord;

/// Terminal state of one discovered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Outcome {
    Placed(PlacementRecord),
    DuplicateInRun { first_seen: PathBuf },
    DuplicateOnDisk { existing: PathBuf },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub source: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub placed: usize,
    pub duplicate_in_run: usize,
    pub duplicate_on_disk: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub dry_run: bool,
    pub counts: Counts,
    pub bytes_placed: u64,
    pub elapsed_ms: u64,
    pub reports: Vec<FileReport>,
}

impl Summary {
    pub fn new(dry_run: bool, reports: Vec<FileReport>, elapsed_ms: u64) -> Self {
        let counts = reports.iter().fold(Counts::default(), |mut acc, r| {
            match r.outcome {
                Outcome::Placed(_) => acc.placed += 1,
                Outcome::DuplicateInRun { .. } => acc.duplicate_in_run += 1,
                Outcome::DuplicateOnDisk { .. } => acc.duplicate_on_disk += 1,
                Outcome::Failed { .. } => acc.failed += 1,
            }
            acc
        });

        let bytes_placed = reports
            .iter()
            .filter_map(|r| match &r.outcome {
                Outcome::Placed(record) => Some(record.size),
                _ => None,
            })
            .sum();

        Self {
            dry_run,
            counts,
            bytes_placed,
            elapsed_ms,
            reports,
        }
    }

    pub fn placed(&self) -> impl Iterator<Item = &PlacementRecord> {
        self.reports.iter().filter_map(|r| match &r.outcome {
            Outcome::Placed(record) => Some(record),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed { .. }))
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: &[(u64, &str)] = &[
        (1024 * 1024 * 1024, "GB"),
        (1024 * 1024, "MB"),
        (1024, "KB"),
    ];

    UNITS
        .iter()
        .find(|(threshold, _)| bytes >= *threshold)
        .map(|(threshold, unit)| format!("{:.2} {}", bytes as f64 / *threshold as f64, unit))
        .unwrap_or_else(|| format!("{} B", bytes))
}
