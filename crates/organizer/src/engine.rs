use chrono::{DateTime, Local};
use rayon::prelude::*;
use sort_tree_core::{hash_file, walk_files, Fingerprint};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::classifier::{modified_time, Classifier};
use crate::config::OrganizeConfig;
use crate::error::{Error, IoContext, Result};
use crate::frames::{FfmpegFrameSampler, FrameSampler};
use crate::labeler::{HttpLabeler, Labeler, NullLabeler};
use crate::ledger::DedupLedger;
use crate::paths::{build_path, probe_disk, resolve_collision, Resolution, Slot};
use crate::place::{copy_file, move_file};
use crate::summary::{FileReport, Outcome, Summary};
use crate::types::{Action, Classification, PlacementPlan, PlacementRecord};

/// Walks a source tree and files every unique piece of content into
/// `destination/<year>/<category>/<label>/`.
///
/// Hashing and labeling fan out over a rayon pool. Ledger decisions and the
/// probe-then-write step stay on the calling thread in walk order, so the
/// first file in walk order wins a content race and no two files can claim
/// the same target path.
pub struct Organizer {
    config: OrganizeConfig,
    classifier: Classifier,
}

/// A file that survived dedup and has been classified.
struct Candidate {
    path: PathBuf,
    fingerprint: Fingerprint,
    classification: Classification,
    modified: Option<DateTime<Local>>,
}

impl Organizer {
    /// Validates `config` and wires up the labeler it names.
    pub fn new(config: OrganizeConfig) -> Result<Self> {
        config.validate()?;

        let labeler: Box<dyn Labeler> = match &config.labeler.endpoint {
            Some(endpoint) => Box::new(HttpLabeler::new(endpoint.as_str(), &config.labeler)?),
            None => Box::new(NullLabeler),
        };

        let classifier = Classifier::new(labeler, Box::new(FfmpegFrameSampler::default()))
            .with_video_samples(config.video_samples);

        Ok(Self { config, classifier })
    }

    pub fn with_labeler(mut self, labeler: Box<dyn Labeler>) -> Self {
        self.classifier = self.classifier.with_labeler(labeler);
        self
    }

    pub fn with_frame_sampler(mut self, frames: Box<dyn FrameSampler>) -> Self {
        self.classifier = self.classifier.with_frame_sampler(frames);
        self
    }

    pub fn config(&self) -> &OrganizeConfig {
        &self.config
    }

    pub fn run(&self) -> Result<Summary> {
        self.run_with_progress(|_| {})
    }

    /// Like `run`, calling `on_report` as each file reaches its final state.
    pub fn run_with_progress<F>(&self, on_report: F) -> Result<Summary>
    where
        F: FnMut(&FileReport),
    {
        let started = Instant::now();
        self.config.validate()?;

        let source = self
            .config
            .source
            .canonicalize()
            .at(&self.config.source)?;
        let destination = self.prepare_destination()?;
        let pool = self.thread_pool()?;

        tracing::info!(
            source = %source.display(),
            destination = %destination.display(),
            move_files = self.config.move_files,
            dry_run = self.config.dry_run,
            "organizing"
        );

        let mut reporter = Reporter::new(self.config.dry_run, on_report);

        let exclude = destination.exists().then_some(destination.as_path());
        let files = discover(&source, exclude, &mut reporter);

        let hashed: Vec<(PathBuf, io::Result<Fingerprint>)> = pool.install(|| {
            files
                .into_par_iter()
                .map(|path| {
                    let hash = hash_file(&path);
                    (path, hash)
                })
                .collect()
        });

        let mut ledger = DedupLedger::new();
        let unique = triage(hashed, &mut ledger, &mut reporter);

        let candidates: Vec<Candidate> = pool.install(|| {
            unique
                .into_par_iter()
                .map(|(path, fingerprint)| {
                    let modified = modified_time(&path);
                    let classification = self.classifier.classify_at(&path, modified);
                    Candidate {
                        path,
                        fingerprint,
                        classification,
                        modified,
                    }
                })
                .collect()
        });

        // Paths claimed during this run. Keeps dry-run versioning in step
        // with what a real run would write.
        let mut claimed: HashMap<PathBuf, Fingerprint> = HashMap::new();

        for candidate in &candidates {
            let report = self.place(candidate, &destination, &mut claimed);
            reporter.push(report);
        }

        let elapsed_ms = started.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        let summary = Summary::new(self.config.dry_run, reporter.into_reports(), elapsed_ms);

        tracing::info!(
            placed = summary.counts.placed,
            duplicate_in_run = summary.counts.duplicate_in_run,
            duplicate_on_disk = summary.counts.duplicate_on_disk,
            failed = summary.counts.failed,
            elapsed_ms,
            "finished"
        );

        Ok(summary)
    }

    /// Absolute destination path. Created up front unless this is a dry run.
    fn prepare_destination(&self) -> Result<PathBuf> {
        let destination = &self.config.destination;

        if !self.config.dry_run {
            std::fs::create_dir_all(destination).at(destination)?;
        }

        match destination.canonicalize() {
            Ok(path) => Ok(path),
            Err(_) if destination.is_absolute() => Ok(destination.clone()),
            Err(_) => Ok(std::env::current_dir()
                .at(destination)?
                .join(destination)),
        }
    }

    fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs.unwrap_or(0))
            .build()
            .map_err(|e| Error::Config(format!("cannot start worker pool: {}", e)))
    }

    fn place(
        &self,
        candidate: &Candidate,
        destination: &Path,
        claimed: &mut HashMap<PathBuf, Fingerprint>,
    ) -> FileReport {
        let outcome = self
            .plan(candidate, destination, claimed)
            .and_then(|plan| {
                let target = plan.target_path();
                if !plan.action.writes() {
                    return Ok(Outcome::DuplicateOnDisk { existing: target });
                }

                let size = self.execute(candidate, &plan)?;
                claimed.insert(target.clone(), candidate.fingerprint);
                Ok(Outcome::Placed(PlacementRecord {
                    source: candidate.path.clone(),
                    target,
                    action: plan.action,
                    size,
                }))
            })
            .unwrap_or_else(|e| Outcome::Failed {
                error: e.to_string(),
            });

        FileReport {
            source: candidate.path.clone(),
            fingerprint: Some(candidate.fingerprint),
            outcome,
        }
    }

    /// Pure planning: where the file goes and what to do, no writes.
    fn plan(
        &self,
        candidate: &Candidate,
        destination: &Path,
        claimed: &HashMap<PathBuf, Fingerprint>,
    ) -> Result<PlacementPlan> {
        let filename = candidate
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (target_dir, base) = build_path(
            destination,
            &candidate.classification,
            &filename,
            candidate.modified,
        );

        let probe = |path: &Path| match claimed.get(path) {
            Some(fingerprint) => Ok(Slot::Holds(*fingerprint)),
            None => probe_disk(path),
        };

        let (final_path, action) =
            match resolve_collision(&target_dir, &base, &candidate.fingerprint, probe)
                .at(&target_dir)?
            {
                Resolution::Free(path) if self.config.move_files => (path, Action::Move),
                Resolution::Free(path) => (path, Action::Copy),
                Resolution::Existing(path) => (path, Action::SkipExists),
            };

        let final_filename = final_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(base);

        Ok(PlacementPlan {
            target_dir,
            final_filename,
            action,
        })
    }

    /// Perform the plan, or only measure the file in a dry run.
    fn execute(&self, candidate: &Candidate, plan: &PlacementPlan) -> Result<u64> {
        let source = &candidate.path;

        if self.config.dry_run {
            return Ok(std::fs::metadata(source).at(source)?.len());
        }

        std::fs::create_dir_all(&plan.target_dir).at(&plan.target_dir)?;
        let target = plan.target_path();

        match plan.action {
            Action::Copy => copy_file(source, &target),
            Action::Move => move_file(source, &target, &candidate.fingerprint),
            Action::SkipDuplicate | Action::SkipExists => Ok(0),
        }
    }
}

/// Collects walk results, reporting entries the walker could not read.
fn discover<F>(source: &Path, exclude: Option<&Path>, reporter: &mut Reporter<F>) -> Vec<PathBuf>
where
    F: FnMut(&FileReport),
{
    walk_files(source, exclude)
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| source.to_path_buf());
                reporter.push(FileReport {
                    source: path,
                    fingerprint: None,
                    outcome: Outcome::Failed {
                        error: e.to_string(),
                    },
                });
                None
            }
        })
        .collect()
}

/// Sequential ledger pass over hashed files, in walk order. Returns the
/// files that carry content not seen before in this run.
fn triage<F>(
    hashed: Vec<(PathBuf, io::Result<Fingerprint>)>,
    ledger: &mut DedupLedger,
    reporter: &mut Reporter<F>,
) -> Vec<(PathBuf, Fingerprint)>
where
    F: FnMut(&FileReport),
{
    hashed
        .into_iter()
        .filter_map(|(path, hash)| {
            let fingerprint = match hash {
                Ok(fingerprint) => fingerprint,
                Err(e) => {
                    reporter.push(FileReport {
                        source: path,
                        fingerprint: None,
                        outcome: Outcome::Failed {
                            error: e.to_string(),
                        },
                    });
                    return None;
                }
            };

            match ledger.record(fingerprint, &path) {
                Some(first_seen) => {
                    let first_seen = first_seen.to_path_buf();
                    reporter.push(FileReport {
                        source: path,
                        fingerprint: Some(fingerprint),
                        outcome: Outcome::DuplicateInRun { first_seen },
                    });
                    None
                }
                None => Some((path, fingerprint)),
            }
        })
        .collect()
}

struct Reporter<F> {
    dry_run: bool,
    reports: Vec<FileReport>,
    on_report: F,
}

impl<F: FnMut(&FileReport)> Reporter<F> {
    fn new(dry_run: bool, on_report: F) -> Self {
        Self {
            dry_run,
            reports: Vec::new(),
            on_report,
        }
    }

    fn push(&mut self, report: FileReport) {
        log_report(&report, self.dry_run);
        (self.on_report)(&report);
        self.reports.push(report);
    }

    fn into_reports(self) -> Vec<FileReport> {
        self.reports
    }
}

fn log_report(report: &FileReport, dry_run: bool) {
    let source = report.source.display();

    match &report.outcome {
        Outcome::Placed(record) => tracing::info!(
            source = %source,
            target = %record.target.display(),
            action = %record.action,
            dry_run,
            "placed"
        ),
        Outcome::DuplicateInRun { first_seen } => tracing::debug!(
            source = %source,
            first_seen = %first_seen.display(),
            action = %Action::SkipDuplicate,
            "duplicate content earlier in this run"
        ),
        Outcome::DuplicateOnDisk { existing } => tracing::debug!(
            source = %source,
            existing = %existing.display(),
            action = %Action::SkipExists,
            "content already in destination"
        ),
        Outcome::Failed { error } => tracing::warn!(source = %source, error = %error, "failed"),
    }
}
