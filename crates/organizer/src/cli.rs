use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use sort_tree::{
    format_size, logging, Action, FileReport, Organizer, OrganizeConfig, Outcome, Summary,
};

const TICK_MS: u64 = 80;

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(" {spinner} {pos} files | {msg}")
        .unwrap()
        .tick_chars("▏▎▍▌▋▊▉█▉▋▌▍▎")
}

#[derive(Parser)]
#[command(name = "sort-tree")]
#[command(version)]
#[command(about = "Sort a folder tree into year/category/label folders, skipping duplicate content")]
struct Cli {
    #[arg(help = "Folder to organize")]
    source_folder: PathBuf,

    #[arg(help = "Folder that receives the organized tree")]
    dest_folder: PathBuf,

    #[arg(long = "move", help = "Move files instead of copying")]
    move_files: bool,

    #[arg(long, help = "Show what would happen without touching the disk")]
    dry_run: bool,

    #[arg(short, long, help = "JSON config file; flags override its values")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Worker threads for hashing and labeling [default: all cores]")]
    jobs: Option<usize>,

    #[arg(long, env = "SORT_TREE_LABELER_URL", help = "Image labeling endpoint")]
    labeler_url: Option<String>,

    #[arg(long, help = "Frames sampled per video [default: 3]")]
    video_samples: Option<usize>,

    #[arg(long, help = "Print the full run summary as JSON")]
    json: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "More log output (-v, -vv)")]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = build_config(&cli)?;
    let json = cli.json;
    let organizer = Organizer::new(config)
        .with_context(|| format!("cannot organize {}", cli.source_folder.display()))?;

    let summary = if json {
        organizer.run()?
    } else {
        run_with_spinner(&organizer)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<OrganizeConfig> {
    let mut config = match &cli.config {
        Some(path) => OrganizeConfig::load(path)?,
        None => OrganizeConfig::default(),
    };

    config.source = cli.source_folder.clone();
    config.destination = cli.dest_folder.clone();
    config.move_files |= cli.move_files;
    config.dry_run |= cli.dry_run;

    if let Some(jobs) = cli.jobs {
        config.jobs = Some(jobs);
    }
    if let Some(samples) = cli.video_samples {
        config.video_samples = samples;
    }
    if let Some(url) = &cli.labeler_url {
        config.labeler.endpoint = Some(url.clone());
    }

    Ok(config)
}

fn run_with_spinner(organizer: &Organizer) -> Result<Summary> {
    // Report paths are canonical; strip the same form of the source.
    let configured = &organizer.config().source;
    let source = configured
        .canonicalize()
        .unwrap_or_else(|_| configured.clone());
    let dry_run = organizer.config().dry_run;

    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.enable_steady_tick(Duration::from_millis(TICK_MS));
    pb.set_message("hashing and labeling");

    let summary = organizer.run_with_progress(|report| {
        pb.set_message(display_name(&report.source));
        pb.println(report_line(report, &source, dry_run));
        pb.inc(1);
    });

    pb.finish_and_clear();
    Ok(summary?)
}

fn report_line(report: &FileReport, source: &Path, dry_run: bool) -> String {
    let name = report
        .source
        .strip_prefix(source)
        .unwrap_or(&report.source)
        .display();

    match &report.outcome {
        Outcome::Placed(record) => {
            let marker = match (dry_run, record.action) {
                (true, _) => "~",
                (false, Action::Move) => ">",
                (false, _) => "+",
            };
            format!(
                "  [{}] {} -> {} ({})",
                marker,
                name,
                record.target.display(),
                format_size(record.size)
            )
        }
        Outcome::DuplicateInRun { first_seen } => {
            format!("  [=] {} (same as {})", name, first_seen.display())
        }
        Outcome::DuplicateOnDisk { existing } => {
            format!("  [=] {} (already at {})", name, existing.display())
        }
        Outcome::Failed { error } => format!("  [!] {}: {}", name, error),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "?".to_string())
}

fn print_summary(summary: &Summary) {
    let counts = &summary.counts;
    let verb = if summary.dry_run { "Would place" } else { "Placed" };

    println!(
        "{} {} files ({})",
        verb,
        counts.placed,
        format_size(summary.bytes_placed)
    );
    println!(
        "Skipped {} duplicates ({} in this run, {} already in destination)",
        counts.duplicate_in_run + counts.duplicate_on_disk,
        counts.duplicate_in_run,
        counts.duplicate_on_disk
    );
    if counts.failed > 0 {
        println!("Failed: {}", counts.failed);
    }
    println!("Done in {:.1}s", summary.elapsed_ms as f64 / 1000.0);
}
