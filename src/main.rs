//! siftdupe - find exact and near-duplicate files and remove them reversibly.
//!
//! Usage:
//!   siftdupe scan [PATH]          Report duplicate groups
//!   siftdupe resolve [PATH]       Delete redundant copies (dry run unless --yes)
//!   siftdupe history              List deletions that can be restored
//!   siftdupe restore <ID>|--all   Bring deleted copies back
//!   siftdupe clear-history        Forget all restorable deletions
//!   siftdupe --help               Show help

mod logging;
mod plan;
mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use siftdupe_analyze::{
    ClusterMode, DetectionProgress, DetectionReport, DuplicateDetector, SemanticGroup,
};
use siftdupe_ops::{JsonFileStore, RestorableRecord, SafeResolutionManager};
use siftdupe_scan::{
    AverageHashFingerprinter, JwalkScanner, PlainTextExtractor, ScanOutcome, ScanProgress,
};

use crate::plan::{GroupPlan, ResolutionPlanner};
use crate::settings::Settings;

/// Shown wherever near-duplicates may be deleted.
const FIDELITY_NOTE: &str = "Note: restoring a deleted file copies the kept file back into place. \
     For exact duplicates that is the original content; for near-duplicates it is only similar.";

#[derive(Parser)]
#[command(
    name = "siftdupe",
    version,
    about = "Find exact and near-duplicate files and remove them reversibly",
    long_about = "siftdupe finds byte-identical files, burst photos, resized images, \
                  visually near-identical images and document drafts.\n\n\
                  Deletions are recorded so they can be restored later. Settings are read \
                  from <config_dir>/siftdupe/config.toml; logging is controlled by SIFTDUPE_LOG."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory and report duplicate groups
    Scan {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Maximum number of groups to show per kind
        #[arg(short = 'n', long, default_value = "20")]
        top: usize,

        /// Only report byte-identical duplicates
        #[arg(long)]
        exact_only: bool,

        /// Minimum file size to consider (e.g., "1KB", "1MB")
        #[arg(short, long)]
        min_size: Option<String>,

        /// How near-identical matches are clustered
        #[arg(long)]
        mode: Option<ModeArg>,
    },

    /// Scan, then delete the redundant copies of every group
    Resolve {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Also resolve near-duplicate groups, not just exact ones
        #[arg(long)]
        semantic: bool,

        /// Actually delete (otherwise only show what would be deleted)
        #[arg(short, long)]
        yes: bool,

        /// Minimum file size to consider (e.g., "1KB", "1MB")
        #[arg(short, long)]
        min_size: Option<String>,
    },

    /// List deletions that can be restored
    History {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Restore deleted files from their kept copies
    Restore {
        /// Record id, or a unique prefix of it
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,

        /// Restore every pending record
        #[arg(long)]
        all: bool,
    },

    /// Forget all restorable deletions (files are not touched)
    ClearHistory,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Greedy,
    Connected,
}

impl From<ModeArg> for ClusterMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Greedy => ClusterMode::Greedy,
            ModeArg::Connected => ClusterMode::Connected,
        }
    }
}

/// Flags that override the settings file for one run.
#[derive(Default)]
struct RunOptions {
    min_size: Option<String>,
    mode: Option<ModeArg>,
    exact_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::init_logger();

    let cli = Cli::parse();
    let settings = Settings::load();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Command::Scan {
            path,
            format,
            top,
            exact_only,
            min_size,
            mode,
        } => {
            let options = RunOptions {
                min_size,
                mode,
                exact_only,
            };
            run_scan(&path, &settings, options, format, top, &cancel).await?;
        }
        Command::Resolve {
            path,
            semantic,
            yes,
            min_size,
        } => {
            let options = RunOptions {
                min_size,
                exact_only: !semantic,
                ..Default::default()
            };
            run_resolve(&path, &settings, options, yes, &cancel).await?;
        }
        Command::History { format } => run_history(format).await?,
        Command::Restore { id, all } => run_restore(id.as_deref(), all, &cancel).await?,
        Command::ClearHistory => run_clear_history().await?,
    }

    Ok(())
}

/// Scan `path` and run detection over the result.
async fn scan_and_detect(
    path: &Path,
    settings: &Settings,
    options: RunOptions,
    cancel: &CancellationToken,
) -> Result<(ScanOutcome, DetectionReport)> {
    let path = path.canonicalize().context("Invalid path")?;

    let mut builder = settings.scan_builder(&path);
    if let Some(min_size) = &options.min_size {
        builder.min_size(parse_size(min_size)?);
    }
    if options.exact_only {
        builder.analyze_content(false);
    }
    let scan_config = builder.build().map_err(|e| eyre!("Invalid scan settings: {e}"))?;

    eprintln!("Scanning {}...", path.display());
    let scanner = JwalkScanner::new();
    log_progress(scanner.subscribe(), |p: &ScanProgress| {
        debug!(
            phase = ?p.phase,
            found = p.files_found,
            processed = p.files_processed,
            total = p.files_total,
            "scan progress"
        );
    });
    let outcome = tokio::task::spawn_blocking(move || scanner.scan(&scan_config))
        .await?
        .context("Scan failed")?;
    debug!(
        files = outcome.records.len(),
        warnings = outcome.warnings.len(),
        "scan complete"
    );

    let mut detection = settings.detection.clone();
    if options.exact_only {
        detection.semantic = false;
    }
    if let Some(mode) = options.mode {
        detection.cluster_mode = mode.into();
    }

    eprintln!("Looking for duplicates among {} files...", outcome.records.len());
    let detector = DuplicateDetector::with_config(detection)
        .with_fingerprinter(Arc::new(AverageHashFingerprinter::new()))
        .with_text_extractor(Arc::new(PlainTextExtractor::new()));
    log_progress(detector.subscribe(), |p: &DetectionProgress| {
        debug!(
            phase = ?p.phase,
            processed = p.files_processed,
            total = p.files_total,
            groups = p.groups_found,
            "detection progress"
        );
    });
    let report = detector.detect(&outcome.records, cancel).await?;

    Ok((outcome, report))
}

/// Log updates from a progress channel until its sender is dropped.
fn log_progress<T, F>(mut rx: broadcast::Receiver<T>, log: F)
where
    T: Clone + Send + 'static,
    F: Fn(&T) + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(progress) => log(&progress),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Scan and print the duplicate report.
async fn run_scan(
    path: &Path,
    settings: &Settings,
    options: RunOptions,
    format: OutputFormat,
    top_n: usize,
    cancel: &CancellationToken,
) -> Result<()> {
    let (outcome, report) = scan_and_detect(path, settings, options, cancel).await?;

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(" Duplicate Report for {}", outcome.root.display());
            println!(
                " {} files, {} scanned in {:.2}s",
                outcome.records.len(),
                format_size(outcome.total_size),
                outcome.scan_duration.as_secs_f64()
            );
            println!("{}", "─".repeat(70));
            println!();

            if !report.has_duplicates() {
                println!(" No duplicate files found.");
            }

            if !report.exact_groups.is_empty() {
                println!(
                    " Exact duplicates: {} groups, {} reclaimable",
                    report.exact_groups.len(),
                    format_size(report.exact_savings)
                );
                println!();
                for (i, group) in report.exact_groups.iter().take(top_n).enumerate() {
                    println!(
                        " Group {} ({} files, {} each, {} reclaimable, hash {})",
                        i + 1,
                        group.count(),
                        format_size(group.keeper().size),
                        format_size(group.potential_savings()),
                        group.hash.short_hex()
                    );
                    println!("   keep {}", group.keeper().path.display());
                    for file in group.removable() {
                        println!("        {}", file.path.display());
                    }
                    println!();
                }
                print_remaining(report.exact_groups.len(), top_n);
            }

            if !report.semantic_groups.is_empty() {
                println!(
                    " Similar files: {} groups, {} reclaimable",
                    report.semantic_groups.len(),
                    format_size(report.semantic_savings)
                );
                println!();
                for group in report.semantic_groups.iter().take(top_n) {
                    print_semantic_group(group);
                }
                print_remaining(report.semantic_groups.len(), top_n);
            }

            if !outcome.warnings.is_empty() {
                println!("{} warning(s) during scan", outcome.warnings.len());
            }
            if outcome.hardlinks_skipped > 0 {
                println!("{} hard link(s) skipped", outcome.hardlinks_skipped);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Scan, then safe-delete removal candidates of every automatic group.
async fn run_resolve(
    path: &Path,
    settings: &Settings,
    options: RunOptions,
    apply: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let semantic = !options.exact_only;
    let (_, report) = scan_and_detect(path, settings, options, cancel).await?;

    let mut groups = report.exact_as_semantic();
    if semantic {
        groups.extend(report.semantic_groups.iter().cloned());
    }

    let manager = if apply { Some(open_manager().await?) } else { None };
    let mut planner = ResolutionPlanner::new();
    let (mut removed, mut freed) = (0usize, 0u64);
    let (mut manual, mut overlapping) = (0usize, 0usize);

    for group in &groups {
        let (kept, targets) = match planner.plan(group) {
            GroupPlan::Delete { kept, targets } => (kept, targets),
            GroupPlan::ManualReview => {
                manual += 1;
                continue;
            }
            GroupPlan::Overlapping => {
                debug!(group = %group.id, "group overlaps an earlier one, leaving it alone");
                overlapping += 1;
                continue;
            }
        };

        println!(
            " {} {} ({}): keep {}",
            group.id,
            group.group_type,
            group.recommendation,
            kept.display()
        );
        for target in &targets {
            let verb = if apply { "delete" } else { "would delete" };
            println!("   {verb} {}", target.display());
        }

        let Some(manager) = &manager else {
            removed += targets.len();
            planner.mark_removed(targets);
            continue;
        };
        match manager.delete_safely(&targets, &kept, cancel).await {
            Ok(complete) => {
                freed += complete.bytes_processed;
                removed += complete.succeeded();
                planner.mark_removed(complete.records.iter().map(|r| r.deleted_path.clone()));
                for error in &complete.errors {
                    eprintln!("   failed: {error}");
                }
                if complete.cancelled {
                    eprintln!("Cancelled.");
                    break;
                }
            }
            Err(err) => eprintln!("   skipped: {err}"),
        }
    }

    println!();
    if apply {
        println!(
            " Deleted {} files, freed {}. Use `siftdupe history` and `siftdupe restore` to undo.",
            removed,
            format_size(freed)
        );
    } else {
        println!(" Dry run: {removed} files would be deleted. Pass --yes to delete them.");
    }
    if manual > 0 {
        println!(" {manual} group(s) need manual review and were left alone.");
    }
    if overlapping > 0 {
        println!(" {overlapping} group(s) overlapped earlier groups and were left alone.");
    }
    if semantic {
        println!(" {FIDELITY_NOTE}");
    }

    Ok(())
}

/// List pending restorable records.
async fn run_history(format: OutputFormat) -> Result<()> {
    let manager = open_manager().await?;
    let pending = manager.pending().await;

    match format {
        OutputFormat::Text => {
            if pending.is_empty() {
                println!("No restorable deletions.");
                return Ok(());
            }
            for record in &pending {
                println!(
                    "{}  {}  {}",
                    record.short_id(),
                    record.deleted_at.format("%Y-%m-%d %H:%M:%S"),
                    record.deleted_path.display()
                );
                println!("          from {}", record.original_path.display());
            }
            println!();
            println!("{} restorable deletion(s). {FIDELITY_NOTE}", pending.len());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&pending)?);
        }
    }

    Ok(())
}

/// Restore one record by id (or prefix), or all of them.
async fn run_restore(id: Option<&str>, all: bool, cancel: &CancellationToken) -> Result<()> {
    let manager = open_manager().await?;

    if all {
        let complete = manager.restore_all(cancel).await?;
        for error in &complete.errors {
            eprintln!("  failed: {error}");
        }
        println!("{}", complete.summary());
        return Ok(());
    }

    let Some(id) = id else {
        bail!("Pass a record id or --all");
    };
    let id = find_record(&manager.pending().await, id)?;
    let record = manager
        .restore(id)
        .await
        .with_context(|| format!("Could not restore {id}"))?;
    println!(
        "Restored {} from {}",
        record.deleted_path.display(),
        record.original_path.display()
    );

    Ok(())
}

async fn run_clear_history() -> Result<()> {
    let manager = open_manager().await?;
    let count = manager.clear_all_data().await?;
    println!("Forgot {count} restorable deletion(s).");
    Ok(())
}

async fn open_manager() -> Result<SafeResolutionManager> {
    let store = JsonFileStore::open_default()?;
    debug!(path = %store.path().display(), "opening restore history");
    Ok(SafeResolutionManager::open(Arc::new(store)).await?)
}

/// Resolve a full id or a unique prefix of one.
fn find_record(pending: &[RestorableRecord], query: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(query) {
        return Ok(id);
    }
    let query = query.to_ascii_lowercase();
    let matches: Vec<Uuid> = pending
        .iter()
        .filter(|r| {
            r.id.to_string().starts_with(&query) || r.id.simple().to_string().starts_with(&query)
        })
        .map(|r| r.id)
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("No restorable deletion matches '{query}'"),
        _ => bail!("'{query}' matches {} deletions; use more characters", matches.len()),
    }
}

fn print_semantic_group(group: &SemanticGroup) {
    println!(
        " {} {} ({} files, {:.0}% similar, {} reclaimable)",
        group.id,
        group.group_type,
        group.files.len(),
        group.similarity * 100.0,
        format_size(group.potential_savings())
    );
    println!("   {}", group.recommendation);
    let kept = group.recommendation.kept_id();
    for file in &group.files {
        let marker = if Some(file.id) == kept { "keep" } else { "    " };
        let dims = file
            .dimensions
            .map(|d| format!(" {d}"))
            .unwrap_or_default();
        println!(
            "   {} {} ({}{})",
            marker,
            file.path.display(),
            format_size(file.size),
            dims
        );
    }
    println!();
}

fn print_remaining(total: usize, shown: usize) {
    if total > shown {
        println!(" ... and {} more", total - shown);
        println!();
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let digits = s.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.');
    let unit = &s[digits.len()..];

    let multiplier: u64 = match unit {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        other => bail!("Unknown size unit '{other}'"),
    };
    let num: f64 = digits
        .parse()
        .with_context(|| format!("Invalid size '{s}'"))?;

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use siftdupe_ops::CapturedMetadata;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("1.5k").unwrap(), 1536);
        assert_eq!(parse_size("2MB").unwrap(), 2 * 1024 * 1024);
        assert!(parse_size("3 parsecs").is_err());
        assert!(parse_size("KB").is_err());
    }

    #[test]
    fn test_find_record_by_prefix() {
        let records: Vec<_> = (0..3)
            .map(|_| RestorableRecord::new("/keep", "/dup", CapturedMetadata::default()))
            .collect();
        let target = &records[1];

        assert_eq!(find_record(&records, &target.id.to_string()).unwrap(), target.id);
        let prefix = &target.id.simple().to_string()[..20];
        assert_eq!(find_record(&records, prefix).unwrap(), target.id);
        assert!(find_record(&records, "zzzz").is_err());
        assert!(find_record(&records, "").is_err());
    }
}
