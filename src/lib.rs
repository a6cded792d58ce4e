//! dupesieve - duplicate file finder with identifier-based refinement.
//!
//! Files under a directory are grouped by content digest. A refinement pass
//! then partitions each group by an identifier pulled from the file path and
//! keeps one copy per identifier, listing the rest as safe to remove.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod refine;
pub mod report;
pub mod scanner;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{
    confirm_deletion, delete_batch, validate_preserves_copy, BatchDeleteResult, DeleteConfig,
    DeleteProgressCallback, DeleteResult,
};
use crate::cli::{Cli, Commands, DeleteArgs, MetadataArgs, MetadataFormat, RefineArgs, ScanArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, DuplicateGroups, FinderConfig, ScanSummary};
use crate::error::ExitCode;
use crate::output::{JsonMetadataLog, SqliteMetadataLog, DEFAULT_JSON_LOG, DEFAULT_SQLITE_LOG};
use crate::progress::{Progress, ProgressCallback};
use crate::refine::{RefineSummary, RefinedSet, Refiner};
use crate::report::{load_report, save_report, ReportKind};
use crate::scanner::{Hasher, LocalDirectory, WalkerConfig};

/// Run the command selected on the command line.
///
/// # Errors
///
/// Returns an error for anything that stops the command as a whole: bad
/// configuration, an unusable scan root, an unreadable report or an output
/// file that cannot be written. Per-file problems are logged and reflected
/// in the returned exit code instead.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    log::debug!("Effective configuration: {:?}", config);

    match cli.command {
        Commands::Scan(args) => run_scan(args, config, cli.quiet),
        Commands::Refine(args) => run_refine(args, config, cli.quiet),
        Commands::Delete(args) => run_delete(&args, cli.quiet),
        Commands::Metadata(args) => run_metadata(args, &config),
    }
}

fn run_scan(args: ScanArgs, mut config: Config, quiet: bool) -> Result<ExitCode> {
    apply_scan_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;

    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(quiet));
    let finder_config = FinderConfig::default()
        .with_walker_config(WalkerConfig::new(
            config.follow_symlinks,
            config.extensions.clone(),
        ))
        .with_algorithm(config.algorithm)
        .with_concurrency(config.threads)
        .with_progress_callback(progress);

    let provider = LocalDirectory::new(args.location.clone());
    let (groups, summary) = DuplicateFinder::new(finder_config)
        .find_duplicates(&provider)
        .with_context(|| format!("Failed to scan {}", args.location))?;

    save_report(&config.report, ReportKind::Duplicates, &groups)
        .context("Failed to write duplicate report")?;

    if !quiet {
        print_scan_summary(&summary, &config.report);
    }

    let mut partial = summary.has_errors();

    if groups.is_empty() {
        log::info!("No duplicate files found");
        return Ok(if partial {
            ExitCode::PartialSuccess
        } else {
            ExitCode::NoDuplicates
        });
    }

    let plan = if config.pattern.is_some() {
        let refiner = Refiner::with_pattern(config.identifier_pattern()?, config.criterion());
        let refinement = refiner.refine(&groups);
        save_report(
            &config.filtered_report,
            ReportKind::Filtered,
            &refinement.refined,
        )
        .context("Failed to write filtered report")?;

        if !quiet {
            print_refine_summary(&refinement.summary, &config.filtered_report);
        }
        partial |= refinement.summary.unreadable > 0;
        refinement.refined
    } else {
        keep_first(&groups)
    };

    if args.delete {
        for (digest, removals) in &plan {
            let members = groups.get(digest).unwrap_or_default();
            validate_preserves_copy(removals, members)
                .with_context(|| format!("Refusing to delete group {digest}"))?;
        }

        let removals: Vec<PathBuf> = plan.into_values().flatten().collect();
        if let Some(result) = execute_deletion(&removals, args.permanent, args.yes, quiet)? {
            partial |= !result.all_succeeded();
        }
    }

    Ok(if partial {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    })
}

fn apply_scan_overrides(config: &mut Config, args: &ScanArgs) {
    if !args.extensions.is_empty() {
        config.extensions.clone_from(&args.extensions);
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm.into();
    }
    if args.no_follow_symlinks {
        config.follow_symlinks = false;
    }
    if let Some(ref pattern) = args.pattern {
        config.pattern = Some(pattern.clone());
    }
    if let Some(ref criterion) = args.criterion {
        config.criterion.clone_from(criterion);
    }
    if let Some(ref output) = args.output {
        config.report.clone_from(output);
    }
    if let Some(ref output) = args.filtered_output {
        config.filtered_report.clone_from(output);
    }
}

/// Every member but the first of each group.
fn keep_first(groups: &DuplicateGroups) -> RefinedSet {
    groups
        .iter()
        .map(|(digest, members)| (*digest, members[1..].to_vec()))
        .collect()
}

fn run_refine(args: RefineArgs, mut config: Config, quiet: bool) -> Result<ExitCode> {
    if let Some(pattern) = args.pattern {
        config.pattern = Some(pattern);
    }
    if let Some(criterion) = args.criterion {
        config.criterion = criterion;
    }
    if let Some(output) = args.output {
        config.filtered_report = output;
    }
    config.validate().context("Invalid configuration")?;

    let pattern = config
        .identifier_pattern()
        .context("Refinement needs an identifier pattern (use --regex)")?;
    let refiner = Refiner::with_pattern(pattern, config.criterion());

    let report = load_report(&args.report)
        .with_context(|| format!("Failed to load report {}", args.report.display()))?;
    let groups = DuplicateGroups::from_map(report.into_groups());
    let refinement = refiner.refine(&groups);

    save_report(
        &config.filtered_report,
        ReportKind::Filtered,
        &refinement.refined,
    )
    .context("Failed to write filtered report")?;

    if !quiet {
        print_refine_summary(&refinement.summary, &config.filtered_report);
    }

    Ok(if refinement.summary.unreadable > 0 {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    })
}

fn run_delete(args: &DeleteArgs, quiet: bool) -> Result<ExitCode> {
    let report = load_report(&args.report)
        .with_context(|| format!("Failed to load report {}", args.report.display()))?;

    // Raw scan groups list every copy; deleting them would keep none
    for (digest, members) in report.groups_of_kind(ReportKind::Duplicates) {
        if members.is_empty() {
            continue;
        }
        validate_preserves_copy(members, members).with_context(|| {
            format!(
                "Refusing to delete group {digest} from an unrefined report (run `dupesieve refine` first)"
            )
        })?;
    }

    let paths: Vec<PathBuf> = report.paths().cloned().collect();

    let result = if args.execute {
        match execute_deletion(&paths, args.permanent, args.yes, quiet)? {
            Some(result) => result,
            None => return Ok(ExitCode::Success),
        }
    } else {
        let printer = DeletionPrinter { quiet };
        let plan = delete_batch(&paths, &DeleteConfig::dry_run(), Some(&printer));
        if !quiet {
            println!("{}", plan.summary());
            println!("Run again with --execute to delete these files.");
        }
        plan
    };

    Ok(if result.all_succeeded() {
        ExitCode::Success
    } else {
        ExitCode::PartialSuccess
    })
}

/// Confirm (unless `assume_yes`) and delete `paths`.
///
/// Returns `None` when nothing was deleted because the list was empty or
/// the user declined.
fn execute_deletion(
    paths: &[PathBuf],
    permanent: bool,
    assume_yes: bool,
    quiet: bool,
) -> Result<Option<BatchDeleteResult>> {
    if paths.is_empty() {
        log::info!("No files to delete");
        return Ok(None);
    }

    if !assume_yes {
        let confirmed = confirm_deletion(io::stdin().lock(), io::stdout(), paths.len(), permanent)
            .context("Failed to read confirmation")?;
        if !confirmed {
            log::info!("Deletion cancelled");
            return Ok(None);
        }
    }

    let config = if permanent {
        DeleteConfig::permanent()
    } else {
        DeleteConfig::trash()
    };
    let printer = DeletionPrinter { quiet };
    let result = delete_batch(paths, &config, Some(&printer));

    if !quiet {
        println!("{}", result.summary());
    }
    Ok(Some(result))
}

fn run_metadata(args: MetadataArgs, config: &Config) -> Result<ExitCode> {
    let report = load_report(&args.report)
        .with_context(|| format!("Failed to load report {}", args.report.display()))?;

    let errors = match args.format {
        MetadataFormat::Json => {
            let out = args
                .output
                .unwrap_or_else(|| PathBuf::from(DEFAULT_JSON_LOG));
            let log = JsonMetadataLog::build(&report, &Hasher::new(config.algorithm));
            log.save(&out)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            log.error_count()
        }
        MetadataFormat::Sqlite => {
            let out = args
                .output
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_LOG));
            let mut db = SqliteMetadataLog::open(&out)
                .with_context(|| format!("Failed to open {}", out.display()))?;
            db.log_report(&report)
                .with_context(|| format!("Failed to write {}", out.display()))?
                .errors
        }
    };

    log::info!(
        "Recorded {} files in {} format ({} unreadable)",
        report.path_count(),
        args.format,
        errors
    );

    Ok(if errors > 0 {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    })
}

fn print_scan_summary(summary: &ScanSummary, report: &Path) {
    println!(
        "Scanned {} files in {:.2?}: {} duplicate groups, {} redundant copies, {} reclaimable",
        summary.total_files,
        summary.scan_duration,
        summary.duplicate_groups,
        summary.duplicate_files,
        summary.reclaimable_display()
    );
    if summary.has_errors() {
        println!(
            "Skipped {} unreadable entries and {} unhashable files",
            summary.scan_errors.len(),
            summary.hash_errors.len()
        );
    }
    println!("Report written to {}", report.display());
}

fn print_refine_summary(summary: &RefineSummary, report: &Path) {
    println!(
        "Refined {} of {} groups: {} files to remove, {} reclaimable",
        summary.groups_refined,
        summary.groups_examined,
        summary.files_removed,
        summary.reclaimable_display()
    );
    if summary.has_skipped() {
        println!(
            "Kept {} files without an identifier and {} unreadable files",
            summary.unidentified, summary.unreadable
        );
    }
    println!("Filtered report written to {}", report.display());
}

/// Prints one line per deleted (or planned) file.
struct DeletionPrinter {
    quiet: bool,
}

impl DeleteProgressCallback for DeletionPrinter {
    fn on_delete_success(&self, result: &DeleteResult, dry_run: bool) {
        if self.quiet {
            return;
        }
        let verb = match (dry_run, result.permanent) {
            (true, _) => "Would delete",
            (false, true) => "Deleted",
            (false, false) => "Trashed",
        };
        println!("{verb}: {}", result.path.display());
    }

    fn on_delete_failure(&self, path: &Path, error: &str) {
        eprintln!("Failed to delete {}: {}", path.display(), error);
    }
}
