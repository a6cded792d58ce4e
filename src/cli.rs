//! Command-line interface definitions for dupesieve.
//!
//! Global options (verbosity, structured errors, config file) apply to every
//! subcommand. Options that also live in the config file are `Option`s here
//! so that an absent flag leaves the configured value alone.
//!
//! # Example
//!
//! ```bash
//! # Find duplicate PDFs and EPUBs, writing duplicates_report.txt
//! dupesieve scan /srv/library -e .pdf .epub
//!
//! # Keep the oldest copy per item id
//! dupesieve refine duplicates_report.txt -r 'item(?P<uid>\d+)' -c oldest
//!
//! # Preview, then really delete, the refined removals
//! dupesieve delete filtered_duplicates_report.txt
//! dupesieve delete filtered_duplicates_report.txt --execute
//!
//! # Record metadata for a report
//! dupesieve metadata filtered_duplicates_report.txt --format sqlite
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::scanner::HashAlgorithm;

/// Duplicate file finder with identifier-based refinement.
///
/// dupesieve groups byte-identical files by content hash, then narrows each
/// group to the copies that are truly redundant for the same logical item.
#[derive(Debug, Parser)]
#[command(name = "dupesieve")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: platform config directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory for duplicate files and write a report
    Scan(ScanArgs),
    /// Narrow a duplicate report to redundant copies per identifier
    Refine(RefineArgs),
    /// Delete the files listed in a report
    Delete(DeleteArgs),
    /// Record size, creation time and hash of every file in a report
    Metadata(MetadataArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan (must be locally mounted)
    #[arg(value_name = "DIR")]
    pub location: String,

    /// File name suffixes to include, e.g. `-e .pdf .epub` (default: all files)
    #[arg(short, long = "ext", value_name = "EXT", num_args = 1..)]
    pub extensions: Vec<String>,

    /// Report output path [default: duplicates_report.txt]
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Number of hashing threads [default: available parallelism]
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,

    /// Content digest algorithm [default: sha256]
    #[arg(long, value_enum)]
    pub algorithm: Option<AlgorithmArg>,

    /// Do not follow symbolic links
    #[arg(long)]
    pub no_follow_symlinks: bool,

    /// Refine the results with this identifier pattern
    #[arg(long, value_name = "REGEX")]
    pub pattern: Option<String>,

    /// Survivor selection criterion for refinement [default: oldest]
    #[arg(long, value_name = "CRITERION", requires = "pattern")]
    pub criterion: Option<String>,

    /// Refined report output path [default: filtered_duplicates_report.txt]
    #[arg(long, value_name = "PATH", requires = "pattern")]
    pub filtered_output: Option<PathBuf>,

    /// Delete redundant copies after scanning
    ///
    /// Without --pattern the first file of every group is kept. With
    /// --pattern the refined removals are deleted.
    #[arg(long)]
    pub delete: bool,

    /// Delete permanently instead of moving to trash
    #[arg(long, requires = "delete")]
    pub permanent: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long, requires = "delete")]
    pub yes: bool,
}

/// Arguments for the refine subcommand.
#[derive(Debug, Args)]
pub struct RefineArgs {
    /// Duplicate report to refine
    #[arg(value_name = "REPORT")]
    pub report: PathBuf,

    /// Identifier pattern with a named group, e.g. `item(?P<uid>\d+)`
    #[arg(short = 'r', long = "regex", value_name = "REGEX")]
    pub pattern: Option<String>,

    /// Survivor selection criterion: oldest, largest or shortest_name [default: oldest]
    #[arg(short, long, value_name = "CRITERION")]
    pub criterion: Option<String>,

    /// Refined report output path [default: filtered_duplicates_report.txt]
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the delete subcommand.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Report listing the files to delete
    #[arg(value_name = "REPORT")]
    pub report: PathBuf,

    /// Actually delete (default is a dry run)
    #[arg(long)]
    pub execute: bool,

    /// Delete permanently instead of moving to trash
    #[arg(long, requires = "execute")]
    pub permanent: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for the metadata subcommand.
#[derive(Debug, Args)]
pub struct MetadataArgs {
    /// Report whose files are recorded
    #[arg(value_name = "REPORT")]
    pub report: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: MetadataFormat,

    /// Output path [default: duplicate_metadata.json or duplicates.db]
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Digest algorithm choice on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmArg {
    /// SHA-256
    Sha256,
    /// BLAKE3
    Blake3,
}

impl From<AlgorithmArg> for HashAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Sha256 => Self::Sha256,
            AlgorithmArg::Blake3 => Self::Blake3,
        }
    }
}

/// Metadata log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetadataFormat {
    /// Pretty-printed JSON keyed by digest
    Json,
    /// Rows appended to a SQLite table
    Sqlite,
}

impl std::fmt::Display for MetadataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataFormat::Json => write!(f, "json"),
            MetadataFormat::Sqlite => write!(f, "sqlite"),
        }
    }
}
