//! Metadata loggers for parsed reports.
//!
//! Every path listed in a report is stat'ed and recorded with its size and
//! creation time:
//! - [`json`]: a pretty-printed JSON object keyed by digest, with each
//!   file's digest recomputed
//! - [`sqlite`]: rows appended to a `duplicates` table
//!
//! A file that cannot be read is recorded with an error message instead.
//! Logging failures are reported to the caller and never affect a report.
//!
//! # Example
//!
//! ```no_run
//! use dupesieve::output::json::JsonMetadataLog;
//! use dupesieve::report::load_report;
//! use dupesieve::scanner::Hasher;
//! use std::path::Path;
//!
//! let report = load_report(Path::new("duplicates_report.txt")).unwrap();
//! let log = JsonMetadataLog::build(&report, &Hasher::default());
//! log.save(Path::new("duplicate_metadata.json")).unwrap();
//! ```

pub mod json;
pub mod sqlite;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};

pub use json::JsonMetadataLog;
pub use sqlite::{LoggedRows, SqliteMetadataLog};

use crate::scanner::FileRecord;

/// Default output path of the JSON metadata log.
pub const DEFAULT_JSON_LOG: &str = "duplicate_metadata.json";

/// Default output path of the SQLite metadata log.
pub const DEFAULT_SQLITE_LOG: &str = "duplicates.db";

/// Errors raised while writing a metadata log.
#[derive(thiserror::Error, Debug)]
pub enum PersistenceError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error writing the log
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Output path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Format a timestamp as local ISO-8601 without an offset.
#[must_use]
pub fn iso_local(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Read the metadata a log entry needs.
fn stat(path: &Path) -> Result<FileRecord, String> {
    FileRecord::read(path).map_err(|e| {
        log::warn!("Cannot read metadata for {}: {}", path.display(), e);
        e.to_string()
    })
}
