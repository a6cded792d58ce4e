//! JSON metadata log.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "<digest>": [
//!     {
//!       "path": "/a/item1_v1.txt",
//!       "size": 1024,
//!       "ctime": "2024-05-01T10:22:31.123456",
//!       "hash": "<digest recomputed from the file>"
//!     },
//!     { "path": "/b/vanished.txt", "error": "No such file or directory (os error 2)" }
//!   ]
//! }
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;

use super::{iso_local, stat, PersistenceError};
use crate::report::ParsedReport;
use crate::scanner::Hasher;

/// One file in the JSON log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetadataEntry {
    /// The file was read successfully.
    File {
        /// Path as listed in the report
        path: String,
        /// Size in bytes
        size: u64,
        /// Creation time, local ISO-8601
        ctime: String,
        /// Digest of the current file content
        hash: String,
    },
    /// The file could not be read.
    Error {
        /// Path as listed in the report
        path: String,
        /// Why it could not be read
        error: String,
    },
}

impl MetadataEntry {
    /// Stat and hash `path`.
    #[must_use]
    pub fn read(path: &Path, hasher: &Hasher) -> Self {
        let display = path.to_string_lossy().into_owned();
        let record = match stat(path) {
            Ok(record) => record,
            Err(error) => {
                return Self::Error {
                    path: display,
                    error,
                }
            }
        };

        match hasher.hash_file(path) {
            Ok(digest) => Self::File {
                path: display,
                size: record.size,
                ctime: iso_local(record.created),
                hash: digest.to_hex(),
            },
            Err(e) => {
                log::warn!("Cannot hash {}: {}", path.display(), e);
                Self::Error {
                    path: display,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Whether this entry records a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Metadata for every path of a report, keyed by report digest.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct JsonMetadataLog {
    entries: IndexMap<String, Vec<MetadataEntry>>,
}

impl JsonMetadataLog {
    /// Collect metadata for every path in `report`.
    #[must_use]
    pub fn build(report: &ParsedReport, hasher: &Hasher) -> Self {
        let entries = report
            .iter()
            .map(|(digest, paths)| {
                let files = paths
                    .iter()
                    .map(|p| MetadataEntry::read(p, hasher))
                    .collect();
                (digest.to_hex(), files)
            })
            .collect();

        Self { entries }
    }

    /// Entries keyed by digest, in report order.
    #[must_use]
    pub fn entries(&self) -> &IndexMap<String, Vec<MetadataEntry>> {
        &self.entries
    }

    /// Number of entries that record a failure.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.entries
            .values()
            .flatten()
            .filter(|e| e.is_error())
            .count()
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), PersistenceError> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        Ok(())
    }

    /// Write the log to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let io_err = |source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush().map_err(io_err)?;

        log::info!("JSON metadata log written to {}", path.display());
        Ok(())
    }
}
