//! Deletion of files listed in a report.
//!
//! # Overview
//!
//! - Dry run by default: nothing is touched, the plan is returned
//! - Move to system trash (recoverable) when executing
//! - Permanent deletion only with an explicit flag
//! - Missing files are skipped; a failed deletion never stops the batch
//!
//! # Example
//!
//! ```no_run
//! use dupesieve::actions::delete::{delete_batch, DeleteConfig};
//! use std::path::PathBuf;
//!
//! let paths = vec![PathBuf::from("/b/item1_v2.txt")];
//! let result = delete_batch(&paths, &DeleteConfig::trash(), None);
//! println!("{}", result.summary());
//! ```

use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// Every member of a group was selected for deletion.
    #[error("cannot delete all copies - at least one file must be preserved")]
    AllCopiesWouldBeDeleted,

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            Self::AllCopiesWouldBeDeleted => None,
        }
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Result of one deletion (or planned deletion in a dry run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
}

impl DeleteResult {
    /// Create a new delete result.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, permanent: bool) -> Self {
        Self {
            path,
            size,
            permanent,
        }
    }
}

/// Results of a batch deletion.
#[derive(Debug, Clone, Default)]
pub struct BatchDeleteResult {
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Files deleted, or that would be deleted in a dry run.
    pub successes: Vec<DeleteResult>,
    /// Files that no longer existed.
    pub skipped: Vec<PathBuf>,
    /// Failed deletions with their errors.
    pub failures: Vec<(PathBuf, String)>,
    /// Bytes freed (or that would be freed).
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Number of paths looked at.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.successes.len() + self.skipped.len() + self.failures.len()
    }

    /// Check if nothing failed or was skipped.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let freed = ByteSize::b(self.bytes_freed);
        let mut summary = if self.dry_run {
            format!(
                "[DRY RUN] Would delete {} file(s), freeing {}",
                self.success_count(),
                freed
            )
        } else {
            format!("Deleted {} file(s), freed {}", self.success_count(), freed)
        };

        if !self.skipped.is_empty() {
            summary.push_str(&format!(", {} missing", self.skipped.len()));
        }
        if !self.failures.is_empty() {
            summary.push_str(&format!(", {} failed", self.failure_count()));
        }
        summary
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone)]
pub struct DeleteConfig {
    /// Only report what would be deleted.
    pub dry_run: bool,
    /// Use permanent deletion instead of trash.
    pub permanent: bool,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            permanent: false,
        }
    }
}

impl DeleteConfig {
    /// Dry run: nothing is deleted.
    #[must_use]
    pub fn dry_run() -> Self {
        Self::default()
    }

    /// Execute, moving files to the trash.
    #[must_use]
    pub fn trash() -> Self {
        Self {
            dry_run: false,
            permanent: false,
        }
    }

    /// Execute, removing files permanently.
    #[must_use]
    pub fn permanent() -> Self {
        Self {
            dry_run: false,
            permanent: true,
        }
    }
}

/// Callback trait for deletion progress reporting.
pub trait DeleteProgressCallback {
    /// Called after a file was deleted (or would be, in a dry run).
    fn on_delete_success(&self, result: &DeleteResult, dry_run: bool);

    /// Called after a failed deletion.
    fn on_delete_failure(&self, path: &Path, error: &str);
}

/// Delete a single file to the system trash.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if the file cannot be stat'ed
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult::new(path.to_path_buf(), size, false))
}

/// Permanently delete a single file.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if the file cannot be stat'ed
/// - `PermanentDeleteFailed` if removal fails
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    fs::remove_file(path).map_err(|e| {
        log::error!("Permanent delete failed for {}: {}", path.display(), e);
        DeleteError::PermanentDeleteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult::new(path.to_path_buf(), size, true))
}

/// Delete (or plan to delete) every path.
///
/// Missing files are logged and skipped. Each failure is logged and
/// recorded; the batch always runs to the end.
pub fn delete_batch(
    paths: &[PathBuf],
    config: &DeleteConfig,
    callback: Option<&dyn DeleteProgressCallback>,
) -> BatchDeleteResult {
    let mut result = BatchDeleteResult {
        dry_run: config.dry_run,
        ..BatchDeleteResult::default()
    };

    for path in paths {
        let metadata = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("File does not exist: {}", path.display());
                result.skipped.push(path.clone());
                continue;
            }
            Err(e) => {
                let error_msg = DeleteError::from_io(path, e).to_string();
                log::warn!("Failed to delete {}: {}", path.display(), error_msg);
                if let Some(cb) = callback {
                    cb.on_delete_failure(path, &error_msg);
                }
                result.failures.push((path.clone(), error_msg));
                continue;
            }
        };

        let attempt = if config.dry_run {
            log::debug!("[DRY RUN] Would delete: {}", path.display());
            Ok(DeleteResult::new(
                path.clone(),
                metadata.len(),
                config.permanent,
            ))
        } else if config.permanent {
            permanent_delete(path)
        } else {
            delete_to_trash(path)
        };

        match attempt {
            Ok(deleted) => {
                result.bytes_freed += deleted.size;
                if let Some(cb) = callback {
                    cb.on_delete_success(&deleted, config.dry_run);
                }
                result.successes.push(deleted);
            }
            Err(e) => {
                let error_msg = e.to_string();
                log::warn!("Failed to delete {}: {}", path.display(), error_msg);
                if let Some(cb) = callback {
                    cb.on_delete_failure(path, &error_msg);
                }
                result.failures.push((path.clone(), error_msg));
            }
        }
    }

    log::info!("{}", result.summary());

    result
}

/// Validate that a selection doesn't delete all copies of a group.
///
/// # Errors
///
/// Returns `AllCopiesWouldBeDeleted` if nothing in `group_paths` survives.
///
/// # Example
///
/// ```
/// use dupesieve::actions::delete::validate_preserves_copy;
/// use std::path::PathBuf;
///
/// let group = vec![PathBuf::from("/original.txt"), PathBuf::from("/copy.txt")];
/// assert!(validate_preserves_copy(&[PathBuf::from("/copy.txt")], &group).is_ok());
/// assert!(validate_preserves_copy(&group, &group).is_err());
/// ```
pub fn validate_preserves_copy(
    selected_paths: &[PathBuf],
    group_paths: &[PathBuf],
) -> Result<(), DeleteError> {
    let selected_set: HashSet<&PathBuf> = selected_paths.iter().collect();
    let preserved_count = group_paths
        .iter()
        .filter(|p| !selected_set.contains(p))
        .count();

    if preserved_count == 0 {
        log::error!(
            "Attempted to delete all {} copies of a duplicate group",
            group_paths.len()
        );
        Err(DeleteError::AllCopiesWouldBeDeleted)
    } else {
        Ok(())
    }
}

/// Ask the user to confirm deleting `count` files.
///
/// Only the answer `yes` (any case) confirms.
///
/// # Errors
///
/// Returns the underlying I/O error if the prompt cannot be written or the
/// answer cannot be read.
pub fn confirm_deletion<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    count: usize,
    permanent: bool,
) -> io::Result<bool> {
    let how = if permanent {
        "PERMANENTLY delete"
    } else {
        "move to trash"
    };
    write!(
        output,
        "{count} files marked for deletion. Do you want to {how} them? (yes/no): "
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}
