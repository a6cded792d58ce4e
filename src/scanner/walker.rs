//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree and collecting the paths that make up the hashing workload. It
//! never reads file contents.
//!
//! # Features
//!
//! - Parallel directory reading via jwalk
//! - Symbolic links followed by default
//! - Case-insensitive suffix filtering
//! - Unreadable entries reported as [`ScanError`] without stopping traversal
//!
//! # Example
//!
//! ```no_run
//! use dupesieve::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig::default().with_extensions(vec![".epub".into(), ".pdf".into()]);
//! let walker = Walker::new(Path::new("/srv/library"), config);
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} candidate files", files.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jwalk::WalkDir;

use super::{ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Directory walker for file discovery.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Lowercased suffixes, precomputed once
    suffixes: Vec<String>,
    /// Optional progress callback
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        let suffixes = config
            .extensions
            .iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Self {
            root: path.to_path_buf(),
            config,
            suffixes,
            progress_callback: None,
        }
    }

    /// Report discovered files to a progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if a file name passes the extension filter.
    fn passes_extension_filter(&self, path: &Path) -> bool {
        if self.suffixes.is_empty() {
            return true;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        self.suffixes.iter().any(|suffix| name.ends_with(suffix))
    }

    /// Walk the directory tree, yielding regular file paths.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Order is deterministic for an unchanged tree.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, ScanError>> + '_ {
        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(false)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        let mut discovered = 0usize;

        walk_dir.into_iter().filter_map(move |entry_result| {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    return Some(Err(ScanError::Io {
                        path,
                        source: std::io::Error::other(e.to_string()),
                    }));
                }
            };

            let path = entry.path();
            if entry.file_type().is_dir() {
                return None;
            }

            if !self.passes_extension_filter(&path) {
                log::trace!("Skipping file due to extension filter: {}", path.display());
                return None;
            }

            let metadata = if self.config.follow_symlinks {
                std::fs::metadata(&path)
            } else {
                std::fs::symlink_metadata(&path)
            };

            let metadata = match metadata {
                Ok(m) => m,
                Err(e) => {
                    let err = ScanError::from_io(&path, e);
                    log::warn!("Skipping unreadable entry: {}", err);
                    return Some(Err(err));
                }
            };

            // Sockets, fifos, dangling or unfollowed links
            if !metadata.is_file() {
                log::trace!("Skipping non-regular file: {}", path.display());
                return None;
            }

            discovered += 1;
            if let Some(ref callback) = self.progress_callback {
                callback.on_progress(discovered, path.to_string_lossy().as_ref());
            }

            Some(Ok(path))
        })
    }
}

/// Files discovered by [`scan`], plus the entries that could not be read.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Regular files that passed the filter
    pub files: Vec<PathBuf>,
    /// Entries skipped because they could not be read
    pub errors: Vec<ScanError>,
}

/// Collect every candidate file under `root`.
///
/// # Arguments
///
/// * `root` - Directory to traverse
/// * `config` - Walker configuration (symlinks, extension filter)
/// * `progress` - Optional progress callback, driven through a `"walking"` phase
#[must_use]
pub fn scan(
    root: &Path,
    config: WalkerConfig,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> ScanOutcome {
    let mut walker = Walker::new(root, config);
    if let Some(ref callback) = progress {
        callback.on_phase_start("walking", 0);
        walker = walker.with_progress_callback(Arc::clone(callback));
    }

    let mut outcome = ScanOutcome::default();
    for result in walker.walk() {
        match result {
            Ok(path) => outcome.files.push(path),
            Err(e) => outcome.errors.push(e),
        }
    }

    if let Some(ref callback) = progress {
        callback.on_phase_end("walking");
    }

    log::info!(
        "Found {} candidate files under {} ({} unreadable entries skipped)",
        outcome.files.len(),
        root.display(),
        outcome.errors.len()
    );

    outcome
}
