//! Duplicate finder: walk, hash, group.
//!
//! # Overview
//!
//! [`DuplicateFinder`] drives the full detection run against a
//! [`DirectoryProvider`]:
//! 1. **Walk** - collect candidate files (see [`crate::scanner::walker`])
//! 2. **Hash** - stream every candidate through the [`HashPipeline`]
//! 3. **Group** - keep digests shared by two or more files
//!
//! Per-file failures in steps 1 and 2 are logged and counted in the
//! [`ScanSummary`]; only an unusable root aborts the run.
//!
//! # Example
//!
//! ```no_run
//! use dupesieve::duplicates::{DuplicateFinder, FinderConfig};
//! use dupesieve::scanner::LocalDirectory;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_concurrency(4));
//! let (groups, summary) = finder.find_duplicates(&LocalDirectory::new("/srv/library")).unwrap();
//!
//! println!("Found {} duplicate groups", groups.len());
//! println!("Reclaimable space: {}", summary.reclaimable_display());
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;

use super::pipeline::default_concurrency;
use super::{DuplicateGroups, HashPipeline, PipelineConfig};
use crate::progress::ProgressCallback;
use crate::scanner::{
    scan, DirectoryProvider, HashAlgorithm, HashError, Hasher, ScanError, WalkerConfig,
};

/// Configuration for a complete detection run.
#[derive(Clone)]
pub struct FinderConfig {
    /// Traversal options
    pub walker_config: WalkerConfig,
    /// Content digest algorithm
    pub algorithm: HashAlgorithm,
    /// Number of hashing threads
    pub concurrency: usize,
    /// Optional progress callback
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("walker_config", &self.walker_config)
            .field("algorithm", &self.algorithm)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            walker_config: WalkerConfig::default(),
            algorithm: HashAlgorithm::default(),
            concurrency: default_concurrency(),
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of hashing threads (at least one).
    #[must_use]
    pub fn with_concurrency(mut self, threads: usize) -> Self {
        self.concurrency = threads.max(1);
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Summary statistics from a detection run.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Candidate files found by the walker
    pub total_files: usize,
    /// Files hashed successfully
    pub hashed_files: usize,
    /// Files eliminated because their digest was unique
    pub eliminated_unique: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Redundant copies (group members beyond the first)
    pub duplicate_files: usize,
    /// Bytes held by redundant copies
    pub reclaimable_space: u64,
    /// Wall-clock duration of the run
    pub scan_duration: Duration,
    /// Entries the walker could not read
    pub scan_errors: Vec<ScanError>,
    /// Files that could not be hashed
    pub hash_errors: Vec<HashError>,
}

impl ScanSummary {
    /// Format reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Whether any file was skipped because of an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.scan_errors.is_empty() || !self.hash_errors.is_empty()
    }
}

/// Runs walk, hash and group against one root.
#[derive(Debug, Clone)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find every group of byte-identical files under the provider's root.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the root cannot be resolved. Unreadable
    /// files below the root are recorded in the summary instead.
    pub fn find_duplicates(
        &self,
        provider: &dyn DirectoryProvider,
    ) -> Result<(DuplicateGroups, ScanSummary), ScanError> {
        let start_time = Instant::now();
        let root = provider.root()?;

        log::info!("Scanning {}", root.display());

        let walked = scan(
            &root,
            self.config.walker_config.clone(),
            self.config.progress_callback.clone(),
        );

        let mut pipeline_config = PipelineConfig::default().with_concurrency(self.config.concurrency);
        if let Some(ref callback) = self.config.progress_callback {
            pipeline_config = pipeline_config.with_progress_callback(Arc::clone(callback));
        }
        let pipeline = HashPipeline::new(Hasher::new(self.config.algorithm), pipeline_config);
        let outcome = pipeline.run(&walked.files);

        let (groups, stats) = DuplicateGroups::from_results(outcome.results);

        let summary = ScanSummary {
            total_files: walked.files.len(),
            hashed_files: outcome.hashed,
            eliminated_unique: stats.eliminated_unique,
            duplicate_groups: stats.duplicate_groups,
            duplicate_files: stats.redundant_files(),
            reclaimable_space: groups.wasted_bytes(),
            scan_duration: start_time.elapsed(),
            scan_errors: walked.errors,
            hash_errors: outcome.failures,
        };

        log::info!(
            "Scan complete in {:.2?}: {} groups, {} redundant files, {} reclaimable",
            summary.scan_duration,
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        Ok((groups, summary))
    }
}
