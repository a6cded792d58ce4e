//! Concurrent hash pipeline.
//!
//! # Overview
//!
//! [`HashPipeline::run`] fans a list of paths out over a bounded rayon pool,
//! hashes each file with the streaming [`Hasher`], and folds the successes
//! into a digest → paths map. The map lives in a [`HashAccumulator`] owned
//! by the run; every append takes its mutex, so no path is lost or recorded
//! twice.
//!
//! A file that cannot be read is logged and recorded in
//! [`PipelineOutcome::failures`]; it never aborts the batch. `run` returns
//! only after every submitted path has been hashed or recorded as failed.
//!
//! # Example
//!
//! ```no_run
//! use dupesieve::duplicates::{HashPipeline, PipelineConfig};
//! use dupesieve::scanner::Hasher;
//! use std::path::PathBuf;
//!
//! let paths = vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")];
//! let pipeline = HashPipeline::new(Hasher::default(), PipelineConfig::default());
//! let outcome = pipeline.run(&paths);
//! println!("{} digests, {} failures", outcome.results.len(), outcome.failures.len());
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;

use crate::progress::ProgressCallback;
use crate::scanner::{Digest, HashError, Hasher};

/// Digest → every path that hashed to it, in arrival order.
pub type HashResults = HashMap<Digest, Vec<PathBuf>>;

/// Number of hashing threads used when none is configured.
#[must_use]
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Mutex-guarded digest → paths map shared by the hashing workers.
#[derive(Debug, Default)]
pub struct HashAccumulator {
    inner: Mutex<HashResults>,
}

impl HashAccumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` to the list for `digest`.
    pub fn insert(&self, digest: Digest, path: PathBuf) {
        // A poisoned lock still holds every completed append
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(digest).or_default().push(path);
    }

    /// Consume the accumulator, returning the collected map.
    #[must_use]
    pub fn into_inner(self) -> HashResults {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Configuration for the hash pipeline.
#[derive(Clone)]
pub struct PipelineConfig {
    /// Number of worker threads.
    pub concurrency: usize,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            progress_callback: None,
        }
    }
}

impl PipelineConfig {
    /// Set the worker count (at least one).
    #[must_use]
    pub fn with_concurrency(mut self, threads: usize) -> Self {
        self.concurrency = threads.max(1);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Result of a completed pipeline run.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    /// Digest → paths for every file that hashed successfully
    pub results: HashResults,
    /// Files that could not be hashed
    pub failures: Vec<HashError>,
    /// Number of files hashed successfully
    pub hashed: usize,
}

/// Bounded-parallelism hashing over a materialized path list.
#[derive(Debug, Clone)]
pub struct HashPipeline {
    hasher: Hasher,
    config: PipelineConfig,
}

impl HashPipeline {
    /// Create a pipeline.
    #[must_use]
    pub fn new(hasher: Hasher, config: PipelineConfig) -> Self {
        Self { hasher, config }
    }

    /// Hash every path and collect the results.
    ///
    /// Never fails as a whole: unreadable files end up in
    /// [`PipelineOutcome::failures`].
    #[must_use]
    pub fn run(&self, paths: &[PathBuf]) -> PipelineOutcome {
        if paths.is_empty() {
            log::debug!("Hash pipeline: no files to process");
            return PipelineOutcome::default();
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("hashing", paths.len());
        }

        log::info!(
            "Hashing {} files with {} threads ({})",
            paths.len(),
            self.config.concurrency,
            self.hasher.algorithm()
        );

        let accumulator = HashAccumulator::new();
        let failures: Mutex<Vec<HashError>> = Mutex::new(Vec::new());
        let completed = AtomicUsize::new(0);

        let work = || {
            paths.par_iter().for_each(|path| {
                match self.hasher.hash_file(path) {
                    Ok(digest) => {
                        log::trace!("Hashed {}: {}", path.display(), digest);
                        accumulator.insert(digest, path.clone());
                    }
                    Err(e) => {
                        log::warn!("Failed to hash {}: {}", path.display(), e);
                        failures
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(e);
                    }
                }

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(ref callback) = self.config.progress_callback {
                    callback.on_progress(done, path.to_string_lossy().as_ref());
                }
            });
        };

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.concurrency)
            .build()
        {
            Ok(pool) => pool.install(work),
            Err(e) => {
                log::warn!(
                    "Failed to create hashing pool ({}), using global pool with {} threads",
                    e,
                    rayon::current_num_threads()
                );
                work();
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("hashing");
        }

        let failures = failures
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let hashed = paths.len() - failures.len();
        let results = accumulator.into_inner();

        log::info!(
            "Hashing complete: {} hashed, {} failed, {} distinct digests",
            hashed,
            failures.len(),
            results.len()
        );

        PipelineOutcome {
            results,
            failures,
            hashed,
        }
    }
}
