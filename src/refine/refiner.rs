//! Identifier-based refinement of duplicate groups.
//!
//! # Overview
//!
//! Content duplicates are not always redundant: two byte-identical files may
//! belong to different logical items. The [`Refiner`] narrows each group:
//!
//! 1. Partition members by the identifier extracted from their path.
//!    Members without an identifier are left alone.
//! 2. In each partition, read every member's metadata and let the
//!    [`Criterion`] pick one survivor. Members whose metadata cannot be read
//!    are left alone.
//! 3. Everything else in the partition is marked for removal.
//!
//! Only groups with at least one removal appear in the [`RefinedSet`].
//! Metadata is read at refinement time; a file changed between the scan and
//! the refinement is judged by its current state.
//!
//! # Example
//!
//! ```no_run
//! use dupesieve::refine::{Criterion, Refiner};
//! # let groups = dupesieve::duplicates::DuplicateGroups::default();
//!
//! let refiner = Refiner::new(r"item(?P<uid>\d+)", Criterion::Oldest).unwrap();
//! let refinement = refiner.refine(&groups);
//! println!("{} files can go", refinement.summary.files_removed);
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use bytesize::ByteSize;
use indexmap::IndexMap;

use super::{Criterion, IdentifierPattern};
use crate::config::ConfigError;
use crate::duplicates::DuplicateGroups;
use crate::scanner::{Digest, FileRecord};

/// Digest → paths judged safe to remove, every list non-empty.
pub type RefinedSet = BTreeMap<Digest, Vec<PathBuf>>;

/// Counters from one refinement run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefineSummary {
    /// Duplicate groups looked at
    pub groups_examined: usize,
    /// Groups with at least one removal
    pub groups_refined: usize,
    /// Paths marked for removal
    pub files_removed: usize,
    /// Members skipped because no identifier was found
    pub unidentified: usize,
    /// Members skipped because their metadata could not be read
    pub unreadable: usize,
    /// Bytes held by the paths marked for removal
    pub reclaimable_bytes: u64,
}

impl RefineSummary {
    /// Format reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_bytes).to_string()
    }

    /// Whether any member was skipped.
    #[must_use]
    pub fn has_skipped(&self) -> bool {
        self.unidentified > 0 || self.unreadable > 0
    }
}

/// Output of [`Refiner::refine`].
#[derive(Debug, Clone, Default)]
pub struct Refinement {
    /// Removal candidates per digest
    pub refined: RefinedSet,
    /// Run counters
    pub summary: RefineSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fate {
    Unidentified,
    Unreadable,
    Survivor,
    Removed,
}

/// Partitions duplicate groups by identifier and keeps one file per partition.
#[derive(Debug, Clone)]
pub struct Refiner {
    pattern: IdentifierPattern,
    criterion: Criterion,
}

impl Refiner {
    /// Create a refiner, compiling `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the pattern is invalid or has no named
    /// capture group.
    pub fn new(pattern: &str, criterion: Criterion) -> Result<Self, ConfigError> {
        Ok(Self::with_pattern(IdentifierPattern::new(pattern)?, criterion))
    }

    /// Create a refiner from an already compiled pattern.
    #[must_use]
    pub fn with_pattern(pattern: IdentifierPattern, criterion: Criterion) -> Self {
        Self { pattern, criterion }
    }

    /// The selection criterion in use.
    #[must_use]
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    /// Refine every group.
    #[must_use]
    pub fn refine(&self, groups: &DuplicateGroups) -> Refinement {
        let mut refinement = Refinement::default();

        for (digest, members) in groups.iter() {
            refinement.summary.groups_examined += 1;

            let removed = self.refine_group(digest, members, &mut refinement.summary);
            if removed.is_empty() {
                log::debug!("Group {}: nothing to remove", digest);
                continue;
            }

            refinement.summary.groups_refined += 1;
            refinement.summary.files_removed += removed.len();
            refinement.refined.insert(*digest, removed);
        }

        log::info!(
            "Refinement complete ({}): {} of {} groups refined, {} files marked, {} unidentified, {} unreadable",
            self.criterion,
            refinement.summary.groups_refined,
            refinement.summary.groups_examined,
            refinement.summary.files_removed,
            refinement.summary.unidentified,
            refinement.summary.unreadable
        );

        refinement
    }

    /// Removal list for one group, in member order.
    ///
    /// Relies on `members` holding distinct paths, which
    /// [`DuplicateGroups`] guarantees.
    fn refine_group(
        &self,
        digest: &Digest,
        members: &[PathBuf],
        summary: &mut RefineSummary,
    ) -> Vec<PathBuf> {
        let mut fates = vec![Fate::Unidentified; members.len()];
        let mut sizes = vec![0u64; members.len()];

        let mut partitions: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (index, path) in members.iter().enumerate() {
            match self.pattern.extract(path) {
                Some(id) => partitions.entry(id).or_default().push(index),
                None => {
                    log::debug!("No identifier in {}, leaving it alone", path.display());
                    summary.unidentified += 1;
                }
            }
        }

        for (id, indices) in &partitions {
            let mut candidates = Vec::with_capacity(indices.len());
            let mut candidate_indices = Vec::with_capacity(indices.len());

            for &index in indices {
                match FileRecord::read(&members[index]) {
                    Ok(record) => {
                        sizes[index] = record.size;
                        candidates.push(record);
                        candidate_indices.push(index);
                    }
                    Err(e) => {
                        log::warn!(
                            "Cannot read metadata for {}: {}",
                            members[index].display(),
                            e
                        );
                        fates[index] = Fate::Unreadable;
                        summary.unreadable += 1;
                    }
                }
            }

            let Some(chosen) = self.criterion.select_index(&candidates) else {
                continue;
            };

            for (position, &index) in candidate_indices.iter().enumerate() {
                fates[index] = if position == chosen {
                    Fate::Survivor
                } else {
                    Fate::Removed
                };
            }

            log::debug!(
                "Group {} identifier '{}': keeping {} of {} candidates",
                digest,
                id,
                members[candidate_indices[chosen]].display(),
                candidates.len()
            );
        }

        members
            .iter()
            .zip(&fates)
            .zip(&sizes)
            .filter(|((_, fate), _)| **fate == Fate::Removed)
            .map(|((path, _), size)| {
                summary.reclaimable_bytes += size;
                path.clone()
            })
            .collect()
    }
}
