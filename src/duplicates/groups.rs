//! Duplicate grouping.
//!
//! # Overview
//!
//! [`DuplicateGroups::from_results`] reduces the pipeline's digest → paths
//! map to the digests shared by two or more files. Every other entry is a
//! unique file and is dropped. The result is keyed by [`Digest`] in a
//! `BTreeMap`, so iteration (and therefore report output) is ordered by hash.
//!
//! # Example
//!
//! ```
//! use dupesieve::duplicates::{DuplicateGroups, HashResults};
//! use dupesieve::scanner::Hasher;
//! use std::path::PathBuf;
//!
//! let hasher = Hasher::default();
//! let mut results = HashResults::new();
//! results.insert(
//!     hasher.hash_bytes(b"X"),
//!     vec![PathBuf::from("/a/1.pdf"), PathBuf::from("/b/1.pdf")],
//! );
//! results.insert(hasher.hash_bytes(b"Y"), vec![PathBuf::from("/a/2.pdf")]);
//!
//! let (groups, stats) = DuplicateGroups::from_results(results);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(stats.eliminated_unique, 1);
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;

use super::HashResults;
use crate::scanner::Digest;

/// Statistics from the grouping step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Files that hashed successfully
    pub total_files: usize,
    /// Distinct digests seen
    pub distinct_digests: usize,
    /// Groups with two or more members
    pub duplicate_groups: usize,
    /// Files belonging to a duplicate group
    pub duplicate_files: usize,
    /// Files dropped because their digest was unique
    pub eliminated_unique: usize,
}

impl GroupingStats {
    /// Files that could be removed while keeping one copy per group.
    #[must_use]
    pub fn redundant_files(&self) -> usize {
        self.duplicate_files - self.duplicate_groups
    }
}

/// Digests shared by at least two files, with their member paths.
///
/// Invariant: every group has two or more members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateGroups {
    groups: BTreeMap<Digest, Vec<PathBuf>>,
}

impl DuplicateGroups {
    /// Build groups from raw pipeline results.
    ///
    /// Paths inside a group are sorted and deduplicated, so the same tree
    /// always produces the same groups regardless of hashing order.
    #[must_use]
    pub fn from_results(results: HashResults) -> (Self, GroupingStats) {
        let mut stats = GroupingStats {
            distinct_digests: results.len(),
            ..GroupingStats::default()
        };

        let mut groups = BTreeMap::new();
        for (digest, mut paths) in results {
            paths.sort();
            paths.dedup();

            stats.total_files += paths.len();
            if paths.len() < 2 {
                stats.eliminated_unique += paths.len();
                continue;
            }

            stats.duplicate_groups += 1;
            stats.duplicate_files += paths.len();
            log::debug!("Duplicate group {}: {} files", digest, paths.len());
            groups.insert(digest, paths);
        }

        log::info!(
            "Grouping complete: {} files → {} duplicate groups ({} redundant copies)",
            stats.total_files,
            stats.duplicate_groups,
            stats.redundant_files()
        );

        (Self { groups }, stats)
    }

    /// Build groups from an already-grouped map, such as a parsed report.
    ///
    /// Member order is preserved and a repeated path keeps only its first
    /// occurrence. Entries left with fewer than two members are dropped.
    #[must_use]
    pub fn from_map(map: impl IntoIterator<Item = (Digest, Vec<PathBuf>)>) -> Self {
        let groups = map
            .into_iter()
            .map(|(digest, paths)| (digest, distinct(paths)))
            .filter(|(digest, paths)| {
                if paths.len() < 2 {
                    log::warn!(
                        "Ignoring group {} with {} member(s)",
                        digest,
                        paths.len()
                    );
                    false
                } else {
                    true
                }
            })
            .collect();

        Self { groups }
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if there are no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Members of the group for `digest`.
    #[must_use]
    pub fn get(&self, digest: &Digest) -> Option<&[PathBuf]> {
        self.groups.get(digest).map(Vec::as_slice)
    }

    /// Iterate groups in digest order.
    pub fn iter(&self) -> impl Iterator<Item = (&Digest, &[PathBuf])> {
        self.groups.iter().map(|(d, p)| (d, p.as_slice()))
    }

    /// Total number of member paths across all groups.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Bytes held by redundant copies, using the first readable member's size.
    ///
    /// Groups whose members cannot be stat'ed contribute nothing.
    #[must_use]
    pub fn wasted_bytes(&self) -> u64 {
        self.groups
            .values()
            .map(|paths| {
                let size = paths.iter().find_map(|p| file_size(p)).unwrap_or(0);
                size * (paths.len() as u64 - 1)
            })
            .sum()
    }

    /// Borrow the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<Digest, Vec<PathBuf>> {
        &self.groups
    }

    /// Consume into the underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<Digest, Vec<PathBuf>> {
        self.groups
    }
}

impl<'a> IntoIterator for &'a DuplicateGroups {
    type Item = (&'a Digest, &'a Vec<PathBuf>);
    type IntoIter = std::collections::btree_map::Iter<'a, Digest, Vec<PathBuf>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// `paths` without repeats, first occurrence wins.
fn distinct(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let before = paths.len();
    let unique: IndexSet<PathBuf> = paths.into_iter().collect();
    let unique: Vec<PathBuf> = unique.into_iter().collect();
    if unique.len() < before {
        log::debug!("Dropped {} repeated member path(s)", before - unique.len());
    }
    unique
}

fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|m| m.len())
}
