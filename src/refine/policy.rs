//! Survivor selection policy.
//!
//! A [`Criterion`] picks exactly one file to keep from a set of candidates
//! that share both content and identifier. Ties always go to the candidate
//! that appears first.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::scanner::FileRecord;

/// Rule choosing one survivor among equivalent candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Earliest creation time.
    #[default]
    Oldest,
    /// Greatest size in bytes.
    Largest,
    /// Fewest characters in the file name.
    ShortestName,
    /// Whichever candidate came first.
    FirstEncountered,
}

impl Criterion {
    /// Names accepted by [`Criterion::parse`].
    pub const NAMES: [&'static str; 3] = ["oldest", "largest", "shortest_name"];

    /// Resolve a criterion name, case-insensitively.
    ///
    /// Unknown names resolve to [`Criterion::FirstEncountered`] with a
    /// warning, so a typo degrades selection instead of stopping a run.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.parse() {
            Ok(criterion) => criterion,
            Err(UnknownCriterion(name)) => {
                match suggest(&name) {
                    Some(hint) => log::warn!(
                        "Unknown criterion '{}' (did you mean '{}'?), keeping the first file of each set",
                        name,
                        hint
                    ),
                    None => log::warn!(
                        "Unknown criterion '{}', keeping the first file of each set",
                        name
                    ),
                }
                Self::FirstEncountered
            }
        }
    }

    /// Index of the survivor within `candidates`.
    ///
    /// `None` only for an empty slice.
    #[must_use]
    pub fn select_index(self, candidates: &[FileRecord]) -> Option<usize> {
        let indexed = candidates.iter().enumerate();
        // min_by_key keeps the first of equal minima
        let chosen = match self {
            Self::Oldest => indexed.min_by_key(|(_, r)| r.created),
            Self::Largest => indexed.min_by_key(|(_, r)| Reverse(r.size)),
            Self::ShortestName => indexed.min_by_key(|(_, r)| r.name_len()),
            Self::FirstEncountered => indexed.take(1).next(),
        };
        chosen.map(|(i, _)| i)
    }

    /// The survivor among `candidates`.
    ///
    /// # Example
    ///
    /// ```
    /// use dupesieve::refine::Criterion;
    /// use dupesieve::scanner::FileRecord;
    /// use std::path::PathBuf;
    /// use std::time::{Duration, SystemTime};
    ///
    /// let t0 = SystemTime::UNIX_EPOCH;
    /// let files = vec![
    ///     FileRecord::new(PathBuf::from("/b/item1_v2.txt"), 10, t0 + Duration::from_secs(20)),
    ///     FileRecord::new(PathBuf::from("/a/item1_v1.txt"), 10, t0 + Duration::from_secs(10)),
    /// ];
    ///
    /// let keep = Criterion::Oldest.select(&files).unwrap();
    /// assert_eq!(keep.path, PathBuf::from("/a/item1_v1.txt"));
    /// ```
    #[must_use]
    pub fn select(self, candidates: &[FileRecord]) -> Option<&FileRecord> {
        self.select_index(candidates).map(|i| &candidates[i])
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Oldest => "oldest",
            Self::Largest => "largest",
            Self::ShortestName => "shortest_name",
            Self::FirstEncountered => "first_encountered",
        })
    }
}

/// A criterion name that [`Criterion::from_str`] does not recognise.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown criterion '{0}' (expected one of: oldest, largest, shortest_name)")]
pub struct UnknownCriterion(pub String);

impl FromStr for Criterion {
    type Err = UnknownCriterion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "oldest" => Ok(Self::Oldest),
            "largest" => Ok(Self::Largest),
            "shortest_name" => Ok(Self::ShortestName),
            "first_encountered" => Ok(Self::FirstEncountered),
            _ => Err(UnknownCriterion(s.to_string())),
        }
    }
}

/// Closest known criterion name, if any is reasonably close.
fn suggest(name: &str) -> Option<&'static str> {
    let lowered = name.to_lowercase();
    Criterion::NAMES
        .iter()
        .map(|known| (*known, strsim::jaro_winkler(&lowered, known)))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(known, _)| known)
}
