//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Concurrent content hashing with a bounded worker pool
//! - Grouping files that share a digest
//! - Orchestrating a full walk → hash → group run

pub mod finder;
pub mod groups;
pub mod pipeline;

pub use finder::{DuplicateFinder, FinderConfig, ScanSummary};
pub use groups::{DuplicateGroups, GroupingStats};
pub use pipeline::{
    default_concurrency, HashAccumulator, HashPipeline, HashResults, PipelineConfig,
    PipelineOutcome,
};
