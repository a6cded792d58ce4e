//! Second-pass refinement of duplicate groups.
//!
//! - [`identifier`]: extract a logical-item identifier from a path
//! - [`policy`]: choose one survivor among equivalent files
//! - [`refiner`]: partition groups by identifier and build the removal set

pub mod identifier;
pub mod policy;
pub mod refiner;

pub use identifier::{IdentifierPattern, DEFAULT_GROUP};
pub use policy::{Criterion, UnknownCriterion};
pub use refiner::{RefineSummary, RefinedSet, Refinement, Refiner};
