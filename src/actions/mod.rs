//! File actions module.
//!
//! The delete module removes the files a report lists:
//! - Dry run unless execution is requested
//! - Move to system trash (default, recoverable)
//! - Permanent deletion (requires explicit configuration)
//! - Interactive `yes` confirmation
//!
//! ```no_run
//! use dupesieve::actions::delete::{delete_batch, DeleteConfig};
//! use std::path::PathBuf;
//!
//! let plan = delete_batch(&[PathBuf::from("/dup.txt")], &DeleteConfig::dry_run(), None);
//! println!("{}", plan.summary());
//! ```

pub mod delete;

pub use delete::{
    confirm_deletion, delete_batch, delete_to_trash, permanent_delete, validate_preserves_copy,
    BatchDeleteResult, DeleteConfig, DeleteError, DeleteProgressCallback, DeleteResult,
};
