//! Sources of the directory tree to scan.
//!
//! The scanner never mounts anything itself. A [`DirectoryProvider`] hands it
//! a local root; network shares have to be mounted by whoever supplies that
//! provider.

use std::path::{Path, PathBuf};

use super::ScanError;

/// Supplies the root directory the scanner walks.
pub trait DirectoryProvider {
    /// Resolve the root to walk.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the root is unavailable.
    fn root(&self) -> Result<PathBuf, ScanError>;
}

/// A directory on a locally mounted filesystem.
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    location: String,
}

impl LocalDirectory {
    /// Create a provider for `location`.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Provider for an existing path.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        Self::new(path.to_string_lossy())
    }
}

impl DirectoryProvider for LocalDirectory {
    fn root(&self) -> Result<PathBuf, ScanError> {
        if self.location.contains("://") {
            return Err(ScanError::UnsupportedLocation(self.location.clone()));
        }

        let path = PathBuf::from(&self.location);
        let metadata = std::fs::metadata(&path).map_err(|e| ScanError::from_io(&path, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(path));
        }

        Ok(path)
    }
}
