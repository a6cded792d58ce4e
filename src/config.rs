//! Application configuration management.
//!
//! Settings are layered with figment, lowest precedence first:
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory (or `--config <PATH>`)
//! 3. Environment variables prefixed `DUPESIEVE_` (e.g. `DUPESIEVE_THREADS=8`)
//! 4. Command-line flags, applied by the caller
//!
//! # Example
//!
//! ```toml
//! extensions = [".epub", ".pdf"]
//! threads = 8
//! algorithm = "sha256"
//! pattern = 'item(?P<uid>\d+)'
//! criterion = "oldest"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::default_concurrency;
use crate::refine::{Criterion, IdentifierPattern};
use crate::scanner::HashAlgorithm;

/// Default path of the duplicate report written by `scan`.
pub const DEFAULT_REPORT: &str = "duplicates_report.txt";

/// Default path of the refined report written by `refine`.
pub const DEFAULT_FILTERED_REPORT: &str = "filtered_duplicates_report.txt";

/// Errors raised while loading or validating configuration.
///
/// All of these are fatal and surface before any file is touched.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The identifier pattern is not a valid regular expression.
    #[error("Invalid identifier pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The rejected pattern
        pattern: String,
        /// Why the regex engine rejected it
        #[source]
        source: regex::Error,
    },

    /// The identifier pattern has no named capture group.
    #[error("Identifier pattern '{0}' has no named capture group (expected e.g. (?P<uid>...))")]
    MissingCapture(String),

    /// Refinement was requested without an identifier pattern.
    #[error("No identifier pattern configured (use --pattern or set `pattern` in config.toml)")]
    MissingPattern,

    /// The worker thread count is unusable.
    #[error("Invalid thread count {0}: must be at least 1")]
    InvalidThreads(usize),

    /// A configuration source could not be read or parsed.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File name suffixes to scan; empty scans every file.
    pub extensions: Vec<String>,
    /// Hashing worker threads.
    pub threads: usize,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Content digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Identifier pattern used by refinement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Survivor selection criterion name.
    pub criterion: String,
    /// Where `scan` writes its report.
    pub report: PathBuf,
    /// Where `refine` writes its report.
    pub filtered_report: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            threads: default_concurrency(),
            follow_symlinks: true,
            algorithm: HashAlgorithm::default(),
            pattern: None,
            criterion: Criterion::Oldest.to_string(),
            report: PathBuf::from(DEFAULT_REPORT),
            filtered_report: PathBuf::from(DEFAULT_FILTERED_REPORT),
        }
    }
}

impl Config {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// `path` replaces the platform config file when given. A missing file
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if a source cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path.map(Path::to_path_buf).or_else(Self::config_path);
        match file {
            Some(ref f) => log::debug!("Loading configuration from {}", f.display()),
            None => log::debug!("No configuration directory available, using defaults"),
        }

        let config: Self = Self::figment(file.as_deref()).extract()?;
        Ok(config)
    }

    /// The figment used by [`Config::load`].
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed("DUPESIEVE_"))
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupesieve", "dupesieve")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check values a running scan depends on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero thread count or a malformed
    /// identifier pattern.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidThreads(self.threads));
        }
        if let Some(ref pattern) = self.pattern {
            IdentifierPattern::new(pattern)?;
        }
        Ok(())
    }

    /// The configured criterion, resolved once.
    #[must_use]
    pub fn criterion(&self) -> Criterion {
        Criterion::parse(&self.criterion)
    }

    /// The identifier pattern, compiled.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPattern`] when none is configured.
    pub fn identifier_pattern(&self) -> Result<IdentifierPattern, ConfigError> {
        let pattern = self.pattern.as_deref().ok_or(ConfigError::MissingPattern)?;
        IdentifierPattern::new(pattern)
    }
}
