//! Identifier extraction from file paths.
//!
//! An [`IdentifierPattern`] is a regular expression with a named capture
//! group. The group `uid` is used when present, otherwise the first named
//! group. The pattern may match anywhere in the path.

use std::path::Path;

use regex::Regex;

use crate::config::ConfigError;

/// Capture group name preferred when a pattern has several.
pub const DEFAULT_GROUP: &str = "uid";

/// Compiled pattern that extracts a logical-item identifier from a path.
#[derive(Debug, Clone)]
pub struct IdentifierPattern {
    regex: Regex,
    group: String,
}

impl IdentifierPattern {
    /// Compile `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] if the regex does not compile
    /// and [`ConfigError::MissingCapture`] if it has no named group.
    ///
    /// # Example
    ///
    /// ```
    /// use dupesieve::refine::IdentifierPattern;
    /// use std::path::Path;
    ///
    /// let pattern = IdentifierPattern::new(r"item(?P<uid>\d+)").unwrap();
    /// assert_eq!(pattern.extract(Path::new("/a/item1_v1.txt")).as_deref(), Some("1"));
    /// assert_eq!(pattern.extract(Path::new("/a/readme.txt")), None);
    /// ```
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let names: Vec<&str> = regex.capture_names().flatten().collect();
        let group = if names.contains(&DEFAULT_GROUP) {
            DEFAULT_GROUP
        } else {
            names
                .first()
                .copied()
                .ok_or_else(|| ConfigError::MissingCapture(pattern.to_string()))?
        }
        .to_string();

        log::debug!("Identifier pattern '{}' using group '{}'", pattern, group);
        Ok(Self { regex, group })
    }

    /// Extract the identifier from `path`.
    ///
    /// Returns `None` when the pattern does not match, or the capture group
    /// did not participate in the match or captured nothing.
    #[must_use]
    pub fn extract(&self, path: &Path) -> Option<String> {
        let text = path.to_string_lossy();
        let captures = self.regex.captures(&text)?;
        captures
            .name(&self.group)
            .filter(|m| !m.as_str().is_empty())
            .map(|m| m.as_str().to_string())
    }

    /// The source pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Name of the capture group used as the identifier.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }
}
