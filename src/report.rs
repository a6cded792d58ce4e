//! Plain-text duplicate reports.
//!
//! # Format
//!
//! ```text
//! Duplicate files with hash <hex>:
//!   /path/one
//!   /path/two
//!
//! ```
//!
//! Refined reports use the header `Filtered duplicates with hash <hex>:`.
//! Every group ends with a blank line. The parser accepts both headers and
//! takes the digest from the last word of the header, minus its colon.
//! Indented lines after a header are member paths.
//!
//! Paths are written with [`Path::display`] and read back trimmed, so a name
//! that is not valid UTF-8, or that starts or ends with whitespace, does not
//! survive the round trip. The writer warns about such paths.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::scanner::Digest;

const DUPLICATE_HEADER: &str = "Duplicate files with hash";
const FILTERED_HEADER: &str = "Filtered duplicates with hash";

/// Which header a report uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Raw scan output.
    Duplicates,
    /// Refined removal list.
    Filtered,
}

impl ReportKind {
    fn header(self) -> &'static str {
        match self {
            Self::Duplicates => DUPLICATE_HEADER,
            Self::Filtered => FILTERED_HEADER,
        }
    }

    fn from_line(line: &str) -> Option<Self> {
        if line.starts_with(DUPLICATE_HEADER) {
            Some(Self::Duplicates)
        } else if line.starts_with(FILTERED_HEADER) {
            Some(Self::Filtered)
        } else {
            None
        }
    }
}

/// Errors reading or writing a report.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// A report file could not be opened or created.
    #[error("Cannot access report {path}: {source}")]
    File {
        /// Report path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Reading or writing report content failed.
    #[error("Report I/O error: {0}")]
    Io(#[from] io::Error),

    /// A group header carries something that is not a digest.
    #[error("Invalid digest '{value}' on line {line}")]
    InvalidDigest {
        /// 1-based line number
        line: usize,
        /// The offending token
        value: String,
    },
}

/// Groups read back from a report, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReport {
    groups: IndexMap<Digest, Vec<PathBuf>>,
    kinds: IndexMap<Digest, ReportKind>,
}

impl ParsedReport {
    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if the report has no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate groups in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&Digest, &[PathBuf])> {
        self.groups.iter().map(|(d, p)| (d, p.as_slice()))
    }

    /// Header kind of the group for `digest`.
    ///
    /// A digest listed under both headers counts as
    /// [`ReportKind::Duplicates`].
    #[must_use]
    pub fn kind(&self, digest: &Digest) -> Option<ReportKind> {
        self.kinds.get(digest).copied()
    }

    /// Groups listed under the `kind` header, in file order.
    pub fn groups_of_kind(
        &self,
        kind: ReportKind,
    ) -> impl Iterator<Item = (&Digest, &[PathBuf])> + '_ {
        self.iter()
            .filter(move |(digest, _)| self.kind(digest) == Some(kind))
    }

    /// Every listed path, in file order.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.groups.values().flatten()
    }

    /// Number of listed paths.
    #[must_use]
    pub fn path_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Consume into the ordered group map.
    #[must_use]
    pub fn into_groups(self) -> IndexMap<Digest, Vec<PathBuf>> {
        self.groups
    }
}

/// Write groups in report format.
///
/// # Errors
///
/// Returns the underlying I/O error.
pub fn write_report<'a, W, I>(writer: &mut W, kind: ReportKind, groups: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a Digest, &'a Vec<PathBuf>)>,
{
    for (digest, paths) in groups {
        writeln!(writer, "{} {}:", kind.header(), digest)?;
        for path in paths {
            if !survives_round_trip(path) {
                log::warn!(
                    "Path {:?} cannot be read back from the report unchanged",
                    path
                );
            }
            writeln!(writer, "  {}", path.display())?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Whether `path` parses back to itself from a report line.
fn survives_round_trip(path: &Path) -> bool {
    path.to_str().is_some_and(|text| {
        !text.is_empty() && text.trim() == text && !text.contains(['\n', '\r'])
    })
}

/// Write groups to a report file, replacing any existing file.
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be created or written.
pub fn save_report<'a, I>(path: &Path, kind: ReportKind, groups: I) -> Result<(), ReportError>
where
    I: IntoIterator<Item = (&'a Digest, &'a Vec<PathBuf>)>,
{
    let file = File::create(path).map_err(|source| ReportError::File {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    write_report(&mut writer, kind, groups)?;
    writer.flush()?;

    log::info!("Report written to {}", path.display());
    Ok(())
}

/// Parse a report from a reader.
///
/// Path lines that appear before any header are ignored with a warning.
/// A digest that appears twice has its members appended; a path already
/// listed for that digest is skipped.
///
/// # Errors
///
/// Returns [`ReportError::InvalidDigest`] for a malformed header and
/// [`ReportError::Io`] if reading fails.
pub fn parse_report<R: BufRead>(reader: R) -> Result<ParsedReport, ReportError> {
    let mut report = ParsedReport::default();
    let mut current: Option<Digest> = None;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;

        if let Some(kind) = ReportKind::from_line(&line) {
            let token = line.split_whitespace().last().unwrap_or_default();
            let hex = token.strip_suffix(':').unwrap_or(token);
            let digest = Digest::from_hex(hex).ok_or_else(|| ReportError::InvalidDigest {
                line: line_no,
                value: hex.to_string(),
            })?;
            report.groups.entry(digest).or_default();
            report
                .kinds
                .entry(digest)
                .and_modify(|seen| {
                    if kind == ReportKind::Duplicates {
                        *seen = kind;
                    }
                })
                .or_insert(kind);
            current = Some(digest);
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if !line.starts_with(char::is_whitespace) {
            log::warn!("Ignoring unrecognised report line {}: {}", line_no, trimmed);
            continue;
        }

        let Some(digest) = current else {
            log::warn!("Ignoring path outside any group on line {}: {}", line_no, trimmed);
            continue;
        };
        let members = report.groups.entry(digest).or_default();
        let path = PathBuf::from(trimmed);
        if members.contains(&path) {
            log::debug!("Skipping repeated path on line {}: {}", line_no, trimmed);
        } else {
            members.push(path);
        }
    }

    log::debug!("Parsed report with {} groups", report.len());
    Ok(report)
}

/// Parse the report file at `path`.
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be read or is malformed.
pub fn load_report(path: &Path) -> Result<ParsedReport, ReportError> {
    let file = File::open(path).map_err(|source| ReportError::File {
        path: path.to_path_buf(),
        source,
    })?;
    parse_report(BufReader::new(file))
}
