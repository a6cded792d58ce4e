//! SQLite metadata log.
//!
//! Rows are appended to
//! `duplicates(hash TEXT, path TEXT, size INTEGER, ctime TEXT, error TEXT)`,
//! one per report path. The `hash` column is the digest from the report
//! header. Unreadable files get a row with `size` and `ctime` NULL and the
//! error message in `error`.

use std::path::Path;

use rusqlite::{params, Connection};

use super::{iso_local, stat, PersistenceError};
use crate::report::ParsedReport;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS duplicates (
    hash TEXT,
    path TEXT,
    size INTEGER,
    ctime TEXT,
    error TEXT
);";

/// One row of the `duplicates` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    /// Report digest
    pub hash: String,
    /// Path as listed in the report
    pub path: String,
    /// Size in bytes, if readable
    pub size: Option<i64>,
    /// Creation time, if readable
    pub ctime: Option<String>,
    /// Error message, if unreadable
    pub error: Option<String>,
}

/// Rows appended by one [`SqliteMetadataLog::log_report`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggedRows {
    /// Rows written
    pub rows: usize,
    /// Rows recording an unreadable file
    pub errors: usize,
}

/// Connection to a metadata database.
pub struct SqliteMetadataLog {
    conn: Connection,
}

impl SqliteMetadataLog {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Sqlite`] if the database cannot be opened.
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Sqlite`] if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute_batch(SCHEMA)?;
        log::debug!("SQLite metadata schema ready");
        Ok(Self { conn })
    }

    /// Append a row for every path in `report`, in one transaction.
    ///
    /// The returned counts cover this call only, not rows already in the
    /// database.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Sqlite`] if an insert fails; nothing from
    /// this call is kept in that case.
    pub fn log_report(&mut self, report: &ParsedReport) -> Result<LoggedRows, PersistenceError> {
        let tx = self.conn.transaction()?;
        let mut logged = LoggedRows::default();
        {
            let mut insert = tx.prepare(
                "INSERT INTO duplicates (hash, path, size, ctime, error) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for (digest, paths) in report.iter() {
                let hash = digest.to_hex();
                for path in paths {
                    let display = path.to_string_lossy().into_owned();
                    match stat(path) {
                        Ok(record) => insert.execute(params![
                            hash,
                            display,
                            i64::try_from(record.size).unwrap_or(i64::MAX),
                            iso_local(record.created),
                            Option::<String>::None,
                        ])?,
                        Err(error) => {
                            logged.errors += 1;
                            insert.execute(params![
                                hash,
                                display,
                                Option::<i64>::None,
                                Option::<String>::None,
                                error,
                            ])?
                        }
                    };
                    logged.rows += 1;
                }
            }
        }
        tx.commit()?;

        log::info!(
            "Logged {} rows of metadata to SQLite ({} unreadable)",
            logged.rows,
            logged.errors
        );
        Ok(logged)
    }

    /// Every row, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Sqlite`] if the query fails.
    pub fn rows(&self) -> Result<Vec<MetadataRow>, PersistenceError> {
        let mut stmt = self
            .conn
            .prepare("SELECT hash, path, size, ctime, error FROM duplicates ORDER BY rowid")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(MetadataRow {
                    hash: row.get(0)?,
                    path: row.get(1)?,
                    size: row.get(2)?,
                    ctime: row.get(3)?,
                    error: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
