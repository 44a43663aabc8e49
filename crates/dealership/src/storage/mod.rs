//! Storage layer for dealership.
//!
//! This module provides `SQLite`-based persistent storage for the vehicle
//! catalog, user accounts, orders and feedback. Each table's operations live
//! in their own submodule as `impl Storage` blocks.

mod feedback;
pub mod migrations;
mod orders;
pub mod schema;
mod users;
mod vehicles;

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub use users::UserCredentials;

/// SQL function lowercasing its argument with full Unicode case mapping.
///
/// The built-in `lower()` and `LIKE` only fold ASCII.
pub(crate) const UNICODE_LOWER: &str = "unicode_lower";

/// Label used as the path of in-memory databases.
const MEMORY_PATH: &str = ":memory:";

/// Storage engine for the dealership.
///
/// Wraps a single `SQLite` connection. Callers that share it across
/// request handlers put it behind a mutex.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )?;
    Ok(())
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL keeps readers unblocked while an order transaction commits
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA busy_timeout=5000;",
        )?;

        register_functions(&conn)?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(MEMORY_PATH),
            source,
        })?;

        register_functions(&conn)?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(MEMORY_PATH),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let count = |table: &str| -> Result<i64> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
        };

        let db_size_bytes = if self.path.as_os_str() == MEMORY_PATH {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            users: count("users")?,
            vehicles: count("vehicles")?,
            orders: count("orders")?,
            feedback: count("feedback")?,
            db_size_bytes,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Number of user accounts.
    pub users: i64,
    /// Number of catalog vehicles.
    pub vehicles: i64,
    /// Number of orders.
    pub orders: i64,
    /// Number of feedback messages.
    pub feedback: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// Format a timestamp for storage.
///
/// Fixed precision keeps lexical order equal to chronological order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, falling back to now if the column is corrupt.
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| {
            warn!("Unparseable timestamp in database: {}", raw);
            Utc::now()
        },
        |dt| dt.with_timezone(&Utc),
    )
}

/// Convert a row count into the limit SQLite expects (`-1` means unlimited).
fn sql_limit(limit: Option<usize>) -> i64 {
    match limit {
        Some(0) | None => -1,
        Some(n) => i64::try_from(n).unwrap_or(i64::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let storage = Storage::open_in_memory().unwrap();
        assert_eq!(storage.path(), Path::new(":memory:"));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dealership.db");

        let storage = Storage::open(&path).unwrap();
        assert_eq!(storage.path(), path);
        assert!(path.exists());
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dealership.db");

        {
            let storage = Storage::open(&path).unwrap();
            storage
                .insert_feedback(&crate::model::NewFeedback {
                    name: "Lan".to_string(),
                    email: "lan@mail.vn".to_string(),
                    subject: None,
                    message: "Hello".to_string(),
                })
                .unwrap();
        }

        let storage = Storage::open(&path).unwrap();
        assert_eq!(storage.stats().unwrap().feedback, 1);
        assert!(storage.stats().unwrap().db_size_bytes > 0);
    }

    #[test]
    fn test_stats_empty() {
        let storage = Storage::open_in_memory().unwrap();
        let stats = storage.stats().unwrap();
        assert_eq!(
            stats,
            StorageStats {
                users: 0,
                vehicles: 0,
                orders: 0,
                feedback: 0,
                db_size_bytes: 0,
            }
        );
    }

    #[test]
    fn test_timestamp_roundtrip_preserves_order() {
        let earlier = Utc::now();
        let later = earlier + chrono::Duration::milliseconds(5);
        let (a, b) = (format_timestamp(earlier), format_timestamp(later));
        assert!(a < b);
        assert_eq!(parse_timestamp(&a).timestamp_micros(), earlier.timestamp_micros());
    }

    #[test]
    fn test_sql_limit() {
        assert_eq!(sql_limit(None), -1);
        assert_eq!(sql_limit(Some(0)), -1);
        assert_eq!(sql_limit(Some(10)), 10);
    }
}
