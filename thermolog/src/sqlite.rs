//! SQLite-backed measurement store.
//!
//! A relational alternative to the JSON [`Store`](crate::store::Store), used
//! to compare write and read cost between the two. Records live in a single
//! `measurements` table; there is no timestamp index file because the
//! database orders rows itself.
//!
//! This module is only available when the `sqlite` feature is enabled.

use std::path::Path;

use rusqlite::{Connection, params};

use crate::error::{Result, SqliteError};
use crate::measurement::Measurement;

/// Default database file name inside the data directory.
pub const DATABASE_FILE: &str = "measurements.db";

/// Measurement store backed by a SQLite database file.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database at `path` and ensures the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Open`] if the database cannot be opened or the
    /// table cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let open_error = |e| SqliteError::Open {
            path: path.to_path_buf(),
            source: e,
        };

        let conn = Connection::open(path).map_err(open_error)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS measurements (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                component   TEXT NOT NULL,
                temperature REAL NOT NULL,
                timestamp   INTEGER NOT NULL
            )",
            (),
        )
        .map_err(open_error)?;

        Ok(Self { conn })
    }

    /// Inserts one measurement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Query`] if the insert fails.
    pub fn save(&self, measurement: &Measurement) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO measurements (component, temperature, timestamp) VALUES (?1, ?2, ?3)",
                params![
                    measurement.component,
                    measurement.temperature,
                    measurement.timestamp
                ],
            )
            .map_err(SqliteError::Query)?;
        Ok(())
    }

    /// Loads the newest `limit` measurements of `component`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Query`] if the query fails.
    pub fn load(&self, component: &str, limit: usize) -> Result<Vec<Measurement>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self
            .conn
            .prepare(
                "SELECT component, temperature, timestamp FROM measurements
                 WHERE component = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2",
            )
            .map_err(SqliteError::Query)?;

        let rows = stmt
            .query_map(params![component, limit], |row| {
                Ok(Measurement {
                    component: row.get(0)?,
                    temperature: row.get(1)?,
                    timestamp: row.get(2)?,
                })
            })
            .map_err(SqliteError::Query)?;

        let records = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(SqliteError::Query)?;
        Ok(records)
    }
}
