//! `SQLite` storage.
//!
//! One row per departure in the `departures` table. Each change runs in a
//! single transaction, so a failed statement leaves the table untouched.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, Transaction};
use tracing::{debug, info};

use crate::departure::Departure;
use crate::error::{Error, Result};
use crate::record::{DepartureRecord, RecordId};

use super::{migrations, Backend, Change};

const SELECT_DEPARTURES: &str = r"
SELECT id, unit_number, destination, departure_time, gate, transport_type, status, comment
FROM departures ORDER BY position, id
";

const INSERT_DEPARTURE: &str = r"
INSERT INTO departures
    (id, unit_number, destination, departure_time, gate, transport_type, status, comment, position)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
";

/// Departures stored in a `SQLite` database.
#[derive(Debug)]
pub struct SqliteBackend {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl SqliteBackend {
    /// Open or create a database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// then brings the schema up to date.
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

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Number of stored rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM departures", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Schema version recorded in the metadata table.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn schema_version(&self) -> Result<i32> {
        migrations::get_schema_version(&self.conn)
    }

    fn next_position(tx: &Transaction<'_>) -> Result<i64> {
        let position = tx.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM departures",
            [],
            |row| row.get(0),
        )?;
        Ok(position)
    }

    fn insert(tx: &Transaction<'_>, departure: &Departure, position: i64) -> Result<()> {
        tx.execute(
            INSERT_DEPARTURE,
            params![
                departure.id.get(),
                departure.unit_number,
                departure.destination.label(),
                departure.departure_time.to_string(),
                departure.gate,
                departure.transport_type.label(),
                departure.status.label(),
                departure.comment,
                position,
            ],
        )?;
        Ok(())
    }

    fn update(tx: &Transaction<'_>, departure: &Departure) -> Result<()> {
        tx.execute(
            r"
            UPDATE departures
            SET unit_number = ?2, destination = ?3, departure_time = ?4, gate = ?5,
                transport_type = ?6, status = ?7, comment = ?8
            WHERE id = ?1
            ",
            params![
                departure.id.get(),
                departure.unit_number,
                departure.destination.label(),
                departure.departure_time.to_string(),
                departure.gate,
                departure.transport_type.label(),
                departure.status.label(),
                departure.comment,
            ],
        )?;
        Ok(())
    }

    /// Convert a database row to a record.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<DepartureRecord> {
        Ok(DepartureRecord {
            id: Some(RecordId::Int(row.get(0)?)),
            unit_number: row.get(1)?,
            destination: row.get(2)?,
            time: row.get(3)?,
            gate: row.get(4)?,
            transport_type: row.get(5)?,
            status: row.get(6)?,
            comment: row.get(7)?,
        })
    }
}

impl Backend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn location(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<DepartureRecord>> {
        let mut stmt = self.conn.prepare(SELECT_DEPARTURES)?;
        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!("Loaded {} rows from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn apply(&mut self, change: &Change<'_>, snapshot: &[Departure]) -> Result<()> {
        let tx = self.conn.transaction()?;

        match change {
            Change::Insert(departure) => {
                let position = Self::next_position(&tx)?;
                Self::insert(&tx, departure, position)?;
            }
            Change::Update(departure) => Self::update(&tx, departure)?,
            Change::Delete(id) => {
                tx.execute("DELETE FROM departures WHERE id = ?1", [id.get()])?;
            }
            Change::Clear => {
                tx.execute("DELETE FROM departures", [])?;
            }
            Change::Replace => {
                tx.execute("DELETE FROM departures", [])?;
                for (position, departure) in (1_i64..).zip(snapshot) {
                    Self::insert(&tx, departure, position)?;
                }
            }
            Change::Append(departures) => {
                let start = Self::next_position(&tx)?;
                for (position, departure) in (start..).zip(departures.iter()) {
                    Self::insert(&tx, departure, position)?;
                }
            }
        }

        tx.commit()?;
        debug!("Applied {} to {}", change.kind(), self.path.display());
        Ok(())
    }
}
