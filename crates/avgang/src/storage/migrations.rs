//! Database migration system for the departure table.
//!
//! Version 1 is the base schema. Version 2 rewrites retired status and type
//! labels in place, using the same normalization tables as JSON loading.

use rusqlite::Connection;
use tracing::info;

use crate::departure::TransportType;
use crate::error::{Error, Result};
use crate::status::Status;

use super::schema::SCHEMA_STATEMENTS;

/// The current schema version.
pub const CURRENT_VERSION: i32 = 2;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Initialize the database schema.
///
/// Creates all tables and indexes if they don't exist, then runs any
/// pending migrations to bring the schema up to the current version.
///
/// # Errors
///
/// Returns an error if schema creation or migration fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let version = get_schema_version(conn)?;
    if version < CURRENT_VERSION {
        run_migrations(conn, version)?;
    }

    Ok(())
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (fresh database).
pub(crate) fn get_schema_version(conn: &Connection) -> Result<i32> {
    let result: std::result::Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
    );

    match result {
        Ok(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// Set the schema version in the database.
pub(crate) fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

/// Run migrations from the given version to the current version.
fn run_migrations(conn: &Connection, from_version: i32) -> Result<()> {
    let mut current = from_version;

    while current < CURRENT_VERSION {
        current += 1;
        run_migration(conn, current)?;
    }

    set_schema_version(conn, CURRENT_VERSION)?;
    Ok(())
}

/// Run a specific migration version.
fn run_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        2 => migrate_v2(conn),
        _ => Err(Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        }),
    }
}

/// Migration to version 1 (initial schema, created by `SCHEMA_STATEMENTS`).
fn migrate_v1(conn: &Connection) -> Result<()> {
    set_schema_version(conn, 1)?;
    Ok(())
}

/// Migration to version 2: canonical status and type labels.
fn migrate_v2(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    let rows: Vec<(i64, String, String)> = {
        let mut stmt = tx.prepare("SELECT id, status, transport_type FROM departures")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows
    };

    let mut rewritten = 0usize;
    for (id, status, transport_type) in rows {
        let new_status = Status::parse_label(&status).filter(|(_, legacy)| *legacy);
        let new_type = TransportType::parse_label(&transport_type).filter(|(_, legacy)| *legacy);
        if new_status.is_none() && new_type.is_none() {
            continue;
        }
        let status_label = new_status.map_or(status, |(s, _)| s.label().to_string());
        let type_label = new_type.map_or(transport_type, |(t, _)| t.label().to_string());
        tx.execute(
            "UPDATE departures SET status = ?1, transport_type = ?2 WHERE id = ?3",
            (status_label, type_label, id),
        )?;
        rewritten += 1;
    }

    set_schema_version(&tx, 2)?;
    tx.commit()?;

    if rewritten > 0 {
        info!("Rewrote legacy labels on {} departures", rewritten);
    }
    Ok(())
}
