//! Storage layer for avgang.
//!
//! The registry keeps its records in memory and hands every mutation to a
//! [`Backend`]. File backends rewrite the full snapshot; the `SQLite` backend
//! applies the change row by row inside a transaction.

pub mod json_file;
pub mod memory;
pub mod migrations;
pub mod schema;
pub mod sqlite;

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::config::{Config, StorageBackend};
use crate::departure::{Departure, DepartureId};
use crate::error::Result;
use crate::record::DepartureRecord;

pub use json_file::JsonFileBackend;
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

/// A single mutation, as seen by a backend.
#[derive(Debug, Clone, Copy)]
pub enum Change<'a> {
    /// A new record was appended.
    Insert(&'a Departure),
    /// An existing record was replaced field by field.
    Update(&'a Departure),
    /// A record was removed.
    Delete(DepartureId),
    /// Every record was removed.
    Clear,
    /// The whole set was replaced by the snapshot.
    Replace,
    /// Records were appended in order.
    Append(&'a [Departure]),
}

impl Change<'_> {
    /// Short name used in log lines.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
            Self::Clear => "clear",
            Self::Replace => "replace",
            Self::Append(_) => "append",
        }
    }
}

/// Durable storage behind a registry.
pub trait Backend: Send + fmt::Debug {
    /// Backend kind, for logs and `config show`.
    fn name(&self) -> &'static str;

    /// Where the data lives.
    fn location(&self) -> &Path;

    /// Read every stored record, in list order.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the data cannot be read or parsed.
    fn load(&self) -> Result<Vec<DepartureRecord>>;

    /// Persist a change. `snapshot` is the complete record set after it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails; the stored data is then
    /// left as it was before the call.
    fn apply(&mut self, change: &Change<'_>, snapshot: &[Departure]) -> Result<()>;
}

/// Open the backend selected by the configuration.
///
/// # Errors
///
/// Returns a storage error if the file or database cannot be opened.
pub fn open_backend(config: &Config) -> Result<Box<dyn Backend>> {
    let path = config.data_path();
    debug!("Opening {} storage", config.storage.backend);
    let backend: Box<dyn Backend> = match config.storage.backend {
        StorageBackend::Json => Box::new(JsonFileBackend::open(path)?),
        StorageBackend::Sqlite => Box::new(SqliteBackend::open(path)?),
        StorageBackend::Memory => Box::new(MemoryBackend::new()),
    };
    Ok(backend)
}
