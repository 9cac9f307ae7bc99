//! Error types for avgang.
//!
//! Validation errors (`MissingField`, `InvalidFormat`, `DuplicateUnit`,
//! `NotFound`, `InvalidId`, `InvalidImportPayload`) block a single operation
//! and leave the registry untouched. Storage errors report a failed write or
//! read of the backing file or table; the in-memory record set stays as it was
//! before the failed call.

use std::path::PathBuf;
use thiserror::Error;

use crate::departure::DepartureId;

/// The main error type for avgang operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// A required field was absent or blank.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// The unit number does not match the configured pattern.
    #[error("unit number '{unit_number}' does not match the pattern {pattern}")]
    InvalidFormat {
        /// The normalized unit number that was rejected.
        unit_number: String,
        /// The pattern it was checked against.
        pattern: String,
    },

    /// Another record already uses this unit number.
    #[error("unit number '{unit_number}' is already registered")]
    DuplicateUnit {
        /// The normalized unit number.
        unit_number: String,
    },

    /// No record has the given id.
    #[error("no departure with id {id}")]
    NotFound {
        /// The id that was looked up.
        id: DepartureId,
    },

    /// A caller-chosen id lies outside `1..=DepartureId::MAX`.
    #[error("departure id {id} is out of range")]
    InvalidId {
        /// The rejected id.
        id: DepartureId,
    },

    /// An import payload was not a list of well-formed records.
    #[error("invalid import payload: {message}")]
    InvalidImportPayload {
        /// Description of what is wrong with the payload.
        message: String,
    },

    /// Every id up to `DepartureId::MAX` has been handed out.
    #[error("no departure ids left")]
    IdsExhausted,

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// The data file exists but could not be understood.
    #[error("data file {path} is corrupt: {message}")]
    StorageCorrupt {
        /// Path to the data file.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Service Errors ===
    /// The registry task behind a handle is no longer running.
    #[error("registry service has stopped")]
    ServiceStopped,
}

/// A specialized Result type for avgang operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a missing field error.
    #[must_use]
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Create an invalid import payload error.
    #[must_use]
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidImportPayload {
            message: message.into(),
        }
    }

    /// Check if this error rejected user input rather than failing I/O.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::InvalidFormat { .. }
                | Self::DuplicateUnit { .. }
                | Self::NotFound { .. }
                | Self::InvalidId { .. }
                | Self::InvalidImportPayload { .. }
        )
    }

    /// Check if this error comes from the persistence layer.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::DatabaseOpen { .. }
                | Self::DatabaseQuery(_)
                | Self::DatabaseMigration { .. }
                | Self::StorageCorrupt { .. }
                | Self::Io(_)
                | Self::DirectoryCreate { .. }
                | Self::Json(_)
                | Self::Csv(_)
        )
    }
}
