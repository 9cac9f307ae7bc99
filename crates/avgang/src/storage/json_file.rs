//! JSON array file storage.
//!
//! The whole record set is rewritten on every change. Writes go to a
//! temporary file in the same directory which is then renamed over the data
//! file, so a crash mid-write never leaves a truncated file behind.

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::departure::Departure;
use crate::error::{Error, Result};
use crate::record::DepartureRecord;

use super::{Backend, Change};

/// Stores departures as a pretty-printed JSON array.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Use the file at `path`, creating parent directories if needed.
    ///
    /// The file itself is created on the first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Using data file {}", path.display());
        Ok(Self { path })
    }

    fn corrupt(&self, message: impl Into<String>) -> Error {
        Error::StorageCorrupt {
            path: self.path.clone(),
            message: message.into(),
        }
    }

    fn write_snapshot(&self, snapshot: &[Departure]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, snapshot)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

impl Backend for JsonFileBackend {
    fn name(&self) -> &'static str {
        "json"
    }

    fn location(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<DepartureRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No data file at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let content = content.trim_start_matches('\u{feff}');
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| self.corrupt(e.to_string()))?;
        if !value.is_array() {
            return Err(self.corrupt("expected a JSON array of departures"));
        }
        let records: Vec<DepartureRecord> =
            serde_json::from_value(value).map_err(|e| self.corrupt(e.to_string()))?;

        debug!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn apply(&mut self, change: &Change<'_>, snapshot: &[Departure]) -> Result<()> {
        self.write_snapshot(snapshot)?;
        debug!(
            "Wrote {} records to {} after {}",
            snapshot.len(),
            self.path.display(),
            change.kind()
        );
        Ok(())
    }
}
