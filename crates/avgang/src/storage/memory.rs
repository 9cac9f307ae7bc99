//! Session-only storage.

use std::path::{Path, PathBuf};

use crate::departure::Departure;
use crate::error::Result;
use crate::record::DepartureRecord;

use super::{Backend, Change};

/// Keeps the last snapshot in memory. Nothing survives the process.
#[derive(Debug)]
pub struct MemoryBackend {
    location: PathBuf,
    records: Vec<DepartureRecord>,
}

impl MemoryBackend {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// A store that starts with the given records, as if loaded from disk.
    #[must_use]
    pub fn with_records(records: Vec<DepartureRecord>) -> Self {
        Self {
            location: PathBuf::from(":memory:"),
            records,
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn location(&self) -> &Path {
        &self.location
    }

    fn load(&self) -> Result<Vec<DepartureRecord>> {
        Ok(self.records.clone())
    }

    fn apply(&mut self, _change: &Change<'_>, snapshot: &[Departure]) -> Result<()> {
        self.records = snapshot.iter().map(DepartureRecord::from).collect();
        Ok(())
    }
}
