//! Departure id allocation.

use chrono::Utc;

use crate::departure::DepartureId;
use crate::error::{Error, Result};

/// Hands out strictly increasing departure ids.
///
/// The allocator starts at the current wall-clock time in milliseconds and is
/// moved past every id it observes, so ids stay unique for rapid successive
/// inserts and are not handed out again after a restart.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    last: i64,
}

impl IdAllocator {
    /// Create an allocator seeded from the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_after(Utc::now().timestamp_millis().max(0))
    }

    /// Create an allocator whose first id is `last + 1`.
    #[must_use]
    pub fn starting_after(last: i64) -> Self {
        Self { last }
    }

    /// Make sure `id` is never allocated again.
    pub fn observe(&mut self, id: DepartureId) {
        self.last = self.last.max(id.get());
    }

    /// Allocate the next id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdsExhausted`] once `DepartureId::MAX` has been
    /// handed out or observed.
    pub fn allocate(&mut self) -> Result<DepartureId> {
        let next = self
            .last
            .checked_add(1)
            .and_then(DepartureId::checked)
            .ok_or(Error::IdsExhausted)?;
        self.last = next.get();
        Ok(next)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
