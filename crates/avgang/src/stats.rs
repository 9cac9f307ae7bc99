//! Summary statistics over a set of departures.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::departure::{Departure, Destination, TransportType};
use crate::status::Status;

/// Counts shown on the overview.
///
/// Every vocabulary value is present in the maps, with zero when unused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Number of departures counted.
    pub total: usize,
    /// Departures per transport type.
    pub by_type: BTreeMap<TransportType, usize>,
    /// Departures per status.
    pub by_status: BTreeMap<Status, usize>,
    /// Departures per destination.
    pub by_destination: BTreeMap<Destination, usize>,
    /// Destination with the most departures; ties go to the first in label order.
    pub top_destination: Option<Destination>,
}

impl RegistryStats {
    /// Count the given departures.
    #[must_use]
    pub fn from_departures<'a>(departures: impl IntoIterator<Item = &'a Departure>) -> Self {
        let mut by_type: BTreeMap<TransportType, usize> =
            TransportType::ALL.into_iter().map(|t| (t, 0)).collect();
        let mut by_status: BTreeMap<Status, usize> =
            Status::ALL.into_iter().map(|s| (s, 0)).collect();
        let mut by_destination: BTreeMap<Destination, usize> =
            Destination::ALL.into_iter().map(|d| (d, 0)).collect();
        let mut total = 0;

        for departure in departures {
            total += 1;
            *by_type.entry(departure.transport_type).or_default() += 1;
            *by_status.entry(departure.status).or_default() += 1;
            *by_destination.entry(departure.destination).or_default() += 1;
        }

        // Iteration is in label order; only a strictly larger count replaces the leader.
        let top_destination = by_destination
            .iter()
            .filter(|(_, count)| **count > 0)
            .fold(None, |best: Option<(Destination, usize)>, (d, count)| match best {
                Some((_, best_count)) if best_count >= *count => best,
                _ => Some((*d, *count)),
            })
            .map(|(d, _)| d);

        Self {
            total,
            by_type,
            by_status,
            by_destination,
            top_destination,
        }
    }

    /// Count for one status.
    #[must_use]
    pub fn status_count(&self, status: Status) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}
