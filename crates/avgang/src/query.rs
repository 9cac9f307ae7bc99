//! Search, filter and sort over departures.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::departure::{Departure, Destination};

/// Filter applied by `find`, `export` and `stats`.
///
/// Both parts must match. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Case-insensitive substring matched against the unit number,
    /// destination, type, status or comment.
    pub search: Option<String>,
    /// Exact destination.
    pub destination: Option<Destination>,
}

impl Filter {
    /// A filter that matches everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to records containing `term`.
    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() {
            None
        } else {
            Some(term)
        };
        self
    }

    /// Restrict to one destination.
    #[must_use]
    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Whether this filter matches everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.destination.is_none()
    }

    /// Check a single departure.
    #[must_use]
    pub fn matches(&self, departure: &Departure) -> bool {
        if let Some(destination) = self.destination {
            if departure.destination != destination {
                return false;
            }
        }
        let Some(term) = &self.search else {
            return true;
        };
        let term = term.trim().to_lowercase();
        let contains = |field: &str| field.to_lowercase().contains(&term);

        contains(&departure.unit_number)
            || contains(departure.destination.label())
            || contains(departure.transport_type.label())
            || contains(departure.transport_type.legacy_label())
            || contains(departure.status.label())
            || contains(departure.status.display_label())
            || departure.comment.as_deref().is_some_and(contains)
    }
}

/// Column to sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Chronological by time of day.
    Time,
    /// Lexicographic by station name.
    Destination,
    /// Lexicographic by canonical status label.
    Status,
}

impl SortKey {
    fn compare(self, a: &Departure, b: &Departure) -> Ordering {
        match self {
            Self::Time => a.departure_time.cmp(&b.departure_time),
            Self::Destination => a.destination.label().cmp(b.destination.label()),
            Self::Status => a.status.label().cmp(b.status.label()),
        }
    }
}

/// Stable sort by a single key.
pub fn sort_departures(records: &mut [Departure], key: SortKey) {
    records.sort_by(|a, b| key.compare(a, b));
}

/// Departures matching `filter`, in their original order.
#[must_use]
pub fn filter_departures(records: &[Departure], filter: &Filter) -> Vec<Departure> {
    records
        .iter()
        .filter(|d| filter.matches(d))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::departure::{DepartureId, TransportType};
    use crate::status::Status;

    fn departure(id: i64, unit: &str, destination: Destination, time: &str) -> Departure {
        Departure {
            id: DepartureId::new(id),
            unit_number: unit.to_string(),
            destination,
            departure_time: time.parse().unwrap(),
            gate: "G1".to_string(),
            transport_type: TransportType::Train,
            status: Status::Planned,
            comment: None,
        }
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let records = vec![
            departure(1, "TOG1001", Destination::Molde, "08:00"),
            departure(2, "TOG1002", Destination::Forde, "09:00"),
        ];
        assert!(Filter::all().is_empty());
        assert_eq!(filter_departures(&records, &Filter::all()), records);
    }

    #[test]
    fn test_destination_filter_preserves_order() {
        let records = vec![
            departure(1, "TOG1001", Destination::Trondheim, "08:00"),
            departure(2, "TOG1002", Destination::Molde, "09:00"),
            departure(3, "TOG1003", Destination::Trondheim, "07:00"),
            departure(4, "TOG1004", Destination::Alesund, "10:00"),
            departure(5, "TOG1005", Destination::Trondheim, "06:00"),
        ];
        let found = filter_departures(&records, &Filter::all().destination(Destination::Trondheim));
        let ids: Vec<i64> = found.iter().map(|d| d.id.get()).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn test_search_covers_all_text_fields() {
        let mut record = departure(1, "BIL5678", Destination::Alesund, "08:00");
        record.transport_type = TransportType::Truck;
        record.status = Status::InStorage;
        record.comment = Some("Forsinket fra Oslo".to_string());

        for term in ["bil56", "ålesund", "truck", "bil", "instorage", "lager", "oslo"] {
            assert!(Filter::all().search(term).matches(&record), "term {term}");
        }
        assert!(!Filter::all().search("molde").matches(&record));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        assert!(Filter::all().search("   ").search.is_none());
    }

    #[test]
    fn test_search_and_destination_combine() {
        let records = vec![
            departure(1, "TOG1001", Destination::Trondheim, "08:00"),
            departure(2, "TOG2002", Destination::Molde, "09:00"),
            departure(3, "TOG2003", Destination::Trondheim, "07:00"),
        ];
        let filter = Filter::all().search("tog2").destination(Destination::Trondheim);
        let found = filter_departures(&records, &filter);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].unit_number, "TOG2003");
    }

    #[test]
    fn test_sort_by_time_is_chronological() {
        let mut records = vec![
            departure(1, "A", Destination::Molde, "23:50"),
            departure(2, "B", Destination::Molde, "00:10"),
            departure(3, "C", Destination::Molde, "12:00"),
            departure(4, "D", Destination::Molde, "9:00"),
            departure(5, "E", Destination::Molde, "10:00"),
        ];
        sort_departures(&mut records, SortKey::Time);
        let times: Vec<String> = records.iter().map(|d| d.departure_time.to_string()).collect();
        assert_eq!(times, vec!["00:10", "09:00", "10:00", "12:00", "23:50"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut records = vec![
            departure(1, "A", Destination::Trondheim, "08:00"),
            departure(2, "B", Destination::Molde, "08:00"),
            departure(3, "C", Destination::Trondheim, "08:00"),
        ];
        sort_departures(&mut records, SortKey::Destination);
        let ids: Vec<i64> = records.iter().map(|d| d.id.get()).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_sort_by_status_label() {
        let mut records = vec![
            departure(1, "A", Destination::Molde, "08:00"),
            departure(2, "B", Destination::Molde, "08:00"),
            departure(3, "C", Destination::Molde, "08:00"),
        ];
        records[0].status = Status::Planned;
        records[1].status = Status::Delivered;
        records[2].status = Status::Loading;
        sort_departures(&mut records, SortKey::Status);
        let statuses: Vec<&str> = records.iter().map(|d| d.status.label()).collect();
        assert_eq!(statuses, vec!["Delivered", "Loading", "Planned"]);
    }
}
