//! Lenient persisted record shape and its normalization.
//!
//! Data files written by older releases use timestamp ids (sometimes with a
//! fractional part), Norwegian type labels and retired status labels.
//! [`DepartureRecord`] accepts all of that; [`DepartureRecord::normalize`]
//! turns it into canonical field values.

use serde::{Deserialize, Serialize};

use crate::departure::{Departure, DepartureId, DepartureTime, Destination, TransportType};
use crate::rules::{normalize_comment, normalize_unit_number};
use crate::status::Status;

/// A record id as found in a data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Integer id.
    Int(i64),
    /// Floating point id (legacy timestamps).
    Float(f64),
    /// Id stored as text.
    Text(String),
}

impl RecordId {
    /// The id as a departure id, when it is a whole number in
    /// `1..=DepartureId::MAX`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    pub fn as_departure_id(&self) -> Option<DepartureId> {
        let raw = match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 && *v >= 1.0 && *v < 9.0e15 => Some(*v as i64),
            Self::Float(_) => None,
            Self::Text(s) => s.trim().parse().ok(),
        };
        raw.and_then(DepartureId::checked)
    }
}

/// A departure as stored in a JSON file or import payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartureRecord {
    /// Id, if the record has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Unit number.
    pub unit_number: String,
    /// Destination label.
    pub destination: String,
    /// Time of day.
    pub time: String,
    /// Gate.
    pub gate: String,
    /// Transport type label.
    #[serde(rename = "type")]
    pub transport_type: String,
    /// Status label.
    pub status: String,
    /// Optional comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// A record after label normalization, still waiting for a final id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    /// Id carried by the record, if usable.
    pub id: Option<DepartureId>,
    /// Canonical departure fields; `id` is filled in by [`NormalizedRecord::into_departure`].
    pub unit_number: String,
    /// Destination.
    pub destination: Destination,
    /// Time of day.
    pub departure_time: DepartureTime,
    /// Gate.
    pub gate: String,
    /// Transport type.
    pub transport_type: TransportType,
    /// Status.
    pub status: Status,
    /// Comment.
    pub comment: Option<String>,
    /// Whether any legacy value was rewritten.
    pub migrated: bool,
}

impl NormalizedRecord {
    /// Attach the final id.
    #[must_use]
    pub fn into_departure(self, id: DepartureId) -> Departure {
        Departure {
            id,
            unit_number: self.unit_number,
            destination: self.destination,
            departure_time: self.departure_time,
            gate: self.gate,
            transport_type: self.transport_type,
            status: self.status,
            comment: self.comment,
        }
    }
}

impl DepartureRecord {
    /// Normalize labels and free-text fields.
    ///
    /// # Errors
    ///
    /// Returns a description of the first field that cannot be understood.
    pub fn normalize(&self) -> std::result::Result<NormalizedRecord, String> {
        let unit_number = normalize_unit_number(&self.unit_number);
        if unit_number.is_empty() {
            return Err("unitNumber is blank".to_string());
        }
        let gate = self.gate.trim();
        if gate.is_empty() {
            return Err("gate is blank".to_string());
        }
        let destination: Destination = self.destination.parse().map_err(|e| format!("{e}"))?;
        let departure_time: DepartureTime = self.time.parse().map_err(|e| format!("{e}"))?;
        let (transport_type, legacy_type) = TransportType::parse_label(&self.transport_type)
            .ok_or_else(|| format!("unknown transport type '{}'", self.transport_type))?;
        let (status, legacy_status) = Status::parse_label(&self.status)
            .ok_or_else(|| format!("unknown status '{}'", self.status))?;

        // Older writers serialized a missing comment as the text "None".
        let comment = normalize_comment(self.comment.as_deref().filter(|c| *c != "None"));

        let migrated = legacy_type
            || legacy_status
            || unit_number != self.unit_number
            || comment.as_deref() != self.comment.as_deref()
            || departure_time.to_string() != self.time
            || destination.label() != self.destination;

        Ok(NormalizedRecord {
            id: self.id.as_ref().and_then(RecordId::as_departure_id),
            unit_number,
            destination,
            departure_time,
            gate: gate.to_string(),
            transport_type,
            status,
            comment,
            migrated,
        })
    }
}

impl From<&Departure> for DepartureRecord {
    fn from(d: &Departure) -> Self {
        Self {
            id: Some(RecordId::Int(d.id.get())),
            unit_number: d.unit_number.clone(),
            destination: d.destination.label().to_string(),
            time: d.departure_time.to_string(),
            gate: d.gate.clone(),
            transport_type: d.transport_type.label().to_string(),
            status: d.status.label().to_string(),
            comment: d.comment.clone(),
        }
    }
}
