//! Core departure types for avgang.
//!
//! This module defines the record stored by the registry and the closed
//! vocabularies (destinations, transport types, times of day) its fields use.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::Status;

/// A label that does not belong to a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseLabelError {
    /// Which vocabulary was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseLabelError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Unique, immutable identifier of a departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartureId(i64);

impl DepartureId {
    /// Largest id the registry hands out or accepts (2^53 - 1).
    ///
    /// JSON readers that store numbers as doubles keep every id up to here
    /// exact.
    pub const MAX: i64 = 9_007_199_254_740_991;

    /// Wrap a raw id value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Wrap `value` if it lies in `1..=DepartureId::MAX`.
    #[must_use]
    pub const fn checked(value: i64) -> Option<Self> {
        if value >= 1 && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Whether this id lies in the range the registry hands out.
    #[must_use]
    pub const fn is_usable(self) -> bool {
        Self::checked(self.0).is_some()
    }

    /// The raw id value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DepartureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DepartureId {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .ok()
            .and_then(Self::checked)
            .ok_or_else(|| ParseLabelError::new("departure id", s))
    }
}

/// The stations departures can be bound for.
///
/// Variants are declared in label order, so the derived ordering matches
/// sorting by station name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Destination {
    /// FØRDE
    Forde,
    /// HAUGESUND
    Haugesund,
    /// MOLDE
    Molde,
    /// STAVANGER
    Stavanger,
    /// TRONDHEIM
    Trondheim,
    /// ÅLESUND
    Alesund,
}

impl Destination {
    /// Every destination, in label order.
    pub const ALL: [Self; 6] = [
        Self::Forde,
        Self::Haugesund,
        Self::Molde,
        Self::Stavanger,
        Self::Trondheim,
        Self::Alesund,
    ];

    /// The station name as stored and displayed.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Forde => "FØRDE",
            Self::Haugesund => "HAUGESUND",
            Self::Molde => "MOLDE",
            Self::Stavanger => "STAVANGER",
            Self::Trondheim => "TRONDHEIM",
            Self::Alesund => "ÅLESUND",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Destination {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|d| d.label() == wanted)
            .ok_or_else(|| ParseLabelError::new("destination", s))
    }
}

impl TryFrom<String> for Destination {
    type Error = ParseLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Destination> for String {
    fn from(value: Destination) -> Self {
        value.label().to_string()
    }
}

/// The kind of transport unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TransportType {
    /// Train (Tog).
    Train,
    /// Truck (Bil).
    Truck,
    /// Trailer (Tralle).
    Trailer,
    /// Module (Modul).
    Module,
}

impl TransportType {
    /// Every transport type.
    pub const ALL: [Self; 4] = [Self::Train, Self::Truck, Self::Trailer, Self::Module];

    /// Canonical label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Train => "Train",
            Self::Truck => "Truck",
            Self::Trailer => "Trailer",
            Self::Module => "Module",
        }
    }

    /// Norwegian label used by older data files.
    #[must_use]
    pub const fn legacy_label(self) -> &'static str {
        match self {
            Self::Train => "Tog",
            Self::Truck => "Bil",
            Self::Trailer => "Tralle",
            Self::Module => "Modul",
        }
    }

    /// Unit-number prefix used for this kind of unit.
    #[must_use]
    pub const fn unit_prefix(self) -> &'static str {
        match self {
            Self::Train => "TOG",
            Self::Truck => "BIL",
            Self::Trailer => "TRL",
            Self::Module => "MOD",
        }
    }

    /// Parse a label, reporting whether it came from the legacy vocabulary.
    #[must_use]
    pub fn parse_label(s: &str) -> Option<(Self, bool)> {
        let s = s.trim();
        Self::ALL.into_iter().find_map(|t| {
            if t.label().eq_ignore_ascii_case(s) {
                Some((t, false))
            } else if t.legacy_label().eq_ignore_ascii_case(s) {
                Some((t, true))
            } else {
                None
            }
        })
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TransportType {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_label(s)
            .map(|(t, _)| t)
            .ok_or_else(|| ParseLabelError::new("transport type", s))
    }
}

impl TryFrom<String> for TransportType {
    type Error = ParseLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransportType> for String {
    fn from(value: TransportType) -> Self {
        value.label().to_string()
    }
}

/// Scheduled time of day, always rendered as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DepartureTime(NaiveTime);

impl DepartureTime {
    /// Build a time from hour and minute.
    #[must_use]
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Hour of day (0-23).
    #[must_use]
    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    /// Minute of hour (0-59).
    #[must_use]
    pub fn minute(self) -> u32 {
        self.0.minute()
    }
}

impl fmt::Display for DepartureTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for DepartureTime {
    type Err = ParseLabelError;

    /// Accepts `H:MM`, `HH:MM` and `HH:MM:SS`; seconds are dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseLabelError::new("time", s);
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        let mut parts = s.trim().split(':');
        let hour = parts.next().ok_or_else(err)?;
        let minute = parts.next().ok_or_else(err)?;
        if let Some(second) = parts.next() {
            if second.len() != 2
                || !digits(second)
                || second.parse::<u32>().map_or(true, |v| v > 59)
            {
                return Err(err());
            }
        }
        if parts.next().is_some() || hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(err());
        }
        if !digits(hour) || !digits(minute) {
            return Err(err());
        }
        let hour = hour.parse().map_err(|_| err())?;
        let minute = minute.parse().map_err(|_| err())?;
        Self::from_hm(hour, minute).ok_or_else(err)
    }
}

impl TryFrom<String> for DepartureTime {
    type Error = ParseLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DepartureTime> for String {
    fn from(value: DepartureTime) -> Self {
        value.to_string()
    }
}

/// A registered departure.
///
/// Serializes to the persisted record shape (`unitNumber`, `time`, `type`,
/// `null` for an absent comment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Departure {
    /// Assigned at creation, never changed.
    pub id: DepartureId,
    /// Uppercase unit number, unique within the registry.
    pub unit_number: String,
    /// Where the unit is going.
    pub destination: Destination,
    /// Scheduled time of day.
    #[serde(rename = "time")]
    pub departure_time: DepartureTime,
    /// Loading gate.
    pub gate: String,
    /// Kind of unit.
    #[serde(rename = "type")]
    pub transport_type: TransportType,
    /// Current status.
    pub status: Status,
    /// Optional free text.
    pub comment: Option<String>,
}

/// Unvalidated departure fields, as submitted by a form or the CLI.
///
/// Enum-valued fields are optional so that an unselected value can be
/// reported as a missing field rather than silently defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartureInput {
    /// Unit number as typed.
    pub unit_number: String,
    /// Selected destination.
    pub destination: Option<Destination>,
    /// Selected time.
    pub departure_time: Option<DepartureTime>,
    /// Gate as typed.
    pub gate: String,
    /// Selected transport type.
    pub transport_type: Option<TransportType>,
    /// Selected status.
    pub status: Option<Status>,
    /// Optional comment.
    pub comment: Option<String>,
}

impl DepartureInput {
    /// Create a fully specified input without a comment.
    #[must_use]
    pub fn new(
        unit_number: impl Into<String>,
        destination: Destination,
        departure_time: DepartureTime,
        gate: impl Into<String>,
        transport_type: TransportType,
        status: Status,
    ) -> Self {
        Self {
            unit_number: unit_number.into(),
            destination: Some(destination),
            departure_time: Some(departure_time),
            gate: gate.into(),
            transport_type: Some(transport_type),
            status: Some(status),
            comment: None,
        }
    }

    /// Attach a comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

impl From<&Departure> for DepartureInput {
    fn from(d: &Departure) -> Self {
        Self {
            unit_number: d.unit_number.clone(),
            destination: Some(d.destination),
            departure_time: Some(d.departure_time),
            gate: d.gate.clone(),
            transport_type: Some(d.transport_type),
            status: Some(d.status),
            comment: d.comment.clone(),
        }
    }
}
