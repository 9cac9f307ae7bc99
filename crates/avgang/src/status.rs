//! Departure status and the label normalization table.
//!
//! Status labels drifted between releases of the registry ("I lager" became
//! "Lager", "Planlagt" became "Planlaget", some screens used uppercase
//! variants). Every label ever written is listed in [`LEGACY_STATUS_LABELS`]
//! and mapped onto one canonical [`Status`]. Loading and importing go through
//! this table and nothing else.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::departure::ParseLabelError;

/// Where a departure is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Status {
    /// Handed over at the destination.
    Delivered,
    /// Scheduled but not yet started.
    Planned,
    /// Waiting in storage.
    InStorage,
    /// Currently being loaded.
    Loading,
}

/// Labels from older data mapped to their canonical status.
///
/// Matching is case-insensitive.
pub const LEGACY_STATUS_LABELS: &[(&str, Status)] = &[
    ("Levert", Status::Delivered),
    ("I lager", Status::InStorage),
    ("Lager", Status::InStorage),
    ("Planlagt", Status::Planned),
    ("Planlaget", Status::Planned),
    ("Underlasting", Status::Loading),
    ("Laster nå", Status::Loading),
];

impl Status {
    /// Every status.
    pub const ALL: [Self; 4] = [Self::Delivered, Self::Planned, Self::InStorage, Self::Loading];

    /// Canonical label, as persisted.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Delivered => "Delivered",
            Self::Planned => "Planned",
            Self::InStorage => "InStorage",
            Self::Loading => "Loading",
        }
    }

    /// Current Norwegian display label.
    #[must_use]
    pub const fn display_label(self) -> &'static str {
        match self {
            Self::Delivered => "Levert",
            Self::Planned => "Planlaget",
            Self::InStorage => "Lager",
            Self::Loading => "Underlasting",
        }
    }

    /// Parse a label, reporting whether it came from the legacy table.
    #[must_use]
    pub fn parse_label(s: &str) -> Option<(Self, bool)> {
        let wanted = s.trim().to_lowercase();
        if let Some(status) = Self::ALL
            .into_iter()
            .find(|st| st.label().to_lowercase() == wanted)
        {
            return Some((status, false));
        }
        LEGACY_STATUS_LABELS
            .iter()
            .find(|(label, _)| label.to_lowercase() == wanted)
            .map(|(_, status)| (*status, true))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_label(s)
            .map(|(st, _)| st)
            .ok_or_else(|| ParseLabelError::new("status", s))
    }
}

impl TryFrom<String> for Status {
    type Error = ParseLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        value.label().to_string()
    }
}
