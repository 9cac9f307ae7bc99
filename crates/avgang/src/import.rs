//! Bulk import of departure records.
//!
//! A payload is accepted or rejected as a whole: every element must be an
//! object with all required keys and understood labels before anything is
//! added. Legacy labels are normalized on the way in.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::departure::{Departure, DepartureId};
use crate::error::{Error, Result};
use crate::ids::IdAllocator;
use crate::record::{DepartureRecord, NormalizedRecord};

/// Keys every imported element must carry.
const REQUIRED_KEYS: [&str; 6] = ["unitNumber", "destination", "time", "gate", "type", "status"];

/// What happens to the existing records on import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportPolicy {
    /// Drop the current set and keep only the imported records.
    Replace,
    /// Keep the current set and add imported records that are not already present.
    #[default]
    Merge,
}

impl fmt::Display for ImportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Merge => write!(f, "merge"),
        }
    }
}

impl FromStr for ImportPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "merge" => Ok(Self::Merge),
            other => Err(format!("unknown import policy '{other}'")),
        }
    }
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Records in the payload.
    pub received: usize,
    /// Records added to the registry.
    pub added: usize,
    /// Records skipped because their id or unit number was already present.
    pub skipped: usize,
    /// Existing records dropped by a replace.
    pub removed: usize,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} received, {} added, {} skipped, {} removed",
            self.received, self.added, self.skipped, self.removed
        )
    }
}

/// The record set an import would produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPlan {
    /// Complete record set after the import.
    pub departures: Vec<Departure>,
    /// Number of leading records in `departures` that were kept from before.
    pub kept: usize,
    /// Counts for the caller.
    pub summary: ImportSummary,
}

impl ImportPlan {
    /// The records the import adds, in payload order.
    #[must_use]
    pub fn added(&self) -> &[Departure] {
        &self.departures[self.kept..]
    }
}

/// Parse and normalize an import payload.
///
/// # Errors
///
/// Returns `InvalidImportPayload` if the payload is not a JSON array, an
/// element is not an object, lacks a required key, or carries a value that
/// cannot be normalized.
pub fn parse_payload(payload: &str) -> Result<Vec<NormalizedRecord>> {
    let payload = payload.trim_start_matches('\u{feff}');
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| Error::invalid_payload(format!("not valid JSON: {e}")))?;
    let Value::Array(elements) = value else {
        return Err(Error::invalid_payload("expected a JSON array of departures"));
    };

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| parse_element(index, element))
        .collect()
}

fn parse_element(index: usize, element: Value) -> Result<NormalizedRecord> {
    let Some(object) = element.as_object() else {
        return Err(Error::invalid_payload(format!(
            "element {index} is not an object"
        )));
    };
    if let Some(key) = REQUIRED_KEYS.iter().find(|k| !object.contains_key(**k)) {
        return Err(Error::invalid_payload(format!(
            "element {index} is missing key '{key}'"
        )));
    }

    let record: DepartureRecord = serde_json::from_value(element)
        .map_err(|e| Error::invalid_payload(format!("element {index}: {e}")))?;
    record
        .normalize()
        .map_err(|e| Error::invalid_payload(format!("element {index}: {e}")))
}

/// Work out the record set after importing `incoming` into `existing`.
///
/// Under both policies a record is skipped when its id or unit number is
/// already in the target set; under `Replace` the target starts empty, so
/// only repeats within the payload are skipped. Records without a usable id
/// get a fresh one from `ids`.
///
/// # Errors
///
/// Returns [`Error::IdsExhausted`] if a fresh id is needed and none is left.
pub fn plan_import(
    existing: &[Departure],
    incoming: Vec<NormalizedRecord>,
    policy: ImportPolicy,
    ids: &mut IdAllocator,
) -> Result<ImportPlan> {
    let mut departures = match policy {
        ImportPolicy::Merge => existing.to_vec(),
        ImportPolicy::Replace => Vec::new(),
    };
    let kept = departures.len();

    let mut taken_ids: HashSet<DepartureId> = departures.iter().map(|d| d.id).collect();
    let mut taken_units: HashSet<String> = departures
        .iter()
        .map(|d| d.unit_number.to_uppercase())
        .collect();

    let mut summary = ImportSummary {
        received: incoming.len(),
        removed: existing.len() - kept,
        ..ImportSummary::default()
    };

    for record in incoming {
        let id_taken = record.id.is_some_and(|id| taken_ids.contains(&id));
        if id_taken || taken_units.contains(&record.unit_number) {
            summary.skipped += 1;
            continue;
        }

        let id = match record.id {
            Some(id) => {
                ids.observe(id);
                id
            }
            None => ids.allocate()?,
        };
        taken_ids.insert(id);
        taken_units.insert(record.unit_number.clone());
        departures.push(record.into_departure(id));
        summary.added += 1;
    }

    Ok(ImportPlan {
        departures,
        kept,
        summary,
    })
}
