//! Field validation for new and edited departures.
//!
//! Checks run in a fixed order: required fields first, then the unit-number
//! pattern. Uniqueness needs the full record set and is checked by the
//! registry after these rules pass.

use regex::Regex;

use crate::config::ValidationConfig;
use crate::departure::{
    Departure, DepartureId, DepartureInput, DepartureTime, Destination, TransportType,
};
use crate::error::{Error, Result};
use crate::status::Status;

/// Default unit-number pattern: type prefix followed by 4-6 digits.
pub const DEFAULT_UNIT_PATTERN: &str = r"^(TOG|BIL|TRL|MOD)\d{4,6}$";

/// A departure whose fields passed validation, ready to receive an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDeparture {
    /// Uppercase, trimmed unit number.
    pub unit_number: String,
    /// Destination.
    pub destination: Destination,
    /// Time of day.
    pub departure_time: DepartureTime,
    /// Trimmed gate.
    pub gate: String,
    /// Transport type.
    pub transport_type: TransportType,
    /// Status.
    pub status: Status,
    /// Trimmed comment, `None` when blank.
    pub comment: Option<String>,
}

impl ValidDeparture {
    /// Attach an id.
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

/// Unit-number rules applied to every add and update.
#[derive(Debug, Clone)]
pub struct UnitRules {
    pattern: Option<Regex>,
}

impl UnitRules {
    /// Rules that enforce the given pattern.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pattern does not compile.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::ConfigValidation {
            message: format!("invalid unit pattern {pattern}: {e}"),
        })?;
        Ok(Self {
            pattern: Some(regex),
        })
    }

    /// Rules that only check required fields.
    #[must_use]
    pub fn lenient() -> Self {
        Self { pattern: None }
    }

    /// Build rules from configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the configured pattern is invalid.
    pub fn from_config(config: &ValidationConfig) -> Result<Self> {
        if config.enforce_unit_pattern {
            Self::with_pattern(&config.unit_pattern)
        } else {
            Ok(Self::lenient())
        }
    }

    /// The enforced pattern, if any.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }

    /// Validate an input.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for the first absent or blank required field,
    /// then `InvalidFormat` if the unit number fails the pattern.
    pub fn validate(&self, input: &DepartureInput) -> Result<ValidDeparture> {
        let unit_number = normalize_unit_number(&input.unit_number);
        if unit_number.is_empty() {
            return Err(Error::missing("unit_number"));
        }
        let destination = input.destination.ok_or(Error::missing("destination"))?;
        let departure_time = input.departure_time.ok_or(Error::missing("time"))?;
        let gate = input.gate.trim();
        if gate.is_empty() {
            return Err(Error::missing("gate"));
        }
        let transport_type = input.transport_type.ok_or(Error::missing("type"))?;
        let status = input.status.ok_or(Error::missing("status"))?;

        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(&unit_number) {
                return Err(Error::InvalidFormat {
                    unit_number,
                    pattern: pattern.as_str().to_string(),
                });
            }
        }

        Ok(ValidDeparture {
            unit_number,
            destination,
            departure_time,
            gate: gate.to_string(),
            transport_type,
            status,
            comment: normalize_comment(input.comment.as_deref()),
        })
    }
}

impl Default for UnitRules {
    fn default() -> Self {
        Self {
            pattern: Some(Regex::new(DEFAULT_UNIT_PATTERN).expect("default pattern compiles")),
        }
    }
}

/// Trim and uppercase a unit number.
#[must_use]
pub fn normalize_unit_number(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Trim a comment; blank becomes `None`.
#[must_use]
pub fn normalize_comment(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}
