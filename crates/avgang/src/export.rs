//! CSV and JSON export.
//!
//! CSV drops the `id` column and is meant for spreadsheets; JSON keeps every
//! field and is the backup format that `import` reads back.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ExportConfig;
use crate::departure::Departure;
use crate::error::Result;

/// Column names of the CSV export, in order.
pub const CSV_HEADER: [&str; 7] = [
    "unitNumber",
    "destination",
    "time",
    "gate",
    "type",
    "status",
    "comment",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Flat table without ids.
    Csv,
    /// Pretty-printed array of full records.
    Json,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Default file name for an export made on `date`.
    #[must_use]
    pub fn default_file_name(self, date: NaiveDate) -> String {
        let date = date.format("%Y-%m-%d");
        match self {
            Self::Csv => format!("avganger_{date}.csv"),
            Self::Json => format!("backup_avganger_{date}.json"),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown export format '{other}'")),
        }
    }
}

/// CSV writer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Prefix the output with a UTF-8 byte order mark.
    pub bom: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            bom: true,
        }
    }
}

impl CsvOptions {
    /// Options from the `[export]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the delimiter is not ASCII.
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        Ok(Self {
            delimiter: config.delimiter_byte()?,
            bom: config.csv_bom,
        })
    }
}

/// Write departures as CSV.
///
/// # Errors
///
/// Returns an error if the CSV writer fails.
pub fn to_csv(departures: &[Departure], options: CsvOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    if options.bom {
        out.extend_from_slice(UTF8_BOM);
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(out);
    writer.write_record(CSV_HEADER)?;
    for d in departures {
        let time = d.departure_time.to_string();
        writer.write_record([
            d.unit_number.as_str(),
            d.destination.label(),
            time.as_str(),
            d.gate.as_str(),
            d.transport_type.label(),
            d.status.label(),
            d.comment.as_deref().unwrap_or(""),
        ])?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}

/// Write departures as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(departures: &[Departure]) -> Result<Vec<u8>> {
    let mut out = serde_json::to_vec_pretty(departures)?;
    out.push(b'\n');
    Ok(out)
}

/// Export in the given format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn export(departures: &[Departure], format: ExportFormat, options: CsvOptions) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => to_csv(departures, options),
        ExportFormat::Json => to_json(departures),
    }
}
