//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::departure::{DepartureId, DepartureInput, DepartureTime, Destination, TransportType};
use crate::export::ExportFormat;
use crate::import::ImportPolicy;
use crate::query::{Filter, SortKey};
use crate::status::Status;

/// Every field of a departure, as given on the command line.
#[derive(Debug, Args)]
pub struct DepartureArgs {
    /// Unit number, e.g. TOG1234
    #[arg(short, long)]
    pub unit: String,

    /// Destination station
    #[arg(short, long)]
    pub destination: Destination,

    /// Departure time (HH:MM)
    #[arg(short, long)]
    pub time: DepartureTime,

    /// Loading gate
    #[arg(short, long)]
    pub gate: String,

    /// Transport type (Train, Truck, Trailer, Module)
    #[arg(long = "type", value_name = "TYPE")]
    pub transport_type: TransportType,

    /// Status (Delivered, Planned, InStorage, Loading)
    #[arg(short, long)]
    pub status: Status,

    /// Optional comment
    #[arg(long)]
    pub comment: Option<String>,
}

impl From<DepartureArgs> for DepartureInput {
    fn from(args: DepartureArgs) -> Self {
        Self {
            unit_number: args.unit,
            destination: Some(args.destination),
            departure_time: Some(args.time),
            gate: args.gate,
            transport_type: Some(args.transport_type),
            status: Some(args.status),
            comment: args.comment,
        }
    }
}

/// Search and destination filter shared by several commands.
#[derive(Debug, Default, Args)]
pub struct FilterArgs {
    /// Case-insensitive text to look for in any field
    #[arg(long)]
    pub search: Option<String>,

    /// Only this destination
    #[arg(short, long)]
    pub destination: Option<Destination>,
}

impl FilterArgs {
    /// Build the registry filter.
    #[must_use]
    pub fn to_filter(&self) -> Filter {
        let mut filter = Filter::all();
        if let Some(search) = &self.search {
            filter = filter.search(search.as_str());
        }
        if let Some(destination) = self.destination {
            filter = filter.destination(destination);
        }
        filter
    }
}

/// Edit command arguments.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Id of the departure to replace
    pub id: DepartureId,

    /// New field values
    #[command(flatten)]
    pub departure: DepartureArgs,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Id of the departure to delete
    pub id: DepartureId,

    /// Confirm the deletion
    #[arg(short, long)]
    pub yes: bool,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Filter options
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Sort column
    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Filter options
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Export format
    #[arg(short, long, value_enum)]
    pub format: ExportFormatArg,

    /// Output file (defaults to a dated file name in the current directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Filter options
    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// JSON backup file to read
    pub file: PathBuf,

    /// What to do with the current departures (defaults to the configured policy)
    #[arg(short, long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Confirm replacing existing departures
    #[arg(short, long)]
    pub yes: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Sort column argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    /// Chronological by departure time
    Time,
    /// By destination name
    Destination,
    /// By status label
    Status,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Time => Self::Time,
            SortArg::Destination => Self::Destination,
            SortArg::Status => Self::Status,
        }
    }
}

/// Import policy argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Drop current departures and keep only the imported ones
    Replace,
    /// Add imported departures that are not already present
    Merge,
}

impl From<PolicyArg> for ImportPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Replace => Self::Replace,
            PolicyArg::Merge => Self::Merge,
        }
    }
}

/// Export format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormatArg {
    /// Semicolon-separated table for spreadsheets
    Csv,
    /// Full JSON backup
    Json,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Csv => Self::Csv,
            ExportFormatArg::Json => Self::Json,
        }
    }
}

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Formatted table
    #[default]
    Table,
    /// JSON output
    Json,
    /// CSV output
    Csv,
}
