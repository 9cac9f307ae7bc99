//! `avgang` - A registry of outgoing transport departures
//!
//! This library keeps a list of departures (trains, trucks, trailers and
//! modules bound for a fixed set of stations), validates and deduplicates
//! them, and persists them to a JSON file, a SQLite table or nowhere at all.
//! It also searches, sorts, summarizes, exports and imports them, and
//! migrates records written with older status labels.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod departure;
pub mod error;
pub mod export;
pub mod ids;
pub mod import;
pub mod logging;
pub mod query;
pub mod record;
pub mod registry;
pub mod rules;
pub mod service;
pub mod stats;
pub mod status;
pub mod storage;

pub use config::Config;
pub use departure::{Departure, DepartureId, DepartureInput, DepartureTime, Destination, TransportType};
pub use error::{Error, Result};
pub use export::ExportFormat;
pub use import::{ImportPolicy, ImportSummary};
pub use logging::init_logging;
pub use query::{Filter, SortKey};
pub use registry::Registry;
pub use service::RegistryHandle;
pub use stats::RegistryStats;
pub use status::Status;
