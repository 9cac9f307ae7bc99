//! `SQLite` schema definitions for the departure table.

/// SQL statement to create the departures table.
pub const CREATE_DEPARTURES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS departures (
    id INTEGER PRIMARY KEY,
    unit_number TEXT NOT NULL,
    destination TEXT NOT NULL,
    departure_time TEXT NOT NULL,
    gate TEXT NOT NULL,
    transport_type TEXT NOT NULL,
    status TEXT NOT NULL,
    comment TEXT,
    position INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// Unit numbers are unique regardless of case.
pub const CREATE_UNIT_INDEX: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_departures_unit ON departures(unit_number COLLATE NOCASE)
";

/// SQL statement to create an index on destination for filtering.
pub const CREATE_DESTINATION_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_departures_destination ON departures(destination)
";

/// Rows are read back in list order.
pub const CREATE_POSITION_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_departures_position ON departures(position)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DEPARTURES_TABLE,
    CREATE_UNIT_INDEX,
    CREATE_DESTINATION_INDEX,
    CREATE_POSITION_INDEX,
    CREATE_METADATA_TABLE,
];
