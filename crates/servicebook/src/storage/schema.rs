//! `SQLite` schema definitions for servicebook.
//!
//! Table and column names match the databases written by earlier releases of
//! the shop tool, so an existing `app_data.db` opens without conversion.

/// SQL statement to create the service type lookup table.
pub const CREATE_SERVICE_TYPES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS tip_usluge (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    naziv TEXT NOT NULL
)
";

/// SQL statement to create the records table.
pub const CREATE_RECORDS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    datum TEXT NOT NULL,
    broj_sasije TEXT NOT NULL,
    registarska_oznaka TEXT NOT NULL,
    marka_model TEXT NOT NULL,
    tip_usluge_id INTEGER NOT NULL,
    opis_rada TEXT,
    cena INTEGER,
    FOREIGN KEY (tip_usluge_id) REFERENCES tip_usluge(id)
)
";

/// SQL statement to create an index on the chassis number for searches.
pub const CREATE_CHASSIS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_records_chassis ON records(broj_sasije)
";

/// SQL statement to create an index on the service date for reports.
pub const CREATE_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_records_date ON records(datum)
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
    CREATE_SERVICE_TYPES_TABLE,
    CREATE_RECORDS_TABLE,
    CREATE_CHASSIS_INDEX,
    CREATE_DATE_INDEX,
    CREATE_METADATA_TABLE,
];

/// Columns selected for a joined record row, in `row_to_record` order.
pub const RECORD_COLUMNS: &str = r"
    records.id, records.datum, records.broj_sasije, records.registarska_oznaka,
    records.marka_model, tip_usluge.naziv, records.opis_rada, records.cena,
    records.tip_usluge_id
";
