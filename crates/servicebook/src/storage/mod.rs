//! Storage layer for servicebook.
//!
//! This module provides `SQLite`-based persistent storage for service records
//! and the service type catalog, including search, aggregate reports and
//! consistent backups.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{NewRecord, ServiceRecord, ServiceType, DATE_FORMAT};
use crate::report::{ReportPeriod, ReportRow};

use schema::RECORD_COLUMNS;

/// Service types seeded into an empty catalog.
pub const DEFAULT_SERVICE_TYPES: &[&str] = &[
    "Servis",
    "Popravka",
    "Zamena delova",
    "Dijagnostika",
    "Gume",
    "Klima",
    "DPF",
];

/// Storage engine for service records.
///
/// Provides persistent storage using `SQLite` with support for:
/// - Record insertion, editing and batch deletion
/// - Substring search on the chassis number
/// - Monthly and yearly aggregates per service type
/// - A small key/value metadata table
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// initializes the schema and seeds [`DEFAULT_SERVICE_TYPES`] into an empty
    /// catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_service_types(path, DEFAULT_SERVICE_TYPES)
    }

    /// Open or create a storage database, seeding an empty catalog with `service_types`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open_with_service_types<S: AsRef<str>>(
        path: impl AsRef<Path>,
        service_types: &[S],
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;
        migrations::initialize_schema(&conn)?;

        let storage = Self { path, conn };
        storage.seed_service_types(service_types)?;

        info!("Database opened successfully at {}", storage.path.display());
        Ok(storage)
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        let storage = Self {
            path: PathBuf::from(":memory:"),
            conn,
        };
        storage.seed_service_types(DEFAULT_SERVICE_TYPES)?;
        Ok(storage)
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether this storage lives in memory only.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == ":memory:"
    }

    /// Raw connection, for tests that need to shape legacy rows.
    #[cfg(test)]
    pub(crate) fn conn_for_tests(&self) -> &Connection {
        &self.conn
    }

    /// Insert the given names into the service type catalog if it is empty.
    ///
    /// Returns the number of service types inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn seed_service_types<S: AsRef<str>>(&self, names: &[S]) -> Result<usize> {
        let existing: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tip_usluge", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare("INSERT INTO tip_usluge (naziv) VALUES (?1)")?;
            for name in names {
                let name = name.as_ref().trim();
                if name.is_empty() {
                    continue;
                }
                stmt.execute([name])?;
                inserted += 1;
            }
        }
        tx.commit()?;

        if inserted > 0 {
            info!("Seeded {} default service types", inserted);
        }
        Ok(inserted)
    }

    /// Insert a service record.
    ///
    /// Text fields are trimmed before storage. Returns the assigned ID.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank vehicle identifiers or a negative
    /// price, [`Error::UnknownServiceType`] if the referenced type does not
    /// exist, or an error if the database operation fails.
    pub fn insert_record(&self, record: &NewRecord) -> Result<i64> {
        let record = self.checked(record)?;

        self.conn.execute(
            r"
            INSERT INTO records (datum, broj_sasije, registarska_oznaka, marka_model,
                                 tip_usluge_id, opis_rada, cena)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                record.date.format(DATE_FORMAT).to_string(),
                record.chassis_number,
                record.registration_plate,
                record.make_model,
                record.service_type_id,
                record.description,
                record.price,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted record with id {}", id);
        Ok(id)
    }

    /// Replace every field of an existing record.
    ///
    /// Returns `true` if the record was updated, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns the same validation errors as [`Storage::insert_record`], or an
    /// error if the database operation fails.
    pub fn update_record(&self, id: i64, record: &NewRecord) -> Result<bool> {
        let record = self.checked(record)?;

        let affected = self.conn.execute(
            r"
            UPDATE records
            SET datum = ?1, broj_sasije = ?2, registarska_oznaka = ?3, marka_model = ?4,
                tip_usluge_id = ?5, opis_rada = ?6, cena = ?7
            WHERE id = ?8
            ",
            params![
                record.date.format(DATE_FORMAT).to_string(),
                record.chassis_number,
                record.registration_plate,
                record.make_model,
                record.service_type_id,
                record.description,
                record.price,
                id,
            ],
        )?;

        if affected > 0 {
            debug!("Updated record {}", id);
        }
        Ok(affected > 0)
    }

    /// Normalize and validate a record, and verify its service type exists.
    fn checked(&self, record: &NewRecord) -> Result<NewRecord> {
        let record = record.normalized();
        record.validate()?;
        if self.service_type(record.service_type_id)?.is_none() {
            return Err(Error::unknown_service_type(record.service_type_id.to_string()));
        }
        Ok(record)
    }

    /// Delete the records with the given IDs in a single transaction.
    ///
    /// IDs that do not exist are ignored. Returns the number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; no record is deleted then.
    pub fn delete_records(&self, ids: &[i64]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut deleted = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM records WHERE id = ?1")?;
            for id in ids {
                deleted += stmt.execute([id])?;
            }
        }
        tx.commit()?;

        info!("Deleted {} of {} requested records", deleted, ids.len());
        Ok(deleted)
    }

    /// Get a record by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_record(&self, id: i64) -> Result<Option<ServiceRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM records \
             JOIN tip_usluge ON records.tip_usluge_id = tip_usluge.id \
             WHERE records.id = ?1"
        );
        let record = self
            .conn
            .query_row(&sql, [id], Self::row_to_record)
            .optional()?;
        Ok(record)
    }

    /// Search records whose chassis number contains `fragment`.
    ///
    /// The match is case-insensitive for ASCII letters and literal, so `%` and
    /// `_` in the fragment match only themselves. An empty fragment returns
    /// every record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn search_records(&self, fragment: &str) -> Result<Vec<ServiceRecord>> {
        let pattern = format!("%{}%", escape_like(fragment.trim()));
        let sql = format!(
            r"SELECT {RECORD_COLUMNS} FROM records
              JOIN tip_usluge ON records.tip_usluge_id = tip_usluge.id
              WHERE records.broj_sasije LIKE ?1 ESCAPE '\'
              ORDER BY records.id"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([pattern], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!("Search for '{}' matched {} records", fragment, records.len());
        Ok(records)
    }

    /// Get every record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn all_records(&self) -> Result<Vec<ServiceRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM records \
             JOIN tip_usluge ON records.tip_usluge_id = tip_usluge.id \
             ORDER BY records.id"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Count total records in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Aggregate records for the given calendar month, per service type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPeriod`] for a month outside 1..=12, or an error
    /// if the database operation fails.
    pub fn monthly_report(&self, year: i32, month: u32) -> Result<Vec<ReportRow>> {
        self.report_rows(&ReportPeriod::month(year, month)?)
    }

    /// Aggregate records for the given calendar year, per service type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn yearly_report(&self, year: i32) -> Result<Vec<ReportRow>> {
        self.report_rows(&ReportPeriod::year(year))
    }

    /// Aggregate records within `period`, per service type, ordered by name.
    ///
    /// Service types without records in the period are omitted. Records
    /// without a price count towards `count` only.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn report_rows(&self, period: &ReportPeriod) -> Result<Vec<ReportRow>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT tip_usluge.naziv, COUNT(*), AVG(records.cena), SUM(records.cena)
            FROM records
            JOIN tip_usluge ON records.tip_usluge_id = tip_usluge.id
            WHERE strftime(?1, records.datum) = ?2
            GROUP BY tip_usluge.naziv
            ORDER BY tip_usluge.naziv
            ",
        )?;

        let rows = stmt
            .query_map(params![period.sql_format(), period.key()], |row| {
                Ok(ReportRow {
                    service_type: row.get(0)?,
                    count: row.get(1)?,
                    average_price: row.get(2)?,
                    total_price: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!("Report for {} has {} rows", period.key(), rows.len());
        Ok(rows)
    }

    /// List the service type catalog, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn service_types(&self) -> Result<Vec<ServiceType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, naziv FROM tip_usluge ORDER BY id")?;
        let types = stmt
            .query_map([], |row| {
                Ok(ServiceType {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(types)
    }

    /// Get a service type by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn service_type(&self, id: i64) -> Result<Option<ServiceType>> {
        let service_type = self
            .conn
            .query_row(
                "SELECT id, naziv FROM tip_usluge WHERE id = ?1",
                [id],
                |row| {
                    Ok(ServiceType {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(service_type)
    }

    /// Resolve a service type from a numeric ID or a case-insensitive name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownServiceType`] if nothing matches, or an error if
    /// the database operation fails.
    pub fn resolve_service_type(&self, key: &str) -> Result<ServiceType> {
        let key = key.trim();
        if let Ok(id) = key.parse::<i64>() {
            return self
                .service_type(id)?
                .ok_or_else(|| Error::unknown_service_type(key));
        }

        let wanted = key.to_lowercase();
        self.service_types()?
            .into_iter()
            .find(|st| st.name.to_lowercase() == wanted)
            .ok_or_else(|| Error::unknown_service_type(key))
    }

    /// Add a new service type to the catalog.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is blank or already present
    /// (ignoring case), or an error if the database operation fails.
    pub fn add_service_type(&self, name: &str) -> Result<ServiceType> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_field("service_type", "name must not be empty"));
        }
        let wanted = name.to_lowercase();
        if self
            .service_types()?
            .iter()
            .any(|st| st.name.to_lowercase() == wanted)
        {
            return Err(Error::DuplicateServiceType {
                name: name.to_string(),
            });
        }

        self.conn
            .execute("INSERT INTO tip_usluge (naziv) VALUES (?1)", [name])?;
        let id = self.conn.last_insert_rowid();
        info!("Added service type '{}' with id {}", name, id);

        Ok(ServiceType {
            id,
            name: name.to_string(),
        })
    }

    /// Read a value from the metadata table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Write a value to the metadata table, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            (key, value),
        )?;
        Ok(())
    }

    /// Write a consistent copy of the database to `dest`.
    ///
    /// `dest` must not exist yet. Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backup`] if the destination exists, is not valid UTF-8,
    /// or `SQLite` cannot write it.
    pub fn backup_to(&self, dest: &Path) -> Result<()> {
        if dest.exists() {
            return Err(Error::Backup {
                path: dest.to_path_buf(),
                message: "destination already exists".to_string(),
            });
        }
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let dest_str = dest.to_str().ok_or_else(|| Error::Backup {
            path: dest.to_path_buf(),
            message: "path is not valid UTF-8".to_string(),
        })?;

        self.conn
            .execute("VACUUM INTO ?1", [dest_str])
            .map_err(|e| Error::Backup {
                path: dest.to_path_buf(),
                message: e.to_string(),
            })?;

        info!("Backed up {} to {}", self.path.display(), dest.display());
        Ok(())
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_records = self.count()?;
        let service_types: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tip_usluge", [], |row| row.get(0))?;

        let (first, last): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(datum), MAX(datum) FROM records",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let parse = |s: Option<String>| {
            s.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok())
        };

        let db_size_bytes = if self.is_in_memory() {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_records,
            service_types,
            first_record: parse(first),
            last_record: parse(last),
            db_size_bytes,
        })
    }

    /// Convert a joined database row to a [`ServiceRecord`].
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<ServiceRecord> {
        let date_str: String = row.get(1)?;
        let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let description: Option<String> = row.get(6)?;

        Ok(ServiceRecord {
            id: row.get(0)?,
            date,
            chassis_number: row.get(2)?,
            registration_plate: row.get(3)?,
            make_model: row.get(4)?,
            service_type: row.get(5)?,
            service_type_id: row.get(8)?,
            description: description.unwrap_or_default(),
            price: row.get(7)?,
        })
    }
}

/// Escape `LIKE` wildcards so the text matches literally with `ESCAPE '\'`.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of records stored.
    pub total_records: i64,
    /// Number of service types in the catalog.
    pub service_types: i64,
    /// Date of the earliest record.
    pub first_record: Option<NaiveDate>,
    /// Date of the latest record.
    pub last_record: Option<NaiveDate>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn type_id(storage: &Storage, name: &str) -> i64 {
        storage.resolve_service_type(name).unwrap().id
    }

    fn create_test_record(
        storage: &Storage,
        chassis: &str,
        service: &str,
        day: NaiveDate,
        price: i64,
    ) -> NewRecord {
        NewRecord {
            date: day,
            chassis_number: chassis.to_string(),
            registration_plate: "BG-100-XY".to_string(),
            make_model: "Skoda Octavia".to_string(),
            service_type_id: type_id(storage, service),
            description: "work".to_string(),
            price,
        }
    }

    #[test]
    fn test_open_in_memory_seeds_defaults() {
        let storage = create_test_storage();
        let names: Vec<String> = storage
            .service_types()
            .unwrap()
            .into_iter()
            .map(|st| st.name)
            .collect();
        assert_eq!(names, DEFAULT_SERVICE_TYPES);
    }

    #[test]
    fn test_seed_skips_non_empty_catalog() {
        let storage = create_test_storage();
        let inserted = storage.seed_service_types(&["Lakiranje"]).unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(storage.service_types().unwrap().len(), DEFAULT_SERVICE_TYPES.len());
    }

    #[test]
    fn test_insert_and_get() {
        let storage = create_test_storage();
        let record = create_test_record(&storage, "WVWZZZ1KZ", "DPF", date(2024, 3, 1), 15_000);

        let id = storage.insert_record(&record).unwrap();
        let retrieved = storage.get_record(id).unwrap().unwrap();

        assert_eq!(retrieved.id, id);
        assert_eq!(retrieved.chassis_number, "WVWZZZ1KZ");
        assert_eq!(retrieved.service_type, "DPF");
        assert_eq!(retrieved.date, date(2024, 3, 1));
        assert_eq!(retrieved.price, Some(15_000));
    }

    #[test]
    fn test_insert_trims_fields() {
        let storage = create_test_storage();
        let mut record = create_test_record(&storage, "  VIN9  ", "Gume", date(2024, 1, 1), 10);
        record.make_model = " Opel Astra ".to_string();

        let id = storage.insert_record(&record).unwrap();
        let retrieved = storage.get_record(id).unwrap().unwrap();
        assert_eq!(retrieved.chassis_number, "VIN9");
        assert_eq!(retrieved.make_model, "Opel Astra");
    }

    #[test]
    fn test_insert_rejects_invalid_record() {
        let storage = create_test_storage();
        let mut record = create_test_record(&storage, "", "DPF", date(2024, 1, 1), 10);
        assert!(storage.insert_record(&record).unwrap_err().is_validation());

        record.chassis_number = "VIN".to_string();
        record.price = -10;
        assert!(storage.insert_record(&record).unwrap_err().is_validation());
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_price_ceiling_keeps_report_totals_in_range() {
        use crate::record::MAX_PRICE;
        use crate::report::Report;

        let storage = create_test_storage();
        let huge =
            create_test_record(&storage, "VIN1", "DPF", date(2024, 2, 1), 5_000_000_000_000_000_000);
        assert!(storage.insert_record(&huge).unwrap_err().is_validation());

        for service_type in ["DPF", "DPF", "Gume"] {
            let record =
                create_test_record(&storage, "VIN1", service_type, date(2024, 2, 1), MAX_PRICE);
            storage.insert_record(&record).unwrap();
        }

        let report =
            Report::generate(&storage, ReportPeriod::year(2024), date(2024, 12, 31)).unwrap();
        assert_eq!(report.total_revenue(), 3 * MAX_PRICE);
        assert_eq!(report.rows[0].total_price, Some(2 * MAX_PRICE));
    }

    #[test]
    fn test_insert_unknown_service_type() {
        let storage = create_test_storage();
        let mut record = create_test_record(&storage, "VIN", "DPF", date(2024, 1, 1), 10);
        record.service_type_id = 999;

        let err = storage.insert_record(&record).unwrap_err();
        assert!(matches!(err, Error::UnknownServiceType { .. }));
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = create_test_storage();
        assert!(storage.get_record(99_999).unwrap().is_none());
    }

    #[test]
    fn test_update_record() {
        let storage = create_test_storage();
        let record = create_test_record(&storage, "VIN1", "Servis", date(2024, 1, 5), 100);
        let id = storage.insert_record(&record).unwrap();

        let mut changed = record.clone();
        changed.price = 250;
        changed.service_type_id = type_id(&storage, "Klima");
        assert!(storage.update_record(id, &changed).unwrap());

        let retrieved = storage.get_record(id).unwrap().unwrap();
        assert_eq!(retrieved.price, Some(250));
        assert_eq!(retrieved.service_type, "Klima");
    }

    #[test]
    fn test_update_nonexistent() {
        let storage = create_test_storage();
        let record = create_test_record(&storage, "VIN1", "Servis", date(2024, 1, 5), 100);
        assert!(!storage.update_record(12_345, &record).unwrap());
    }

    #[test]
    fn test_delete_records() {
        let storage = create_test_storage();
        let a = storage
            .insert_record(&create_test_record(&storage, "A", "DPF", date(2024, 1, 1), 1))
            .unwrap();
        let b = storage
            .insert_record(&create_test_record(&storage, "B", "DPF", date(2024, 1, 1), 1))
            .unwrap();
        let c = storage
            .insert_record(&create_test_record(&storage, "C", "DPF", date(2024, 1, 1), 1))
            .unwrap();

        let deleted = storage.delete_records(&[a, c, 99_999]).unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(storage.count().unwrap(), 1);
        assert!(storage.get_record(b).unwrap().is_some());
    }

    #[test]
    fn test_delete_empty_list() {
        let storage = create_test_storage();
        assert_eq!(storage.delete_records(&[]).unwrap(), 0);
    }

    #[test]
    fn test_search_substring() {
        let storage = create_test_storage();
        for chassis in ["WVWZZZ1KZAW1", "WVWZZZ3CZ", "VF1BB05"] {
            storage
                .insert_record(&create_test_record(&storage, chassis, "DPF", date(2024, 2, 2), 5))
                .unwrap();
        }

        assert_eq!(storage.search_records("WVW").unwrap().len(), 2);
        assert_eq!(storage.search_records("zzz3").unwrap().len(), 1);
        assert_eq!(storage.search_records("BB0").unwrap().len(), 1);
        assert!(storage.search_records("nonexistent").unwrap().is_empty());
    }

    #[test]
    fn test_search_empty_fragment_lists_all() {
        let storage = create_test_storage();
        storage
            .insert_record(&create_test_record(&storage, "A1", "DPF", date(2024, 2, 2), 5))
            .unwrap();
        storage
            .insert_record(&create_test_record(&storage, "B2", "Gume", date(2024, 2, 3), 5))
            .unwrap();

        let results = storage.search_records("").unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results, storage.all_records().unwrap());
    }

    #[test]
    fn test_search_wildcards_are_literal() {
        let storage = create_test_storage();
        storage
            .insert_record(&create_test_record(&storage, "ABC123", "DPF", date(2024, 2, 2), 5))
            .unwrap();
        storage
            .insert_record(&create_test_record(&storage, "AB_100", "DPF", date(2024, 2, 2), 5))
            .unwrap();

        assert!(storage.search_records("%").unwrap().is_empty());
        let underscore = storage.search_records("B_").unwrap();
        assert_eq!(underscore.len(), 1);
        assert_eq!(underscore[0].chassis_number, "AB_100");
    }

    #[test]
    fn test_all_records_ordered_by_id() {
        let storage = create_test_storage();
        for chassis in ["Z", "A", "M"] {
            storage
                .insert_record(&create_test_record(&storage, chassis, "DPF", date(2024, 2, 2), 5))
                .unwrap();
        }
        let ids: Vec<i64> = storage.all_records().unwrap().iter().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_monthly_report_aggregates() {
        let storage = create_test_storage();
        let rows = [
            ("A", "DPF", date(2024, 3, 1), 10_000),
            ("B", "DPF", date(2024, 3, 20), 20_000),
            ("C", "Gume", date(2024, 3, 31), 3_000),
            ("D", "DPF", date(2024, 4, 1), 99_000),
            ("E", "Gume", date(2023, 3, 10), 1),
        ];
        for (chassis, service, day, price) in rows {
            storage
                .insert_record(&create_test_record(&storage, chassis, service, day, price))
                .unwrap();
        }

        let report = storage.monthly_report(2024, 3).unwrap();
        assert_eq!(report.len(), 2);

        assert_eq!(report[0].service_type, "DPF");
        assert_eq!(report[0].count, 2);
        assert_eq!(report[0].total_price, Some(30_000));
        assert!((report[0].average_price.unwrap() - 15_000.0).abs() < f64::EPSILON);

        assert_eq!(report[1].service_type, "Gume");
        assert_eq!(report[1].count, 1);
        assert_eq!(report[1].total_price, Some(3_000));
    }

    #[test]
    fn test_yearly_report() {
        let storage = create_test_storage();
        storage
            .insert_record(&create_test_record(&storage, "A", "Servis", date(2024, 1, 1), 100))
            .unwrap();
        storage
            .insert_record(&create_test_record(&storage, "B", "Servis", date(2024, 12, 31), 300))
            .unwrap();
        storage
            .insert_record(&create_test_record(&storage, "C", "Servis", date(2025, 1, 1), 999))
            .unwrap();

        let report = storage.yearly_report(2024).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].count, 2);
        assert_eq!(report[0].total_price, Some(400));
    }

    #[test]
    fn test_report_empty_period() {
        let storage = create_test_storage();
        assert!(storage.monthly_report(2024, 1).unwrap().is_empty());
        assert!(storage.yearly_report(1999).unwrap().is_empty());
    }

    #[test]
    fn test_monthly_report_invalid_month() {
        let storage = create_test_storage();
        let err = storage.monthly_report(2024, 13).unwrap_err();
        assert!(matches!(err, Error::InvalidPeriod { .. }));
    }

    #[test]
    fn test_report_null_prices() {
        let storage = create_test_storage();
        let dpf = type_id(&storage, "DPF");
        storage
            .conn
            .execute(
                "INSERT INTO records (datum, broj_sasije, registarska_oznaka, marka_model, tip_usluge_id, opis_rada, cena)
                 VALUES ('2024-05-05', 'OLD', 'NS-1', 'Lada', ?1, NULL, NULL)",
                [dpf],
            )
            .unwrap();

        let report = storage.monthly_report(2024, 5).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].count, 1);
        assert!(report[0].average_price.is_none());
        assert!(report[0].total_price.is_none());

        let record = &storage.all_records().unwrap()[0];
        assert_eq!(record.description, "");
        assert!(record.price.is_none());
    }

    #[test]
    fn test_invalid_stored_date_is_an_error() {
        let storage = create_test_storage();
        let dpf = type_id(&storage, "DPF");
        storage
            .conn
            .execute(
                "INSERT INTO records (datum, broj_sasije, registarska_oznaka, marka_model, tip_usluge_id, opis_rada, cena)
                 VALUES ('15.05.2024', 'BAD', 'NS-1', 'Lada', ?1, '', 1)",
                [dpf],
            )
            .unwrap();

        assert!(storage.all_records().is_err());
    }

    #[test]
    fn test_resolve_service_type() {
        let storage = create_test_storage();
        let by_name = storage.resolve_service_type("zamena DELOVA").unwrap();
        assert_eq!(by_name.name, "Zamena delova");

        let by_id = storage.resolve_service_type(&by_name.id.to_string()).unwrap();
        assert_eq!(by_id, by_name);

        assert!(storage.resolve_service_type("Lakiranje").unwrap_err().is_not_found());
        assert!(storage.resolve_service_type("424242").unwrap_err().is_not_found());
    }

    #[test]
    fn test_add_service_type() {
        let storage = create_test_storage();
        let added = storage.add_service_type("  Lakiranje ").unwrap();
        assert_eq!(added.name, "Lakiranje");
        assert_eq!(storage.resolve_service_type("lakiranje").unwrap(), added);
    }

    #[test]
    fn test_add_service_type_duplicate_and_blank() {
        let storage = create_test_storage();
        assert!(matches!(
            storage.add_service_type("dpf").unwrap_err(),
            Error::DuplicateServiceType { .. }
        ));
        assert!(storage.add_service_type("   ").unwrap_err().is_validation());
    }

    #[test]
    fn test_metadata_roundtrip() {
        let storage = create_test_storage();
        assert!(storage.get_metadata("last_backup_at").unwrap().is_none());
        storage.set_metadata("last_backup_at", "x").unwrap();
        storage.set_metadata("last_backup_at", "y").unwrap();
        assert_eq!(
            storage.get_metadata("last_backup_at").unwrap(),
            Some("y".to_string())
        );
    }

    #[test]
    fn test_stats_empty() {
        let storage = create_test_storage();
        let stats = storage.stats().unwrap();

        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.service_types, 7);
        assert!(stats.first_record.is_none());
        assert!(stats.last_record.is_none());
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_stats_with_data() {
        let storage = create_test_storage();
        storage
            .insert_record(&create_test_record(&storage, "A", "DPF", date(2023, 6, 1), 1))
            .unwrap();
        storage
            .insert_record(&create_test_record(&storage, "B", "DPF", date(2024, 2, 1), 1))
            .unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.first_record, Some(date(2023, 6, 1)));
        assert_eq!(stats.last_record, Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
        assert!(storage.is_in_memory());
    }

    #[test]
    fn test_open_file_based_with_custom_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("app_data.db");

        let storage = Storage::open_with_service_types(&db_path, &["Filter", "Ulje"]).unwrap();
        assert!(db_path.exists());
        assert_eq!(storage.path(), db_path);
        assert_eq!(storage.service_types().unwrap().len(), 2);

        let id = storage
            .insert_record(&create_test_record(&storage, "VIN", "Ulje", date(2024, 1, 1), 50))
            .unwrap();
        drop(storage);

        let reopened = Storage::open(&db_path).unwrap();
        assert_eq!(reopened.service_types().unwrap().len(), 2);
        assert!(reopened.get_record(id).unwrap().is_some());
        assert!(reopened.stats().unwrap().db_size_bytes > 0);
    }

    #[test]
    fn test_backup_to() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path().join("app_data.db")).unwrap();
        storage
            .insert_record(&create_test_record(&storage, "VIN", "DPF", date(2024, 1, 1), 50))
            .unwrap();

        let dest = dir.path().join("backups").join("copy.db");
        storage.backup_to(&dest).unwrap();
        assert!(dest.exists());

        let copy = Storage::open(&dest).unwrap();
        assert_eq!(copy.count().unwrap(), 1);

        let err = storage.backup_to(&dest).unwrap_err();
        assert!(matches!(err, Error::Backup { .. }));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("a%b_c\\d"), "a\\%b\\_c\\\\d");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_unicode_fields() {
        let storage = create_test_storage();
        let mut record = create_test_record(&storage, "ČŠĐ-1", "DPF", date(2024, 1, 1), 1);
        record.description = "Čišćenje filtera čađi".to_string();

        let id = storage.insert_record(&record).unwrap();
        let retrieved = storage.get_record(id).unwrap().unwrap();
        assert_eq!(retrieved.description, "Čišćenje filtera čađi");
        assert_eq!(storage.search_records("ŠĐ").unwrap().len(), 1);
    }
}
