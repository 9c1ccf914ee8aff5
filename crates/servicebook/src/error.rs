//! Error types for servicebook.
//!
//! This module defines all error types used throughout the servicebook crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for servicebook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// No service record exists with the given ID.
    #[error("record {id} not found")]
    RecordNotFound {
        /// The requested record ID.
        id: i64,
    },

    /// The referenced service type does not exist.
    #[error("unknown service type: {key}")]
    UnknownServiceType {
        /// The ID or name that was looked up.
        key: String,
    },

    /// A service type with this name already exists.
    #[error("service type already exists: {name}")]
    DuplicateServiceType {
        /// The conflicting name.
        name: String,
    },

    // === Validation Errors ===
    /// A record field failed validation.
    #[error("invalid {field}: {message}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// A report period is out of range.
    #[error("invalid report period: {message}")]
    InvalidPeriod {
        /// Description of the problem.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Backup Errors ===
    /// Writing a database backup failed.
    #[error("failed to back up database to {path}: {message}")]
    Backup {
        /// Destination of the backup.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A specialized Result type for servicebook operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new field validation error.
    #[must_use]
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Create a new report period error.
    #[must_use]
    pub fn invalid_period(message: impl Into<String>) -> Self {
        Self::InvalidPeriod {
            message: message.into(),
        }
    }

    /// Create an unknown service type error.
    #[must_use]
    pub fn unknown_service_type(key: impl Into<String>) -> Self {
        Self::UnknownServiceType { key: key.into() }
    }

    /// Check if this error means the requested entity does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RecordNotFound { .. } | Self::UnknownServiceType { .. }
        )
    }

    /// Check if this error was caused by invalid user input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidField { .. } | Self::InvalidPeriod { .. } | Self::DuplicateServiceType { .. }
        )
    }
}
