//! `servicebook` - Service record book for a vehicle-service shop
//!
//! This library keeps the shop's service records in a local SQLite database,
//! finds them by chassis number, and summarizes them into monthly and yearly
//! reports by service type.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod actions;
pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod record;
pub mod report;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{NewRecord, RecordChanges, ServiceRecord, ServiceType};
pub use report::{Report, ReportPeriod, ReportRow};
pub use storage::{Storage, StorageStats};
