//! Monthly and yearly summary reports.
//!
//! A report groups the records of one calendar period by service type and
//! carries the count, average price and revenue of each group, plus each
//! group's share of total revenue (the slices of the summary pie chart).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::Storage;

/// The calendar period a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportPeriod {
    /// A single calendar month.
    Month {
        /// Year, e.g. 2024.
        year: i32,
        /// Month, 1 through 12.
        month: u32,
    },
    /// A whole calendar year.
    Year {
        /// Year, e.g. 2024.
        year: i32,
    },
}

impl ReportPeriod {
    /// A monthly period.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPeriod`] if `month` is not within 1..=12.
    pub fn month(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::invalid_period(format!(
                "month must be between 1 and 12 (got {month})"
            )));
        }
        Ok(Self::Month { year, month })
    }

    /// A yearly period.
    #[must_use]
    pub fn year(year: i32) -> Self {
        Self::Year { year }
    }

    /// The month containing `today`.
    #[must_use]
    pub fn current_month(today: NaiveDate) -> Self {
        Self::Month {
            year: today.year(),
            month: today.month(),
        }
    }

    /// The year containing `today`.
    #[must_use]
    pub fn current_year(today: NaiveDate) -> Self {
        Self::Year { year: today.year() }
    }

    /// The monthly period selected on the command line.
    ///
    /// With neither value given this is the month containing `today`; a
    /// missing year or month is taken from `today`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPeriod`] if `month` is not within 1..=12.
    pub fn monthly(year: Option<i32>, month: Option<u32>, today: NaiveDate) -> Result<Self> {
        match (year, month) {
            (None, None) => Ok(Self::current_month(today)),
            (year, month) => Self::month(
                year.unwrap_or_else(|| today.year()),
                month.unwrap_or_else(|| today.month()),
            ),
        }
    }

    /// The yearly period selected on the command line, defaulting to the year
    /// containing `today`.
    #[must_use]
    pub fn yearly(year: Option<i32>, today: NaiveDate) -> Self {
        year.map_or_else(|| Self::current_year(today), Self::year)
    }

    /// The `strftime` pattern that reduces a record date to this period's key.
    #[must_use]
    pub fn sql_format(&self) -> &'static str {
        match self {
            Self::Month { .. } => "%Y-%m",
            Self::Year { .. } => "%Y",
        }
    }

    /// The period key, `YYYY-MM` or `YYYY`.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Month { year, month } => format!("{year:04}-{month:02}"),
            Self::Year { year } => format!("{year:04}"),
        }
    }

    /// Human-readable report title.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::Month { .. } => format!("Monthly report {}", self.key()),
            Self::Year { .. } => format!("Yearly report {}", self.key()),
        }
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Aggregates for one service type within a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Service type name.
    pub service_type: String,
    /// Number of records.
    pub count: i64,
    /// Average price of the priced records, if any were priced.
    pub average_price: Option<f64>,
    /// Sum of prices of the priced records, if any were priced.
    pub total_price: Option<i64>,
}

impl ReportRow {
    /// Revenue of this row, treating "no priced records" as zero.
    #[must_use]
    pub fn revenue(&self) -> i64 {
        self.total_price.unwrap_or(0)
    }
}

/// One slice of the revenue breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueShare {
    /// Service type name.
    pub service_type: String,
    /// Percentage of the period's total revenue, 0.0 through 100.0.
    pub percent: f64,
}

/// A generated summary report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Period covered.
    pub period: ReportPeriod,
    /// Day the report was produced.
    pub generated_on: NaiveDate,
    /// Per service type aggregates, ordered by service type name.
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Query `storage` and build the report for `period`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn generate(
        storage: &Storage,
        period: ReportPeriod,
        generated_on: NaiveDate,
    ) -> Result<Self> {
        let rows = storage.report_rows(&period)?;
        Ok(Self {
            period,
            generated_on,
            rows,
        })
    }

    /// Report title.
    #[must_use]
    pub fn title(&self) -> String {
        self.period.title()
    }

    /// Whether the period contains no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of records across all service types.
    #[must_use]
    pub fn total_count(&self) -> i64 {
        self.rows.iter().map(|r| r.count).sum()
    }

    /// Revenue across all service types, saturating at `i64::MAX`.
    #[must_use]
    pub fn total_revenue(&self) -> i64 {
        self.rows
            .iter()
            .fold(0_i64, |total, row| total.saturating_add(row.revenue()))
    }

    /// Each row's share of total revenue, in row order.
    ///
    /// When the period has no revenue every share is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn shares(&self) -> Vec<RevenueShare> {
        let total = self.total_revenue();
        self.rows
            .iter()
            .map(|row| RevenueShare {
                service_type: row.service_type.clone(),
                percent: if total > 0 {
                    row.revenue() as f64 * 100.0 / total as f64
                } else {
                    0.0
                },
            })
            .collect()
    }
}
