//! Core record types for servicebook.
//!
//! This module defines the service record as it is entered by the operator
//! ([`NewRecord`]) and as it is read back joined with its service type
//! ([`ServiceRecord`]).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Date format used for the `datum` column and on the command line.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Highest price a record may carry.
///
/// Keeps per-period sums well inside `i64` for any realistic record count.
pub const MAX_PRICE: i64 = 1_000_000_000_000;

/// A category of work the shop performs (a row of `tip_usluge`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceType {
    /// Database identifier.
    pub id: i64,
    /// Display name, e.g. `DPF` or `Dijagnostika`.
    pub name: String,
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Field values for a record that is about to be inserted or updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    /// Day the service was performed.
    pub date: NaiveDate,
    /// Vehicle chassis (VIN) number.
    pub chassis_number: String,
    /// Registration plate.
    pub registration_plate: String,
    /// Vehicle make and model.
    pub make_model: String,
    /// Referenced service type.
    pub service_type_id: i64,
    /// Free-form description of the work done.
    pub description: String,
    /// Price charged, in whole currency units.
    pub price: i64,
}

impl NewRecord {
    /// Return a copy with surrounding whitespace removed from all text fields.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            date: self.date,
            chassis_number: self.chassis_number.trim().to_string(),
            registration_plate: self.registration_plate.trim().to_string(),
            make_model: self.make_model.trim().to_string(),
            service_type_id: self.service_type_id,
            description: self.description.trim().to_string(),
            price: self.price,
        }
    }

    /// Check that the record can be stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidField`] if a vehicle identifier is blank or the
    /// price is negative or above [`MAX_PRICE`].
    pub fn validate(&self) -> Result<()> {
        require_text("chassis_number", &self.chassis_number)?;
        require_text("registration_plate", &self.registration_plate)?;
        require_text("make_model", &self.make_model)?;

        if self.price < 0 {
            return Err(Error::invalid_field(
                "price",
                format!("must not be negative (got {})", self.price),
            ));
        }
        if self.price > MAX_PRICE {
            return Err(Error::invalid_field(
                "price",
                format!("must not exceed {MAX_PRICE} (got {})", self.price),
            ));
        }
        Ok(())
    }

    /// Build the replacement for `existing`, taking each field from `changes`
    /// when present and from the stored record otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidField`] if neither `changes` nor the stored
    /// record carry a price.
    pub fn with_changes(existing: &ServiceRecord, changes: RecordChanges) -> Result<Self> {
        let price = changes.price.or(existing.price).ok_or_else(|| {
            Error::invalid_field(
                "price",
                format!("record {} has no stored price, a new one is required", existing.id),
            )
        })?;

        Ok(Self {
            date: changes.date.unwrap_or(existing.date),
            chassis_number: changes
                .chassis_number
                .unwrap_or_else(|| existing.chassis_number.clone()),
            registration_plate: changes
                .registration_plate
                .unwrap_or_else(|| existing.registration_plate.clone()),
            make_model: changes
                .make_model
                .unwrap_or_else(|| existing.make_model.clone()),
            service_type_id: changes.service_type_id.unwrap_or(existing.service_type_id),
            description: changes
                .description
                .unwrap_or_else(|| existing.description.clone()),
            price,
        })
    }
}

/// Fields to change on a stored record. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordChanges {
    /// New service date.
    pub date: Option<NaiveDate>,
    /// New chassis number.
    pub chassis_number: Option<String>,
    /// New registration plate.
    pub registration_plate: Option<String>,
    /// New make and model.
    pub make_model: Option<String>,
    /// New service type.
    pub service_type_id: Option<i64>,
    /// New description.
    pub description: Option<String>,
    /// New price.
    pub price: Option<i64>,
}

impl RecordChanges {
    /// Whether no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn require_text(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_field(field, "must not be empty"));
    }
    Ok(())
}

/// A stored record joined with the name of its service type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Database identifier.
    pub id: i64,
    /// Day the service was performed.
    pub date: NaiveDate,
    /// Vehicle chassis (VIN) number.
    pub chassis_number: String,
    /// Registration plate.
    pub registration_plate: String,
    /// Vehicle make and model.
    pub make_model: String,
    /// Name of the service type.
    pub service_type: String,
    /// Referenced service type.
    pub service_type_id: i64,
    /// Description of the work done (empty when none was given).
    pub description: String,
    /// Price charged. Older databases may hold records without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`Error::InvalidField`] if the text is not a valid calendar date.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|e| Error::invalid_field("date", format!("'{text}' is not YYYY-MM-DD ({e})")))
}

/// Parse a price entered by the operator.
///
/// Only plain digits are accepted, so signs, separators and decimals are rejected.
///
/// # Errors
///
/// Returns [`Error::InvalidField`] if the text is not a whole non-negative
/// number or exceeds [`MAX_PRICE`].
pub fn parse_price(text: &str) -> Result<i64> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid_field(
            "price",
            format!("'{text}' must be a whole number"),
        ));
    }
    match text.parse::<i64>() {
        Ok(price) if price <= MAX_PRICE => Ok(price),
        _ => Err(Error::invalid_field(
            "price",
            format!("'{text}' exceeds {MAX_PRICE}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewRecord {
        NewRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            chassis_number: "WVWZZZ1KZAW000001".to_string(),
            registration_plate: "BG-123-AA".to_string(),
            make_model: "VW Golf 6".to_string(),
            service_type_id: 7,
            description: "DPF cleaning".to_string(),
            price: 12_000,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_chassis() {
        let mut record = sample();
        record.chassis_number = "   ".to_string();
        let err = record.validate().unwrap_err();
        assert!(err.to_string().contains("chassis_number"));
    }

    #[test]
    fn test_validate_empty_plate_and_model() {
        let mut record = sample();
        record.registration_plate = String::new();
        assert!(record.validate().is_err());

        let mut record = sample();
        record.make_model = String::new();
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_validate_negative_price() {
        let mut record = sample();
        record.price = -1;
        let err = record.validate().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn test_validate_empty_description_allowed() {
        let mut record = sample();
        record.description = String::new();
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_normalized_trims() {
        let mut record = sample();
        record.chassis_number = "  VIN1 ".to_string();
        record.description = "\tclean\n".to_string();
        let normalized = record.normalized();
        assert_eq!(normalized.chassis_number, "VIN1");
        assert_eq!(normalized.description, "clean");
        assert_eq!(normalized.price, record.price);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("15.03.2024").is_err());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("15000").unwrap(), 15_000);
        assert_eq!(parse_price(" 0 ").unwrap(), 0);
        assert!(parse_price("-5").is_err());
        assert!(parse_price("12.50").is_err());
        assert!(parse_price("").is_err());
        assert!(parse_price("99999999999999999999").is_err());
        assert_eq!(parse_price("1000000000000").unwrap(), MAX_PRICE);
        assert!(parse_price("1000000000001").is_err());
        assert!(parse_price("5000000000000000000").is_err());
    }

    #[test]
    fn test_validate_price_ceiling() {
        let mut record = sample();
        record.price = MAX_PRICE;
        assert!(record.validate().is_ok());

        record.price = MAX_PRICE + 1;
        let err = record.validate().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("price"));
    }

    fn stored(price: Option<i64>) -> ServiceRecord {
        ServiceRecord {
            id: 9,
            date: NaiveDate::from_ymd_opt(2023, 11, 4).unwrap(),
            chassis_number: "VF1RFB00000000001".to_string(),
            registration_plate: "KG-44-CC".to_string(),
            make_model: "Renault Megane".to_string(),
            service_type: "Dijagnostika".to_string(),
            service_type_id: 4,
            description: "Greška P2002".to_string(),
            price,
        }
    }

    #[test]
    fn test_with_changes_keeps_untouched_fields() {
        let existing = stored(Some(3_000));
        let changes = RecordChanges {
            registration_plate: Some("KG-45-CC".to_string()),
            price: Some(3_500),
            ..RecordChanges::default()
        };

        let record = NewRecord::with_changes(&existing, changes).unwrap();
        assert_eq!(record.registration_plate, "KG-45-CC");
        assert_eq!(record.price, 3_500);
        assert_eq!(record.date, existing.date);
        assert_eq!(record.chassis_number, existing.chassis_number);
        assert_eq!(record.make_model, existing.make_model);
        assert_eq!(record.service_type_id, 4);
        assert_eq!(record.description, existing.description);
    }

    #[test]
    fn test_with_no_changes_reproduces_record() {
        let existing = stored(Some(3_000));
        let record = NewRecord::with_changes(&existing, RecordChanges::default()).unwrap();
        assert_eq!(record.price, 3_000);
        assert_eq!(record.service_type_id, existing.service_type_id);
        assert!(RecordChanges::default().is_empty());
    }

    #[test]
    fn test_with_changes_requires_price_for_unpriced_record() {
        let existing = stored(None);

        let err = NewRecord::with_changes(&existing, RecordChanges::default()).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("price"));

        let changes = RecordChanges {
            price: Some(2_000),
            ..RecordChanges::default()
        };
        assert_eq!(NewRecord::with_changes(&existing, changes).unwrap().price, 2_000);
    }

    #[test]
    fn test_service_type_display() {
        let st = ServiceType {
            id: 1,
            name: "Servis".to_string(),
        };
        assert_eq!(st.to_string(), "Servis");
    }

    #[test]
    fn test_service_record_serialization_skips_missing_price() {
        let record = ServiceRecord {
            id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            chassis_number: "VIN".to_string(),
            registration_plate: "NS-001".to_string(),
            make_model: "Fiat Punto".to_string(),
            service_type: "Gume".to_string(),
            service_type_id: 5,
            description: String::new(),
            price: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"date\":\"2024-01-02\""));
        assert!(!json.contains("price"));
    }
}
