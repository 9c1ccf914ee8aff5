//! Command handlers that change stored records.
//!
//! The binary parses arguments and prints results; the work of turning
//! operator input into records, merging edits and confirming deletes lives
//! here so it can run against any [`Storage`].

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::cli::{AddCommand, DeleteCommand, EditCommand};
use crate::error::{Error, Result};
use crate::record::{parse_date, parse_price, NewRecord, RecordChanges, ServiceRecord};
use crate::storage::Storage;

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Not confirmed: these records would be deleted, nothing was changed.
    Preview(Vec<ServiceRecord>),
    /// Confirmed: these records were deleted.
    Deleted(Vec<ServiceRecord>),
}

/// Build the record described by an `add` command. `today` is used when no
/// date was given.
///
/// # Errors
///
/// Returns a validation error for a malformed date or price, or
/// [`Error::UnknownServiceType`] if the service type does not resolve.
pub fn new_record(storage: &Storage, cmd: &AddCommand, today: NaiveDate) -> Result<NewRecord> {
    let date = match cmd.date.as_deref() {
        Some(text) => parse_date(text)?,
        None => today,
    };

    Ok(NewRecord {
        date,
        chassis_number: cmd.chassis.clone(),
        registration_plate: cmd.plate.clone(),
        make_model: cmd.model.clone(),
        service_type_id: storage.resolve_service_type(&cmd.service_type)?.id,
        description: cmd.description.clone(),
        price: parse_price(&cmd.price)?,
    })
}

/// Parse the fields given to an `edit` command.
///
/// # Errors
///
/// Returns a validation error for a malformed date or price, or
/// [`Error::UnknownServiceType`] if the service type does not resolve.
pub fn record_changes(storage: &Storage, cmd: &EditCommand) -> Result<RecordChanges> {
    Ok(RecordChanges {
        date: cmd.date.as_deref().map(parse_date).transpose()?,
        chassis_number: cmd.chassis.clone(),
        registration_plate: cmd.plate.clone(),
        make_model: cmd.model.clone(),
        service_type_id: cmd
            .service_type
            .as_deref()
            .map(|key| storage.resolve_service_type(key).map(|st| st.id))
            .transpose()?,
        description: cmd.description.clone(),
        price: cmd.price.as_deref().map(parse_price).transpose()?,
    })
}

/// Apply `changes` to record `id` and return the stored result.
///
/// # Errors
///
/// Returns [`Error::RecordNotFound`] if the record does not exist, a
/// validation error if the merged record is invalid, or a database error.
pub fn edit_record(storage: &Storage, id: i64, changes: RecordChanges) -> Result<ServiceRecord> {
    let existing = storage
        .get_record(id)?
        .ok_or(Error::RecordNotFound { id })?;
    if changes.is_empty() {
        info!("No changes requested for record {}", id);
        return Ok(existing);
    }

    let record = NewRecord::with_changes(&existing, changes)?;
    if !storage.update_record(id, &record)? {
        return Err(Error::RecordNotFound { id });
    }
    storage.get_record(id)?.ok_or(Error::RecordNotFound { id })
}

/// Delete the records named by a `delete` command.
///
/// Ids that do not exist are logged and skipped. Without `--yes` the existing
/// records are returned as a preview and nothing is deleted.
///
/// # Errors
///
/// Returns [`Error::RecordNotFound`] if none of the ids exist, or a database
/// error.
pub fn delete_records(storage: &Storage, cmd: &DeleteCommand) -> Result<DeleteOutcome> {
    let mut found = Vec::with_capacity(cmd.ids.len());
    for &id in &cmd.ids {
        match storage.get_record(id)? {
            Some(record) => found.push(record),
            None => warn!("Record {} does not exist", id),
        }
    }
    if found.is_empty() {
        return Err(Error::RecordNotFound {
            id: cmd.ids.first().copied().unwrap_or_default(),
        });
    }

    if !cmd.yes {
        return Ok(DeleteOutcome::Preview(found));
    }

    let ids: Vec<i64> = found.iter().map(|r| r.id).collect();
    let deleted = storage.delete_records(&ids)?;
    if deleted != ids.len() {
        warn!("Expected to delete {} records, deleted {}", ids.len(), deleted);
    }
    Ok(DeleteOutcome::Deleted(found))
}
