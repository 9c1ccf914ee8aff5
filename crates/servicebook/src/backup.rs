//! Periodic database backups.
//!
//! Before data is changed, a copy of the database is written to the backup
//! directory when the previous backup is older than the configured interval.
//! The time of the last backup lives in the database's metadata table, and old
//! backup files beyond the retention count are removed.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;

/// Metadata key holding the RFC 3339 time of the last backup.
pub const LAST_BACKUP_KEY: &str = "last_backup_at";

/// Timestamp format embedded in backup file names.
const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Length of a rendered [`FILE_TIMESTAMP_FORMAT`] timestamp.
const TIMESTAMP_LEN: usize = 15;

/// When and where backups are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPolicy {
    /// Directory receiving backup files.
    pub directory: PathBuf,
    /// Minimum time between automatic backups.
    pub interval: Duration,
    /// Number of backup files to retain, 0 for unlimited.
    pub keep: usize,
}

impl BackupPolicy {
    /// Build the policy described by `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            directory: config.backup_dir(),
            interval: config.backup_interval(),
            keep: config.backup.keep,
        }
    }
}

/// Check whether an automatic backup should be taken at `now`.
///
/// A backup is due when the last one is older than the policy interval, or
/// when none was ever recorded and the database already holds records.
/// In-memory databases are never backed up.
///
/// # Errors
///
/// Returns an error if the database cannot be queried.
pub fn is_due(storage: &Storage, policy: &BackupPolicy, now: DateTime<Local>) -> Result<bool> {
    if storage.is_in_memory() {
        return Ok(false);
    }

    match storage.get_metadata(LAST_BACKUP_KEY)? {
        Some(value) => match DateTime::parse_from_rfc3339(&value) {
            Ok(last) => {
                let elapsed = now.with_timezone(&Utc) - last.with_timezone(&Utc);
                debug!("Last backup was {} hours ago", elapsed.num_hours());
                Ok(elapsed >= policy.interval)
            }
            Err(e) => {
                warn!("Ignoring unreadable {} value '{}': {}", LAST_BACKUP_KEY, value, e);
                Ok(true)
            }
        },
        None => Ok(storage.count()? > 0),
    }
}

/// Take a backup now, record its time and prune old backup files.
///
/// Returns the path of the new backup file.
///
/// # Errors
///
/// Returns an error if the backup cannot be written or the directory cannot be read.
pub fn create_backup(
    storage: &Storage,
    policy: &BackupPolicy,
    now: DateTime<Local>,
) -> Result<PathBuf> {
    if storage.is_in_memory() {
        return Err(Error::Backup {
            path: storage.path().to_path_buf(),
            message: "in-memory databases cannot be backed up".to_string(),
        });
    }

    let stem = database_stem(storage.path());
    let dest = unique_destination(&policy.directory, &stem, now);
    storage.backup_to(&dest)?;
    storage.set_metadata(LAST_BACKUP_KEY, &now.to_rfc3339())?;

    let removed = prune_backups(&policy.directory, &stem, policy.keep)?;
    if removed > 0 {
        info!("Removed {} old backups from {}", removed, policy.directory.display());
    }
    Ok(dest)
}

/// Take a backup if one [`is_due`].
///
/// # Errors
///
/// Returns an error if checking or writing the backup fails.
pub fn backup_if_due(
    storage: &Storage,
    policy: &BackupPolicy,
    now: DateTime<Local>,
) -> Result<Option<PathBuf>> {
    if is_due(storage, policy, now)? {
        create_backup(storage, policy, now).map(Some)
    } else {
        Ok(None)
    }
}

/// File name of a backup of `stem` taken at `at`.
#[must_use]
pub fn backup_file_name(stem: &str, at: DateTime<Local>) -> String {
    format!("backup_{stem}_{}.db", at.format(FILE_TIMESTAMP_FORMAT))
}

/// Backups of the database named `stem` in `directory`, oldest first.
///
/// Only files named exactly like [`backup_file_name`] output for `stem`, with
/// an optional `_N` collision suffix, are included. Backups of other databases
/// sharing the directory are left out even when their stem starts with `stem`.
/// A missing directory yields an empty list.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be read.
pub fn list_backups(directory: &Path, stem: &str) -> Result<Vec<PathBuf>> {
    if !directory.exists() {
        return Ok(Vec::new());
    }

    let mut backups = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some((taken_at, counter)) = parse_backup_name(name, stem) {
            if path.is_file() {
                backups.push((taken_at, counter, path));
            }
        }
    }

    backups.sort();
    Ok(backups.into_iter().map(|(_, _, path)| path).collect())
}

/// Split a backup file name of `stem` into its timestamp and collision counter.
///
/// `backup_<stem>_<YYYYmmdd_HHMMSS>.db` has counter 0 and
/// `backup_<stem>_<YYYYmmdd_HHMMSS>_<N>.db` has counter N.
fn parse_backup_name(name: &str, stem: &str) -> Option<(NaiveDateTime, u32)> {
    let rest = name
        .strip_prefix("backup_")?
        .strip_prefix(stem)?
        .strip_prefix('_')?
        .strip_suffix(".db")?;

    let stamp = rest.get(..TIMESTAMP_LEN)?;
    let is_stamp = stamp
        .bytes()
        .enumerate()
        .all(|(i, b)| if i == 8 { b == b'_' } else { b.is_ascii_digit() });
    if !is_stamp {
        return None;
    }
    let taken_at = NaiveDateTime::parse_from_str(stamp, FILE_TIMESTAMP_FORMAT).ok()?;

    let counter = match &rest[TIMESTAMP_LEN..] {
        "" => 0,
        suffix => {
            let digits = suffix.strip_prefix('_')?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse().ok()?
        }
    };
    Some((taken_at, counter))
}

/// Delete all but the newest `keep` backups of `stem`. `keep == 0` keeps all.
///
/// Returns the number of files removed.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or a file cannot be removed.
pub fn prune_backups(directory: &Path, stem: &str, keep: usize) -> Result<usize> {
    if keep == 0 {
        return Ok(0);
    }

    let backups = list_backups(directory, stem)?;
    let excess = backups.len().saturating_sub(keep);
    for path in &backups[..excess] {
        debug!("Removing old backup {}", path.display());
        std::fs::remove_file(path)?;
    }
    Ok(excess)
}

fn database_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "database".to_string(), |s| s.to_string_lossy().into_owned())
}

/// Pick a file name that does not exist yet, suffixing `_N` on collisions.
fn unique_destination(directory: &Path, stem: &str, now: DateTime<Local>) -> PathBuf {
    let mut candidate = directory.join(backup_file_name(stem, now));
    let mut n = 1;
    while candidate.exists() {
        candidate = directory.join(format!(
            "backup_{stem}_{}_{n}.db",
            now.format(FILE_TIMESTAMP_FORMAT)
        ));
        n += 1;
    }
    candidate
}
