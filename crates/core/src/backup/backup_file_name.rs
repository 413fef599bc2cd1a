//! Backup file naming: `backup_v<version>_<timestamp>.db`.
//!
//! The timestamp is an ISO-8601 instant with every `:` replaced by `-`, since
//! `:` is not allowed in Windows file names. Parsing is lenient: operators may
//! rename or annotate backups, so unknown tokens are skipped.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};

const BACKUP_PREFIX: &str = "backup";
const BACKUP_EXTENSION: &str = ".db";

/// Version and timestamp recovered from a backup file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedBackupFileName {
    pub version: i64,
    /// Epoch milliseconds, 0 when no token parses as a date.
    pub mts: i64,
}

/// Builds the file name for a backup of `version` taken at `created_at`.
pub fn backup_file_name(version: i64, created_at: DateTime<Utc>) -> String {
    let iso_ts = created_at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(':', "-");

    format!("backup_v{}_{}.db", version, iso_ts)
}

/// True when `name` looks like a backup file (`backup*.db`, any case).
pub fn is_backup_file_name(name: &str) -> bool {
    let normalized = name.to_lowercase();
    normalized.starts_with(BACKUP_PREFIX) && normalized.ends_with(BACKUP_EXTENSION)
}

/// Parses a backup file name.
///
/// Returns `None` when the name is not a backup file name or carries no
/// `v<digits>` token. The first version token wins.
pub fn parse_backup_file_name(name: &str) -> Option<ParsedBackupFileName> {
    if !is_backup_file_name(name) {
        return None;
    }

    let trimmed = name
        .get(..name.len() - BACKUP_EXTENSION.len())
        .unwrap_or(name);
    let mut version = None;
    let mut mts = 0;

    for token in trimmed.split('_') {
        if version.is_none() {
            version = parse_version_token(token);
        }
        if let Some(ts) = parse_timestamp_token(token) {
            mts = ts;
        }
    }

    version.map(|version| ParsedBackupFileName { version, mts })
}

fn parse_version_token(token: &str) -> Option<i64> {
    let digits = token
        .strip_prefix('v')
        .or_else(|| token.strip_prefix('V'))?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}

/// Date layouts tried before the reduced `YYYY` and `YYYY-MM` forms.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

/// Time layouts: extended, `:`-substituted and basic.
const TIME_FORMATS: [&str; 6] = [
    "%H:%M:%S%.f",
    "%H-%M-%S%.f",
    "%H%M%S%.f",
    "%H:%M",
    "%H-%M",
    "%H%M",
];

/// Parses an ISO-8601 token, with or without the `:` -> `-` substitution,
/// into epoch milliseconds. Tokens without an offset are read as UTC.
fn parse_timestamp_token(token: &str) -> Option<i64> {
    // Cheap reject for tokens like "backup" or "v7"
    if !token.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Some(dt.timestamp_millis());
    }

    let naive_part = token
        .strip_suffix('Z')
        .or_else(|| token.strip_suffix('z'))
        .unwrap_or(token);
    let (date_part, time_part) = match naive_part.split_once(|c| c == 'T' || c == 't') {
        Some((date, time)) => (date, Some(time)),
        None => (naive_part, None),
    };

    let date = parse_date_part(date_part)?;
    let time = match time_part {
        Some(time) => parse_time_part(time)?,
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
    };

    Some(date.and_time(time).and_utc().timestamp_millis())
}

fn parse_date_part(part: &str) -> Option<NaiveDate> {
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(part, format).ok())
    {
        return Some(date);
    }

    let (year, month) = part.split_once('-').unwrap_or((part, "01"));
    if year.len() != 4 || month.len() != 2 {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

fn parse_time_part(part: &str) -> Option<NaiveTime> {
    if let Some(time) = TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(part, format).ok())
    {
        return Some(time);
    }

    if part.len() != 2 {
        return None;
    }
    NaiveTime::from_hms_opt(part.parse().ok()?, 0, 0)
}
