//! Backup domain models.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A backup file found in the backups directory.
///
/// Never cached: it is rebuilt from a directory listing on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupFile {
    pub name: String,
    pub file_path: PathBuf,
    /// Schema version parsed from the `v<digits>` token.
    pub version: i64,
    /// Creation instant parsed from the timestamp token, epoch milliseconds
    /// (0 when the name carries no timestamp).
    pub mts: i64,
}

/// Outcome of one retention run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRetention {
    pub removed_files: Vec<BackupFile>,
    /// Files kept by the retention rule.
    pub excluded_files: Vec<BackupFile>,
}

/// Parameters for `backup_db`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDbParams {
    /// Version tagged into the file name; read from the store when absent.
    pub curr_ver: Option<i64>,
    /// Version the pending migration targets, for log context only.
    pub supported_ver: Option<i64>,
}

/// Parameters for `restore_db`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreDbParams {
    /// Restore the newest backup at or below this version
    /// (defaults to the supported version).
    #[serde(default)]
    pub version: Option<i64>,
    /// Restore the backup with exactly this file name; wins over `version`.
    #[serde(default)]
    pub name: Option<String>,
}

/// Settings the backup manager needs about the store layout.
#[derive(Debug, Clone)]
pub struct DbBackupManagerConfig {
    /// Directory holding the live store file and the backups subdirectory.
    pub db_dir: PathBuf,
    /// File name of the live store; also the prefix of its side files.
    pub db_file_name: String,
    pub supported_db_version: i64,
}
