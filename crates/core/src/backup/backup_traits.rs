use async_trait::async_trait;
use std::path::PathBuf;

use super::{BackupDbParams, BackupFile, BackupRetention, RestoreDbParams};
use crate::errors::Result;

#[async_trait]
pub trait DbBackupManagerTrait: Send + Sync {
    /// Snapshots the store into the backups directory and prunes old backups.
    ///
    /// Never fails: errors are logged and reported as `ErrorBackup`.
    /// Returns the backup path on success.
    async fn backup_db(&self, params: BackupDbParams) -> Option<PathBuf>;

    /// Applies the retention rule to the backups directory.
    async fn manage_db_backup_files(&self) -> Result<BackupRetention>;

    /// Lists versioned backups, newest `(version, mts)` first.
    async fn get_backup_files_metadata(&self) -> Result<Vec<BackupFile>>;

    /// Swaps the live store for a backup. `Ok(false)` when no backup matches.
    async fn restore_db(&self, params: RestoreDbParams) -> Result<bool>;
}
