//! Process state notifications.

use serde::{Deserialize, Serialize};

/// Notifications relayed to the supervising process.
///
/// Backup, migration and restore flows report their progress and outcome
/// exclusively through these states; callers of `backup_db` in particular can
/// only observe a failure as `ErrorBackup`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "state",
    content = "data",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum ProcessState {
    BackupStarted,

    /// Percentage of the backup copied so far (0..=100).
    BackupProgress { progress: u8 },

    BackupFinished,

    ErrorBackup,

    ErrorMigrations,

    ReadyMigrations,

    /// The live store was swapped for a backup file.
    #[serde(rename_all = "camelCase")]
    DbHasBeenRestored {
        /// The restored schema version differs from the supported one,
        /// so a migration will run on the next start.
        is_not_ver_supported: bool,
    },
}

impl ProcessState {
    /// Creates a BackupProgress state, clamping the value to 100.
    pub fn backup_progress(progress: u8) -> Self {
        Self::BackupProgress {
            progress: progress.min(100),
        }
    }

    /// Creates a DbHasBeenRestored state.
    pub fn db_has_been_restored(is_not_ver_supported: bool) -> Self {
        Self::DbHasBeenRestored {
            is_not_ver_supported,
        }
    }
}
