//! Commands received from the supervising process.

use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backup::{BackupDbParams, BackupFile, DbBackupManagerTrait, RestoreDbParams};
use crate::errors::Result;

/// A request sent by the supervising process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ProcessCommand {
    #[serde(rename = "backup-db")]
    BackupDb,

    #[serde(rename = "restore-db")]
    RestoreDb {
        #[serde(default)]
        version: Option<i64>,
        #[serde(default)]
        name: Option<String>,
    },

    #[serde(rename = "request:get-backup-files-metadata")]
    RequestGetBackupFilesMetadata,

    /// Answer to `ERROR_MIGRATIONS`: whether the newest backup at or below
    /// the supported version should be restored.
    #[serde(
        rename = "response:migration-has-failed:what-should-be-done",
        rename_all = "camelCase"
    )]
    MigrationHasFailedWhatShouldBeDone { should_restore_db: bool },
}

/// Result of a handled command, sent back to the supervising process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ProcessCommandResponse {
    #[serde(rename_all = "camelCase")]
    BackupDb { is_done: bool },

    #[serde(rename_all = "camelCase")]
    RestoreDb { is_restored: bool },

    #[serde(rename_all = "camelCase")]
    BackupFilesMetadata { backup_files: Vec<BackupFile> },
}

/// Dispatches process commands to the backup manager.
pub struct ProcessCommandHandler {
    db_backup_manager: Arc<dyn DbBackupManagerTrait>,
}

impl ProcessCommandHandler {
    pub fn new(db_backup_manager: Arc<dyn DbBackupManagerTrait>) -> Self {
        ProcessCommandHandler { db_backup_manager }
    }

    pub async fn handle(&self, command: ProcessCommand) -> Result<ProcessCommandResponse> {
        debug!("[Process command]: {:?}", command);

        match command {
            ProcessCommand::BackupDb => {
                let backup_path = self
                    .db_backup_manager
                    .backup_db(BackupDbParams::default())
                    .await;

                Ok(ProcessCommandResponse::BackupDb {
                    is_done: backup_path.is_some(),
                })
            }
            ProcessCommand::RestoreDb { version, name } => {
                let is_restored = self
                    .db_backup_manager
                    .restore_db(RestoreDbParams { version, name })
                    .await?;

                Ok(ProcessCommandResponse::RestoreDb { is_restored })
            }
            ProcessCommand::RequestGetBackupFilesMetadata => {
                let backup_files = self.db_backup_manager.get_backup_files_metadata().await?;

                Ok(ProcessCommandResponse::BackupFilesMetadata { backup_files })
            }
            ProcessCommand::MigrationHasFailedWhatShouldBeDone { should_restore_db } => {
                let is_restored = should_restore_db
                    && self
                        .db_backup_manager
                        .restore_db(RestoreDbParams::default())
                        .await?;

                Ok(ProcessCommandResponse::RestoreDb { is_restored })
            }
        }
    }
}
