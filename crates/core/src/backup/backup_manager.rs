use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use futures::FutureExt;
use log::{debug, error, warn};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::backup_file_name::{backup_file_name, parse_backup_file_name};
use super::{
    BackupDbParams, BackupFile, BackupRetention, DbBackupManagerConfig, DbBackupManagerTrait,
    RestoreDbParams,
};
use crate::constants::{BACKUPS_DIR_NAME, SCHEDULER_IS_ENABLE_COLUMN, SCHEDULER_TABLE};
use crate::dao::{BackupDbOptions, DbDao, ProgressFn, RecordPatch, RestartDbOptions};
use crate::errors::{Error, Result};
use crate::process::{ProcessMessageSink, ProcessState};
use crate::scheduler::SyncSchedulerTrait;

/// Number of distinct schema versions represented among retained backups.
const MAX_RETAINED_VERSIONS: usize = 2;

/// Backups kept for the newest retained version.
const MAX_FILES_OF_NEWEST_VERSION: usize = 2;

/// Backups kept for any older retained version.
const MAX_FILES_OF_OLDER_VERSION: usize = 1;

/// Creates, prunes and restores backups of the live store file.
///
/// Owns the backups directory. The live store file is only replaced inside
/// `DbDao::restart_db`, while the handle is closed.
pub struct DbBackupManager {
    dao: Arc<dyn DbDao>,
    sync_scheduler: Arc<dyn SyncSchedulerTrait>,
    process_message_sink: Arc<dyn ProcessMessageSink>,
    db_dir: PathBuf,
    db_file_name: String,
    backup_dir: PathBuf,
    supported_db_version: i64,
}

impl DbBackupManager {
    /// Creates the manager and the backups directory if missing.
    pub fn new(
        config: DbBackupManagerConfig,
        dao: Arc<dyn DbDao>,
        sync_scheduler: Arc<dyn SyncSchedulerTrait>,
        process_message_sink: Arc<dyn ProcessMessageSink>,
    ) -> Result<Self> {
        let backup_dir = config.db_dir.join(BACKUPS_DIR_NAME);
        std::fs::create_dir_all(&backup_dir).map_err(|e| {
            error!(
                "Failed to create backup directory {}: {}",
                backup_dir.display(),
                e
            );
            Error::Io(e)
        })?;

        Ok(DbBackupManager {
            dao,
            sync_scheduler,
            process_message_sink,
            db_dir: config.db_dir,
            db_file_name: config.db_file_name,
            backup_dir,
            supported_db_version: config.supported_db_version,
        })
    }

    /// Path of the live store file.
    pub fn db_destination(&self) -> PathBuf {
        self.db_dir.join(&self.db_file_name)
    }

    async fn try_backup_db(&self, params: BackupDbParams) -> Result<PathBuf> {
        let curr_ver = match params.curr_ver {
            Some(ver) => ver,
            None => self.dao.get_curr_db_ver().await?,
        };

        match params.supported_ver {
            Some(supported_ver) => debug!(
                "[Start v{} DB backup before migration to v{}]",
                curr_ver, supported_ver
            ),
            None => debug!("[Start v{} DB backup]", curr_ver),
        }

        let file_path = self
            .backup_dir
            .join(backup_file_name(curr_ver, Utc::now()));

        self.process_message_sink
            .send_state(ProcessState::BackupStarted);

        let sink = Arc::clone(&self.process_message_sink);
        let progress_fn: ProgressFn = Arc::new(move |progress| {
            debug!("[DB backup progress]: {}%", progress);
            sink.send_state(ProcessState::backup_progress(progress));
        });

        self.dao
            .backup_db(BackupDbOptions::new(file_path.clone()).with_progress_fn(progress_fn))
            .await?;
        self.manage_db_backup_files().await?;

        Ok(file_path)
    }

    fn scheduler_patch(is_enable: bool) -> RecordPatch {
        let mut patch = RecordPatch::new();
        patch.insert(
            SCHEDULER_IS_ENABLE_COLUMN.to_string(),
            serde_json::Value::Bool(is_enable),
        );
        patch
    }
}

#[async_trait]
impl DbBackupManagerTrait for DbBackupManager {
    async fn backup_db(&self, params: BackupDbParams) -> Option<PathBuf> {
        match self.try_backup_db(params).await {
            Ok(file_path) => {
                self.process_message_sink
                    .send_state(ProcessState::BackupFinished);
                debug!(
                    "[DB backup has been created successfully]: {}",
                    file_path.display()
                );
                Some(file_path)
            }
            Err(e) => {
                debug!(
                    "[ERR_DB_BACKUP_V{}_HAS_FAILED]",
                    params
                        .curr_ver
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "?".to_string())
                );
                error!("{}", e);

                self.process_message_sink
                    .send_state(ProcessState::ErrorBackup);
                None
            }
        }
    }

    async fn manage_db_backup_files(&self) -> Result<BackupRetention> {
        let backup_files_metadata = self.get_backup_files_metadata().await?;
        let (excluded_files, files_to_remove) = select_retained_backups(backup_files_metadata);

        let removals = files_to_remove.into_iter().map(|metadata| async move {
            match tokio::fs::remove_file(&metadata.file_path).await {
                Ok(()) => Some(metadata),
                Err(e) if e.kind() == ErrorKind::NotFound => Some(metadata),
                Err(e) => {
                    warn!(
                        "Failed to remove backup file {}: {}",
                        metadata.file_path.display(),
                        e
                    );
                    None
                }
            }
        });
        let removed_files = join_all(removals).await.into_iter().flatten().collect();

        Ok(BackupRetention {
            removed_files,
            excluded_files,
        })
    }

    async fn get_backup_files_metadata(&self) -> Result<Vec<BackupFile>> {
        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(&self.backup_dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            entries.push(entry);
        }

        let inspections = entries.into_iter().map(|entry| async move {
            let name = entry.file_name().to_string_lossy().to_string();
            let parsed = parse_backup_file_name(&name)?;
            let is_file = entry
                .file_type()
                .await
                .map(|file_type| file_type.is_file())
                .unwrap_or(false);
            if !is_file {
                return None;
            }

            Some(BackupFile {
                file_path: entry.path(),
                name,
                version: parsed.version,
                mts: parsed.mts,
            })
        });
        let mut files: Vec<BackupFile> = join_all(inspections).await.into_iter().flatten().collect();

        sort_backup_files(&mut files);

        Ok(files)
    }

    async fn restore_db(&self, params: RestoreDbParams) -> Result<bool> {
        let version = params.version.unwrap_or(self.supported_db_version);

        let backup_files_metadata = self.get_backup_files_metadata().await?;
        let suitable_backup = backup_files_metadata.into_iter().find(|m| match &params.name {
            Some(name) => m.name == *name,
            None => m.version <= version,
        });
        let Some(backup) = suitable_backup else {
            return Ok(false);
        };

        self.dao
            .update_record_of(SCHEDULER_TABLE, Self::scheduler_patch(false))
            .await?;
        self.sync_scheduler.stop().await?;

        let db_dir = self.db_dir.clone();
        let db_file_name = self.db_file_name.clone();
        let db_destination = self.db_destination();
        let backup_path = backup.file_path.clone();

        self.dao
            .restart_db(RestartDbOptions::with_middleware(Box::new(move || {
                async move {
                    remove_live_db_files(&db_dir, &db_file_name).await?;
                    tokio::fs::copy(&backup_path, &db_destination).await?;
                    Ok::<(), Error>(())
                }
                .boxed()
            })))
            .await?;

        self.dao
            .update_record_of(SCHEDULER_TABLE, Self::scheduler_patch(true))
            .await?;
        self.sync_scheduler.resume().await?;

        debug!("[DB has been restored]: {}", backup.file_path.display());
        self.process_message_sink
            .send_state(ProcessState::db_has_been_restored(
                backup.version != self.supported_db_version,
            ));

        Ok(true)
    }
}

/// Sorts backups by `(version, mts)`, newest first.
pub fn sort_backup_files(files: &mut [BackupFile]) {
    files.sort_by(|a, b| (b.version, b.mts).cmp(&(a.version, a.mts)));
}

/// Splits backups sorted newest first into `(kept, to_remove)`.
///
/// The newest file is always kept. At most two distinct versions survive:
/// the newest version keeps up to two files, the older one a single file.
pub fn select_retained_backups(files: Vec<BackupFile>) -> (Vec<BackupFile>, Vec<BackupFile>) {
    let mut kept: Vec<BackupFile> = Vec::new();
    let mut to_remove = Vec::new();

    for metadata in files {
        let keep = match kept.first() {
            None => true,
            Some(first) => {
                let version = metadata.version;
                let other_versions = kept
                    .iter()
                    .map(|m| m.version)
                    .filter(|v| *v != version)
                    .collect::<HashSet<_>>()
                    .len();
                let kept_of_version = kept.iter().filter(|m| m.version == version).count();
                let max_files = if first.version == version {
                    MAX_FILES_OF_NEWEST_VERSION
                } else {
                    MAX_FILES_OF_OLDER_VERSION
                };

                other_versions < MAX_RETAINED_VERSIONS && kept_of_version < max_files
            }
        };

        if keep {
            kept.push(metadata);
        } else {
            to_remove.push(metadata);
        }
    }

    (kept, to_remove)
}

/// Removes the live store file and its side files (`-wal`, `-shm`,
/// `-journal`): every file in `db_dir` whose lowercased name starts with
/// `db_file_name`.
async fn remove_live_db_files(db_dir: &Path, db_file_name: &str) -> Result<()> {
    let prefix = db_file_name.to_lowercase();
    let mut read_dir = tokio::fs::read_dir(db_dir).await?;
    let mut paths = Vec::new();

    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !name.starts_with(&prefix) || !entry.file_type().await?.is_file() {
            continue;
        }
        paths.push(entry.path());
    }

    let removals = paths.iter().map(|path| async move {
        match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(Error::Io(e)),
            _ => Ok(()),
        }
    });
    for result in join_all(removals).await {
        result?;
    }

    Ok(())
}
