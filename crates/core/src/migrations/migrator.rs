use log::{debug, error};
use std::sync::{Arc, RwLock};

use super::MigrationsFactory;
use crate::backup::{BackupDbParams, DbBackupManagerTrait};
use crate::dao::DbDao;
use crate::errors::{MigrationError, Result};
use crate::process::{ProcessMessageSink, ProcessState};

/// Versions passed to `DbMigrator::migrate`: one version or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationVersions {
    Single(i64),
    List(Vec<i64>),
}

impl MigrationVersions {
    /// Normalizes to a list, rejecting negative versions.
    pub fn into_vec(self) -> Result<Vec<i64>> {
        let versions = match self {
            MigrationVersions::Single(version) => vec![version],
            MigrationVersions::List(versions) => versions,
        };

        if let Some(invalid) = versions.iter().find(|v| **v < 0) {
            return Err(MigrationError::DbMigrationVerCorrectness(format!(
                "negative version {} in {:?}",
                invalid, versions
            ))
            .into());
        }

        Ok(versions)
    }
}

impl From<i64> for MigrationVersions {
    fn from(version: i64) -> Self {
        MigrationVersions::Single(version)
    }
}

impl From<Vec<i64>> for MigrationVersions {
    fn from(versions: Vec<i64>) -> Self {
        MigrationVersions::List(versions)
    }
}

impl From<&[i64]> for MigrationVersions {
    fn from(versions: &[i64]) -> Self {
        MigrationVersions::List(versions.to_vec())
    }
}

/// Moves the store between schema versions by running migration units.
///
/// The migrator does not own the store. The DAO is attached after
/// construction with `set_dao`, since the DAO is usually built first and
/// hands itself over once its handle is open.
pub struct DbMigrator {
    migrations_factory: Arc<dyn MigrationsFactory>,
    supported_db_version: i64,
    db_backup_manager: Arc<dyn DbBackupManagerTrait>,
    process_message_sink: Arc<dyn ProcessMessageSink>,
    dao: RwLock<Option<Arc<dyn DbDao>>>,
}

impl DbMigrator {
    pub fn new(
        migrations_factory: Arc<dyn MigrationsFactory>,
        supported_db_version: i64,
        db_backup_manager: Arc<dyn DbBackupManagerTrait>,
        process_message_sink: Arc<dyn ProcessMessageSink>,
    ) -> Self {
        DbMigrator {
            migrations_factory,
            supported_db_version,
            db_backup_manager,
            process_message_sink,
            dao: RwLock::new(None),
        }
    }

    pub fn set_dao(&self, dao: Arc<dyn DbDao>) {
        let mut guard = self.dao.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(dao);
    }

    fn dao(&self) -> Result<Arc<dyn DbDao>> {
        let guard = self.dao.read().unwrap_or_else(|e| e.into_inner());
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| MigrationError::DaoNotSet.into())
    }

    pub fn get_supported_db_ver(&self) -> i64 {
        self.supported_db_version
    }

    /// Versions strictly between `start` and `end` on the side of `end`,
    /// ordered in the direction of travel.
    ///
    /// `range(24, 26) == [25, 26]`, `range(26, 24) == [26, 25]`,
    /// `range(n, n)` is empty.
    pub fn range(&self, start: i64, end: i64) -> Result<Vec<i64>> {
        for bound in [start, end] {
            if bound < 0 {
                return Err(MigrationError::DbVersionType(bound).into());
            }
        }

        let range = if start < end {
            ((start + 1)..=end).collect()
        } else {
            ((end + 1)..=start).rev().collect()
        };

        Ok(range)
    }

    /// Runs the units for `versions` strictly in the given order.
    ///
    /// Callers pre-sort the versions (see `range`). Versions the factory does
    /// not know are skipped. The first failing unit stops the run; units
    /// already applied stay applied.
    pub async fn migrate(
        &self,
        versions: impl Into<MigrationVersions>,
        is_down: bool,
    ) -> Result<()> {
        let versions = versions.into().into_vec()?;
        let dao = self.dao()?;

        debug!(
            "[Start of migrations]: {}",
            versions
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        for version in versions {
            let Some(migration) = self.migrations_factory.create(version) else {
                continue;
            };
            let ver = migration.version();

            if let Err(e) = migration.launch(dao.as_ref(), is_down).await {
                debug!("[ERR_DB_MIGRATION_V{}_HAS_FAILED]", ver);
                error!("{}", e);

                self.process_message_sink
                    .send_state(ProcessState::ErrorMigrations);

                return Err(MigrationError::MigrationLaunching { version: ver }.into());
            }
        }

        debug!("[Migrations completed successfully]");
        self.process_message_sink
            .send_state(ProcessState::ReadyMigrations);

        Ok(())
    }

    /// Brings the store from its persisted version to the supported one,
    /// taking a backup first.
    ///
    /// A fresh (empty) store and a store already at the supported version are
    /// left untouched. A failed backup is reported by the backup manager and
    /// does not stop the migration.
    pub async fn migrate_from_curr_to_supported_ver(&self) -> Result<()> {
        let dao = self.dao()?;

        if dao.is_db_empty().await? {
            return Ok(());
        }

        let supported_ver = self.get_supported_db_ver();
        let curr_ver = dao.get_curr_db_ver().await?;

        for ver in [supported_ver, curr_ver] {
            if ver < 0 {
                return Err(MigrationError::DbVersionType(ver).into());
            }
        }
        if curr_ver == supported_ver {
            return Ok(());
        }

        let is_down = curr_ver > supported_ver;
        let versions = self.range(curr_ver, supported_ver)?;

        self.db_backup_manager
            .backup_db(BackupDbParams {
                curr_ver: Some(curr_ver),
                supported_ver: Some(supported_ver),
            })
            .await;
        self.migrate(versions, is_down).await
    }
}
