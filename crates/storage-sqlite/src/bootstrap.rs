//! Store startup: migrate an existing store, or create the schema of a new one.

use std::sync::Arc;

use ledgersync_core::constants::{SCHEDULER_IS_ENABLE_COLUMN, SCHEDULER_TABLE};
use ledgersync_core::dao::DbDao;
use ledgersync_core::migrations::DbMigrator;
use ledgersync_core::Result;
use log::info;

/// Brings the store at `dao` to the migrator's supported version.
///
/// An existing store is migrated (taking a backup first). A fresh store gets
/// every unit applied upwards from version 0. Either way the `scheduler`
/// table ends up with one enabled row if it had none.
pub async fn bootstrap_store(dao: Arc<dyn DbDao>, migrator: &DbMigrator) -> Result<()> {
    migrator.set_dao(Arc::clone(&dao));
    migrator.migrate_from_curr_to_supported_ver().await?;

    if dao.is_db_empty().await? {
        let supported_ver = migrator.get_supported_db_ver();
        info!("Creating schema v{} for a new store", supported_ver);

        let versions = migrator.range(0, supported_ver)?;
        migrator.migrate(versions, false).await?;
    }

    dao.execute_queries_in_trans(vec![format!(
        "INSERT INTO {table} ({column}) SELECT 1 WHERE NOT EXISTS (SELECT 1 FROM {table})",
        table = SCHEDULER_TABLE,
        column = SCHEDULER_IS_ENABLE_COLUMN,
    )])
    .await
}
