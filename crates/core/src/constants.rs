/// Table holding the sync scheduler row
pub const SCHEDULER_TABLE: &str = "scheduler";

/// Scheduler column toggled around a restore
pub const SCHEDULER_IS_ENABLE_COLUMN: &str = "isEnable";

/// Table recording collections completed on the first sync
pub const COMPLETED_ON_FIRST_SYNC_COLLS_TABLE: &str = "completedOnFirstSyncColls";

/// Subdirectory of the store directory holding backup files
pub const BACKUPS_DIR_NAME: &str = "backups";

/// Default live store file name
pub const DEFAULT_DB_FILE_NAME: &str = "db-sqlite_sync_m0.db";
