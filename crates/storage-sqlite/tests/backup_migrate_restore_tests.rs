//! End-to-end tests: bootstrap, backup, migrate and restore against a real
//! SQLite file.

use async_trait::async_trait;
use ledgersync_core::backup::{
    BackupDbParams, DbBackupManager, DbBackupManagerConfig, DbBackupManagerTrait, RestoreDbParams,
};
use ledgersync_core::dao::{BackupDbOptions, DbDao, RecordPatch, RestartDbOptions};
use ledgersync_core::errors::{Error, MigrationError};
use ledgersync_core::migrations::{DbMigrator, Migration, MigrationsFactory};
use ledgersync_core::process::{
    MockProcessMessageSink, ProcessCommand, ProcessCommandHandler, ProcessCommandResponse,
    ProcessState,
};
use ledgersync_core::scheduler::SyncSchedulerTrait;
use ledgersync_core::Result;
use ledgersync_storage_sqlite::{
    bootstrap_store, SqliteDao, SqliteMigrationsFactory, SUPPORTED_DB_VERSION,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const DB_FILE_NAME: &str = "db-sqlite_sync_m0.db";

#[derive(Default)]
struct RecordingScheduler {
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingScheduler {
    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncSchedulerTrait for RecordingScheduler {
    async fn stop(&self) -> Result<()> {
        self.calls.lock().unwrap().push("stop");
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.calls.lock().unwrap().push("resume");
        Ok(())
    }
}

/// Unit whose batch always fails: `ledgers` already exists.
struct BrokenMigration;

impl Migration for BrokenMigration {
    fn version(&self) -> i64 {
        SUPPORTED_DB_VERSION + 1
    }

    fn up(&self) -> Vec<String> {
        vec!["CREATE TABLE ledgers (id INTEGER)".to_string()]
    }

    fn down(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Store whose next versioned batch fails on its last statement, after the
/// step's own statements already ran inside the transaction.
struct InterruptedStepDao {
    inner: Arc<SqliteDao>,
    interrupt_next: AtomicBool,
}

impl InterruptedStepDao {
    fn new(inner: Arc<SqliteDao>) -> Self {
        InterruptedStepDao {
            inner,
            interrupt_next: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl DbDao for InterruptedStepDao {
    async fn is_db_empty(&self) -> Result<bool> {
        self.inner.is_db_empty().await
    }

    async fn get_curr_db_ver(&self) -> Result<i64> {
        self.inner.get_curr_db_ver().await
    }

    async fn set_curr_db_ver(&self, version: i64) -> Result<()> {
        self.inner.set_curr_db_ver(version).await
    }

    async fn execute_queries_in_trans(&self, statements: Vec<String>) -> Result<()> {
        self.inner.execute_queries_in_trans(statements).await
    }

    async fn execute_queries_in_trans_with_ver(
        &self,
        mut statements: Vec<String>,
        version: i64,
    ) -> Result<()> {
        if self.interrupt_next.swap(false, Ordering::SeqCst) {
            statements.push("SELECT * FROM interrupted_step".to_string());
        }
        self.inner
            .execute_queries_in_trans_with_ver(statements, version)
            .await
    }

    async fn backup_db(&self, options: BackupDbOptions) -> Result<()> {
        self.inner.backup_db(options).await
    }

    async fn restart_db(&self, options: RestartDbOptions) -> Result<()> {
        self.inner.restart_db(options).await
    }

    async fn disable_foreign_keys(&self) -> Result<()> {
        self.inner.disable_foreign_keys().await
    }

    async fn enable_foreign_keys(&self) -> Result<()> {
        self.inner.enable_foreign_keys().await
    }

    async fn update_record_of(&self, table: &str, patch: RecordPatch) -> Result<()> {
        self.inner.update_record_of(table, patch).await
    }

    async fn get_first_record_value_of(&self, table: &str, column: &str) -> Result<Option<String>> {
        self.inner.get_first_record_value_of(table, column).await
    }
}

struct Store {
    dao: Arc<SqliteDao>,
    sink: MockProcessMessageSink,
    scheduler: Arc<RecordingScheduler>,
    temp_dir: TempDir,
}

struct Engine {
    migrator: DbMigrator,
    backup_manager: Arc<DbBackupManager>,
}

fn open_store() -> Store {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join(DB_FILE_NAME);
    let dao = Arc::new(SqliteDao::new(db_path.to_str().unwrap()).expect("Failed to open store"));

    Store {
        dao,
        sink: MockProcessMessageSink::new(),
        scheduler: Arc::new(RecordingScheduler::default()),
        temp_dir,
    }
}

fn create_engine(store: &Store, factory: Arc<dyn MigrationsFactory>, supported: i64) -> Engine {
    let backup_manager = Arc::new(
        DbBackupManager::new(
            DbBackupManagerConfig {
                db_dir: store.temp_dir.path().to_path_buf(),
                db_file_name: DB_FILE_NAME.to_string(),
                supported_db_version: supported,
            },
            store.dao.clone(),
            store.scheduler.clone(),
            Arc::new(store.sink.clone()),
        )
        .expect("Failed to create backup manager"),
    );
    let migrator = DbMigrator::new(
        factory,
        supported,
        backup_manager.clone(),
        Arc::new(store.sink.clone()),
    );

    Engine {
        migrator,
        backup_manager,
    }
}

fn sqlite_engine(store: &Store, supported: i64) -> Engine {
    create_engine(store, Arc::new(SqliteMigrationsFactory), supported)
}

async fn table_exists(dao: &SqliteDao, table: &str) -> bool {
    dao.execute_queries_in_trans(vec![format!("SELECT 1 FROM {} LIMIT 0", table)])
        .await
        .is_ok()
}

async fn index_exists(dao: &SqliteDao, table: &str, index: &str) -> bool {
    dao.execute_queries_in_trans(vec![format!(
        "SELECT 1 FROM {} INDEXED BY {} LIMIT 0",
        table, index
    )])
    .await
    .is_ok()
}

async fn bootstrap(store: &Store, engine: &Engine) {
    bootstrap_store(store.dao.clone(), &engine.migrator)
        .await
        .expect("Bootstrap should succeed");
}

#[tokio::test]
async fn test_bootstrap_creates_schema_for_new_store() {
    let store = open_store();
    let engine = sqlite_engine(&store, SUPPORTED_DB_VERSION);

    bootstrap(&store, &engine).await;

    assert_eq!(
        store.dao.get_curr_db_ver().await.unwrap(),
        SUPPORTED_DB_VERSION
    );
    assert!(table_exists(&store.dao, "payInvoiceList").await);
    assert_eq!(
        store
            .dao
            .get_first_record_value_of("scheduler", "isEnable")
            .await
            .unwrap(),
        Some("1".to_string())
    );
    // A new store has nothing worth backing up
    assert!(engine
        .backup_manager
        .get_backup_files_metadata()
        .await
        .unwrap()
        .is_empty());
    assert_eq!(store.sink.states(), vec![ProcessState::ReadyMigrations]);
}

#[tokio::test]
async fn test_bootstrap_is_idempotent() {
    let store = open_store();
    let engine = sqlite_engine(&store, SUPPORTED_DB_VERSION);

    bootstrap(&store, &engine).await;
    store.sink.clear();
    bootstrap(&store, &engine).await;

    assert!(store.sink.is_empty());
    assert!(table_exists(&store.dao, "scheduler").await);
    assert_eq!(
        store
            .dao
            .get_first_record_value_of("scheduler", "_id")
            .await
            .unwrap(),
        Some("1".to_string())
    );
}

#[tokio::test]
async fn test_upgrade_takes_backup_then_migrates() {
    let store = open_store();
    bootstrap(&store, &sqlite_engine(&store, 1)).await;
    assert!(!table_exists(&store.dao, "payInvoiceList").await);
    store.sink.clear();

    let engine = sqlite_engine(&store, SUPPORTED_DB_VERSION);
    bootstrap(&store, &engine).await;

    assert_eq!(
        store.dao.get_curr_db_ver().await.unwrap(),
        SUPPORTED_DB_VERSION
    );
    assert!(table_exists(&store.dao, "payInvoiceList").await);

    let backups = engine
        .backup_manager
        .get_backup_files_metadata()
        .await
        .unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0].version, 1);

    let states = store.sink.states();
    assert_eq!(states.first(), Some(&ProcessState::BackupStarted));
    assert_eq!(store.sink.count(&ProcessState::BackupFinished), 1);
    assert_eq!(states.last(), Some(&ProcessState::ReadyMigrations));
}

#[tokio::test]
async fn test_downgrade_reverts_units_in_descending_order() {
    let store = open_store();
    bootstrap(&store, &sqlite_engine(&store, SUPPORTED_DB_VERSION)).await;

    let engine = sqlite_engine(&store, 1);
    engine.migrator.set_dao(store.dao.clone());
    engine
        .migrator
        .migrate_from_curr_to_supported_ver()
        .await
        .unwrap();

    assert_eq!(store.dao.get_curr_db_ver().await.unwrap(), 1);
    assert!(!table_exists(&store.dao, "payInvoiceList").await);
    assert!(table_exists(&store.dao, "ledgers").await);
}

#[tokio::test]
async fn test_restore_brings_back_older_version() {
    let store = open_store();
    bootstrap(&store, &sqlite_engine(&store, 1)).await;
    let engine = sqlite_engine(&store, SUPPORTED_DB_VERSION);
    bootstrap(&store, &engine).await;
    store.sink.clear();

    let restored = engine
        .backup_manager
        .restore_db(RestoreDbParams {
            version: Some(1),
            name: None,
        })
        .await
        .unwrap();

    assert!(restored);
    assert_eq!(store.dao.get_curr_db_ver().await.unwrap(), 1);
    assert!(!table_exists(&store.dao, "payInvoiceList").await);
    assert_eq!(
        store
            .dao
            .get_first_record_value_of("scheduler", "isEnable")
            .await
            .unwrap(),
        Some("1".to_string())
    );
    assert_eq!(store.scheduler.calls(), vec!["stop", "resume"]);
    assert_eq!(
        store.sink.states(),
        vec![ProcessState::db_has_been_restored(true)]
    );
}

#[tokio::test]
async fn test_backup_then_restore_at_supported_version() {
    let store = open_store();
    let engine = sqlite_engine(&store, SUPPORTED_DB_VERSION);
    bootstrap(&store, &engine).await;

    let backup_path = engine
        .backup_manager
        .backup_db(BackupDbParams::default())
        .await
        .expect("Backup should succeed");
    assert!(backup_path.is_file());

    // Changes made after the backup are lost by the restore
    store
        .dao
        .execute_queries_in_trans(vec!["DROP TABLE payInvoiceList".to_string()])
        .await
        .unwrap();
    store.sink.clear();

    assert!(engine
        .backup_manager
        .restore_db(RestoreDbParams::default())
        .await
        .unwrap());

    assert!(table_exists(&store.dao, "payInvoiceList").await);
    assert_eq!(
        store.sink.states(),
        vec![ProcessState::db_has_been_restored(false)]
    );
}

#[tokio::test]
async fn test_failed_migration_can_be_answered_with_restore() {
    let store = open_store();
    bootstrap(&store, &sqlite_engine(&store, SUPPORTED_DB_VERSION)).await;
    store.sink.clear();

    let broken_factory: Arc<dyn MigrationsFactory> =
        Arc::new(|version: i64| -> Option<Box<dyn Migration>> {
            if version == SUPPORTED_DB_VERSION + 1 {
                Some(Box::new(BrokenMigration))
            } else {
                SqliteMigrationsFactory.create(version)
            }
        });
    let engine = create_engine(&store, broken_factory, SUPPORTED_DB_VERSION + 1);

    assert!(bootstrap_store(store.dao.clone(), &engine.migrator)
        .await
        .is_err());
    assert_eq!(
        store.dao.get_curr_db_ver().await.unwrap(),
        SUPPORTED_DB_VERSION
    );
    assert_eq!(store.sink.count(&ProcessState::ErrorMigrations), 1);

    let handler = ProcessCommandHandler::new(engine.backup_manager.clone());
    let response = handler
        .handle(ProcessCommand::MigrationHasFailedWhatShouldBeDone {
            should_restore_db: true,
        })
        .await
        .unwrap();

    assert_eq!(
        response,
        ProcessCommandResponse::RestoreDb { is_restored: true }
    );
    assert_eq!(
        store.dao.get_curr_db_ver().await.unwrap(),
        SUPPORTED_DB_VERSION
    );
    assert_eq!(
        store.sink.states().last(),
        Some(&ProcessState::db_has_been_restored(true))
    );
}

#[tokio::test]
async fn test_interrupted_step_rolls_back_and_next_start_completes_it() {
    let store = open_store();
    bootstrap(&store, &sqlite_engine(&store, 2)).await;
    store.sink.clear();

    let engine = sqlite_engine(&store, SUPPORTED_DB_VERSION);
    engine
        .migrator
        .set_dao(Arc::new(InterruptedStepDao::new(store.dao.clone())));

    let result = engine.migrator.migrate_from_curr_to_supported_ver().await;

    assert!(matches!(
        result,
        Err(Error::Migration(MigrationError::MigrationLaunching {
            version: 3
        }))
    ));
    assert_eq!(store.dao.get_curr_db_ver().await.unwrap(), 2);
    assert!(!index_exists(&store.dao, "ledgers", "ledgers_user_id_currency_mts").await);
    assert_eq!(store.sink.count(&ProcessState::ErrorMigrations), 1);

    engine
        .migrator
        .migrate_from_curr_to_supported_ver()
        .await
        .expect("The step should apply cleanly on the next start");

    assert_eq!(
        store.dao.get_curr_db_ver().await.unwrap(),
        SUPPORTED_DB_VERSION
    );
    assert!(index_exists(&store.dao, "ledgers", "ledgers_user_id_currency_mts").await);
    assert_eq!(store.sink.count(&ProcessState::ReadyMigrations), 1);
}
