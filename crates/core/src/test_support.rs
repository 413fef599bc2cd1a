//! In-memory collaborators shared by the engine tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::dao::{BackupDbOptions, DbDao, RecordPatch, RestartDbOptions};
use crate::errors::{DatabaseError, Error, Result};
use crate::scheduler::SyncSchedulerTrait;

/// Statements containing this marker make a batch fail.
pub const FAILING_STATEMENT: &str = "FAIL";

/// Ordered record of calls made on the mocks, shared between them so tests
/// can assert cross-component ordering.
pub type CallJournal = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
struct MockDaoState {
    version: i64,
    is_empty: bool,
    committed_batches: Vec<Vec<String>>,
    patches: Vec<(String, RecordPatch)>,
    fail_backup: bool,
    fail_next_versioned_batch: bool,
}

/// DAO double keeping its "store" in memory.
pub struct MockDao {
    state: Mutex<MockDaoState>,
    journal: CallJournal,
}

impl MockDao {
    pub fn new(version: i64, journal: CallJournal) -> Self {
        MockDao {
            state: Mutex::new(MockDaoState {
                version,
                ..Default::default()
            }),
            journal,
        }
    }

    pub fn empty(journal: CallJournal) -> Self {
        let dao = Self::new(0, journal);
        dao.state.lock().unwrap().is_empty = true;
        dao
    }

    pub fn fail_backups(&self) {
        self.state.lock().unwrap().fail_backup = true;
    }

    /// Makes the next versioned batch fail as a whole, like a transient
    /// BUSY error hitting its transaction.
    pub fn fail_next_versioned_batch(&self) {
        self.state.lock().unwrap().fail_next_versioned_batch = true;
    }

    pub fn version(&self) -> i64 {
        self.state.lock().unwrap().version
    }

    pub fn committed_batches(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().committed_batches.clone()
    }

    pub fn patches(&self) -> Vec<(String, RecordPatch)> {
        self.state.lock().unwrap().patches.clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.journal.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl DbDao for MockDao {
    async fn is_db_empty(&self) -> Result<bool> {
        self.record("is_db_empty");
        Ok(self.state.lock().unwrap().is_empty)
    }

    async fn get_curr_db_ver(&self) -> Result<i64> {
        self.record("get_curr_db_ver");
        Ok(self.version())
    }

    async fn set_curr_db_ver(&self, version: i64) -> Result<()> {
        self.record(format!("set_curr_db_ver:{}", version));
        self.state.lock().unwrap().version = version;
        Ok(())
    }

    async fn execute_queries_in_trans(&self, statements: Vec<String>) -> Result<()> {
        self.record("execute_queries_in_trans");
        if let Some(failing) = statements.iter().find(|s| s.contains(FAILING_STATEMENT)) {
            return Err(Error::Database(DatabaseError::TransactionFailed(format!(
                "statement failed: {}",
                failing
            ))));
        }
        self.state.lock().unwrap().committed_batches.push(statements);
        Ok(())
    }

    async fn execute_queries_in_trans_with_ver(
        &self,
        statements: Vec<String>,
        version: i64,
    ) -> Result<()> {
        self.record(format!("execute_queries_in_trans_with_ver:{}", version));
        let mut state = self.state.lock().unwrap();
        if std::mem::take(&mut state.fail_next_versioned_batch) {
            return Err(Error::Database(DatabaseError::TransactionFailed(
                "database is locked".to_string(),
            )));
        }
        if let Some(failing) = statements.iter().find(|s| s.contains(FAILING_STATEMENT)) {
            return Err(Error::Database(DatabaseError::TransactionFailed(format!(
                "statement failed: {}",
                failing
            ))));
        }
        state.committed_batches.push(statements);
        state.version = version;
        Ok(())
    }

    async fn backup_db(&self, options: BackupDbOptions) -> Result<()> {
        self.record("backup_db");
        let (fail_backup, version) = {
            let state = self.state.lock().unwrap();
            (state.fail_backup, state.version)
        };
        if fail_backup {
            return Err(Error::Database(DatabaseError::BackupFailed(
                "disk full".to_string(),
            )));
        }

        options.report_progress(0);
        std::fs::write(&options.file_path, format!("snapshot v{}", version))?;
        options.report_progress(50);
        options.report_progress(100);
        Ok(())
    }

    async fn restart_db(&self, options: RestartDbOptions) -> Result<()> {
        self.record("restart_db:close");

        let result = match options.middleware {
            Some(middleware) => middleware().await,
            None => Ok(()),
        };

        self.record("restart_db:open");
        result
    }

    async fn disable_foreign_keys(&self) -> Result<()> {
        self.record("disable_foreign_keys");
        Ok(())
    }

    async fn enable_foreign_keys(&self) -> Result<()> {
        self.record("enable_foreign_keys");
        Ok(())
    }

    async fn update_record_of(&self, table: &str, patch: RecordPatch) -> Result<()> {
        self.record(format!("update_record_of:{}", table));
        self.state
            .lock()
            .unwrap()
            .patches
            .push((table.to_string(), patch));
        Ok(())
    }
}

/// Scheduler double journaling stop/resume calls.
pub struct MockSyncScheduler {
    journal: CallJournal,
}

impl MockSyncScheduler {
    pub fn new(journal: CallJournal) -> Self {
        MockSyncScheduler { journal }
    }
}

#[async_trait]
impl SyncSchedulerTrait for MockSyncScheduler {
    async fn stop(&self) -> Result<()> {
        self.journal.lock().unwrap().push("scheduler:stop".to_string());
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.journal
            .lock()
            .unwrap()
            .push("scheduler:resume".to_string());
        Ok(())
    }
}

pub fn new_journal() -> CallJournal {
    Arc::new(Mutex::new(Vec::new()))
}
