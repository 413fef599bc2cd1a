//! Persistence capability every store backend implements.

use async_trait::async_trait;

use super::{BackupDbOptions, RecordPatch, RestartDbOptions};
use crate::errors::{Error, Result};

fn unimplemented<T>(method: &str) -> Result<T> {
    Err(Error::Unimplemented(method.to_string()))
}

/// Store operations the migration and backup engine depends on.
///
/// Backends override what they support; the defaults fail with
/// `Error::Unimplemented`. Implementations must propagate their errors
/// unmodified and never swallow them.
#[async_trait]
pub trait DbDao: Send + Sync {
    /// Returns true when the store holds no user tables (fresh install).
    async fn is_db_empty(&self) -> Result<bool> {
        unimplemented("is_db_empty")
    }

    /// Reads the persisted schema version.
    async fn get_curr_db_ver(&self) -> Result<i64> {
        unimplemented("get_curr_db_ver")
    }

    /// Persists the schema version.
    async fn set_curr_db_ver(&self, _version: i64) -> Result<()> {
        unimplemented("set_curr_db_ver")
    }

    /// Executes all statements in one transaction: all commit or none do.
    async fn execute_queries_in_trans(&self, _statements: Vec<String>) -> Result<()> {
        unimplemented("execute_queries_in_trans")
    }

    /// Executes all statements and persists `version` in one transaction, so
    /// a schema step and its version bump commit together or not at all.
    async fn execute_queries_in_trans_with_ver(
        &self,
        _statements: Vec<String>,
        _version: i64,
    ) -> Result<()> {
        unimplemented("execute_queries_in_trans_with_ver")
    }

    /// Produces a consistent point-in-time copy of the store at
    /// `options.file_path`, reporting progress through `options.progress_fn`.
    async fn backup_db(&self, _options: BackupDbOptions) -> Result<()> {
        unimplemented("backup_db")
    }

    /// Closes the live handle, runs the middleware while the store file is not
    /// open by this process, then reopens the handle.
    async fn restart_db(&self, _options: RestartDbOptions) -> Result<()> {
        unimplemented("restart_db")
    }

    async fn disable_foreign_keys(&self) -> Result<()> {
        unimplemented("disable_foreign_keys")
    }

    async fn enable_foreign_keys(&self) -> Result<()> {
        unimplemented("enable_foreign_keys")
    }

    /// Applies `patch` (column -> value) to every row of `table`.
    async fn update_record_of(&self, _table: &str, _patch: RecordPatch) -> Result<()> {
        unimplemented("update_record_of")
    }

    /// Reads `column` of the first row of `table` rendered as text.
    async fn get_first_record_value_of(
        &self,
        _table: &str,
        _column: &str,
    ) -> Result<Option<String>> {
        unimplemented("get_first_record_value_of")
    }
}
