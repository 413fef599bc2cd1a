//! `DbDao` backed by a SQLite file.

mod sql;

use std::time::Duration;

use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::sql_types::{BigInt, Nullable, Text};
use diesel::{QueryableByName, RunQueryDsl};
use ledgersync_core::dao::{BackupDbOptions, DbDao, RecordPatch, RestartDbOptions};
use ledgersync_core::errors::{Result, ValidationError};
use log::{debug, warn};
use rusqlite::backup::{Backup, StepResult};

use crate::db::{spawn_connection_actor, ConnectionHandle};
use crate::errors::IntoCore;

pub use sql::{build_select_first_value, build_update_statement, quote_identifier};

/// Pages copied per online-backup step.
const BACKUP_PAGES_PER_STEP: i32 = 100;

/// Pause before retrying a step that hit a busy or locked source.
const BACKUP_RETRY_DELAY: Duration = Duration::from_millis(50);

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName)]
struct UserVersionRow {
    #[diesel(sql_type = BigInt)]
    user_version: i64,
}

#[derive(QueryableByName)]
struct TextValueRow {
    #[diesel(sql_type = Nullable<Text>)]
    value: Option<String>,
}

/// SQLite implementation of the DAO capability.
///
/// All statements go through a single connection actor. The schema version
/// lives in `PRAGMA user_version`.
pub struct SqliteDao {
    db_path: String,
    connection: ConnectionHandle,
}

impl SqliteDao {
    /// Opens the store at `db_path`. Must be called inside a Tokio runtime.
    pub fn new(db_path: impl Into<String>) -> Result<Self> {
        let db_path = db_path.into();
        let connection = spawn_connection_actor(db_path.clone())?;

        Ok(SqliteDao {
            db_path,
            connection,
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    async fn execute(&self, statement: String) -> Result<()> {
        self.connection
            .exec(move |conn| conn.batch_execute(&statement).into_core())
            .await
    }
}

#[async_trait]
impl DbDao for SqliteDao {
    async fn is_db_empty(&self) -> Result<bool> {
        let row = self
            .connection
            .exec(|conn| {
                diesel::sql_query(
                    "SELECT COUNT(*) AS count FROM sqlite_master \
                     WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                )
                .get_result::<CountRow>(conn)
                .into_core()
            })
            .await?;

        Ok(row.count == 0)
    }

    async fn get_curr_db_ver(&self) -> Result<i64> {
        let row = self
            .connection
            .exec(|conn| {
                diesel::sql_query("PRAGMA user_version")
                    .get_result::<UserVersionRow>(conn)
                    .into_core()
            })
            .await?;

        Ok(row.user_version)
    }

    async fn set_curr_db_ver(&self, version: i64) -> Result<()> {
        let statement = user_version_statement(version)?;
        self.execute(statement).await
    }

    async fn execute_queries_in_trans(&self, statements: Vec<String>) -> Result<()> {
        self.connection
            .exec_in_transaction(move |conn| {
                for statement in &statements {
                    conn.batch_execute(statement).into_core()?;
                }
                Ok(())
            })
            .await
    }

    async fn execute_queries_in_trans_with_ver(
        &self,
        statements: Vec<String>,
        version: i64,
    ) -> Result<()> {
        // user_version lives in the file header, so it commits with the batch
        let version_statement = user_version_statement(version)?;

        self.connection
            .exec_in_transaction(move |conn| {
                for statement in &statements {
                    conn.batch_execute(statement).into_core()?;
                }
                conn.batch_execute(&version_statement).into_core()
            })
            .await
    }

    async fn backup_db(&self, options: BackupDbOptions) -> Result<()> {
        let db_path = self.db_path.clone();
        let file_path = options.file_path.clone();

        let result = tokio::task::spawn_blocking(move || online_backup(&db_path, &options)).await?;

        if result.is_err() {
            // Never leave a half-written snapshot behind
            if let Err(e) = tokio::fs::remove_file(&file_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        "Failed to remove incomplete backup {}: {}",
                        file_path.display(),
                        e
                    );
                }
            }
        }

        result
    }

    async fn restart_db(&self, options: RestartDbOptions) -> Result<()> {
        self.connection.close().await?;

        let result = match options.middleware {
            Some(middleware) => middleware().await,
            None => Ok(()),
        };

        // Reopen even when the middleware failed so the store stays usable
        let reopened = self.connection.open().await;
        result.and(reopened)
    }

    async fn disable_foreign_keys(&self) -> Result<()> {
        self.execute("PRAGMA foreign_keys = OFF;".to_string())
            .await
    }

    async fn enable_foreign_keys(&self) -> Result<()> {
        self.execute("PRAGMA foreign_keys = ON;".to_string()).await
    }

    async fn update_record_of(&self, table: &str, patch: RecordPatch) -> Result<()> {
        let statement = build_update_statement(table, &patch)?;

        self.connection
            .exec_in_transaction(move |conn| conn.batch_execute(&statement).into_core())
            .await
    }

    async fn get_first_record_value_of(&self, table: &str, column: &str) -> Result<Option<String>> {
        let query = build_select_first_value(table, column)?;

        let rows = self
            .connection
            .exec(move |conn| {
                diesel::sql_query(query)
                    .load::<TextValueRow>(conn)
                    .into_core()
            })
            .await?;

        Ok(rows.into_iter().next().and_then(|row| row.value))
    }
}

/// `PRAGMA user_version` holds a signed 32-bit value.
fn user_version_statement(version: i64) -> Result<String> {
    if !(0..=i64::from(i32::MAX)).contains(&version) {
        return Err(ValidationError::InvalidInput(format!(
            "schema version {} is out of range",
            version
        ))
        .into());
    }

    Ok(format!("PRAGMA user_version = {};", version))
}

/// Copies the store page by page through the SQLite online backup API.
fn online_backup(db_path: &str, options: &BackupDbOptions) -> Result<()> {
    let source = rusqlite::Connection::open(db_path).into_core()?;
    let mut destination = rusqlite::Connection::open(&options.file_path).into_core()?;
    let backup = Backup::new(&source, &mut destination).into_core()?;

    debug!(
        "[SQLite online backup]: {} -> {}",
        db_path,
        options.file_path.display()
    );
    options.report_progress(0);

    loop {
        match backup.step(BACKUP_PAGES_PER_STEP).into_core()? {
            StepResult::Done => break,
            StepResult::More => {
                let progress = backup.progress();
                options.report_progress(progress_percent(progress.remaining, progress.pagecount));
            }
            _ => std::thread::sleep(BACKUP_RETRY_DELAY),
        }
    }

    options.report_progress(100);
    Ok(())
}

fn progress_percent(remaining: i32, pagecount: i32) -> u8 {
    if pagecount <= 0 {
        return 0;
    }
    let copied = i64::from(pagecount - remaining);
    (copied * 100 / i64::from(pagecount)).clamp(0, 100) as u8
}
