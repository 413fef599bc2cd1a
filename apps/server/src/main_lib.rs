use std::sync::Arc;

use ledgersync_core::backup::{DbBackupManager, DbBackupManagerConfig};
use ledgersync_core::migrations::DbMigrator;
use ledgersync_core::process::{ProcessCommand, ProcessCommandHandler};
use ledgersync_core::scheduler::SyncSchedulerTrait;
use ledgersync_storage_sqlite::{
    bootstrap_store, db, SqliteDao, SqliteMigrationsFactory, SUPPORTED_DB_VERSION,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::ipc::JsonLinesProcessMessageSink;
use crate::scheduler::{HeartbeatSyncJob, IntervalSyncScheduler};

pub struct AppState {
    pub dao: Arc<SqliteDao>,
    pub migrator: DbMigrator,
    pub sync_scheduler: Arc<IntervalSyncScheduler>,
    pub command_handler: ProcessCommandHandler,
    pub ipc: Arc<JsonLinesProcessMessageSink>,
}

/// Installs the global subscriber. Logs go to stderr; stdout carries IPC.
pub fn init_tracing() {
    let log_format = std::env::var("LS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub async fn build_state(
    config: &Config,
    ipc: Arc<JsonLinesProcessMessageSink>,
) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_dir, &config.db_file_name)?;
    info!("Database path in use: {}", db_path);

    let dao = Arc::new(SqliteDao::new(db_path)?);
    let sync_scheduler = Arc::new(IntervalSyncScheduler::new(
        dao.clone(),
        Arc::new(HeartbeatSyncJob),
        config.sync_interval,
    ));

    let backup_manager = Arc::new(DbBackupManager::new(
        DbBackupManagerConfig {
            db_dir: config.db_dir.clone(),
            db_file_name: config.db_file_name.clone(),
            supported_db_version: SUPPORTED_DB_VERSION,
        },
        dao.clone(),
        sync_scheduler.clone(),
        ipc.clone(),
    )?);
    let migrator = DbMigrator::new(
        Arc::new(SqliteMigrationsFactory),
        SUPPORTED_DB_VERSION,
        backup_manager.clone(),
        ipc.clone(),
    );
    let command_handler = ProcessCommandHandler::new(backup_manager);

    Ok(Arc::new(AppState {
        dao,
        migrator,
        sync_scheduler,
        command_handler,
        ipc,
    }))
}

/// Bootstraps the store and starts the scheduler.
///
/// A failed migration leaves the scheduler stopped: the supervisor answers
/// `ERROR_MIGRATIONS` with a restore command, and a successful restore
/// resumes it.
pub async fn start(state: &AppState) -> anyhow::Result<()> {
    match bootstrap_store(state.dao.clone(), &state.migrator).await {
        Ok(()) => {
            state.sync_scheduler.resume().await?;
        }
        Err(e) => {
            error!("Store bootstrap failed: {}", e);
            warn!("Waiting for the supervising process to decide on a restore");
        }
    }

    Ok(())
}

/// Serves one JSON command per line until `reader` reaches EOF.
pub async fn run_command_loop<R>(state: &AppState, reader: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command: ProcessCommand = match serde_json::from_str(line) {
            Ok(command) => command,
            Err(e) => {
                warn!("Ignoring malformed process command {:?}: {}", line, e);
                continue;
            }
        };

        match state.command_handler.handle(command).await {
            Ok(response) => state.ipc.send_response(&response),
            Err(e) => error!("Process command failed: {}", e),
        }
    }

    info!("Command channel closed");
    state.sync_scheduler.stop().await?;
    Ok(())
}
