//! Background scheduler for periodic sync.
//!
//! Runs the sync job on a fixed interval while the persisted `isEnable` flag
//! of the `scheduler` table is set. The backup manager stops it around a
//! restore and resumes it afterwards.

use std::sync::Arc;

use async_trait::async_trait;
use ledgersync_core::constants::{SCHEDULER_IS_ENABLE_COLUMN, SCHEDULER_TABLE};
use ledgersync_core::dao::DbDao;
use ledgersync_core::errors::Result;
use ledgersync_core::scheduler::SyncSchedulerTrait;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// One sync run against the store.
#[async_trait]
pub trait SyncJob: Send + Sync {
    async fn run(&self) -> anyhow::Result<()>;
}

/// Sync job used when no remote source is wired in: only records the tick.
pub struct HeartbeatSyncJob;

#[async_trait]
impl SyncJob for HeartbeatSyncJob {
    async fn run(&self) -> anyhow::Result<()> {
        debug!("Sync tick: no remote source configured");
        Ok(())
    }
}

struct RunningLoop {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct IntervalSyncScheduler {
    dao: Arc<dyn DbDao>,
    job: Arc<dyn SyncJob>,
    period: Duration,
    running: Mutex<Option<RunningLoop>>,
}

impl IntervalSyncScheduler {
    pub fn new(dao: Arc<dyn DbDao>, job: Arc<dyn SyncJob>, period: Duration) -> Self {
        Self {
            dao,
            job,
            period,
            running: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }
}

#[async_trait]
impl SyncSchedulerTrait for IntervalSyncScheduler {
    async fn stop(&self) -> Result<()> {
        let Some(running) = self.running.lock().await.take() else {
            return Ok(());
        };

        // The loop only checks the signal between runs, so awaiting the
        // handle waits out an in-flight run.
        let _ = running.shutdown_tx.send(true);
        running.handle.await?;

        info!("Sync scheduler stopped");
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Ok(());
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let dao = Arc::clone(&self.dao);
        let job = Arc::clone(&self.job);
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => run_scheduled_sync(dao.as_ref(), job.as_ref()).await,
                }
            }
        });

        *running = Some(RunningLoop {
            shutdown_tx,
            handle,
        });
        info!("Sync scheduler started ({}s interval)", period.as_secs());
        Ok(())
    }
}

/// Runs a single scheduled sync if the persisted flag allows it.
async fn run_scheduled_sync(dao: &dyn DbDao, job: &dyn SyncJob) {
    let is_enabled = match dao
        .get_first_record_value_of(SCHEDULER_TABLE, SCHEDULER_IS_ENABLE_COLUMN)
        .await
    {
        Ok(value) => value.as_deref() == Some("1"),
        Err(e) => {
            warn!("Scheduled sync skipped: cannot read scheduler flag: {}", e);
            return;
        }
    };

    if !is_enabled {
        debug!("Scheduled sync skipped: scheduler is disabled");
        return;
    }

    if let Err(e) = job.run().await {
        warn!("Scheduled sync failed: {}", e);
    }
}
