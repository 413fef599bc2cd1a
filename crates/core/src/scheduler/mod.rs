//! Contract of the periodic sync scheduler.

use async_trait::async_trait;

use crate::errors::Result;

/// Background job that syncs remote history into the store on an interval.
///
/// It must be paused while the live store file is replaced. The enabled flag
/// persisted in the `scheduler` table is toggled separately through the DAO.
#[async_trait]
pub trait SyncSchedulerTrait: Send + Sync {
    /// Stops scheduling; returns once no sync run is in flight.
    async fn stop(&self) -> Result<()>;

    /// Starts scheduling again after a `stop`.
    async fn resume(&self) -> Result<()>;
}
