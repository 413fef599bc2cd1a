//! Migration unit and factory traits.

use async_trait::async_trait;
use log::debug;

use crate::dao::DbDao;
use crate::errors::Result;

/// One reversible schema transformation between versions `v - 1` and `v`.
///
/// Units are stateless: a factory creates them on demand, the migrator runs
/// each one once and drops it. The author of a unit keeps `up` and `down`
/// inverse to each other; nothing verifies it.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Target version `v` of this unit.
    fn version(&self) -> i64;

    /// Runs before the statement batch, outside its transaction.
    async fn before(&self, _dao: &dyn DbDao) -> Result<()> {
        Ok(())
    }

    /// Statements moving the store from `v - 1` to `v`.
    fn up(&self) -> Vec<String>;

    /// Statements moving the store from `v` back to `v - 1`.
    fn down(&self) -> Vec<String>;

    /// Runs after the statement batch, outside its transaction.
    async fn after(&self, _dao: &dyn DbDao) -> Result<()> {
        Ok(())
    }

    /// Runs the pre-hook, the batch for the requested direction together
    /// with the version bookkeeping in one transaction, then the post-hook.
    /// The first failing stage aborts the rest.
    async fn launch(&self, dao: &dyn DbDao, is_down: bool) -> Result<()> {
        let version = self.version();
        let (statements, target_version) = if is_down {
            (self.down(), version - 1)
        } else {
            (self.up(), version)
        };

        self.before(dao).await?;

        debug!(
            "[Migration v{} {}]: {} statement(s)",
            version,
            if is_down { "down" } else { "up" },
            statements.len()
        );
        dao.execute_queries_in_trans_with_ver(statements, target_version)
            .await?;

        self.after(dao).await
    }
}

/// Creates migration units by target version.
///
/// Returns `None` for versions it has no unit for; the migrator skips those.
pub trait MigrationsFactory: Send + Sync {
    fn create(&self, version: i64) -> Option<Box<dyn Migration>>;
}

impl<F> MigrationsFactory for F
where
    F: Fn(i64) -> Option<Box<dyn Migration>> + Send + Sync,
{
    fn create(&self, version: i64) -> Option<Box<dyn Migration>> {
        self(version)
    }
}
