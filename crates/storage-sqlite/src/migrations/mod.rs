//! SQLite schema migrations.
//!
//! Each unit moves the schema one version. `SqliteMigrationsFactory` maps a
//! target version to its unit; versions above `SUPPORTED_DB_VERSION` have
//! none.

mod migration_v1;
mod migration_v2;
mod migration_v3;

use ledgersync_core::migrations::{Migration, MigrationsFactory};

pub use migration_v1::MigrationV1;
pub use migration_v2::MigrationV2;
pub use migration_v3::MigrationV3;

/// Schema version this build reads and writes.
pub const SUPPORTED_DB_VERSION: i64 = 3;

/// Creates the SQLite migration unit for a target version.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteMigrationsFactory;

impl MigrationsFactory for SqliteMigrationsFactory {
    fn create(&self, version: i64) -> Option<Box<dyn Migration>> {
        match version {
            1 => Some(Box::new(MigrationV1)),
            2 => Some(Box::new(MigrationV2)),
            3 => Some(Box::new(MigrationV3)),
            _ => None,
        }
    }
}
