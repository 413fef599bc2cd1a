//! Schema migrations.
//!
//! A `Migration` moves the store one version up or down; `DbMigrator`
//! sequences units produced by a `MigrationsFactory`.

mod migration_traits;
mod migrator;


pub use migration_traits::{Migration, MigrationsFactory};
pub use migrator::{DbMigrator, MigrationVersions};
