//! SQLite storage implementation for ledgersync.
//!
//! This crate provides the SQLite backend of the store engine defined in
//! `ledgersync-core`:
//! - A single-connection actor owning the live store file
//! - `SqliteDao`, the `DbDao` implementation (Diesel for statements, the
//!   rusqlite online backup API for snapshots)
//! - The schema migration units and their factory
//! - Store bootstrap for new and existing stores
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel and rusqlite
//! dependencies exist. The core engine is database-agnostic and works with
//! traits.
//!
//! ```text
//!        core (migrator, backups)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod bootstrap;
pub mod dao;
pub mod db;
pub mod errors;
pub mod migrations;

pub use bootstrap::bootstrap_store;
pub use dao::SqliteDao;
pub use db::{get_db_path, init, open_connection, spawn_connection_actor, ConnectionHandle};
pub use migrations::{SqliteMigrationsFactory, SUPPORTED_DB_VERSION};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from ledgersync-core for convenience
pub use ledgersync_core::errors::{DatabaseError, Error, Result};
