//! ledgersync Core - schema migration and backup/restore engine.
//!
//! This crate keeps the on-disk schema version of the local store in line with
//! the version the code supports, and snapshots, prunes and restores the store
//! file around risky operations. It is database-agnostic: every store access
//! goes through the `DbDao` trait, implemented by the `storage-sqlite` crate.

pub mod backup;
pub mod constants;
pub mod dao;
pub mod errors;
pub mod migrations;
pub mod process;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
