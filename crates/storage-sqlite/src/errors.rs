//! Storage-specific error types for SQLite operations.
//!
//! This module provides error types that wrap Diesel and rusqlite errors and
//! convert them to the database-agnostic error types defined in
//! `ledgersync_core`.

use diesel::result::Error as DieselError;
use ledgersync_core::errors::{DatabaseError, Error};
use thiserror::Error;

/// Storage-specific errors that wrap Diesel and rusqlite types.
///
/// These errors are internal to the storage layer and are converted to
/// `ledgersync_core::Error` before being returned to callers.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("SQLite backup failed: {0}")]
    BackupFailed(#[from] rusqlite::Error),

    #[error("Connection actor is gone: {0}")]
    ActorStopped(String),

    #[error("Core error: {0}")]
    CoreError(Error),
}

/// Carries a core error through a Diesel transaction closure.
impl From<Error> for StorageError {
    fn from(err: Error) -> Self {
        StorageError::CoreError(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            }
            StorageError::QueryFailed(DieselError::RollbackTransaction) => Error::Database(
                DatabaseError::TransactionFailed("transaction rolled back".to_string()),
            ),
            StorageError::QueryFailed(e) => {
                Error::Database(DatabaseError::QueryFailed(e.to_string()))
            }
            StorageError::BackupFailed(e) => {
                Error::Database(DatabaseError::BackupFailed(e.to_string()))
            }
            StorageError::ActorStopped(e) => Error::Database(DatabaseError::Internal(e)),
            StorageError::CoreError(e) => e,
        }
    }
}

/// Extension trait for easily converting Diesel and rusqlite Results to core
/// Results.
///
/// This provides a `.into_core()` method which handles the conversion through
/// `StorageError`.
pub trait IntoCore<T> {
    fn into_core(self) -> ledgersync_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, DieselError> {
    fn into_core(self) -> ledgersync_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, diesel::ConnectionError> {
    fn into_core(self) -> ledgersync_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, rusqlite::Error> {
    fn into_core(self) -> ledgersync_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}
