//! Core error types for the ledgersync store engine.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the store engine.
///
/// Database-specific errors are wrapped in string form to keep this type
/// database-agnostic.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("File system operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Method '{0}' is not implemented by this store backend")]
    Unimplemented(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// The store handle is closed (e.g. during a restart).
    #[error("Database is not open")]
    NotOpen,

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database backup operation failed.
    #[error("Database backup failed: {0}")]
    BackupFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Errors raised while sequencing schema migrations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    /// A version bound is not a valid schema version.
    #[error("Database version must be a non-negative integer, got {0}")]
    DbVersionType(i64),

    /// The versions passed to `migrate` are malformed.
    #[error("Migration versions are malformed: {0}")]
    DbMigrationVerCorrectness(String),

    /// A migration unit failed; earlier units stay applied.
    #[error("Migration launch failed at version {version}")]
    MigrationLaunching { version: i64 },

    /// The migrator was used before a DAO was attached.
    #[error("Migrator has no DAO attached")]
    DaoNotSet,
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid SQL identifier: {0}")]
    InvalidIdentifier(String),
}

// === From implementations for common error types ===

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Unexpected(err.to_string())
    }
}
