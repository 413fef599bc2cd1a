use log::info;
use std::fs;
use std::path::Path;

use diesel::connection::{Connection, SimpleConnection};
use diesel::sqlite::SqliteConnection;
use ledgersync_core::errors::{DatabaseError, Error, Result};

use crate::errors::IntoCore;

pub mod connection_actor;
pub use connection_actor::{spawn_connection_actor, ConnectionHandle};

const CONNECTION_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA foreign_keys = ON;
    PRAGMA busy_timeout = 30000;
    PRAGMA synchronous  = NORMAL;
";

/// Ensures `db_dir` exists and returns the path of the live store file.
pub fn init(db_dir: &Path, db_file_name: &str) -> Result<String> {
    if !db_dir.exists() {
        info!("Creating database directory {}", db_dir.display());
        fs::create_dir_all(db_dir)?;
    }

    get_db_path(db_dir, db_file_name)
}

pub fn get_db_path(db_dir: &Path, db_file_name: &str) -> Result<String> {
    db_dir
        .join(db_file_name)
        .to_str()
        .map(str::to_string)
        .ok_or_else(|| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "database path under {} is not valid UTF-8",
                db_dir.display()
            )))
        })
}

/// Opens a connection to `db_path`, creating the file if missing, and applies
/// the connection pragmas.
pub fn open_connection(db_path: &str) -> Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(db_path).into_core()?;
    conn.batch_execute(CONNECTION_PRAGMAS).into_core()?;

    Ok(conn)
}
