use std::path::PathBuf;
use std::time::Duration;

use ledgersync_core::constants::DEFAULT_DB_FILE_NAME;

const DEFAULT_DB_DIR: &str = "./db";
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory of the live store file and its `backups` subdirectory.
    pub db_dir: PathBuf,
    pub db_file_name: String,
    pub sync_interval: Duration,
}

impl Config {
    /// Reads `LS_*` variables, loading a `.env` file first if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_dir = lookup("LS_DB_DIR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB_DIR.to_string());
        let db_file_name = lookup("LS_DB_FILE_NAME")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB_FILE_NAME.to_string());
        let sync_interval_secs = lookup("LS_SYNC_INTERVAL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_SYNC_INTERVAL_SECS);

        Config {
            db_dir: PathBuf::from(db_dir),
            db_file_name,
            sync_interval: Duration::from_secs(sync_interval_secs),
        }
    }
}
