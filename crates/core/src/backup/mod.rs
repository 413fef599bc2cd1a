//! Backup manager: point-in-time backups, retention and restore.

mod backup_file_name;
mod backup_manager;
mod backup_model;
mod backup_traits;


pub use backup_file_name::{
    backup_file_name, is_backup_file_name, parse_backup_file_name, ParsedBackupFileName,
};
pub use backup_manager::{select_retained_backups, sort_backup_files, DbBackupManager};
pub use backup_model::*;
pub use backup_traits::DbBackupManagerTrait;
