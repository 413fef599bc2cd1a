//! Option types passed to the DAO capability.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::errors::Result;

/// Callback receiving backup progress as a percentage (0..=100).
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Work run by `restart_db` while the live store file is closed.
pub type RestartMiddleware = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

/// Column patch applied by `update_record_of`.
pub type RecordPatch = serde_json::Map<String, serde_json::Value>;

/// Options for an atomic point-in-time copy of the store.
#[derive(Clone)]
pub struct BackupDbOptions {
    /// Destination of the copy.
    pub file_path: PathBuf,
    pub progress_fn: Option<ProgressFn>,
}

impl BackupDbOptions {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            progress_fn: None,
        }
    }

    pub fn with_progress_fn(mut self, progress_fn: ProgressFn) -> Self {
        self.progress_fn = Some(progress_fn);
        self
    }

    /// Reports progress if a callback is attached.
    pub fn report_progress(&self, progress: u8) {
        if let Some(progress_fn) = &self.progress_fn {
            progress_fn(progress.min(100));
        }
    }
}

impl fmt::Debug for BackupDbOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupDbOptions")
            .field("file_path", &self.file_path)
            .field("progress_fn", &self.progress_fn.is_some())
            .finish()
    }
}

/// Options for closing and reopening the live store handle.
#[derive(Default)]
pub struct RestartDbOptions {
    pub middleware: Option<RestartMiddleware>,
}

impl RestartDbOptions {
    pub fn with_middleware(middleware: RestartMiddleware) -> Self {
        Self {
            middleware: Some(middleware),
        }
    }
}

impl fmt::Debug for RestartDbOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestartDbOptions")
            .field("middleware", &self.middleware.is_some())
            .finish()
    }
}
