//! Outbound channel for process states.

use std::sync::{Arc, Mutex, MutexGuard};

use super::ProcessState;

/// Reports engine progress and failures to the supervising process.
///
/// Delivery is best-effort: `send_state` never fails and never blocks on the
/// receiver, so a dead supervisor cannot fail a backup or a migration.
pub trait ProcessMessageSink: Send + Sync {
    fn send_state(&self, state: ProcessState);
}

/// Sink keeping every state in memory, in send order. Clones share the log.
#[derive(Clone, Default)]
pub struct MockProcessMessageSink {
    sent: Arc<Mutex<Vec<ProcessState>>>,
}

impl MockProcessMessageSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn sent(&self) -> MutexGuard<'_, Vec<ProcessState>> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn states(&self) -> Vec<ProcessState> {
        self.sent().clone()
    }

    /// How many times `state` was sent.
    pub fn count(&self, state: &ProcessState) -> usize {
        self.sent().iter().filter(|s| *s == state).count()
    }

    pub fn clear(&self) {
        self.sent().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.sent().is_empty()
    }
}

impl ProcessMessageSink for MockProcessMessageSink {
    fn send_state(&self, state: ProcessState) {
        self.sent().push(state);
    }
}
