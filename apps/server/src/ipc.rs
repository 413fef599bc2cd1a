//! JSON-lines channel to the supervising process.
//!
//! Every process state and command response is written as one JSON object
//! per line. Logs go to stderr, so this writer is the only user of stdout.

use std::io::Write;
use std::sync::Mutex;

use ledgersync_core::process::{ProcessCommandResponse, ProcessMessageSink, ProcessState};
use serde::Serialize;
use tracing::warn;

pub struct JsonLinesProcessMessageSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesProcessMessageSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn send_response(&self, response: &ProcessCommandResponse) {
        self.write_line(response);
    }

    // Delivery is best-effort: a closed pipe must not fail the operation
    // that reported.
    fn write_line<T: Serialize>(&self, message: &T) {
        let line = match serde_json::to_string(message) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize process message: {}", e);
                return;
            }
        };

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!("Failed to write process message: {}", e);
        }
    }
}

impl ProcessMessageSink for JsonLinesProcessMessageSink {
    fn send_state(&self, state: ProcessState) {
        self.write_line(&state);
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::SharedBuffer;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_states_and_responses_are_written_one_per_line() {
        let buffer = SharedBuffer::default();
        let sink = JsonLinesProcessMessageSink::new(Box::new(buffer.clone()));

        sink.send_state(ProcessState::BackupStarted);
        sink.send_state(ProcessState::backup_progress(40));
        sink.send_response(&ProcessCommandResponse::BackupDb { is_done: true });

        assert_eq!(
            buffer.lines(),
            vec![
                json!({"state": "BACKUP_STARTED"}),
                json!({"state": "BACKUP_PROGRESS", "data": {"progress": 40}}),
                json!({"action": "backup-db", "isDone": true}),
            ]
        );
    }
}
