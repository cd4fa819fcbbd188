//! User-facing progress reporting, passed explicitly to the orchestrator
//! and plugins instead of living in a global.
use std::{fmt::Debug, sync::Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointKind {
    Success,
    Failure,
}

pub trait Checkpoint: Debug + Send + Sync {
    fn checkpoint(&self, message: &str, kind: CheckpointKind);

    fn success(&self, message: &str) {
        self.checkpoint(message, CheckpointKind::Success);
    }

    fn failure(&self, message: &str) {
        self.checkpoint(message, CheckpointKind::Failure);
    }
}

/// Forwards checkpoints to the `log` facade.
#[derive(Debug, Default)]
pub struct LogCheckpoint;

impl Checkpoint for LogCheckpoint {
    fn checkpoint(&self, message: &str, kind: CheckpointKind) {
        match kind {
            CheckpointKind::Success => log::info!("✔ {message}"),
            CheckpointKind::Failure => log::error!("✖ {message}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct NoopCheckpoint;

impl Checkpoint for NoopCheckpoint {
    fn checkpoint(&self, _message: &str, _kind: CheckpointKind) {}
}

/// Keeps every checkpoint in memory, for assertions.
#[derive(Debug, Default)]
pub struct RecordingCheckpoint {
    entries: Mutex<Vec<(CheckpointKind, String)>>,
}

impl RecordingCheckpoint {
    pub fn entries(&self) -> Vec<(CheckpointKind, String)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl Checkpoint for RecordingCheckpoint {
    fn checkpoint(&self, message: &str, kind: CheckpointKind) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((kind, message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let checkpoint = RecordingCheckpoint::default();
        checkpoint.success("built graph");
        checkpoint.failure("cycle");

        assert_eq!(
            checkpoint.entries(),
            vec![
                (CheckpointKind::Success, "built graph".to_string()),
                (CheckpointKind::Failure, "cycle".to_string()),
            ]
        );
    }
}
