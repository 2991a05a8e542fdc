use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// Phases of an update run, in order. `Failed` is reachable from any
/// phase after `Idle`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Idle,
    CheckingVersion,
    Downloading,
    Cleaning,
    Extracting,
    Committing,
    Done,
    Failed,
}

impl UpdateStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, UpdateStatus::Done | UpdateStatus::Failed)
    }
}

impl std::fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            UpdateStatus::Idle => "idle",
            UpdateStatus::CheckingVersion => "checking_version",
            UpdateStatus::Downloading => "downloading",
            UpdateStatus::Cleaning => "cleaning",
            UpdateStatus::Extracting => "extracting",
            UpdateStatus::Committing => "committing",
            UpdateStatus::Done => "done",
            UpdateStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Payload emitted to the observer while an update runs.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateEvent {
    /// A state transition.
    Phase { status: UpdateStatus, percent: f64 },
    /// Download progress, only when the size is known.
    Percent { percent: f64 },
    /// Opaque diagnostic text.
    Line { message: String },
}

/// Receives update events. Called on the task driving the update, so
/// implementations must not block.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: UpdateEvent);
}

impl ProgressSink for UnboundedSender<UpdateEvent> {
    fn emit(&self, event: UpdateEvent) {
        // A dropped receiver only means nobody is watching anymore.
        let _ = self.send(event);
    }
}

/// Sink that discards everything.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: UpdateEvent) {}
}
