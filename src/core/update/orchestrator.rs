// ─── Update Orchestration ───
// State machine around the pipeline:
//
//   Idle → CheckingVersion → Downloading → Cleaning → Extracting
//        → Committing → Done
//
// `CheckingVersion` may jump straight to `Done`, and every state after
// `Idle` may fall into `Failed`. Retrying means a fresh run.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::events::{ProgressSink, UpdateEvent, UpdateStatus};
use super::pipeline::{UpdateDescriptor, UpdatePipeline, UpdateReport};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::installation::InstallationTree;

/// Tracks the current phase and reports every transition to the sink.
pub struct UpdateMachine<'s> {
    state: UpdateStatus,
    percent: f64,
    sink: &'s dyn ProgressSink,
}

impl<'s> UpdateMachine<'s> {
    pub fn new(sink: &'s dyn ProgressSink) -> Self {
        Self {
            state: UpdateStatus::Idle,
            percent: 0.0,
            sink,
        }
    }

    pub fn state(&self) -> UpdateStatus {
        self.state
    }

    /// Move to `next`, emitting one phase event.
    pub fn advance(&mut self, next: UpdateStatus) -> LauncherResult<()> {
        if !can_transition(self.state, next) {
            return Err(LauncherError::Other(format!(
                "invalid update transition {} -> {}",
                self.state, next
            )));
        }
        self.percent = match next {
            UpdateStatus::Idle | UpdateStatus::CheckingVersion | UpdateStatus::Downloading => 0.0,
            UpdateStatus::Failed => self.percent,
            _ => 100.0,
        };
        self.enter(next);
        Ok(())
    }

    /// Enter `Failed` carrying `error`'s message. No-op once terminal.
    pub fn fail(&mut self, error: &LauncherError) {
        if self.state.is_terminal() || self.state == UpdateStatus::Idle {
            return;
        }
        self.enter(UpdateStatus::Failed);
        self.line(error.to_string());
    }

    pub fn progress(&mut self, percent: f64) {
        self.percent = percent;
        self.sink.emit(UpdateEvent::Percent { percent });
    }

    pub fn line(&self, message: String) {
        self.sink.emit(UpdateEvent::Line { message });
    }

    fn enter(&mut self, next: UpdateStatus) {
        debug!("Update phase {} -> {}", self.state, next);
        self.state = next;
        self.sink.emit(UpdateEvent::Phase {
            status: next,
            percent: self.percent,
        });
    }
}

fn can_transition(from: UpdateStatus, to: UpdateStatus) -> bool {
    use UpdateStatus::*;
    match (from, to) {
        (Idle, CheckingVersion) | (Idle, Downloading) => true,
        (CheckingVersion, Downloading) | (CheckingVersion, Done) => true,
        (Downloading, Cleaning) | (Cleaning, Extracting) | (Extracting, Committing) => true,
        (Committing, Done) => true,
        (from, Failed) => from != Idle && !from.is_terminal(),
        _ => false,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// Local marker already matched; nothing was touched.
    UpToDate { version: String },
    Updated(UpdateReport),
}

/// Compares the local marker with the remote target and runs the
/// pipeline only when they differ.
pub struct UpdateOrchestrator {
    pipeline: UpdatePipeline,
}

impl UpdateOrchestrator {
    pub fn new(pipeline: UpdatePipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &UpdatePipeline {
        &self.pipeline
    }

    /// Any difference between local and remote version strings triggers
    /// an update, including a missing marker.
    pub async fn needs_update(tree: &InstallationTree, target_version: &str) -> bool {
        tree.local_version().await.as_deref() != Some(target_version)
    }

    pub async fn run(
        &self,
        tree: &InstallationTree,
        descriptor: &UpdateDescriptor,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> LauncherResult<UpdateOutcome> {
        let mut machine = UpdateMachine::new(sink);
        machine.advance(UpdateStatus::CheckingVersion)?;

        let local = tree.local_version().await;
        if local.as_deref() == Some(descriptor.version.as_str()) {
            debug!("Installation already at {}", descriptor.version);
            machine.advance(UpdateStatus::Done)?;
            return Ok(UpdateOutcome::UpToDate {
                version: descriptor.version.clone(),
            });
        }

        info!(
            "Update required: local {:?} -> remote {}",
            local, descriptor.version
        );
        self.pipeline
            .run(&mut machine, tree, descriptor, cancel)
            .await
            .map(UpdateOutcome::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::installation::VersionMarker;
    use crate::core::update::events::NullSink;
    use crate::core::update::extract::tests::zip_bytes;
    use crate::core::update::pipeline::tests::{FailingSource, MemorySource};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn statuses(rx: &mut mpsc::UnboundedReceiver<UpdateEvent>) -> Vec<UpdateStatus> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let UpdateEvent::Phase { status, .. } = event {
                out.push(status);
            }
        }
        out
    }

    #[test]
    fn transition_table() {
        use UpdateStatus::*;
        assert!(can_transition(Idle, CheckingVersion));
        assert!(can_transition(CheckingVersion, Done));
        assert!(can_transition(Extracting, Failed));
        assert!(!can_transition(Idle, Failed));
        assert!(!can_transition(Done, Failed));
        assert!(!can_transition(Downloading, Extracting));
        assert!(!can_transition(Committing, Cleaning));
    }

    #[test]
    fn invalid_transition_is_an_error() {
        let mut machine = UpdateMachine::new(&NullSink);
        assert!(machine.advance(UpdateStatus::Committing).is_err());
        assert_eq!(machine.state(), UpdateStatus::Idle);
    }

    #[tokio::test]
    async fn equal_versions_finish_without_io() {
        let dir = tempfile::tempdir().unwrap();
        let tree = InstallationTree::new(dir.path());
        tree.write_marker(&VersionMarker {
            version: "1.1.0".into(),
        })
        .await
        .unwrap();

        let orchestrator = UpdateOrchestrator::new(UpdatePipeline::new(
            Arc::new(FailingSource),
            dir.path().join("tmp"),
            Duration::from_secs(5),
        ));
        let descriptor = UpdateDescriptor {
            url: "https://example.com/pack.zip".into(),
            version: "1.1.0".into(),
            delete_list: vec![],
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let outcome = orchestrator
            .run(&tree, &descriptor, &tx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            UpdateOutcome::UpToDate {
                version: "1.1.0".into()
            }
        );
        assert_eq!(
            statuses(&mut rx),
            vec![UpdateStatus::CheckingVersion, UpdateStatus::Done]
        );
        assert!(!dir.path().join("tmp").exists());
    }

    #[tokio::test]
    async fn differing_versions_run_the_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let tree = InstallationTree::new(dir.path().join("tree"));
        assert!(UpdateOrchestrator::needs_update(&tree, "1.1.0").await);

        let orchestrator = UpdateOrchestrator::new(UpdatePipeline::new(
            Arc::new(MemorySource {
                body: zip_bytes(&[("versions/1.12.2/", "")]),
                with_length: true,
            }),
            dir.path().join("tmp"),
            Duration::from_secs(5),
        ));
        let descriptor = UpdateDescriptor {
            url: "https://example.com/pack.zip".into(),
            version: "1.1.0".into(),
            delete_list: vec![],
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let outcome = orchestrator
            .run(&tree, &descriptor, &tx, &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(outcome, UpdateOutcome::Updated(_)));
        assert_eq!(
            statuses(&mut rx),
            vec![
                UpdateStatus::CheckingVersion,
                UpdateStatus::Downloading,
                UpdateStatus::Cleaning,
                UpdateStatus::Extracting,
                UpdateStatus::Committing,
                UpdateStatus::Done,
            ]
        );
        assert!(!UpdateOrchestrator::needs_update(&tree, "1.1.0").await);
    }

    #[tokio::test]
    async fn failure_is_terminal_and_carries_the_message() {
        let dir = tempfile::tempdir().unwrap();
        let tree = InstallationTree::new(dir.path().join("tree"));
        let orchestrator = UpdateOrchestrator::new(UpdatePipeline::new(
            Arc::new(FailingSource),
            dir.path().join("tmp"),
            Duration::from_secs(5),
        ));
        let descriptor = UpdateDescriptor {
            url: "https://example.com/pack.zip".into(),
            version: "2.0.0".into(),
            delete_list: vec![],
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let err = orchestrator
            .run(&tree, &descriptor, &tx, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_download_error());

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(
            events.last(),
            Some(UpdateEvent::Line { message }) if message.contains("connection reset")
        ));
        assert!(events.contains(&UpdateEvent::Phase {
            status: UpdateStatus::Failed,
            percent: 0.0,
        }));
    }
}
