// ─── Launch Executor seam ───
// The process launcher (library/asset download + JVM spawn) lives outside
// this crate; it receives a finished descriptor and reports back events.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use super::descriptor::LaunchDescriptor;
use crate::core::error::LauncherResult;

/// Events raised by an executor, forwarded to the UI unmodified.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LaunchEvent {
    /// Executor diagnostics.
    Debug { message: String },
    /// Raw game stdout/stderr.
    Data { message: String },
    /// Asset/library download progress.
    Progress { kind: String, task: u64, total: u64 },
    /// Game process exited.
    Close { code: Option<i32> },
}

impl LaunchEvent {
    /// Completion of a `Progress` event in percent.
    pub fn percent(&self) -> Option<f64> {
        match self {
            LaunchEvent::Progress { task, total, .. } if *total > 0 => {
                Some((*task as f64 / *total as f64 * 100.0).min(100.0))
            }
            _ => None,
        }
    }
}

#[async_trait]
pub trait LaunchExecutor: Send + Sync {
    /// Start the game described by `descriptor`. The descriptor is
    /// consumed; events go to `events` until `Close`.
    async fn launch(
        &self,
        descriptor: LaunchDescriptor,
        events: UnboundedSender<LaunchEvent>,
    ) -> LauncherResult<()>;
}
