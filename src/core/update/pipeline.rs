// ─── Update Pipeline ───
// Download → Clean → Extract → Commit, strictly in that order.
//
// Only the download phase is safe to abort: it never touches the tree.
// The later phases overwrite in place, so a failure there leaves a mixed
// tree and the recovery path is running the whole pipeline again.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::events::{ProgressSink, UpdateStatus};
use super::extract::{extract_zip_over, ExtractSummary};
use super::orchestrator::UpdateMachine;
use super::sandbox::{resolves_within, sandboxed_path};
use super::source::ArchiveSource;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::installation::{InstallationTree, VersionMarker};

/// Remote instruction set for one update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateDescriptor {
    pub url: String,
    pub version: String,
    /// Tree-relative paths superseded by this version.
    #[serde(default, alias = "deleteList", alias = "delete")]
    pub delete_list: Vec<String>,
}

/// A deletion that could not be carried out. Never fatal.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeleteFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UpdateReport {
    pub version: String,
    pub extracted_entries: usize,
    pub skipped_entries: usize,
    pub failed_deletions: Vec<DeleteFailure>,
    pub completed_at: DateTime<Utc>,
}

pub struct UpdatePipeline {
    source: Arc<dyn ArchiveSource>,
    /// Download staging area; must be outside the tree.
    temp_dir: PathBuf,
    stall_timeout: Duration,
}

impl UpdatePipeline {
    pub fn new(source: Arc<dyn ArchiveSource>, temp_dir: PathBuf, stall_timeout: Duration) -> Self {
        Self {
            source,
            temp_dir,
            stall_timeout,
        }
    }

    /// Apply `descriptor` to `tree` unconditionally.
    pub async fn apply(
        &self,
        tree: &InstallationTree,
        descriptor: &UpdateDescriptor,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> LauncherResult<UpdateReport> {
        let mut machine = UpdateMachine::new(sink);
        self.run(&mut machine, tree, descriptor, cancel).await
    }

    /// Drive the phases on an existing state machine. Any error moves the
    /// machine to `Failed` before it is returned.
    pub(crate) async fn run(
        &self,
        machine: &mut UpdateMachine<'_>,
        tree: &InstallationTree,
        descriptor: &UpdateDescriptor,
        cancel: &CancellationToken,
    ) -> LauncherResult<UpdateReport> {
        let result = self.run_phases(machine, tree, descriptor, cancel).await;
        if let Err(err) = &result {
            warn!("Update to {} failed: {}", descriptor.version, err);
            machine.fail(err);
        }
        result
    }

    async fn run_phases(
        &self,
        machine: &mut UpdateMachine<'_>,
        tree: &InstallationTree,
        descriptor: &UpdateDescriptor,
        cancel: &CancellationToken,
    ) -> LauncherResult<UpdateReport> {
        let started = Instant::now();

        machine.advance(UpdateStatus::Downloading)?;
        let archive = self.download(&descriptor.url, machine, cancel).await?;

        // Past this point the tree is being modified; no more cancellation.
        machine.advance(UpdateStatus::Cleaning)?;
        let failed_deletions = clean_tree(tree.root(), &descriptor.delete_list).await;
        for failure in &failed_deletions {
            machine.line(format!(
                "could not delete {}: {}",
                failure.path.display(),
                failure.reason
            ));
        }

        machine.advance(UpdateStatus::Extracting)?;
        let summary = extract_archive(&archive, tree.root()).await?;

        machine.advance(UpdateStatus::Committing)?;
        tree.write_marker(&VersionMarker {
            version: descriptor.version.clone(),
        })
        .await?;

        if let Err(e) = tokio::fs::remove_file(&archive).await {
            debug!("Could not remove staged archive {:?}: {}", archive, e);
        }

        machine.advance(UpdateStatus::Done)?;
        info!(
            "Updated {:?} to {} in {:?}",
            tree.root(),
            descriptor.version,
            started.elapsed()
        );

        Ok(UpdateReport {
            version: descriptor.version.clone(),
            extracted_entries: summary.written,
            skipped_entries: summary.skipped,
            failed_deletions,
            completed_at: Utc::now(),
        })
    }

    /// Stream the archive into the temp dir. The file is kept on failure.
    #[instrument(skip(self, machine, cancel))]
    async fn download(
        &self,
        url: &str,
        machine: &mut UpdateMachine<'_>,
        cancel: &CancellationToken,
    ) -> LauncherResult<PathBuf> {
        // Staging failures still leave the tree untouched, so they are
        // reported as download errors.
        let staging = |path: &Path, e: std::io::Error| LauncherError::Download {
            url: url.to_string(),
            reason: format!("cannot stage archive at {}: {e}", path.display()),
        };

        tokio::fs::create_dir_all(&self.temp_dir)
            .await
            .map_err(|e| staging(&self.temp_dir, e))?;
        let archive_path = self.temp_dir.join(format!("{}.zip", Uuid::new_v4()));

        let stalled = || LauncherError::Download {
            url: url.to_string(),
            reason: format!("no data received for {:?}", self.stall_timeout),
        };

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LauncherError::Cancelled),
            opened = tokio::time::timeout(self.stall_timeout, self.source.open(url)) => opened,
        };
        let mut stream = opened.map_err(|_| stalled())??;

        let mut file = tokio::fs::File::create(&archive_path)
            .await
            .map_err(|e| staging(&archive_path, e))?;

        let total = stream.content_length.filter(|len| *len > 0);
        let mut downloaded: u64 = 0;
        let mut last_percent: u64 = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LauncherError::Cancelled),
                next = tokio::time::timeout(self.stall_timeout, stream.chunks.next()) => next,
            };
            let Some(chunk) = next.map_err(|_| stalled())? else {
                break;
            };
            let chunk = chunk?;

            file.write_all(&chunk)
                .await
                .map_err(|e| staging(&archive_path, e))?;
            downloaded = downloaded.saturating_add(chunk.len() as u64);

            if let Some(total) = total {
                let percent = (downloaded.saturating_mul(100) / total).min(100);
                if percent > last_percent {
                    last_percent = percent;
                    machine.progress(percent as f64);
                }
            }
        }

        file.flush()
            .await
            .map_err(|e| staging(&archive_path, e))?;
        drop(file);

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, archive_path, downloaded);
        Ok(archive_path)
    }
}

/// Remove every sandboxed entry of `delete_list` that exists as a file or
/// symlink. Entries reached through a symlinked directory pointing out of
/// the tree are refused. Failures are collected, never raised.
pub async fn clean_tree(root: &Path, delete_list: &[String]) -> Vec<DeleteFailure> {
    let mut failures = Vec::new();

    let canonical_root = match tokio::fs::canonicalize(root).await {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Tree {:?} does not exist yet, nothing to delete", root);
            return failures;
        }
        Err(e) => {
            warn!("Cannot resolve tree root {:?}: {}", root, e);
            return delete_list
                .iter()
                .map(|raw| DeleteFailure {
                    path: root.join(raw),
                    reason: format!("cannot resolve tree root: {e}"),
                })
                .collect();
        }
    };

    for raw in delete_list {
        let Some(path) = sandboxed_path(root, raw) else {
            warn!("Ignoring delete entry {:?}: resolves to the tree root", raw);
            failures.push(DeleteFailure {
                path: root.to_path_buf(),
                reason: format!("entry {raw:?} resolves to the tree root"),
            });
            continue;
        };

        // The entry itself is never followed, only its directories.
        let parent = path.parent().unwrap_or(root);
        match resolves_within(&canonical_root, parent) {
            Ok(true) => {}
            Ok(false) => {
                warn!("Refusing to delete {:?}: escapes the tree", path);
                failures.push(DeleteFailure {
                    path,
                    reason: "escapes the tree through a symlink".into(),
                });
                continue;
            }
            Err(e) => {
                warn!("Cannot resolve {:?}: {}", parent, e);
                failures.push(DeleteFailure {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        }

        let metadata = match tokio::fs::symlink_metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Already absent: {:?}", path);
                continue;
            }
            Err(e) => {
                warn!("Cannot inspect {:?}: {}", path, e);
                failures.push(DeleteFailure {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if metadata.is_dir() {
            warn!("Not deleting directory {:?}", path);
            failures.push(DeleteFailure {
                path,
                reason: "is a directory".into(),
            });
            continue;
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!("Deleted {:?}", path),
            Err(e) => {
                warn!("Failed to delete {:?}: {}", path, e);
                failures.push(DeleteFailure {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    failures
}

async fn extract_archive(archive: &Path, root: &Path) -> LauncherResult<ExtractSummary> {
    let archive_owned = archive.to_path_buf();
    let root_owned = root.to_path_buf();
    tokio::task::spawn_blocking(move || extract_zip_over(&archive_owned, &root_owned))
        .await
        .map_err(|e| LauncherError::Extract {
            archive: archive.to_path_buf(),
            reason: format!("extraction task failed: {e}"),
        })?
}
