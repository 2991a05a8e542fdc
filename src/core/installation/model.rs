use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

pub const MARKER_FILE: &str = "local_version.json";

/// Persisted record of the content version currently on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionMarker {
    pub version: String,
}

/// On-disk root of the game installation.
///
/// Layout:
/// - `versions/<id>/`: one directory per installed version
/// - `local_version.json`: the version marker
#[derive(Debug, Clone)]
pub struct InstallationTree {
    root: PathBuf,
}

impl InstallationTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn marker_path(&self) -> PathBuf {
        self.root.join(MARKER_FILE)
    }

    /// Read the version marker. A missing marker is `None`; an unreadable
    /// one is treated the same so the next update rewrites it.
    pub async fn read_marker(&self) -> Option<VersionMarker> {
        let path = self.marker_path();
        let raw = tokio::fs::read_to_string(&path).await.ok()?;
        match serde_json::from_str::<VersionMarker>(&raw) {
            Ok(marker) => Some(marker),
            Err(e) => {
                warn!("Corrupt version marker at {:?}: {}", path, e);
                None
            }
        }
    }

    pub async fn local_version(&self) -> Option<String> {
        self.read_marker().await.map(|marker| marker.version)
    }

    /// Replace the marker as a whole file: write a sibling temp file, then
    /// rename it over the old one.
    pub async fn write_marker(&self, marker: &VersionMarker) -> LauncherResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| LauncherError::io(&self.root, e))?;

        let path = self.marker_path();
        let staging = self.root.join(format!("{MARKER_FILE}.tmp"));
        let json = serde_json::to_string_pretty(marker)?;

        tokio::fs::write(&staging, json)
            .await
            .map_err(|e| LauncherError::io(&staging, e))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| LauncherError::io(&path, e))?;

        debug!("Version marker set to {} at {:?}", marker.version, path);
        Ok(())
    }
}
