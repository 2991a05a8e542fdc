use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the provisioning and launch engine.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Operation cancelled")]
    Cancelled,

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Installation ────────────────────────────────────
    #[error("Game is not installed: {0:?} does not exist")]
    NotInstalled(PathBuf),

    #[error("Installation is empty: no versions found in {0:?}")]
    EmptyInstallation(PathBuf),

    // ── Archive ─────────────────────────────────────────
    #[error("Failed to extract {archive:?}: {reason}")]
    Extract { archive: PathBuf, reason: String },

    // ── Launch ──────────────────────────────────────────
    #[error("Java runtime not found at {0:?}")]
    JavaNotFound(PathBuf),

    #[error("Invalid server address '{0}': expected host[:port]")]
    InvalidConnectTarget(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // ── Authentication ──────────────────────────────────
    #[error("Authentication rejected: {message}")]
    AuthServer { message: String },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    /// Failures raised before the installation tree is touched.
    pub fn is_download_error(&self) -> bool {
        matches!(
            self,
            LauncherError::Download { .. }
                | LauncherError::DownloadFailed { .. }
                | LauncherError::Cancelled
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// ── Serialization for UI IPC ────────────────────────────
// Host shells display the error text as-is.
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
