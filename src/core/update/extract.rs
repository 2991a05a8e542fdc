use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::sandbox::resolves_within;
use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Files and directories written.
    pub written: usize,
    /// Entries refused because their name or a symlinked directory on
    /// the way escapes the target.
    pub skipped: usize,
}

/// Unpack `zip_path` over `target`, replacing files that already exist.
/// A symlink sitting where a file is extracted is replaced, not followed.
///
/// Blocking; run it on the blocking pool.
pub fn extract_zip_over(zip_path: &Path, target: &Path) -> LauncherResult<ExtractSummary> {
    let fail = |reason: String| LauncherError::Extract {
        archive: zip_path.to_path_buf(),
        reason,
    };

    let zip_file = std::fs::File::open(zip_path).map_err(|e| fail(e.to_string()))?;
    let mut archive = zip::ZipArchive::new(zip_file).map_err(|e| fail(e.to_string()))?;

    std::fs::create_dir_all(target)
        .map_err(|e| fail(format!("cannot create {}: {e}", target.display())))?;
    let canonical_target = std::fs::canonicalize(target)
        .map_err(|e| fail(format!("cannot resolve {}: {e}", target.display())))?;
    let contained = |path: &Path| {
        resolves_within(&canonical_target, path)
            .map_err(|e| fail(format!("cannot resolve {}: {e}", path.display())))
    };

    let mut summary = ExtractSummary::default();
    for index in 0..archive.len() {
        let mut zipped = archive.by_index(index).map_err(|e| fail(e.to_string()))?;

        let Some(relative) = zipped.enclosed_name() else {
            warn!("Skipping unsafe archive entry {:?}", zipped.name());
            summary.skipped += 1;
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let out_path: PathBuf = target.join(&relative);
        let guarded = if zipped.is_dir() {
            out_path.as_path()
        } else {
            out_path.parent().unwrap_or(target)
        };
        if !contained(guarded)? {
            warn!("Skipping {:?}: a symlink leads out of {:?}", zipped.name(), target);
            summary.skipped += 1;
            continue;
        }

        if zipped.is_dir() {
            std::fs::create_dir_all(&out_path)
                .map_err(|e| fail(format!("cannot create {}: {e}", out_path.display())))?;
            summary.written += 1;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| fail(format!("cannot create {}: {e}", parent.display())))?;
        }

        if std::fs::symlink_metadata(&out_path).is_ok_and(|meta| meta.file_type().is_symlink()) {
            std::fs::remove_file(&out_path)
                .map_err(|e| fail(format!("cannot replace {}: {e}", out_path.display())))?;
        }

        // Write inside a block so the handle is closed before permissions change.
        {
            let mut out = std::fs::File::create(&out_path)
                .map_err(|e| fail(format!("cannot write {}: {e}", out_path.display())))?;
            std::io::copy(&mut zipped, &mut out)
                .map_err(|e| fail(format!("cannot inflate {}: {e}", zipped.name())))?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = zipped.unix_mode() {
                let permissions = std::fs::Permissions::from_mode(mode & 0o7777);
                let _ = std::fs::set_permissions(&out_path, permissions);
            }
        }

        summary.written += 1;
    }

    debug!(
        "Extracted {:?} into {:?}: {} written, {} skipped",
        zip_path, target, summary.written, summary.skipped
    );
    Ok(summary)
}
