// ─── Version Resolver ───
// Picks the runnable version directory under `versions/`.

use tracing::{debug, info};

use super::model::InstallationTree;
use crate::core::error::{LauncherError, LauncherResult};

/// Resolve the version to launch from the tree's `versions/` directory.
///
/// Candidates are the immediate subdirectories, sorted by name so the
/// outcome does not depend on filesystem listing order. The first name
/// containing "forge" (any case) wins, otherwise the first candidate.
pub async fn resolve_version(tree: &InstallationTree) -> LauncherResult<String> {
    let versions_dir = tree.versions_dir();
    if !tokio::fs::try_exists(&versions_dir).await.unwrap_or(false) {
        return Err(LauncherError::NotInstalled(versions_dir));
    }

    let mut entries = tokio::fs::read_dir(&versions_dir)
        .await
        .map_err(|e| LauncherError::io(&versions_dir, e))?;

    let mut candidates = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| LauncherError::io(&versions_dir, e))?
    {
        let is_dir = entry
            .file_type()
            .await
            .map(|file_type| file_type.is_dir())
            .unwrap_or(false);
        if !is_dir {
            continue;
        }
        candidates.push(entry.file_name().to_string_lossy().into_owned());
    }
    debug!("Version candidates in {:?}: {:?}", versions_dir, candidates);

    let selected = select_version(candidates)
        .ok_or_else(|| LauncherError::EmptyInstallation(versions_dir.clone()))?;
    info!("Resolved game version: {}", selected);
    Ok(selected)
}

/// Selection rule applied to a candidate list.
pub fn select_version(mut candidates: Vec<String>) -> Option<String> {
    candidates.sort();
    let forge = candidates
        .iter()
        .position(|name| name.to_ascii_lowercase().contains("forge"));
    match forge {
        Some(index) => Some(candidates.swap_remove(index)),
        None => candidates.into_iter().next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_versions(names: &[&str]) -> (tempfile::TempDir, InstallationTree) {
        let dir = tempfile::tempdir().unwrap();
        let tree = InstallationTree::new(dir.path());
        std::fs::create_dir_all(tree.versions_dir()).unwrap();
        for name in names {
            std::fs::create_dir_all(tree.versions_dir().join(name)).unwrap();
        }
        (dir, tree)
    }

    #[tokio::test]
    async fn prefers_forge_regardless_of_position() {
        let (_dir, tree) = tree_with_versions(&["1.12.2-forge-14.23", "1.12.2"]);
        assert_eq!(resolve_version(&tree).await.unwrap(), "1.12.2-forge-14.23");

        let (_dir, tree) = tree_with_versions(&["1.12.2", "1.12.2-Forge-14.23"]);
        assert_eq!(resolve_version(&tree).await.unwrap(), "1.12.2-Forge-14.23");
    }

    #[tokio::test]
    async fn falls_back_to_first_sorted_entry() {
        let (_dir, tree) = tree_with_versions(&["1.16.5", "1.12.2"]);
        assert_eq!(resolve_version(&tree).await.unwrap(), "1.12.2");
    }

    #[tokio::test]
    async fn missing_versions_dir_is_not_installed() {
        let dir = tempfile::tempdir().unwrap();
        let tree = InstallationTree::new(dir.path());
        assert!(matches!(
            resolve_version(&tree).await,
            Err(LauncherError::NotInstalled(_))
        ));
    }

    #[tokio::test]
    async fn empty_versions_dir_is_empty_installation() {
        let (_dir, tree) = tree_with_versions(&[]);
        assert!(matches!(
            resolve_version(&tree).await,
            Err(LauncherError::EmptyInstallation(_))
        ));
    }

    #[tokio::test]
    async fn plain_files_are_not_candidates() {
        let (_dir, tree) = tree_with_versions(&[]);
        std::fs::write(tree.versions_dir().join("forge-notes.txt"), "x").unwrap();
        assert!(matches!(
            resolve_version(&tree).await,
            Err(LauncherError::EmptyInstallation(_))
        ));
    }

    #[test]
    fn multiple_forge_candidates_pick_first_after_sort() {
        let picked = select_version(vec![
            "1.12.2-forge-14.23.5".into(),
            "1.12.2-forge-14.23.1".into(),
            "1.12.2".into(),
        ]);
        assert_eq!(picked.as_deref(), Some("1.12.2-forge-14.23.1"));
        assert_eq!(select_version(Vec::new()), None);
    }
}
