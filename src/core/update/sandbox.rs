// ─── Path Sandbox ───
// Maps untrusted tree-relative paths onto the installation root.
//
// Two layers: `sanitize_relative` is purely lexical, `resolves_within`
// checks the filesystem so a symlinked directory inside the tree cannot
// redirect a write or delete outside it.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Normalize `raw` into a path relative to the tree root.
///
/// `.` segments vanish, `name/..` pairs cancel, and any `..` that would
/// climb above the root is dropped. Root and drive prefixes are stripped
/// so absolute input is re-rooted under the tree. Returns `None` when
/// nothing is left, i.e. the path names the root itself.
pub fn sanitize_relative(raw: &str) -> Option<PathBuf> {
    // Deletion lists are authored on any platform.
    let unified = raw.replace('\\', "/");
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if parts.is_empty() {
        return None;
    }
    Some(parts.into_iter().collect())
}

/// Resolve `raw` under `root`. The result always starts with `root`.
pub fn sandboxed_path(root: &Path, raw: &str) -> Option<PathBuf> {
    sanitize_relative(raw).map(|relative| root.join(relative))
}

/// Whether `path` lands inside `canonical_root` once symlinks in its
/// existing ancestors are resolved. `path` itself is followed too, so pass
/// the parent when the last component must not be.
///
/// Missing trailing components are fine: the deepest existing ancestor
/// decides. `canonical_root` must already be canonical.
pub fn resolves_within(canonical_root: &Path, path: &Path) -> io::Result<bool> {
    let mut current = path;
    loop {
        match std::fs::canonicalize(current) {
            Ok(resolved) => return Ok(resolved.starts_with(canonical_root)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => match current.parent() {
                Some(parent) => current = parent,
                None => return Ok(false),
            },
            Err(e) => return Err(e),
        }
    }
}
