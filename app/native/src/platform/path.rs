//! Shell-like path expansion.

use std::path::{Path, PathBuf};

/// Expands a leading `~` to the home directory. Other paths are returned as-is.
#[must_use]
pub fn expand(path: &str) -> PathBuf {
    let path = path.trim();
    if path.is_empty() {
        return PathBuf::new();
    }
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Expands `path` and resolves it against `base_dir` when still relative.
///
/// Used for paths written in the config file, which are relative to the
/// file's own directory.
#[must_use]
pub fn expand_and_resolve(path: &str, base_dir: &Path) -> PathBuf {
    let expanded = expand(path);
    if expanded.as_os_str().is_empty() || expanded.is_absolute() {
        return expanded;
    }
    base_dir.join(expanded)
}
