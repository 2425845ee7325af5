//! Locating external executables such as the wallpaper setter.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Colon-separated directories searched before `PATH`.
pub const EXTRA_PATHS_ENV: &str = "HUEWALL_EXTRA_PATHS";

/// Resolves a command name to the absolute path of an executable.
///
/// Absolute paths are only checked for executability. Names are looked up in
/// `HUEWALL_EXTRA_PATHS`, then `PATH`, then a few common install locations.
///
/// # Errors
///
/// Returns a description of the failure when no executable is found.
pub fn resolve_binary(binary: &str) -> Result<PathBuf, String> {
    if binary.is_empty() {
        return Err("Binary name cannot be empty".to_string());
    }

    let candidate = Path::new(binary);
    if candidate.is_absolute() {
        return if is_executable(candidate) {
            Ok(candidate.to_path_buf())
        } else {
            Err(format!("Binary at {} is not executable", candidate.display()))
        };
    }

    let mut search_paths = Vec::new();

    if let Ok(extra) = env::var(EXTRA_PATHS_ENV) {
        search_paths.extend(extra.split(':').map(PathBuf::from));
    }

    if let Some(path_var) = env::var_os("PATH") {
        search_paths.extend(env::split_paths(&path_var));
    }

    search_paths.extend([PathBuf::from("/usr/local/bin"), PathBuf::from("/usr/bin")]);

    if let Some(home) = dirs::home_dir() {
        search_paths.push(home.join(".local/bin"));
        search_paths.push(home.join("bin"));
    }

    search_paths
        .into_iter()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(binary))
        .find(|path| is_executable(path))
        .ok_or_else(|| format!("Unable to locate executable '{binary}' in known search paths"))
}

fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}
