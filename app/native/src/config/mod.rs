//! Configuration for huewall.
//!
//! The file is optional. Its values are merged with command-line flags into
//! immutable settings handed to each component, so nothing reads global state.

pub mod schema;
pub mod types;

use std::path::{Path, PathBuf};

pub use types::{
    ConfigError, HuewallConfig, WorkersConfig, config_paths, load_config, load_config_from_path,
};

/// Configuration together with the file it came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: HuewallConfig,
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// Directory relative config paths are resolved against.
    #[must_use]
    pub fn base_dir(&self) -> Option<&Path> { self.path.as_deref().and_then(Path::parent) }
}

/// Loads the configuration from `custom` or the default search paths.
///
/// A missing default file yields the defaults; a missing custom file is an error.
///
/// # Errors
///
/// Returns an error if a file exists but cannot be read or parsed.
pub fn load(custom: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let result = custom.map_or_else(load_config, load_config_from_path);

    match result {
        Ok((config, path)) => {
            tracing::debug!(path = %path.display(), "loaded configuration");
            Ok(LoadedConfig { config, path: Some(path) })
        }
        Err(ConfigError::NotFound) => {
            tracing::debug!("no configuration file, using defaults");
            Ok(LoadedConfig::default())
        }
        Err(err) => Err(err),
    }
}
