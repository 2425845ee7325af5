//! Configuration file types and loading.
//!
//! The file is JSONC: `//` and `/* */` comments are stripped before parsing.

use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::{
    APP_NAME, DEFAULT_BASE_URL, DEFAULT_CATEGORIES, DEFAULT_PURITY, DEFAULT_SORTING,
    DEFAULT_USER_AGENT,
};

/// Worker counts for the local scoring stages. Unset or zero means automatic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkersConfig {
    /// Threads reading and decoding image files.
    pub decode: Option<usize>,
    /// Threads computing average colors.
    pub average: Option<usize>,
    /// Threads computing color distances.
    pub distance: Option<usize>,
}

/// Huewall configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct HuewallConfig {
    /// Where downloaded wallpapers are stored. Supports `~`; relative paths
    /// are resolved against the config file's directory.
    /// Default: `~/Images/<resolution>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images_dir: Option<String>,

    /// Screen resolution as `WIDTHxHEIGHT`, used to filter search results.
    /// Default: detected with `xdpyinfo`, else `2560x1440`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,

    /// User agent sent with every remote request.
    pub user_agent: String,

    /// Base URL of the wallpaper site.
    pub base_url: String,

    /// Search categories flags (general, anime, people).
    pub categories: String,

    /// Search purity flags (sfw, sketchy, nsfw).
    pub purity: String,

    /// Search result ordering.
    pub sorting: String,

    /// Command setting the wallpaper: program followed by arguments. The image
    /// path is appended. When empty, the desktop's native mechanism is used.
    ///
    /// Example: `["fbsetbg", "-t"]`
    pub setter: Vec<String>,

    /// Worker counts for directory mode.
    pub workers: WorkersConfig,
}

impl Default for HuewallConfig {
    fn default() -> Self {
        Self {
            images_dir: None,
            resolution: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            categories: DEFAULT_CATEGORIES.to_string(),
            purity: DEFAULT_PURITY.to_string(),
            sorting: DEFAULT_SORTING.to_string(),
            setter: Vec::new(),
            workers: WorkersConfig::default(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    NotFound,
    /// The configuration file exists but could not be read.
    IoError(std::io::Error),
    /// The configuration file contains invalid JSON.
    ParseError(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(
                f,
                "No configuration file found. Expected at ~/.config/huewall/config.jsonc \
                or ~/.huewall.jsonc"
            ),
            Self::IoError(err) => write!(f, "Failed to read configuration file: {err}"),
            Self::ParseError(err) => write!(f, "Failed to parse configuration file: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            Self::ParseError(err) => Some(err),
            Self::NotFound => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err) }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self { Self::ParseError(err) }
}

const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

const LEGACY_CONFIG_FILE_NAMES: &[&str] = &[".huewall.jsonc", ".huewall.json"];

/// Returns the candidate configuration file paths in priority order.
///
/// 1. `$XDG_CONFIG_HOME/huewall/config.jsonc|json` when the variable is set
/// 2. `~/.config/huewall/config.jsonc|json`
/// 3. the platform config directory, if different
/// 4. `~/.huewall.jsonc|json`
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut dirs_to_search = Vec::new();

    if let Some(xdg_config) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        dirs_to_search.push(PathBuf::from(xdg_config).join(APP_NAME));
    }
    if let Some(home) = dirs::home_dir() {
        dirs_to_search.push(home.join(".config").join(APP_NAME));
    }
    if let Some(config_dir) = dirs::config_dir() {
        dirs_to_search.push(config_dir.join(APP_NAME));
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for dir in dirs_to_search {
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    if let Some(home) = dirs::home_dir() {
        paths.extend(LEGACY_CONFIG_FILE_NAMES.iter().map(|name| home.join(name)));
    }

    paths
}

/// Loads the configuration from a specific path.
///
/// # Errors
///
/// Returns `ConfigError::IoError` if the file cannot be read, or
/// `ConfigError::ParseError` if it is not valid JSONC.
pub fn load_config_from_path(path: &Path) -> Result<(HuewallConfig, PathBuf), ConfigError> {
    let file = fs::File::open(path)?;
    let reader = json_comments::StripComments::new(file);
    let config: HuewallConfig = serde_json::from_reader(reader)?;
    Ok((config, path.to_path_buf()))
}

/// Loads the first configuration file found in [`config_paths`].
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no file exists, or the errors of
/// [`load_config_from_path`].
pub fn load_config() -> Result<(HuewallConfig, PathBuf), ConfigError> {
    config_paths()
        .into_iter()
        .find(|path| path.exists())
        .map_or(Err(ConfigError::NotFound), |path| load_config_from_path(&path))
}
