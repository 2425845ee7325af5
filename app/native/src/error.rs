//! Top-level error type returned by CLI commands.

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::policy::PolicyError;
use crate::remote::{ClientError, RemoteError};
use crate::sink::SinkError;

/// Errors that abort a huewall run.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum HuewallError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// A batch of candidates could not be obtained or scored.
    #[error("{0}")]
    SourceError(String),
    /// Talking to the wallpaper site failed.
    #[error("Remote error: {0}")]
    RemoteError(String),
    /// Saving or applying the wallpaper failed.
    #[error("Wallpaper error: {0}")]
    WallpaperError(String),
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
    /// Generic command error.
    #[error("{0}")]
    CommandError(String),
}

impl From<std::io::Error> for HuewallError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<ConfigError> for HuewallError {
    fn from(err: ConfigError) -> Self { Self::ConfigError(err.to_string()) }
}

impl From<PolicyError> for HuewallError {
    fn from(err: PolicyError) -> Self { Self::SourceError(err.to_string()) }
}

impl From<ClientError> for HuewallError {
    fn from(err: ClientError) -> Self { Self::RemoteError(err.to_string()) }
}

impl From<RemoteError> for HuewallError {
    fn from(err: RemoteError) -> Self { Self::RemoteError(err.to_string()) }
}

impl From<SinkError> for HuewallError {
    fn from(err: SinkError) -> Self { Self::WallpaperError(err.to_string()) }
}

impl From<String> for HuewallError {
    fn from(msg: String) -> Self { Self::CommandError(msg) }
}

impl From<&str> for HuewallError {
    fn from(msg: &str) -> Self { Self::CommandError(msg.to_string()) }
}
