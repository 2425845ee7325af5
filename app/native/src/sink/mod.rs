//! Result sink: persists the chosen image and applies it as the wallpaper.
//!
//! - [`screen`]: screen resolution
//! - [`download`]: images directory and download
//! - [`setter`]: wallpaper setter

pub mod download;
pub mod screen;
pub mod setter;

use std::fmt;
use std::path::{Path, PathBuf};

pub use screen::ScreenSize;
pub use setter::Setter;

use crate::remote::HttpClient;

/// Errors raised while persisting or applying the chosen image.
#[derive(Debug)]
pub enum SinkError {
    /// A filesystem operation failed.
    Io { path: PathBuf, source: std::io::Error },
    /// The images directory path is a file.
    NotADirectory(PathBuf),
    /// The image URL has no usable file name.
    BadUrl(String),
    /// The image could not be downloaded.
    Download(String),
    /// The wallpaper setter failed.
    Setter(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::NotADirectory(path) => write!(f, "{} is not a directory", path.display()),
            Self::BadUrl(url) => write!(f, "cannot derive a file name from {url}"),
            Self::Download(msg) => write!(f, "could not download image: {msg}"),
            Self::Setter(msg) => write!(f, "could not set wallpaper: {msg}"),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Immutable sink settings for one run.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub setter: Setter,
    /// Select only: no download, no wallpaper change.
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct Sink {
    config: SinkConfig,
}

impl Sink {
    #[must_use]
    pub const fn new(config: SinkConfig) -> Self { Self { config } }

    #[must_use]
    pub const fn config(&self) -> &SinkConfig { &self.config }

    /// Applies an image already on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the setter fails.
    pub fn apply_local(&self, image: &Path) -> Result<(), SinkError> {
        if self.config.dry_run {
            tracing::info!(path = %image.display(), "dry run, wallpaper unchanged");
            return Ok(());
        }
        self.config.setter.apply(image)
    }

    /// Downloads a remote image into `images_dir` and applies it.
    ///
    /// Returns the local path, or `None` on a dry run.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory, download or setter fails.
    pub fn apply_remote(
        &self,
        client: &HttpClient,
        url: &str,
        images_dir: &Path,
    ) -> Result<Option<PathBuf>, SinkError> {
        if self.config.dry_run {
            tracing::info!(url, "dry run, skipping download");
            return Ok(None);
        }
        download::ensure_dir(images_dir)?;
        let path = download::download(client, url, images_dir)?;
        self.config.setter.apply(&path)?;
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn dry_sink() -> Sink {
        Sink::new(SinkConfig {
            setter: Setter::Command { program: PathBuf::from("/nonexistent/setter"), args: vec![] },
            dry_run: true,
        })
    }

    #[test]
    fn test_dry_run_local_skips_setter() {
        dry_sink().apply_local(Path::new("/tmp/a.png")).unwrap();
    }

    #[test]
    fn test_dry_run_remote_skips_download() {
        let temp = TempDir::new().unwrap();
        let client = HttpClient::new("huewall-test").unwrap();
        let images_dir = temp.path().join("never-created");
        let result = dry_sink()
            .apply_remote(&client, "https://example.com/full/a.jpg", &images_dir)
            .unwrap();
        assert!(result.is_none());
        assert!(!images_dir.exists());
    }

    #[test]
    fn test_sink_error_display() {
        let err = SinkError::NotADirectory(PathBuf::from("/tmp/file"));
        assert_eq!(err.to_string(), "/tmp/file is not a directory");
    }
}
