//! Persisting the chosen remote image to the images directory.

use std::fs;
use std::path::{Path, PathBuf};

use reqwest::Url;
use tempfile::NamedTempFile;

use super::SinkError;
use super::screen::ScreenSize;
use crate::remote::HttpClient;

/// Default images directory: `~/Images/<resolution>`.
#[must_use]
pub fn default_images_dir(resolution: ScreenSize) -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("Images").join(resolution.to_string()))
}

/// Creates `dir` and its parents when missing.
///
/// # Errors
///
/// Returns an error if the path exists but is not a directory, or creation fails.
pub fn ensure_dir(dir: &Path) -> Result<(), SinkError> {
    if dir.exists() && !dir.is_dir() {
        return Err(SinkError::NotADirectory(dir.to_path_buf()));
    }
    fs::create_dir_all(dir).map_err(|err| SinkError::Io { path: dir.to_path_buf(), source: err })
}

/// Last path segment of `url`, used as the local file name.
///
/// # Errors
///
/// Returns an error if the URL is invalid or has no file name.
pub fn file_name_from_url(url: &str) -> Result<String, SinkError> {
    let parsed = Url::parse(url).map_err(|_| SinkError::BadUrl(url.to_string()))?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
        .ok_or_else(|| SinkError::BadUrl(url.to_string()))
}

/// Downloads `url` into `dir`, keeping the URL's file name.
///
/// The body is written to a temporary file in `dir` first, so an interrupted
/// download never leaves a truncated image behind.
///
/// # Errors
///
/// Returns an error if the request fails or the file cannot be written.
pub fn download(client: &HttpClient, url: &str, dir: &Path) -> Result<PathBuf, SinkError> {
    let target = dir.join(file_name_from_url(url)?);
    let io_error = |source| SinkError::Io { path: target.clone(), source };

    let mut temp = NamedTempFile::new_in(dir).map_err(io_error)?;
    let bytes = client
        .download_to(url, temp.as_file_mut())
        .map_err(|err| SinkError::Download(err.to_string()))?;
    temp.persist(&target).map_err(|err| io_error(err.error))?;

    tracing::info!(url, path = %target.display(), bytes, "downloaded image");
    Ok(target)
}
