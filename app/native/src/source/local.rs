//! Local directory source.
//!
//! Walks a directory tree once and yields every supported image as a single
//! batch. When a maximum item count is configured, the batch is shuffled and
//! truncated so the run time stays bounded.

use std::path::{Path, PathBuf};

use image::{ImageReader, RgbaImage};
use natord::compare;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use walkdir::WalkDir;

use super::{Batch, Candidate, CandidateRef, CandidateSource, FetchError, SourceError};

/// Supported image file extensions (compared case-insensitively).
const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Checks if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Recursively lists all supported image files below `root`.
///
/// Files are returned in natural order. A failure to read `root` itself is an
/// error; unreadable entries deeper in the tree are skipped with a warning.
///
/// # Errors
///
/// Returns [`SourceError::Enumerate`] if `root` cannot be read.
pub fn list_images(root: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let mut images = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(SourceError::Enumerate {
                    root: root.display().to_string(),
                    message: err.to_string(),
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };

        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            images.push(entry.into_path());
        }
    }

    images.sort_by(|a, b| compare(a.to_string_lossy().as_ref(), b.to_string_lossy().as_ref()));
    Ok(images)
}

/// Opens and decodes a local image file into RGBA pixels.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn decode_file(path: &Path) -> Result<RgbaImage, FetchError> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(image.into_rgba8())
}

/// Source yielding every supported image below a root directory as one batch.
pub struct LocalSource {
    root: PathBuf,
    max_items: Option<usize>,
    rng: StdRng,
    emitted: bool,
}

impl LocalSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, max_items: Option<usize>) -> Self {
        Self::with_rng(root, max_items, StdRng::from_rng(&mut rand::rng()))
    }

    /// Creates a source with an explicit random generator for sampling.
    #[must_use]
    pub fn with_rng(root: impl Into<PathBuf>, max_items: Option<usize>, rng: StdRng) -> Self {
        Self {
            root: root.into(),
            max_items: max_items.filter(|&max| max > 0),
            rng,
            emitted: false,
        }
    }

    /// Shuffles and truncates `paths` to the configured maximum.
    fn sample(&mut self, mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
        if let Some(max) = self.max_items
            && paths.len() > max
        {
            paths.shuffle(&mut self.rng);
            paths.truncate(max);
            tracing::debug!(max, "sampled local images");
        }
        paths
    }
}

impl CandidateSource for LocalSource {
    fn next_batch(&mut self) -> Result<Option<Batch>, SourceError> {
        if self.emitted {
            return Ok(None);
        }
        self.emitted = true;

        let found = list_images(&self.root)?;
        tracing::debug!(root = %self.root.display(), count = found.len(), "listed local images");

        let candidates = self
            .sample(found)
            .into_iter()
            .map(|path| {
                let info = CandidateRef::new(path.display().to_string());
                Candidate::new(info, move || decode_file(&path))
            })
            .collect();

        Ok(Some(Batch::new(candidates)))
    }
}
