//! Candidate sources.
//!
//! A source produces batches of [`Candidate`]s: the local directory source
//! yields a single batch, the remote search source yields one batch per
//! results page. Pixels are fetched lazily, only when a candidate is scored.

pub mod local;
pub mod remote;

use std::fmt;

use image::RgbaImage;

pub use local::LocalSource;
pub use remote::RemoteSource;

/// Deferred pixel retrieval for one candidate.
///
/// `FnOnce` guarantees the fetch runs at most once per candidate.
pub type Fetch = Box<dyn FnOnce() -> Result<RgbaImage, FetchError> + Send>;

/// Identity of a candidate image, kept after its pixels are gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRef {
    /// File path or thumbnail URL.
    pub id: String,
    /// Remote preview page URL, used to resolve the full image.
    pub preview: Option<String>,
}

impl CandidateRef {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self { Self { id: id.into(), preview: None } }

    #[must_use]
    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }
}

/// One image under consideration.
pub struct Candidate {
    info: CandidateRef,
    fetch: Fetch,
}

impl Candidate {
    pub fn new<F>(info: CandidateRef, fetch: F) -> Self
    where F: FnOnce() -> Result<RgbaImage, FetchError> + Send + 'static {
        Self { info, fetch: Box::new(fetch) }
    }

    #[must_use]
    pub const fn info(&self) -> &CandidateRef { &self.info }

    /// Drops the fetch without running it.
    #[must_use]
    pub fn into_info(self) -> CandidateRef { self.info }

    /// Splits the candidate so the fetch can be consumed by a scoring worker.
    #[must_use]
    pub fn into_parts(self) -> (CandidateRef, Fetch) { (self.info, self.fetch) }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate").field("info", &self.info).finish_non_exhaustive()
    }
}

/// Pagination metadata carried by a remote results page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub current: u32,
    pub total: u32,
}

/// Unit of candidates fetched and scored together.
#[derive(Debug, Default)]
pub struct Batch {
    pub candidates: Vec<Candidate>,
    /// Total page count, once the source has seen it.
    pub meta: Option<PageMeta>,
}

impl Batch {
    #[must_use]
    pub const fn new(candidates: Vec<Candidate>) -> Self { Self { candidates, meta: None } }

    #[must_use]
    pub fn with_meta(mut self, meta: Option<PageMeta>) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize { self.candidates.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.candidates.is_empty() }
}

/// Produces the next batch of candidates, or `None` once exhausted.
pub trait CandidateSource {
    /// # Errors
    ///
    /// Returns an error when the batch itself cannot be obtained. This is
    /// fatal to the run.
    fn next_batch(&mut self) -> Result<Option<Batch>, SourceError>;
}

/// Failure to fetch or decode a single candidate's pixels.
///
/// Recoverable: the candidate is scored with the worst possible distance.
#[derive(Debug)]
pub enum FetchError {
    /// Reading the local file failed.
    Io(std::io::Error),
    /// The image bytes could not be decoded.
    Decode(image::ImageError),
    /// The thumbnail request failed.
    Http(String),
    /// The fetch panicked.
    Panicked(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read image: {err}"),
            Self::Decode(err) => write!(f, "failed to decode image: {err}"),
            Self::Http(msg) => write!(f, "failed to fetch image: {msg}"),
            Self::Panicked(msg) => write!(f, "image fetch panicked: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Http(_) | Self::Panicked(_) => None,
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self { Self::Io(err) }
}

impl From<image::ImageError> for FetchError {
    fn from(err: image::ImageError) -> Self { Self::Decode(err) }
}

/// Failure to obtain a batch. Always fatal.
#[derive(Debug)]
pub enum SourceError {
    /// The root directory could not be walked.
    Enumerate { root: String, message: String },
    /// A search results page could not be fetched.
    Page { page: u32, message: String },
    /// A search results page contained no candidates.
    EmptyPage(u32),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enumerate { root, message } => {
                write!(f, "cannot enumerate directory {root}: {message}")
            }
            Self::Page { page, message } => write!(f, "cannot fetch page {page}: {message}"),
            Self::EmptyPage(page) => write!(f, "could not find thumbs on page {page}"),
        }
    }
}

impl std::error::Error for SourceError {}
