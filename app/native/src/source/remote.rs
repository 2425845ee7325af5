//! Remote search source.
//!
//! Each call to [`CandidateSource::next_batch`] fetches the next results page
//! and turns its thumbnails into candidates. Thumbnail pixels are downloaded
//! only when a candidate is scored.

use std::sync::Arc;

use image::RgbaImage;

use super::{Batch, Candidate, CandidateRef, CandidateSource, FetchError, SourceError};
use crate::remote::{HttpClient, SearchQuery, page};

/// Source yielding one batch per search results page, starting at page 1.
pub struct RemoteSource {
    client: Arc<HttpClient>,
    query: SearchQuery,
    page: u32,
}

impl RemoteSource {
    #[must_use]
    pub const fn new(client: Arc<HttpClient>, query: SearchQuery) -> Self {
        Self { client, query, page: 1 }
    }

    /// Page the next call to `next_batch` will fetch.
    #[must_use]
    pub const fn next_page(&self) -> u32 { self.page }
}

/// Downloads and decodes one thumbnail.
///
/// # Errors
///
/// Returns an error if the request fails or the bytes are not an image.
pub fn fetch_thumbnail(client: &HttpClient, url: &str) -> Result<RgbaImage, FetchError> {
    let bytes = client.get_bytes(url).map_err(|err| FetchError::Http(err.to_string()))?;
    Ok(image::load_from_memory(&bytes)?.into_rgba8())
}

impl CandidateSource for RemoteSource {
    fn next_batch(&mut self) -> Result<Option<Batch>, SourceError> {
        let page = self.page;
        let page_error = |message: String| SourceError::Page { page, message };

        let url = self.query.page_url(page).map_err(|err| page_error(err.to_string()))?;
        tracing::debug!(page, url = %url, "fetching search page");

        let html = self.client.get_text(url.as_str()).map_err(|err| page_error(err.to_string()))?;
        let parsed = page::parse_search_page(&html).map_err(|err| page_error(err.to_string()))?;
        if parsed.thumbs.is_empty() {
            return Err(SourceError::EmptyPage(page));
        }

        self.page += 1;

        let candidates = parsed
            .thumbs
            .into_iter()
            .map(|thumb| {
                let client = Arc::clone(&self.client);
                let thumbnail = thumb.thumbnail.clone();
                let info = CandidateRef::new(thumb.thumbnail).with_preview(thumb.preview);
                Candidate::new(info, move || fetch_thumbnail(&client, &thumbnail))
            })
            .collect();

        Ok(Some(Batch::new(candidates).with_meta(parsed.meta)))
    }
}
