//! Remote wallpaper site access.
//!
//! - [`client`]: session-carrying HTTP client
//! - [`page`]: extraction of thumbnails, pagination and the full image URL
//! - [`search`]: search query parameters

pub mod client;
pub mod page;
pub mod search;

pub use client::{ClientError, HttpClient};
pub use page::{PageError, SearchPage, Thumb};
pub use search::SearchQuery;

/// Errors raised while resolving a remote wallpaper.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Page(#[from] PageError),
}

/// Follows a preview page link to the URL of the full-size image.
///
/// # Errors
///
/// Returns an error if the preview page cannot be fetched or has no image.
pub fn resolve_full_image(client: &HttpClient, preview_url: &str) -> Result<String, RemoteError> {
    let html = client.get_text(preview_url)?;
    let src = page::parse_wallpaper_src(&html)?;
    tracing::debug!(preview = preview_url, src = %src, "resolved full image");
    Ok(src)
}
