//! Search query parameters and URL construction.

use rand::Rng;
use reqwest::Url;

use super::client::ClientError;

/// Alphabet the random sorting seed is drawn from.
const SEED_SYMBOLS: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 !\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Number of symbols in a sorting seed.
pub const SEED_LENGTH: usize = 16;

/// Draws a random sorting seed.
///
/// The seed stays fixed for a run so that consecutive pages continue the same
/// random ordering.
pub fn random_seed<R: Rng>(rng: &mut R) -> String {
    (0..SEED_LENGTH)
        .map(|_| char::from(SEED_SYMBOLS[rng.random_range(0..SEED_SYMBOLS.len())]))
        .collect()
}

/// Parameters of one remote search, shared by every page of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub base_url: String,
    pub categories: String,
    pub purity: String,
    pub sorting: String,
    pub resolution: String,
    pub seed: String,
}

impl SearchQuery {
    /// Builds the results URL for `page` (1-based).
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not a valid URL.
    pub fn page_url(&self, page: u32) -> Result<Url, ClientError> {
        let endpoint = format!("{}/search", self.base_url.trim_end_matches('/'));
        Url::parse_with_params(&endpoint, [
            ("categories", self.categories.as_str()),
            ("purity", self.purity.as_str()),
            ("resolutions", self.resolution.as_str()),
            ("sorting", self.sorting.as_str()),
            ("seed", self.seed.as_str()),
            ("page", page.to_string().as_str()),
        ])
        .map_err(|_| ClientError::InvalidUrl(endpoint))
    }
}
