//! Blocking HTTP client shared by every request of a remote run.
//!
//! Carries the session across requests: cookies are kept in the client's
//! store, and the last search URL is sent as the referer of later requests.

use std::fmt;
use std::io;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::Url;
use reqwest::blocking::{Client, Response};
use reqwest::header::REFERER;

/// Path of search result pages.
const SEARCH_PATH: &str = "/search";

/// Timeout applied to every request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while talking to the remote site.
#[derive(Debug)]
pub enum ClientError {
    /// The URL could not be parsed.
    InvalidUrl(String),
    /// The request could not be built or sent, or the body could not be read.
    Request(reqwest::Error),
    /// The server answered with a non-success status.
    Status { url: String, status: u16, reason: String },
    /// Copying the response body failed.
    Io(io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl(url) => write!(f, "Invalid URL: {url}"),
            Self::Request(err) => write!(f, "Request failed: {err}"),
            Self::Status { url, status, reason } => {
                write!(f, "Status code error: {status} {reason} ({url})")
            }
            Self::Io(err) => write!(f, "Failed to read response: {err}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::InvalidUrl(_) | Self::Status { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self { Self::Request(err) }
}

impl From<io::Error> for ClientError {
    fn from(err: io::Error) -> Self { Self::Io(err) }
}

/// HTTP client with a user agent, cookie store and referer carry-over.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    referer: Mutex<Option<String>>,
}

impl HttpClient {
    /// Creates a client sending `user_agent` with every request.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(user_agent: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, referer: Mutex::new(None) })
    }

    /// Issues a GET request and checks the status.
    ///
    /// Search requests are marked as XHR and become the referer of every
    /// following request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not a success.
    pub fn get(&self, url: &str) -> Result<Response, ClientError> {
        let parsed = Url::parse(url).map_err(|_| ClientError::InvalidUrl(url.to_string()))?;
        let is_search = parsed.path() == SEARCH_PATH;

        let mut request = self.client.get(parsed);
        if let Some(referer) = self.referer.lock().clone() {
            request = request.header(REFERER, referer);
        }
        if is_search {
            request = request.header("x-requested-with", "XMLHttpRequest");
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        if is_search {
            *self.referer.lock() = Some(url.to_string());
        }

        Ok(response)
    }

    /// Fetches a page body as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be read.
    pub fn get_text(&self, url: &str) -> Result<String, ClientError> {
        Ok(self.get(url)?.text()?)
    }

    /// Fetches a response body as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be read.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        Ok(self.get(url)?.bytes()?.to_vec())
    }

    /// Streams a response body into `writer`, returning the number of bytes copied.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or writing fails.
    pub fn download_to<W: io::Write>(&self, url: &str, writer: &mut W) -> Result<u64, ClientError> {
        let mut response = self.get(url)?;
        Ok(response.copy_to(writer)?)
    }

    /// Returns the referer that will be sent with the next request.
    #[must_use]
    pub fn referer(&self) -> Option<String> { self.referer.lock().clone() }
}
