//! Timeout-bounded HTTP fetching.
//!
//! [`FetchClient`] is the transport every provider builds on. It is cheap to
//! clone (clones share one connection pool) and applies its timeout to
//! every request it issues.

pub mod charset;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Timeout applied when no other value has been configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// User agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Errors that can occur while fetching a URL.
///
/// Every variant carries the URL that was being fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be parsed
    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    /// The request did not complete within the configured timeout
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// The request could not be sent or the connection failed
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read
    #[error("Failed to read response body from {url}: {source}")]
    Body {
        url: String,
        source: reqwest::Error,
    },
}

impl FetchError {
    /// The URL the failed request was made for.
    pub fn url(&self) -> &str {
        match self {
            FetchError::InvalidUrl { url, .. }
            | FetchError::Timeout { url }
            | FetchError::Request { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Body { url, .. } => url,
        }
    }

    /// Returns true when the failure was caused by the timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    url: Url,
    status: StatusCode,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl FetchedPage {
    /// The final URL of the response, after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The raw `Content-Type` header value.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body as UTF-8 text, detecting the source charset.
    pub fn text(&self) -> String {
        self.text_with(true)
    }

    /// Returns the body as UTF-8 text.
    ///
    /// With `detect` disabled only a byte order mark and the header charset
    /// are honored.
    pub fn text_with(&self, detect: bool) -> String {
        charset::decode(&self.body, self.content_type(), detect).text
    }
}

/// Blocking HTTP client with a per-request timeout.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl FetchClient {
    /// Creates a client using [`DEFAULT_TIMEOUT`].
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with the given timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Changes the timeout for all subsequent requests made through this
    /// client. Existing clones keep their own value.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Fetches `url` and reads the full response body.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] for unparseable URLs, transport failures,
    /// timeouts and non-2xx responses.
    pub fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.fetch_with_headers(url, HeaderMap::new())
    }

    /// Fetches `url` sending additional request headers.
    pub fn fetch_with_headers(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            source: e,
        })?;

        debug!(url = %parsed, timeout_ms = self.timeout.as_millis() as u64, "fetching");

        let response = self
            .client
            .get(parsed.clone())
            .timeout(self.timeout)
            .header(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT))
            .headers(headers)
            .send()
            .map_err(|e| classify(url, e, |url, source| FetchError::Request { url, source }))?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %parsed, status = status.as_u16(), "non-success response");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .map_err(|e| classify(url, e, |url, source| FetchError::Body { url, source }))?;

        Ok(FetchedPage {
            url: final_url,
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a reqwest error, singling out timeouts.
fn classify(
    url: &str,
    error: reqwest::Error,
    otherwise: impl FnOnce(String, reqwest::Error) -> FetchError,
) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        otherwise(url.to_string(), error)
    }
}
