//! Per-provider scraping context.
//!
//! A [`Scraper`] is built once per provider from a [`ScraperConfig`] and
//! holds everything a lookup needs: the base URL, detail page templates,
//! the HTTP client with its timeout and the charset policy. Each lookup
//! asks it for a fresh [`Collector`] via [`Scraper::cloned_collector`].

mod collector;

pub use collector::{Collector, HtmlElement, MAX_INTERSTITIAL_HOPS, Page};

use crate::fetch::{FetchClient, FetchError, FetchedPage};
use crate::provider::{ProviderError, RequestTimeoutSetter};
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Placeholder replaced by the identifier in URL templates.
const ID_PLACEHOLDER: &str = "{id}";

/// Construction options for a [`Scraper`].
///
/// URL templates contain an `{id}` placeholder and may be relative to the
/// base URL.
///
/// # Examples
///
/// ```
/// use metascrape::scraping::{Scraper, ScraperConfig};
///
/// let scraper = Scraper::init(
///     ScraperConfig::new("Example", "https://example.com/")
///         .with_movie_url("movies/{id}/")
///         .with_priority(1000),
/// )
/// .unwrap();
///
/// assert_eq!(
///     scraper.movie_url("123").unwrap().as_str(),
///     "https://example.com/movies/123/"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub name: String,
    pub base_url: String,
    pub movie_url: Option<String>,
    pub actor_url: Option<String>,
    pub priority: i64,
    /// Sniff the page encoding when the response header does not declare one
    pub detect_charset: bool,
    /// Fixed maker value for sources that only publish their own titles
    pub default_maker: Option<String>,
    /// Hosts besides the base URL's host that sessions may visit
    pub allowed_hosts: Vec<String>,
}

impl ScraperConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            movie_url: None,
            actor_url: None,
            priority: 0,
            detect_charset: false,
            default_maker: None,
            allowed_hosts: Vec::new(),
        }
    }

    pub fn with_movie_url(mut self, template: impl Into<String>) -> Self {
        self.movie_url = Some(template.into());
        self
    }

    pub fn with_actor_url(mut self, template: impl Into<String>) -> Self {
        self.actor_url = Some(template.into());
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_detect_charset(mut self) -> Self {
        self.detect_charset = true;
        self
    }

    pub fn with_default_maker(mut self, maker: impl Into<String>) -> Self {
        self.default_maker = Some(maker.into());
        self
    }

    pub fn with_allowed_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.push(host.into());
        self
    }
}

/// Reusable scraping context of one provider.
#[derive(Debug, Clone)]
pub struct Scraper {
    name: String,
    base_url: Url,
    movie_url: Option<String>,
    actor_url: Option<String>,
    priority: i64,
    detect_charset: bool,
    default_maker: Option<String>,
    allowed_hosts: Vec<String>,
    client: FetchClient,
}

impl Scraper {
    /// Builds the context from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MalformedUrl`] if the base URL does not parse.
    pub fn init(config: ScraperConfig) -> Result<Self, ProviderError> {
        let mut base_url =
            Url::parse(&config.base_url).map_err(|e| ProviderError::MalformedUrl {
                url: config.base_url.clone(),
                source: e,
            })?;

        // Relative templates resolve below the base path only with a trailing slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut allowed_hosts = config.allowed_hosts;
        if let Some(host) = base_url.host_str() {
            allowed_hosts.insert(0, host.to_string());
        }

        Ok(Self {
            name: config.name,
            base_url,
            movie_url: config.movie_url,
            actor_url: config.actor_url,
            priority: config.priority,
            detect_charset: config.detect_charset,
            default_maker: config.default_maker,
            allowed_hosts,
            client: FetchClient::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn default_maker(&self) -> Option<&str> {
        self.default_maker.as_deref()
    }

    pub fn detect_charset(&self) -> bool {
        self.detect_charset
    }

    pub fn client(&self) -> &FetchClient {
        &self.client
    }

    /// Returns a new, independent scraping session.
    ///
    /// The session shares the allowed hosts, charset policy, timeout and
    /// connection pool of this scraper, but starts without callbacks.
    pub fn cloned_collector<'c, T>(&self) -> Collector<'c, T> {
        Collector::new(
            self.name.clone(),
            self.client.clone(),
            self.allowed_hosts.clone(),
            self.detect_charset,
        )
    }

    /// Renders the movie detail URL for `id`.
    pub fn movie_url(&self, id: &str) -> Result<Url, ProviderError> {
        self.render(self.movie_url.as_deref(), "movie", id)
    }

    /// Renders the actor detail URL for `id`.
    pub fn actor_url(&self, id: &str) -> Result<Url, ProviderError> {
        self.render(self.actor_url.as_deref(), "actor", id)
    }

    fn render(
        &self,
        template: Option<&str>,
        kind: &'static str,
        id: &str,
    ) -> Result<Url, ProviderError> {
        let template = template.ok_or_else(|| ProviderError::MissingTemplate {
            provider: self.name.clone(),
            kind,
        })?;

        let rendered = template.replace(ID_PLACEHOLDER, id);
        self.base_url
            .join(&rendered)
            .map_err(|e| ProviderError::MalformedUrl {
                url: rendered,
                source: e,
            })
    }

    /// Extracts the last non-empty path segment of `raw`.
    ///
    /// Query string and fragment are ignored. If the URL has no path
    /// segments the result is an empty string rather than an error.
    pub fn parse_id_from_url(&self, raw: &str) -> Result<String, ProviderError> {
        let url = Url::parse(raw).map_err(|e| ProviderError::MalformedUrl {
            url: raw.to_string(),
            source: e,
        })?;

        Ok(url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .unwrap_or_default()
            .to_string())
    }

    /// Fetches `url` with this scraper's client, sending the base URL as
    /// referer. Some sources refuse to serve assets without it.
    pub fn fetch_with_referer(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let mut headers = HeaderMap::new();
        if let Ok(referer) = HeaderValue::from_str(self.base_url.as_str()) {
            headers.insert(REFERER, referer);
        }
        self.client.fetch_with_headers(url, headers)
    }
}

impl RequestTimeoutSetter for Scraper {
    fn set_request_timeout(&mut self, timeout: Duration) {
        debug!(provider = %self.name, timeout_ms = timeout.as_millis() as u64, "setting request timeout");
        self.client.set_timeout(timeout);
    }
}
