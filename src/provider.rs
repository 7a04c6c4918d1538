//! Provider traits and capabilities.
//!
//! A provider wraps one external source. Every provider implements
//! [`Provider`] plus [`MovieProvider`] or [`ActorProvider`]. Optional
//! behavior is exposed through explicit capability queries
//! ([`Provider::as_fetcher`], [`Provider::as_timeout_setter`]) so that the
//! absence of a capability is an ordinary `None` branch.

use crate::fetch::{FetchError, FetchedPage};
use crate::model::{ActorInfo, MovieInfo};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur while resolving a lookup against a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The input could not be parsed as a URL
    #[error("Malformed URL {url}: {source}")]
    MalformedUrl {
        url: String,
        source: url::ParseError,
    },

    /// The identifier does not match the provider's identifier grammar
    #[error("Identifier {id:?} is not recognized by provider {provider}")]
    UnrecognizedId { provider: String, id: String },

    /// Fetching a page failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The response did not have the structure needed to continue
    #[error("Failed to parse response from {url}: {reason}")]
    Parse { url: String, reason: String },

    /// A CSS selector registered by the provider is invalid
    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The URL points outside the hosts the provider may visit
    #[error("URL {url} is outside the allowed hosts")]
    ForbiddenHost { url: String },

    /// The provider has no URL template for the requested record kind
    #[error("Provider {provider} has no {kind} URL template")]
    MissingTemplate {
        provider: String,
        kind: &'static str,
    },
}

/// Behavior shared by every provider.
pub trait Provider: Send + Sync {
    /// Unique display name, e.g. `"Gcolle"`. Lookups compare it
    /// case-insensitively.
    fn name(&self) -> &str;

    /// Relative weight of this source; higher is preferred.
    fn priority(&self) -> i64;

    /// Root URL of the source.
    fn base_url(&self) -> &Url;

    /// Returns the custom fetch capability, if this provider needs its own
    /// transport (cookies, headers or session state) for its resources.
    fn as_fetcher(&self) -> Option<&dyn Fetcher> {
        None
    }

    /// Returns the configurable timeout capability, if supported.
    fn as_timeout_setter(&mut self) -> Option<&mut dyn RequestTimeoutSetter> {
        None
    }
}

/// Capability: fetch resources belonging to this provider.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Capability: accept a request timeout after construction.
pub trait RequestTimeoutSetter {
    fn set_request_timeout(&mut self, timeout: Duration);
}

/// A provider of media item records.
pub trait MovieProvider: Provider {
    /// Maps a raw, possibly decorated identifier to the bare identifier the
    /// detail page expects.
    ///
    /// Returns `None` when `id` does not match the provider's grammar. This
    /// is a pure function; it never touches the network.
    fn normalize_movie_id(&self, id: &str) -> Option<String>;

    /// Extracts the provider-local identifier from a detail page URL.
    ///
    /// Fails only if `url` is not a URL at all. The result is best-effort
    /// and should be passed through [`Self::normalize_movie_id`] before it
    /// is trusted.
    fn parse_movie_id_from_url(&self, url: &str) -> Result<String, ProviderError>;

    /// Looks up a record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::UnrecognizedId`] without any network
    /// activity when `id` does not normalize.
    fn get_movie_info_by_id(&self, id: &str) -> Result<MovieInfo, ProviderError>;

    /// Looks up a record from its detail page URL.
    ///
    /// A record carrying only its identifying fields is a valid result when
    /// the page lacks the expected sections.
    fn get_movie_info_by_url(&self, url: &str) -> Result<MovieInfo, ProviderError>;
}

/// A provider of performer records.
pub trait ActorProvider: Provider {
    /// See [`MovieProvider::normalize_movie_id`].
    fn normalize_actor_id(&self, id: &str) -> Option<String>;

    /// See [`MovieProvider::parse_movie_id_from_url`].
    fn parse_actor_id_from_url(&self, url: &str) -> Result<String, ProviderError>;

    fn get_actor_info_by_id(&self, id: &str) -> Result<ActorInfo, ProviderError>;

    fn get_actor_info_by_url(&self, url: &str) -> Result<ActorInfo, ProviderError>;
}
