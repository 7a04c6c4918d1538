//! metascrape - Look up movie and performer metadata from web sources
//!
//! This library provides a registry of metadata providers, the scraping
//! runtime they are built on and an [`Engine`] that instantiates them and
//! stores the records they produce.
//!
//! # Examples
//!
//! ```no_run
//! use metascrape::{Engine, EngineOptions};
//!
//! let engine = Engine::new(EngineOptions::default())?;
//! let info = engine.get_movie_info_by_id("gcolle", "GCOLLE-123456", false)?;
//! println!("{}: {}", info.number, info.title);
//! # Ok::<(), metascrape::MetascrapeError>(())
//! ```

pub mod config;
pub mod engine;
pub mod fetch;
pub mod model;
pub mod parser;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod scraping;
pub mod store;

pub use config::{Config, ConfigError};
pub use engine::{Engine, EngineError, EngineOptions};
pub use fetch::{FetchClient, FetchError, FetchedPage};
pub use model::{ActorInfo, MovieInfo};
pub use provider::{
    ActorProvider, Fetcher, MovieProvider, Provider, ProviderError, RequestTimeoutSetter,
};
pub use registry::{ProviderRegistry, RegistryError};
pub use store::{DataSource, StoreError};

use thiserror::Error;

/// Top-level error type for metascrape operations
#[derive(Debug, Error)]
pub enum MetascrapeError {
    /// Error while loading configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error raised by the engine
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// Error raised by a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error while fetching a resource
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error while registering providers
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Error from the record store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
