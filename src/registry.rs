//! Registry of provider constructors.
//!
//! The registry keeps two independent namespaces, one for movie providers
//! and one for actor providers. Names are compared case-insensitively; the
//! same name may be used once per namespace.

use crate::provider::{ActorProvider, MovieProvider, ProviderError};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Constructor for a movie provider instance.
pub type MovieFactory =
    Arc<dyn Fn() -> Result<Box<dyn MovieProvider>, ProviderError> + Send + Sync>;

/// Constructor for an actor provider instance.
pub type ActorFactory =
    Arc<dyn Fn() -> Result<Box<dyn ActorProvider>, ProviderError> + Send + Sync>;

/// The two provider namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Movie,
    Actor,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Movie => f.write_str("movie"),
            ProviderKind::Actor => f.write_str("actor"),
        }
    }
}

/// Errors that can occur while registering providers.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A provider with the same name already exists in the namespace
    #[error("Duplicate {kind} provider name: {name}")]
    DuplicateName { kind: ProviderKind, name: String },
}

/// Registration-ordered table of named factories.
struct FactoryTable<F> {
    kind: ProviderKind,
    entries: Vec<(String, F)>,
}

impl<F: Clone> FactoryTable<F> {
    fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    fn register(&mut self, name: &str, factory: F) -> Result<(), RegistryError> {
        if self.contains(name) {
            return Err(RegistryError::DuplicateName {
                kind: self.kind,
                name: name.to_string(),
            });
        }

        debug!(kind = %self.kind, name, "registered provider factory");
        self.entries.push((name.to_string(), factory));
        Ok(())
    }

    fn contains(&self, name: &str) -> bool {
        let key = normalize_name(name);
        self.entries
            .iter()
            .any(|(existing, _)| normalize_name(existing) == key)
    }

    fn iter(&self) -> impl Iterator<Item = (&str, F)> + '_ {
        self.entries
            .iter()
            .map(|(name, factory)| (name.as_str(), factory.clone()))
    }
}

/// Registry of provider constructors.
///
/// Populated by an explicit initialization step, usually
/// [`ProviderRegistry::builtin`], and consumed once when an
/// [`Engine`](crate::engine::Engine) is constructed.
///
/// # Examples
///
/// ```
/// use metascrape::registry::ProviderRegistry;
///
/// let registry = ProviderRegistry::builtin().unwrap();
/// assert!(registry.contains_movie_provider("gcolle"));
/// ```
pub struct ProviderRegistry {
    movies: FactoryTable<MovieFactory>,
    actors: FactoryTable<ActorFactory>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            movies: FactoryTable::new(ProviderKind::Movie),
            actors: FactoryTable::new(ProviderKind::Actor),
        }
    }

    /// Creates a registry holding every provider shipped with this crate.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        crate::providers::register_all(&mut registry)?;
        Ok(registry)
    }

    /// Registers a movie provider constructor under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if any casing of `name` is
    /// already registered as a movie provider.
    pub fn register_movie_factory<F>(&mut self, name: &str, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Result<Box<dyn MovieProvider>, ProviderError> + Send + Sync + 'static,
    {
        self.movies.register(name, Arc::new(factory))
    }

    /// Registers an actor provider constructor under `name`.
    pub fn register_actor_factory<F>(&mut self, name: &str, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Result<Box<dyn ActorProvider>, ProviderError> + Send + Sync + 'static,
    {
        self.actors.register(name, Arc::new(factory))
    }

    pub fn contains_movie_provider(&self, name: &str) -> bool {
        self.movies.contains(name)
    }

    pub fn contains_actor_provider(&self, name: &str) -> bool {
        self.actors.contains(name)
    }

    /// Iterates movie factories in registration order.
    pub fn movie_factories(&self) -> impl Iterator<Item = (&str, MovieFactory)> + '_ {
        self.movies.iter()
    }

    /// Iterates actor factories in registration order.
    pub fn actor_factories(&self) -> impl Iterator<Item = (&str, ActorFactory)> + '_ {
        self.actors.iter()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical form of a provider name used for lookups.
pub fn normalize_name(name: &str) -> String {
    name.to_uppercase()
}
