//! The engine façade.
//!
//! An [`Engine`] instantiates every registered provider once, applies the
//! configured request timeout and owns the record store. Provider lookups
//! are case-insensitive and return shared instances.

use crate::fetch::{DEFAULT_TIMEOUT, FetchClient, FetchError, FetchedPage};
use crate::model::{ActorInfo, MovieInfo};
use crate::provider::{ActorProvider, MovieProvider, Provider, ProviderError, RequestTimeoutSetter};
use crate::registry::{ProviderRegistry, RegistryError, normalize_name};
use crate::store::{DataSource, Storage, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while constructing or using an [`Engine`]
#[derive(Debug, Error)]
pub enum EngineError {
    /// No movie provider is registered under the name
    #[error("Movie provider not found: {0}")]
    MovieProviderNotFound(String),

    /// No actor provider is registered under the name
    #[error("Actor provider not found: {0}")]
    ActorProviderNotFound(String),

    /// A provider factory failed
    #[error("Failed to initialize provider {name}: {source}")]
    ProviderInit {
        name: String,
        source: ProviderError,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Construction options for an [`Engine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Where looked-up records are stored
    pub data_source: DataSource,
    /// Skip the background store connectivity check
    pub disable_automatic_ping: bool,
    /// Request timeout applied to every provider that supports one
    pub timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            data_source: DataSource::default(),
            disable_automatic_ping: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Owns provider instances and the record store.
///
/// # Examples
///
/// ```
/// use metascrape::engine::{Engine, EngineOptions};
///
/// let engine = Engine::new(EngineOptions {
///     disable_automatic_ping: true,
///     ..EngineOptions::default()
/// })
/// .unwrap();
///
/// assert!(engine.is_movie_provider("gcolle"));
/// assert!(!engine.is_movie_provider("unknown"));
/// ```
pub struct Engine {
    storage: Arc<Storage>,
    client: FetchClient,
    movie_providers: HashMap<String, Arc<dyn MovieProvider>>,
    actor_providers: HashMap<String, Arc<dyn ActorProvider>>,
}

impl Engine {
    /// Creates an engine with every builtin provider.
    pub fn new(options: EngineOptions) -> Result<Self, EngineError> {
        Self::with_registry(ProviderRegistry::builtin()?, options)
    }

    /// Creates an engine with the providers in `registry`.
    ///
    /// Each factory is called exactly once. Providers that accept a
    /// request timeout get `options.timeout`; the others keep their own.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ProviderInit`] if a factory fails and
    /// [`EngineError::Store`] if the data source cannot be opened.
    pub fn with_registry(
        registry: ProviderRegistry,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        let storage = Arc::new(Storage::open(&options.data_source)?);

        let mut movie_providers: HashMap<String, Arc<dyn MovieProvider>> = HashMap::new();
        for (name, factory) in registry.movie_factories() {
            let mut provider = factory().map_err(|e| EngineError::ProviderInit {
                name: name.to_string(),
                source: e,
            })?;
            apply_timeout(name, provider.as_timeout_setter(), options.timeout);
            movie_providers.insert(normalize_name(name), Arc::from(provider));
        }

        let mut actor_providers: HashMap<String, Arc<dyn ActorProvider>> = HashMap::new();
        for (name, factory) in registry.actor_factories() {
            let mut provider = factory().map_err(|e| EngineError::ProviderInit {
                name: name.to_string(),
                source: e,
            })?;
            apply_timeout(name, provider.as_timeout_setter(), options.timeout);
            actor_providers.insert(normalize_name(name), Arc::from(provider));
        }

        info!(
            movie_providers = movie_providers.len(),
            actor_providers = actor_providers.len(),
            "engine initialized"
        );

        if !options.disable_automatic_ping {
            let storage = Arc::clone(&storage);
            std::thread::spawn(move || match storage.ping() {
                Ok(()) => debug!("record store is reachable"),
                Err(e) => warn!(error = %e, "record store ping failed"),
            });
        }

        Ok(Self {
            storage,
            client: FetchClient::with_timeout(options.timeout),
            movie_providers,
            actor_providers,
        })
    }

    /// Creates the store's backing structures when `enabled`.
    pub fn auto_migrate(&self, enabled: bool) -> Result<(), EngineError> {
        if !enabled {
            debug!("automatic migration disabled");
            return Ok(());
        }
        self.storage.migrate()?;
        debug!("record store migrated");
        Ok(())
    }

    pub fn is_movie_provider(&self, name: &str) -> bool {
        self.movie_providers.contains_key(&normalize_name(name))
    }

    pub fn is_actor_provider(&self, name: &str) -> bool {
        self.actor_providers.contains_key(&normalize_name(name))
    }

    /// Returns the movie provider registered under any casing of `name`.
    pub fn get_movie_provider(&self, name: &str) -> Result<Arc<dyn MovieProvider>, EngineError> {
        self.movie_providers
            .get(&normalize_name(name))
            .cloned()
            .ok_or_else(|| EngineError::MovieProviderNotFound(name.to_string()))
    }

    /// Returns the actor provider registered under any casing of `name`.
    pub fn get_actor_provider(&self, name: &str) -> Result<Arc<dyn ActorProvider>, EngineError> {
        self.actor_providers
            .get(&normalize_name(name))
            .cloned()
            .ok_or_else(|| EngineError::ActorProviderNotFound(name.to_string()))
    }

    /// Like [`Engine::get_movie_provider`], for names known to be registered.
    ///
    /// # Panics
    ///
    /// Panics if no movie provider is registered under `name`.
    pub fn must_get_movie_provider(&self, name: &str) -> Arc<dyn MovieProvider> {
        match self.get_movie_provider(name) {
            Ok(provider) => provider,
            Err(e) => panic!("{e}"),
        }
    }

    /// Like [`Engine::get_actor_provider`], for names known to be registered.
    ///
    /// # Panics
    ///
    /// Panics if no actor provider is registered under `name`.
    pub fn must_get_actor_provider(&self, name: &str) -> Arc<dyn ActorProvider> {
        match self.get_actor_provider(name) {
            Ok(provider) => provider,
            Err(e) => panic!("{e}"),
        }
    }

    /// Movie providers ordered by descending priority, then name.
    pub fn movie_providers(&self) -> Vec<Arc<dyn MovieProvider>> {
        let mut providers: Vec<_> = self.movie_providers.values().cloned().collect();
        providers.sort_by(|a, b| by_priority(&**a, &**b));
        providers
    }

    /// Actor providers ordered by descending priority, then name.
    pub fn actor_providers(&self) -> Vec<Arc<dyn ActorProvider>> {
        let mut providers: Vec<_> = self.actor_providers.values().cloned().collect();
        providers.sort_by(|a, b| by_priority(&**a, &**b));
        providers
    }

    /// Fetches `url` on behalf of `provider`.
    ///
    /// Providers with their own transport handle the request themselves;
    /// everything else goes through the engine's client.
    pub fn fetch<P>(&self, url: &str, provider: &P) -> Result<FetchedPage, FetchError>
    where
        P: Provider + ?Sized,
    {
        match provider.as_fetcher() {
            Some(fetcher) => fetcher.fetch(url),
            None => self.client.fetch(url),
        }
    }

    /// Looks up a movie record by identifier.
    ///
    /// With `lazy` set, a previously stored record is returned without
    /// contacting the provider. Fresh records are written to the store;
    /// failing to store them is logged and otherwise ignored.
    pub fn get_movie_info_by_id(
        &self,
        name: &str,
        id: &str,
        lazy: bool,
    ) -> Result<MovieInfo, EngineError> {
        let provider = self.get_movie_provider(name)?;
        let normalized = provider.normalize_movie_id(id).ok_or_else(|| {
            ProviderError::UnrecognizedId {
                provider: provider.name().to_string(),
                id: id.to_string(),
            }
        })?;

        if lazy {
            if let Some(info) = self.stored_movie_info(provider.name(), &normalized) {
                return Ok(info);
            }
        }

        let info = provider.get_movie_info_by_id(&normalized)?;
        self.save_movie_info(&info);
        Ok(info)
    }

    /// Looks up a movie record from its detail page URL.
    pub fn get_movie_info_by_url(
        &self,
        name: &str,
        url: &str,
        lazy: bool,
    ) -> Result<MovieInfo, EngineError> {
        let provider = self.get_movie_provider(name)?;

        if lazy {
            let id = provider.parse_movie_id_from_url(url)?;
            if let Some(info) = provider
                .normalize_movie_id(&id)
                .and_then(|id| self.stored_movie_info(provider.name(), &id))
            {
                return Ok(info);
            }
        }

        let info = provider.get_movie_info_by_url(url)?;
        self.save_movie_info(&info);
        Ok(info)
    }

    /// Looks up an actor record by identifier. See
    /// [`Engine::get_movie_info_by_id`].
    pub fn get_actor_info_by_id(
        &self,
        name: &str,
        id: &str,
        lazy: bool,
    ) -> Result<ActorInfo, EngineError> {
        let provider = self.get_actor_provider(name)?;
        let normalized = provider.normalize_actor_id(id).ok_or_else(|| {
            ProviderError::UnrecognizedId {
                provider: provider.name().to_string(),
                id: id.to_string(),
            }
        })?;

        if lazy {
            if let Some(info) = self.stored_actor_info(provider.name(), &normalized) {
                return Ok(info);
            }
        }

        let info = provider.get_actor_info_by_id(&normalized)?;
        self.save_actor_info(&info);
        Ok(info)
    }

    /// Looks up an actor record from its profile page URL.
    pub fn get_actor_info_by_url(
        &self,
        name: &str,
        url: &str,
        lazy: bool,
    ) -> Result<ActorInfo, EngineError> {
        let provider = self.get_actor_provider(name)?;

        if lazy {
            let id = provider.parse_actor_id_from_url(url)?;
            if let Some(info) = provider
                .normalize_actor_id(&id)
                .and_then(|id| self.stored_actor_info(provider.name(), &id))
            {
                return Ok(info);
            }
        }

        let info = provider.get_actor_info_by_url(url)?;
        self.save_actor_info(&info);
        Ok(info)
    }

    fn stored_movie_info(&self, provider: &str, id: &str) -> Option<MovieInfo> {
        match self.storage.load_movie_info(provider, id) {
            Ok(Some(info)) if info.is_valid() && info.id == id => {
                debug!(provider, id, "using stored movie info");
                Some(info)
            }
            Ok(Some(info)) if info.id != id => {
                warn!(provider, id, stored = %info.id, "stored movie info belongs to another id");
                None
            }
            Ok(_) => None,
            Err(e) => {
                warn!(provider, id, error = %e, "failed to load stored movie info");
                None
            }
        }
    }

    fn stored_actor_info(&self, provider: &str, id: &str) -> Option<ActorInfo> {
        match self.storage.load_actor_info(provider, id) {
            Ok(Some(info)) if info.is_valid() && info.id == id => {
                debug!(provider, id, "using stored actor info");
                Some(info)
            }
            Ok(Some(info)) if info.id != id => {
                warn!(provider, id, stored = %info.id, "stored actor info belongs to another id");
                None
            }
            Ok(_) => None,
            Err(e) => {
                warn!(provider, id, error = %e, "failed to load stored actor info");
                None
            }
        }
    }

    fn save_movie_info(&self, info: &MovieInfo) {
        if let Err(e) = self.storage.save_movie_info(info) {
            warn!(provider = %info.provider, id = %info.id, error = %e, "failed to store movie info");
        }
    }

    fn save_actor_info(&self, info: &ActorInfo) {
        if let Err(e) = self.storage.save_actor_info(info) {
            warn!(provider = %info.provider, id = %info.id, error = %e, "failed to store actor info");
        }
    }
}

fn apply_timeout(name: &str, setter: Option<&mut dyn RequestTimeoutSetter>, timeout: Duration) {
    match setter {
        Some(setter) => setter.set_request_timeout(timeout),
        None => debug!(provider = name, "provider does not accept a request timeout"),
    }
}

fn by_priority<P: Provider + ?Sized>(a: &P, b: &P) -> std::cmp::Ordering {
    b.priority()
        .cmp(&a.priority())
        .then_with(|| a.name().cmp(b.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Fetcher;
    use httpmock::MockServer;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    /// Network-free movie provider that records what the engine does to it.
    struct FakeMovies {
        name: &'static str,
        priority: i64,
        base_url: Url,
        timeout: Arc<Mutex<Option<Duration>>>,
        lookups: Arc<AtomicUsize>,
        with_fetcher: bool,
        client: FetchClient,
    }

    impl Provider for FakeMovies {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> i64 {
            self.priority
        }

        fn base_url(&self) -> &Url {
            &self.base_url
        }

        fn as_fetcher(&self) -> Option<&dyn Fetcher> {
            if self.with_fetcher { Some(self) } else { None }
        }

        fn as_timeout_setter(&mut self) -> Option<&mut dyn RequestTimeoutSetter> {
            Some(self)
        }
    }

    impl Fetcher for FakeMovies {
        fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-fetched-by", reqwest::header::HeaderValue::from_static("fake"));
            self.client.fetch_with_headers(url, headers)
        }
    }

    impl RequestTimeoutSetter for FakeMovies {
        fn set_request_timeout(&mut self, timeout: Duration) {
            *self.timeout.lock() = Some(timeout);
        }
    }

    impl MovieProvider for FakeMovies {
        fn normalize_movie_id(&self, id: &str) -> Option<String> {
            let id = id.trim();
            (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then(|| id.to_string())
        }

        fn parse_movie_id_from_url(&self, url: &str) -> Result<String, ProviderError> {
            let url = Url::parse(url).map_err(|e| ProviderError::MalformedUrl {
                url: url.to_string(),
                source: e,
            })?;
            Ok(url
                .path_segments()
                .and_then(|s| s.filter(|s| !s.is_empty()).last())
                .unwrap_or_default()
                .to_string())
        }

        fn get_movie_info_by_id(&self, id: &str) -> Result<MovieInfo, ProviderError> {
            let url = self.base_url.join(id).map_err(|e| ProviderError::MalformedUrl {
                url: id.to_string(),
                source: e,
            })?;
            self.get_movie_info_by_url(url.as_str())
        }

        fn get_movie_info_by_url(&self, url: &str) -> Result<MovieInfo, ProviderError> {
            let n = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
            let id = self.parse_movie_id_from_url(url)?;
            let mut info = MovieInfo::new(&id, format!("FAKE-{id}"), self.name, url);
            info.title = format!("lookup {n}");
            Ok(info)
        }
    }

    /// Movie provider without any optional capability.
    struct Plain {
        base_url: Url,
    }

    impl Provider for Plain {
        fn name(&self) -> &str {
            "Plain"
        }

        fn priority(&self) -> i64 {
            5
        }

        fn base_url(&self) -> &Url {
            &self.base_url
        }
    }

    impl MovieProvider for Plain {
        fn normalize_movie_id(&self, id: &str) -> Option<String> {
            Some(id.to_string())
        }

        fn parse_movie_id_from_url(&self, _url: &str) -> Result<String, ProviderError> {
            Ok(String::new())
        }

        fn get_movie_info_by_id(&self, id: &str) -> Result<MovieInfo, ProviderError> {
            Ok(MovieInfo::new(id, id, "Plain", self.base_url.as_str()))
        }

        fn get_movie_info_by_url(&self, url: &str) -> Result<MovieInfo, ProviderError> {
            Ok(MovieInfo::new("x", "x", "Plain", url))
        }
    }

    struct Counters {
        timeout: Arc<Mutex<Option<Duration>>>,
        lookups: Arc<AtomicUsize>,
    }

    fn registry(with_fetcher: bool) -> (ProviderRegistry, Counters) {
        let counters = Counters {
            timeout: Arc::new(Mutex::new(None)),
            lookups: Arc::new(AtomicUsize::new(0)),
        };

        let timeout = Arc::clone(&counters.timeout);
        let lookups = Arc::clone(&counters.lookups);
        let mut registry = ProviderRegistry::new();
        registry
            .register_movie_factory("Fake", move || -> Result<Box<dyn MovieProvider>, ProviderError> {
                Ok(Box::new(FakeMovies {
                    name: "Fake",
                    priority: 10,
                    base_url: Url::parse("https://fake.example.com/").unwrap(),
                    timeout: Arc::clone(&timeout),
                    lookups: Arc::clone(&lookups),
                    with_fetcher,
                    client: FetchClient::new(),
                }))
            })
            .unwrap();
        registry
            .register_movie_factory("Plain", || -> Result<Box<dyn MovieProvider>, ProviderError> {
                Ok(Box::new(Plain {
                    base_url: Url::parse("https://plain.example.com/").unwrap(),
                }))
            })
            .unwrap();

        (registry, counters)
    }

    fn options() -> EngineOptions {
        EngineOptions {
            disable_automatic_ping: true,
            ..EngineOptions::default()
        }
    }

    #[test]
    fn test_names_resolve_under_any_casing() {
        let (registry, _) = registry(false);
        let engine = Engine::with_registry(registry, options()).unwrap();

        for name in ["Fake", "FAKE", "fake", "fAkE"] {
            assert!(engine.is_movie_provider(name));
            assert_eq!(engine.get_movie_provider(name).unwrap().name(), "Fake");
        }
        assert!(!engine.is_actor_provider("Fake"));
    }

    #[test]
    fn test_every_casing_returns_the_same_instance() {
        let (registry, _) = registry(false);
        let engine = Engine::with_registry(registry, options()).unwrap();

        let a = engine.get_movie_provider("fake").unwrap();
        let b = engine.get_movie_provider("FAKE").unwrap();
        let c = engine.must_get_movie_provider("Fake");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_unknown_names_are_not_found() {
        let (registry, _) = registry(false);
        let engine = Engine::with_registry(registry, options()).unwrap();

        assert!(matches!(
            engine.get_movie_provider("nope"),
            Err(EngineError::MovieProviderNotFound(name)) if name == "nope"
        ));
        assert!(matches!(
            engine.get_actor_provider("Fake"),
            Err(EngineError::ActorProviderNotFound(_))
        ));
    }

    #[test]
    #[should_panic(expected = "Movie provider not found")]
    fn test_must_get_panics_for_unknown_name() {
        let (registry, _) = registry(false);
        let engine = Engine::with_registry(registry, options()).unwrap();
        engine.must_get_movie_provider("nope");
    }

    #[test]
    fn test_timeout_is_applied_once_per_provider() {
        let (registry, counters) = registry(false);
        let _engine = Engine::with_registry(
            registry,
            EngineOptions {
                timeout: Duration::from_secs(7),
                ..options()
            },
        )
        .unwrap();

        assert_eq!(*counters.timeout.lock(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_provider_without_capabilities_is_accepted() {
        let (registry, _) = registry(false);
        let engine = Engine::with_registry(registry, options()).unwrap();

        let plain = engine.get_movie_provider("plain").unwrap();
        assert!(plain.as_fetcher().is_none());
        assert_eq!(engine.get_movie_info_by_id("plain", "1", false).unwrap().id, "1");
    }

    #[test]
    fn test_failing_factory_aborts_construction() {
        let mut registry = ProviderRegistry::new();
        registry
            .register_movie_factory("Broken", || -> Result<Box<dyn MovieProvider>, ProviderError> {
                Err(ProviderError::MissingTemplate {
                    provider: "Broken".to_string(),
                    kind: "movie",
                })
            })
            .unwrap();

        let err = Engine::with_registry(registry, options()).err().unwrap();
        assert!(matches!(err, EngineError::ProviderInit { ref name, .. } if name == "Broken"));
    }

    #[test]
    fn test_providers_are_listed_by_priority() {
        let (registry, _) = registry(false);
        let engine = Engine::with_registry(registry, options()).unwrap();

        let names: Vec<String> = engine
            .movie_providers()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["Fake", "Plain"]);
        assert!(engine.actor_providers().is_empty());
    }

    #[test]
    fn test_fetch_uses_provider_transport_when_available() {
        let server = MockServer::start();
        let custom = server.mock(|when, then| {
            when.path("/custom").header("x-fetched-by", "fake");
            then.status(200).body("custom");
        });
        let generic = server.mock(|when, then| {
            when.path("/generic");
            then.status(200).body("generic");
        });

        let (registry, _) = registry(true);
        let engine = Engine::with_registry(registry, options()).unwrap();

        let fake = engine.get_movie_provider("fake").unwrap();
        let page = engine.fetch(&server.url("/custom"), &*fake).unwrap();
        assert_eq!(page.body(), b"custom");

        let plain = engine.get_movie_provider("plain").unwrap();
        let page = engine.fetch(&server.url("/generic"), &*plain).unwrap();
        assert_eq!(page.body(), b"generic");

        custom.assert();
        generic.assert();
    }

    #[test]
    fn test_lazy_lookups_are_served_from_the_store() {
        let (registry, counters) = registry(false);
        let engine = Engine::with_registry(registry, options()).unwrap();
        engine.auto_migrate(true).unwrap();

        let first = engine.get_movie_info_by_id("fake", "42", true).unwrap();
        let second = engine.get_movie_info_by_id("FAKE", " 42 ", true).unwrap();
        assert_eq!(first, second);
        assert_eq!(counters.lookups.load(Ordering::SeqCst), 1);

        let fresh = engine.get_movie_info_by_id("fake", "42", false).unwrap();
        assert_eq!(fresh.title, "lookup 2");
        assert_eq!(counters.lookups.load(Ordering::SeqCst), 2);

        let by_url = engine
            .get_movie_info_by_url("fake", "https://fake.example.com/42", true)
            .unwrap();
        assert_eq!(by_url.title, "lookup 2");
        assert_eq!(counters.lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stored_record_for_another_id_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, counters) = registry(false);
        let engine = Engine::with_registry(
            registry,
            EngineOptions {
                data_source: DataSource::Directory(dir.path().to_path_buf()),
                ..options()
            },
        )
        .unwrap();
        engine.auto_migrate(true).unwrap();

        let mut foreign = MovieInfo::new("7", "FAKE-7", "Fake", "https://fake.example.com/7");
        foreign.title = "someone else".to_string();
        std::fs::write(
            dir.path().join("movies/fake_42.json"),
            serde_json::to_string(&foreign).unwrap(),
        )
        .unwrap();

        let info = engine.get_movie_info_by_id("fake", "42", true).unwrap();
        assert_eq!(info.id, "42");
        assert_eq!(info.title, "lookup 1");
        assert_eq!(counters.lookups.load(Ordering::SeqCst), 1);

        let again = engine.get_movie_info_by_id("fake", "42", true).unwrap();
        assert_eq!(again, info);
        assert_eq!(counters.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unrecognized_id_is_rejected_before_lookup() {
        let (registry, counters) = registry(false);
        let engine = Engine::with_registry(registry, options()).unwrap();

        let err = engine.get_movie_info_by_id("fake", "abc", false).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Provider(ProviderError::UnrecognizedId { .. })
        ));
        assert_eq!(counters.lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_store_failures_do_not_fail_lookups() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, counters) = registry(false);
        let engine = Engine::with_registry(
            registry,
            EngineOptions {
                data_source: DataSource::Directory(dir.path().join("never-created")),
                ..options()
            },
        )
        .unwrap();

        // Not migrated, so every write fails
        engine.get_movie_info_by_id("fake", "1", true).unwrap();
        engine.get_movie_info_by_id("fake", "1", true).unwrap();
        assert_eq!(counters.lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_builtin_engine() {
        let engine = Engine::new(options()).unwrap();

        assert!(engine.is_movie_provider("gcolle"));
        assert!(engine.is_movie_provider("MuraMura"));
        assert!(engine.is_actor_provider("XSLIST"));
        assert!(
            engine
                .get_movie_provider("muramura")
                .unwrap()
                .as_fetcher()
                .is_some()
        );
    }
}
