//! MURAMURA movie provider, a 1pondo-style site.

use super::onepondo::{CoreConfig, OnePondoCore};
use crate::fetch::{FetchError, FetchedPage};
use crate::model::MovieInfo;
use crate::provider::{Fetcher, MovieProvider, Provider, ProviderError, RequestTimeoutSetter};
use crate::registry::{ProviderRegistry, RegistryError};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

pub const NAME: &str = "MURAMURA";
pub const PRIORITY: i64 = 1000 - 1;

const BASE_URL: &str = "https://www.muramura.tv/";
const SAMPLE_VIDEO_URL: &str = "https://fms.muramura.tv/sample/{id}/mb.m3u8";
const DEFAULT_MAKER: &str = "ムラムラってくる素人";

static ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{6}_\d{3}$").unwrap());

fn normalize_id(id: &str) -> Option<String> {
    ID_RE.is_match(id).then(|| id.to_string())
}

/// Provider for muramura.tv.
pub struct MuraMura {
    core: OnePondoCore,
}

impl MuraMura {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ProviderError> {
        let core = OnePondoCore::init(CoreConfig {
            name: NAME,
            priority: PRIORITY,
            base_url: base_url.to_string(),
            sample_video_url: Some(SAMPLE_VIDEO_URL),
            default_maker: DEFAULT_MAKER,
            normalize_id,
        })?;
        Ok(Self { core })
    }
}

impl Provider for MuraMura {
    fn name(&self) -> &str {
        self.core.scraper().name()
    }

    fn priority(&self) -> i64 {
        self.core.scraper().priority()
    }

    fn base_url(&self) -> &Url {
        self.core.scraper().base_url()
    }

    fn as_fetcher(&self) -> Option<&dyn Fetcher> {
        Some(self)
    }

    fn as_timeout_setter(&mut self) -> Option<&mut dyn RequestTimeoutSetter> {
        Some(self)
    }
}

impl Fetcher for MuraMura {
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.core.fetch(url)
    }
}

impl RequestTimeoutSetter for MuraMura {
    fn set_request_timeout(&mut self, timeout: Duration) {
        self.core.set_timeout(timeout);
    }
}

impl MovieProvider for MuraMura {
    fn normalize_movie_id(&self, id: &str) -> Option<String> {
        self.core.normalize_id(id)
    }

    fn parse_movie_id_from_url(&self, url: &str) -> Result<String, ProviderError> {
        self.core.parse_id_from_url(url)
    }

    fn get_movie_info_by_id(&self, id: &str) -> Result<MovieInfo, ProviderError> {
        self.core.movie_info_by_id(id)
    }

    fn get_movie_info_by_url(&self, url: &str) -> Result<MovieInfo, ProviderError> {
        self.core.movie_info_by_url(url)
    }
}

/// Registers the MURAMURA factory.
pub fn register(registry: &mut ProviderRegistry) -> Result<(), RegistryError> {
    registry.register_movie_factory(NAME, || -> Result<Box<dyn MovieProvider>, ProviderError> {
        Ok(Box::new(MuraMura::new()?))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;

    #[test]
    fn test_normalize_movie_id() {
        let muramura = MuraMura::new().unwrap();

        assert_eq!(muramura.normalize_movie_id("123456_001"), Some("123456_001".to_string()));
        assert_eq!(muramura.normalize_movie_id(" 123456_001 "), Some("123456_001".to_string()));
        assert_eq!(muramura.normalize_movie_id("12345_001"), None);
        assert_eq!(muramura.normalize_movie_id("abc"), None);

        let once = muramura.normalize_movie_id("010203_004").unwrap();
        assert_eq!(muramura.normalize_movie_id(&once), Some(once.clone()));
    }

    #[test]
    fn test_id_from_detail_page_url() {
        let muramura = MuraMura::new().unwrap();
        let base = muramura.base_url().clone();

        let id = muramura
            .parse_movie_id_from_url(base.join("movies/123456_001/").unwrap().as_str())
            .unwrap();
        assert_eq!(muramura.normalize_movie_id(&id), Some("123456_001".to_string()));

        let id = muramura
            .parse_movie_id_from_url(&format!("{base}movies/BAD ID/"))
            .unwrap();
        assert_eq!(muramura.normalize_movie_id(&id), None);
    }

    #[test]
    fn test_unrecognized_id_fails_before_any_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.path_contains("/");
            then.status(200);
        });

        let muramura = MuraMura::with_base_url(&server.base_url()).unwrap();
        let err = muramura.get_movie_info_by_id("abc").unwrap_err();

        assert!(matches!(err, ProviderError::UnrecognizedId { .. }));
        mock.assert_hits(0);
    }

    #[test]
    fn test_lookup_sets_site_defaults() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/dyn/phpauto/movie_details/movie_id/123456_001.json");
            then.status(200)
                .json_body(serde_json::json!({ "Title": "Title", "Duration": 1800 }));
        });

        let muramura = MuraMura::with_base_url(&server.base_url()).unwrap();
        let info = muramura.get_movie_info_by_id("123456_001").unwrap();

        assert_eq!(info.provider, NAME);
        assert_eq!(info.number, "123456_001");
        assert_eq!(info.maker, DEFAULT_MAKER);
        assert_eq!(info.runtime, Some(30));
        assert_eq!(
            info.preview_video_url.as_deref(),
            Some("https://fms.muramura.tv/sample/123456_001/mb.m3u8")
        );
    }

    #[test]
    fn test_exposes_fetch_capability() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.path("/moviepages/123456_001/images/l_1.jpg")
                .header_exists("referer");
            then.status(200).body("jpeg");
        });

        let muramura = MuraMura::with_base_url(&server.base_url()).unwrap();
        let fetcher = muramura.as_fetcher().unwrap();
        let page = fetcher
            .fetch(&server.url("/moviepages/123456_001/images/l_1.jpg"))
            .unwrap();

        mock.assert();
        assert_eq!(page.body(), b"jpeg");
    }
}
