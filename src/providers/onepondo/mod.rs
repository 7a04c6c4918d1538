//! Shared core of the 1pondo family of sites.
//!
//! These sites publish every movie as a JSON document below
//! `dyn/phpauto/movie_details/movie_id/<id>.json` and serve human-readable
//! detail pages at `movies/<id>/`. Site providers wrap an
//! [`OnePondoCore`] configured with their own name, host and identifier
//! grammar.

mod types;

use crate::fetch::{FetchError, FetchedPage};
use crate::model::MovieInfo;
use crate::parser::parse_date;
use crate::provider::{ProviderError, RequestTimeoutSetter};
use crate::scraping::{Scraper, ScraperConfig};
use std::time::Duration;
use tracing::debug;
use types::MovieDetail;
use url::Url;

const MOVIE_URL: &str = "movies/{id}/";
const DETAILS_URL: &str = "dyn/phpauto/movie_details/movie_id/{id}.json";

/// Site-specific settings of a core instance.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub name: &'static str,
    pub priority: i64,
    pub base_url: String,
    /// Absolute sample video URL template with an `{id}` placeholder
    pub sample_video_url: Option<&'static str>,
    pub default_maker: &'static str,
    /// Identifier grammar of the site
    pub normalize_id: fn(&str) -> Option<String>,
}

/// Lookup logic shared by 1pondo-style sites.
pub struct OnePondoCore {
    scraper: Scraper,
    sample_video_url: Option<&'static str>,
    normalize_id: fn(&str) -> Option<String>,
}

impl OnePondoCore {
    pub fn init(config: CoreConfig) -> Result<Self, ProviderError> {
        let scraper = Scraper::init(
            ScraperConfig::new(config.name, config.base_url)
                .with_movie_url(MOVIE_URL)
                .with_priority(config.priority)
                .with_default_maker(config.default_maker),
        )?;

        Ok(Self {
            scraper,
            sample_video_url: config.sample_video_url,
            normalize_id: config.normalize_id,
        })
    }

    pub fn scraper(&self) -> &Scraper {
        &self.scraper
    }

    pub fn normalize_id(&self, id: &str) -> Option<String> {
        (self.normalize_id)(id.trim())
    }

    pub fn parse_id_from_url(&self, url: &str) -> Result<String, ProviderError> {
        self.scraper.parse_id_from_url(url)
    }

    /// Fetches a resource of the site with the referer it expects.
    pub fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.scraper.fetch_with_referer(url)
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.scraper.set_request_timeout(timeout);
    }

    pub fn movie_info_by_id(&self, id: &str) -> Result<MovieInfo, ProviderError> {
        let normalized = self.recognize(id)?;
        let homepage = self.scraper.movie_url(&normalized)?;
        self.lookup(&normalized, homepage.as_str())
    }

    pub fn movie_info_by_url(&self, url: &str) -> Result<MovieInfo, ProviderError> {
        let id = self.parse_id_from_url(url)?;
        let normalized = self.recognize(&id)?;
        self.lookup(&normalized, url)
    }

    fn recognize(&self, id: &str) -> Result<String, ProviderError> {
        self.normalize_id(id)
            .ok_or_else(|| ProviderError::UnrecognizedId {
                provider: self.scraper.name().to_string(),
                id: id.to_string(),
            })
    }

    fn details_url(&self, id: &str) -> Result<Url, ProviderError> {
        let rendered = DETAILS_URL.replace("{id}", id);
        self.scraper
            .base_url()
            .join(&rendered)
            .map_err(|e| ProviderError::MalformedUrl {
                url: rendered,
                source: e,
            })
    }

    fn lookup(&self, id: &str, homepage: &str) -> Result<MovieInfo, ProviderError> {
        let mut info = MovieInfo::new(id, id, self.scraper.name(), homepage);
        if let Some(maker) = self.scraper.default_maker() {
            info.maker = maker.to_string();
        }

        let details_url = self.details_url(id)?;
        let page = self.fetch(details_url.as_str())?;
        let detail: MovieDetail =
            serde_json::from_slice(page.body()).map_err(|e| ProviderError::Parse {
                url: details_url.to_string(),
                reason: e.to_string(),
            })?;

        self.apply(&mut info, detail);
        debug!(provider = %info.provider, id = %info.id, title = %info.title, "fetched movie details");
        Ok(info)
    }

    /// Copies the detail document into the record.
    fn apply(&self, info: &mut MovieInfo, detail: MovieDetail) {
        if let Some(movie_id) = detail.movie_id.filter(|m| m != &info.id) {
            debug!(requested = %info.id, returned = %movie_id, "site returned a different movie id");
        }

        info.title = detail
            .title
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
        info.summary = detail
            .desc
            .map(|s| nanohtml2text::html2text(&s).trim().to_string())
            .unwrap_or_default();
        info.release_date = detail.release.as_deref().and_then(parse_date);
        info.runtime = detail.duration.map(|secs| secs.saturating_add(30) / 60);
        info.score = detail.avg_rating;
        info.series = detail.series.unwrap_or_default();
        info.actors = detail.actresses_ja;
        info.tags = detail.uc_name;

        let base = self.scraper.base_url();
        let absolute = |s: String| base.join(&s).ok().map(String::from);
        info.cover_url = detail
            .thumb_ultra
            .or(detail.thumb_high)
            .and_then(absolute);
        info.thumb_url = detail.movie_thumb.and_then(absolute);
        info.preview_video_url = self
            .sample_video_url
            .map(|template| template.replace("{id}", &info.id));
    }
}
