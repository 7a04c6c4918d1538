//! Gcolle movie provider.
//!
//! Scrapes the product detail pages of gcolle.net. Pages are served in a
//! legacy Japanese encoding and adult listings sit behind an age check
//! page linking to the real content.

use crate::model::MovieInfo;
use crate::parser::parse_date;
use crate::provider::{MovieProvider, Provider, ProviderError, RequestTimeoutSetter};
use crate::registry::{ProviderRegistry, RegistryError};
use crate::scraping::{Scraper, ScraperConfig};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

pub const NAME: &str = "Gcolle";
pub const PRIORITY: i64 = 1000;

const BASE_URL: &str = "https://gcolle.net/";
const MOVIE_URL: &str = "product_info.php/products_id/{id}";

static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:GCOLLE-)?([0-9A-Za-z_]+)$").unwrap());

const AGE_CHECK: &str = "#main_content h4 > a";
const TITLE: &str = "#cart_quantity > table > tbody > tr:nth-child(1) > td > h1";
const SUMMARY: &str = "#cart_quantity > table > tbody > tr:nth-child(3) > td > p";
const TAGS: &str = "#cart_quantity > table > tbody > tr:nth-child(4) > td > a";
const COVER: &str =
    "#cart_quantity > table > tbody > tr:nth-child(3) > td > table > tbody > tr > td > a";
const PREVIEW_IMAGES: &str = "#cart_quantity > table > tbody > tr:nth-child(3) > td > div > img, \
     #cart_quantity > table > tbody > tr:nth-child(3) > td > div > a > img";
const FIELDS: &str = "table.filesetumei tr";

/// Provider for gcolle.net product pages.
pub struct Gcolle {
    scraper: Scraper,
}

impl Gcolle {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(BASE_URL)
    }

    /// Creates a provider talking to a different host, e.g. a mirror.
    pub fn with_base_url(base_url: &str) -> Result<Self, ProviderError> {
        let scraper = Scraper::init(
            ScraperConfig::new(NAME, base_url)
                .with_movie_url(MOVIE_URL)
                .with_priority(PRIORITY)
                .with_detect_charset(),
        )?;
        Ok(Self { scraper })
    }
}

impl Provider for Gcolle {
    fn name(&self) -> &str {
        self.scraper.name()
    }

    fn priority(&self) -> i64 {
        self.scraper.priority()
    }

    fn base_url(&self) -> &Url {
        self.scraper.base_url()
    }

    fn as_timeout_setter(&mut self) -> Option<&mut dyn RequestTimeoutSetter> {
        Some(&mut self.scraper)
    }
}

impl MovieProvider for Gcolle {
    fn normalize_movie_id(&self, id: &str) -> Option<String> {
        ID_RE.captures(id.trim()).map(|caps| caps[1].to_string())
    }

    fn parse_movie_id_from_url(&self, url: &str) -> Result<String, ProviderError> {
        self.scraper.parse_id_from_url(url)
    }

    fn get_movie_info_by_id(&self, id: &str) -> Result<MovieInfo, ProviderError> {
        let normalized = self
            .normalize_movie_id(id)
            .ok_or_else(|| ProviderError::UnrecognizedId {
                provider: NAME.to_string(),
                id: id.to_string(),
            })?;

        let url = self.scraper.movie_url(&normalized)?;
        self.get_movie_info_by_url(url.as_str())
    }

    fn get_movie_info_by_url(&self, url: &str) -> Result<MovieInfo, ProviderError> {
        let id = self.parse_movie_id_from_url(url)?;
        let mut info = MovieInfo::new(&id, format!("GCOLLE-{id}"), self.name(), url);

        let mut c = self.scraper.cloned_collector();
        c.on_interstitial(AGE_CHECK, |e| {
            e.attr("href")
                .filter(|href| href.contains("age_check"))
                .map(str::to_string)
        })?
        .on_html(TITLE, |info: &mut MovieInfo, e| info.title = e.text())?
        .on_html(SUMMARY, |info: &mut MovieInfo, e| info.summary = e.text())?
        .on_html(TAGS, |info: &mut MovieInfo, e| {
            let tag = e.text();
            if !tag.is_empty() {
                info.tags.push(tag);
            }
        })?
        .on_html(COVER, |info: &mut MovieInfo, e| {
            info.cover_url = e.attr("href").and_then(|href| e.absolute_url(href));
            info.thumb_url = e
                .child_attr("img", "src")
                .and_then(|src| e.absolute_url(&src));
        })?
        .on_html(PREVIEW_IMAGES, |info: &mut MovieInfo, e| {
            info.preview_images
                .extend(e.attr("src").and_then(|src| e.absolute_url(src)));
        })?
        .on_html(FIELDS, |info: &mut MovieInfo, e| {
            if e.child_text("td:nth-child(1)").as_deref() == Some("商品登録日") {
                info.release_date = e
                    .child_text("td:nth-child(2)")
                    .as_deref()
                    .and_then(parse_date);
            }
        })?;

        c.visit(url, &mut info)?;

        debug!(provider = NAME, id = %info.id, title = %info.title, "scraped movie info");
        Ok(info)
    }
}

/// Registers the Gcolle factory.
pub fn register(registry: &mut ProviderRegistry) -> Result<(), RegistryError> {
    registry.register_movie_factory(NAME, || -> Result<Box<dyn MovieProvider>, ProviderError> {
        Ok(Box::new(Gcolle::new()?))
    })
}
