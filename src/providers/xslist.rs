//! Xslist actor provider.
//!
//! Performer profiles on xslist.org are plain HTML pages. The name and
//! portrait are marked up with schema.org properties, the remaining facts
//! are `label: value` list items.

use crate::model::ActorInfo;
use crate::parser::{parse_date, parse_height};
use crate::provider::{ActorProvider, Provider, ProviderError, RequestTimeoutSetter};
use crate::registry::{ProviderRegistry, RegistryError};
use crate::scraping::{Scraper, ScraperConfig};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

pub const NAME: &str = "Xslist";
pub const PRIORITY: i64 = 1000;

const BASE_URL: &str = "https://xslist.org/";
const ACTOR_URL: &str = "zh/model/{id}.html";

static ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

const NAME_SELECTOR: &str = r#"#layout h1 [itemprop="name"]"#;
const IMAGES: &str = r#"#layout img[itemprop="image"]"#;
const SUMMARY: &str = r#"#layout [itemprop="description"]"#;
const FIELDS: &str = "#layout ul.profile > li";

/// Provider for xslist.org performer profiles.
pub struct Xslist {
    scraper: Scraper,
}

impl Xslist {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ProviderError> {
        let scraper = Scraper::init(
            ScraperConfig::new(NAME, base_url)
                .with_actor_url(ACTOR_URL)
                .with_priority(PRIORITY),
        )?;
        Ok(Self { scraper })
    }
}

impl Provider for Xslist {
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

impl ActorProvider for Xslist {
    fn normalize_actor_id(&self, id: &str) -> Option<String> {
        let id = id.trim();
        let id = id.strip_suffix(".html").unwrap_or(id);
        ID_RE.is_match(id).then(|| id.to_string())
    }

    fn parse_actor_id_from_url(&self, url: &str) -> Result<String, ProviderError> {
        let segment = self.scraper.parse_id_from_url(url)?;
        Ok(segment
            .strip_suffix(".html")
            .map(str::to_string)
            .unwrap_or(segment))
    }

    fn get_actor_info_by_id(&self, id: &str) -> Result<ActorInfo, ProviderError> {
        let normalized = self
            .normalize_actor_id(id)
            .ok_or_else(|| ProviderError::UnrecognizedId {
                provider: NAME.to_string(),
                id: id.to_string(),
            })?;

        let url = self.scraper.actor_url(&normalized)?;
        self.get_actor_info_by_url(url.as_str())
    }

    fn get_actor_info_by_url(&self, url: &str) -> Result<ActorInfo, ProviderError> {
        let id = self.parse_actor_id_from_url(url)?;
        let mut info = ActorInfo::new(id, self.name(), url);

        let mut c = self.scraper.cloned_collector();
        c.on_html(NAME_SELECTOR, |info: &mut ActorInfo, e| {
            if info.name.is_empty() {
                info.name = e.text();
            }
        })?
        .on_html(IMAGES, |info: &mut ActorInfo, e| {
            info.images
                .extend(e.attr("src").and_then(|src| e.absolute_url(src)));
        })?
        .on_html(SUMMARY, |info: &mut ActorInfo, e| info.summary = e.text())?
        .on_html(FIELDS, |info: &mut ActorInfo, e| {
            if let Some((label, value)) = split_field(&e.text()) {
                apply_field(info, label, value);
            }
        })?;

        c.visit(url, &mut info)?;

        debug!(provider = NAME, id = %info.id, name = %info.name, "scraped actor info");
        Ok(info)
    }
}

/// Splits `label: value` at the first ASCII or full-width colon.
fn split_field(text: &str) -> Option<(&str, &str)> {
    let (label, value) = text.split_once([':', '：'])?;
    let value = value.trim();
    (!value.is_empty()).then(|| (label.trim(), value))
}

fn apply_field(info: &mut ActorInfo, label: &str, value: &str) {
    match label {
        "别名" => info.aliases.extend(
            value
                .split([',', '，', '、'])
                .map(str::trim)
                .filter(|alias| !alias.is_empty())
                .map(str::to_string),
        ),
        "生日" => info.birthday = parse_date(value),
        "出道日期" => info.debut_date = parse_date(value),
        "身高" => info.height = parse_height(value),
        "三围" => info.measurements = value.to_string(),
        "罩杯" => info.cup_size = value.trim_end_matches("Cup").trim().to_string(),
        "血型" => info.blood_type = value.to_string(),
        "国籍" => info.nationality = value.to_string(),
        "爱好" => info.hobby = value.to_string(),
        _ => {}
    }
}

/// Registers the Xslist factory.
pub fn register(registry: &mut ProviderRegistry) -> Result<(), RegistryError> {
    registry.register_actor_factory(NAME, || -> Result<Box<dyn ActorProvider>, ProviderError> {
        Ok(Box::new(Xslist::new()?))
    })
}
