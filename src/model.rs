//! Canonical record shapes produced by every provider.
//!
//! Records are created fresh for each lookup, filled in while the source
//! page is parsed and handed to the caller. Only the identifying fields are
//! guaranteed; everything else is best-effort.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Metadata for a single media item (a movie).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MovieInfo {
    /// Source-local identifier
    pub id: String,
    /// Display number, usually prefixed with the source name
    pub number: String,
    /// Name of the provider that produced this record
    pub provider: String,
    /// Canonical detail page of the item
    pub homepage: String,

    pub title: String,
    pub summary: String,
    pub director: String,
    pub maker: String,
    pub label: String,
    pub series: String,

    /// Release date, absent when the page did not carry a parseable date
    pub release_date: Option<NaiveDate>,
    /// Runtime in minutes
    pub runtime: Option<u32>,
    pub score: Option<f64>,

    /// Participant names in page order
    pub actors: Vec<String>,
    pub preview_images: Vec<String>,
    pub cover_url: Option<String>,
    pub thumb_url: Option<String>,
    pub preview_video_url: Option<String>,
    pub tags: Vec<String>,
}

impl MovieInfo {
    /// Seeds a record with its identifying fields and empty collections.
    pub fn new(
        id: impl Into<String>,
        number: impl Into<String>,
        provider: impl Into<String>,
        homepage: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            provider: provider.into(),
            homepage: homepage.into(),
            ..Self::default()
        }
    }

    /// Returns true when the identifying fields are present.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
            && !self.number.is_empty()
            && !self.provider.is_empty()
            && !self.homepage.is_empty()
    }
}

/// Metadata for a performer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActorInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub homepage: String,

    pub summary: String,
    pub aliases: Vec<String>,
    pub images: Vec<String>,
    pub birthday: Option<NaiveDate>,
    pub debut_date: Option<NaiveDate>,
    /// Height in centimeters
    pub height: Option<u32>,
    pub measurements: String,
    pub cup_size: String,
    pub blood_type: String,
    pub nationality: String,
    pub hobby: String,
}

impl ActorInfo {
    /// Seeds a record with its identifying fields and empty collections.
    pub fn new(
        id: impl Into<String>,
        provider: impl Into<String>,
        homepage: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            homepage: homepage.into(),
            ..Self::default()
        }
    }

    /// Returns true when the identifying fields and the name are present.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
            && !self.name.is_empty()
            && !self.provider.is_empty()
            && !self.homepage.is_empty()
    }
}
