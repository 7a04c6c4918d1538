/// Movie detail response types for deserialization.
///
/// These structures mirror the JSON served by the `movie_details` endpoint
/// shared by 1pondo-style sites.
use serde::Deserialize;

/// The movie detail document.
///
/// Sites in this family omit or null out fields freely, so every field
/// is optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct MovieDetail {
    /// Identifier as echoed by the site, e.g. `123456_001`
    #[serde(rename = "MovieID", default)]
    pub movie_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Description in HTML format
    #[serde(default)]
    pub desc: Option<String>,
    /// Release date, `YYYY-MM-DD`
    #[serde(default)]
    pub release: Option<String>,
    /// Performer names in Japanese
    #[serde(default, deserialize_with = "null_as_empty")]
    pub actresses_ja: Vec<String>,
    /// Category names
    #[serde(rename = "UCNAME", default, deserialize_with = "null_as_empty")]
    pub uc_name: Vec<String>,
    #[serde(default)]
    pub thumb_high: Option<String>,
    #[serde(default)]
    pub thumb_ultra: Option<String>,
    #[serde(default)]
    pub movie_thumb: Option<String>,
    /// Runtime in seconds
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub avg_rating: Option<f64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
