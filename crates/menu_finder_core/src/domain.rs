//! crates/menu_finder_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! Nothing here outlives a single request/response cycle.

use chrono::Local;
use serde::{Deserialize, Deserializer, Serialize};

/// A single meal suggestion as returned by the search provider.
///
/// Field names follow the camelCase shape the language model is asked to produce.
/// Missing or `null` fields deserialize as empty strings; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MenuRecommendation {
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub menu_link: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub image_url: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub cuisine: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl MenuRecommendation {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        menu_link: impl Into<String>,
        image_url: impl Into<String>,
        cuisine: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            menu_link: menu_link.into(),
            image_url: image_url.into(),
            cuisine: cuisine.into(),
        }
    }
}

/// The aggregate handed back to the caller for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub query: String,
    pub recommendations: Vec<MenuRecommendation>,
    pub total_found: usize,
    pub search_location: Option<String>,
    pub timestamp: String,
}

impl RecommendationResponse {
    /// Builds the response and stamps it with the current local date-time.
    pub fn new(
        query: impl Into<String>,
        recommendations: Vec<MenuRecommendation>,
        search_location: Option<String>,
    ) -> Self {
        let timestamp = Local::now()
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S%.f")
            .to_string();
        Self {
            query: query.into(),
            total_found: recommendations.len(),
            recommendations,
            search_location,
            timestamp,
        }
    }
}

/// Audio encodings understood by the speech provider.
///
/// Serializes to the provider's enum names (`LINEAR16`, `WEBM_OPUS`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    Linear16,
    Flac,
    Mp3,
    WebmOpus,
    OggOpus,
}

impl AudioEncoding {
    /// The sample rate requested from the provider for this encoding.
    pub fn sample_rate_hz(self) -> u32 {
        match self {
            AudioEncoding::WebmOpus | AudioEncoding::OggOpus => 48_000,
            AudioEncoding::Linear16 | AudioEncoding::Flac | AudioEncoding::Mp3 => 16_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AudioEncoding::Linear16 => "LINEAR16",
            AudioEncoding::Flac => "FLAC",
            AudioEncoding::Mp3 => "MP3",
            AudioEncoding::WebmOpus => "WEBM_OPUS",
            AudioEncoding::OggOpus => "OGG_OPUS",
        }
    }
}

impl std::fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The encoding/sample-rate pair sent with a recognition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub encoding: AudioEncoding,
    pub sample_rate_hz: u32,
}

impl From<AudioEncoding> for AudioFormat {
    fn from(encoding: AudioEncoding) -> Self {
        Self {
            encoding,
            sample_rate_hz: encoding.sample_rate_hz(),
        }
    }
}
