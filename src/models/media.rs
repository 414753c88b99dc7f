//! Media server item models.
//!
//! These mirror the JSON shape returned by the Plex library endpoints.
//! Every attribute Plex may omit is an explicit `Option` (or an empty list),
//! so extractors deal with absence as a value.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Library section type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Movie,
    Show,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for SectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionType::Movie => write!(f, "movie"),
            SectionType::Show => write!(f, "show"),
            SectionType::Other => write!(f, "other"),
        }
    }
}

/// A library section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrarySection {
    /// Section key used in library URLs.
    pub key: String,
    /// Display title.
    pub title: String,
    /// Section type.
    #[serde(rename = "type")]
    pub section_type: SectionType,
}

/// A tag-like entry (genre, collection, label).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub tag: String,
}

impl Tag {
    pub fn new<S: Into<String>>(tag: S) -> Self {
        Self { tag: tag.into() }
    }
}

/// External identifier entry, e.g. `imdb://tt0903747`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Guid {
    pub id: String,
}

/// Metadata shared by movies and shows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    /// Plex rating key.
    #[serde(default)]
    pub rating_key: Option<String>,
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// Original title.
    #[serde(default)]
    pub original_title: Option<String>,
    /// Release year.
    #[serde(default)]
    pub year: Option<i32>,
    /// Studio.
    #[serde(default)]
    pub studio: Option<String>,
    /// Content rating (e.g. "PG-13").
    #[serde(default)]
    pub content_rating: Option<String>,
    /// Summary.
    #[serde(default)]
    pub summary: Option<String>,
    /// Tagline.
    #[serde(default)]
    pub tagline: Option<String>,
    /// When the item was added to the library.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub added_at: Option<DateTime<Utc>>,
    /// When the item was last viewed.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub last_viewed_at: Option<DateTime<Utc>>,
    /// Original release date.
    #[serde(default)]
    pub originally_available_at: Option<NaiveDate>,
    /// Audience rating (0-10).
    #[serde(default)]
    pub audience_rating: Option<f64>,
    /// Critic rating (0-10).
    #[serde(default)]
    pub rating: Option<f64>,
    /// Collections.
    #[serde(rename = "Collection", default)]
    pub collections: Vec<Tag>,
    /// Genres.
    #[serde(rename = "Genre", default)]
    pub genres: Vec<Tag>,
    /// Labels.
    #[serde(rename = "Label", default)]
    pub labels: Vec<Tag>,
    /// View count.
    #[serde(default)]
    pub view_count: Option<u64>,
    /// Skip count.
    #[serde(default)]
    pub skip_count: Option<u64>,
}

impl ItemMetadata {
    /// Title for log messages.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown Title")
    }
}

/// Access to the shared metadata of an item.
pub trait HasMetadata {
    fn metadata(&self) -> &ItemMetadata;
}

/// A file belonging to a media version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaPart {
    /// Absolute file path on the server.
    #[serde(default)]
    pub file: Option<String>,
}

/// One media version of a movie (resolution, codecs, files).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    #[serde(default)]
    pub video_resolution: Option<String>,
    /// Bitrate in kbps.
    #[serde(default)]
    pub bitrate: Option<u64>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub aspect_ratio: Option<f64>,
    #[serde(default)]
    pub audio_channels: Option<u32>,
    #[serde(default)]
    pub audio_codec: Option<String>,
    #[serde(default)]
    pub video_codec: Option<String>,
    #[serde(default)]
    pub video_frame_rate: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(rename = "Part", default)]
    pub parts: Vec<MediaPart>,
}

/// A movie in a library section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieItem {
    #[serde(flatten)]
    pub metadata: ItemMetadata,
    /// Duration in milliseconds.
    #[serde(default)]
    pub duration: Option<u64>,
    /// Media versions; the first is the primary one.
    #[serde(rename = "Media", default)]
    pub media: Vec<MediaInfo>,
}

impl MovieItem {
    /// The primary media version.
    pub fn primary_media(&self) -> Option<&MediaInfo> {
        self.media.first()
    }

    /// The primary file of the primary media version.
    pub fn primary_part(&self) -> Option<&MediaPart> {
        self.primary_media().and_then(|m| m.parts.first())
    }
}

impl HasMetadata for MovieItem {
    fn metadata(&self) -> &ItemMetadata {
        &self.metadata
    }
}

/// A season as reported by the media server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSeason {
    /// Season number; Plex may omit it or send nonsense.
    #[serde(default)]
    pub index: Option<i64>,
    /// Number of episodes present locally.
    #[serde(default)]
    pub leaf_count: Option<u32>,
}

/// A TV show in a library section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShowItem {
    #[serde(flatten)]
    pub metadata: ItemMetadata,
    /// External identifiers.
    #[serde(rename = "Guid", default)]
    pub guids: Vec<Guid>,
    /// Seasons present locally, filled in from the children endpoint.
    #[serde(skip)]
    pub seasons: Vec<LocalSeason>,
}

impl ShowItem {
    /// IMDB ID from the `imdb://` GUID, if any.
    pub fn imdb_id(&self) -> Option<String> {
        self.guids
            .iter()
            .find_map(|g| crate::utils::format::imdb_id_from_guid(&g.id))
    }

    /// Title used for the catalog search: original title, else title.
    pub fn search_title(&self) -> Option<&str> {
        fn usable(title: Option<&str>) -> Option<&str> {
            title.map(str::trim).filter(|t| !t.is_empty())
        }
        usable(self.metadata.original_title.as_deref())
            .or_else(|| usable(self.metadata.title.as_deref()))
    }

    /// Local episode counts keyed by season number.
    ///
    /// Seasons without a valid non-negative number are skipped.
    pub fn local_season_counts(&self) -> BTreeMap<u32, u32> {
        let mut counts = BTreeMap::new();
        for season in &self.seasons {
            match season.index.map(u32::try_from) {
                Some(Ok(number)) => {
                    counts.insert(number, season.leaf_count.unwrap_or(0));
                }
                Some(Err(_)) => {
                    tracing::warn!(
                        "Skipping invalid season number {:?} for show '{}'",
                        season.index,
                        self.metadata.display_title()
                    );
                }
                None => {}
            }
        }
        counts
    }
}

impl HasMetadata for ShowItem {
    fn metadata(&self) -> &ItemMetadata {
        &self.metadata
    }
}
