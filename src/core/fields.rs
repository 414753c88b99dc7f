//! Field extraction registry.
//!
//! Maps a field name to a pure extraction function, so the set of exported
//! columns is configuration while the way each column is computed lives in
//! one place. Movies and shows share the common metadata extractors.

use crate::models::media::{HasMetadata, MovieItem, ShowItem};
use crate::models::report::{FieldRecord, FieldValue};
use crate::utils::format;
use crate::{Error, Result};
use std::collections::HashMap;

/// Extraction function for one field.
pub type Extractor<T> = fn(&T) -> Result<FieldValue>;

/// Default movie columns.
pub const DEFAULT_MOVIE_FIELDS: &[&str] = &[
    "Title",
    "Year",
    "Studio",
    "ContentRating",
    "Video Resolution",
    "Bitrate (kbps)",
    "File Path",
    "Container",
    "Duration (min)",
];

/// Default show columns.
pub const DEFAULT_SHOW_FIELDS: &[&str] = &["Title", "Year", "Studio", "ContentRating", "Summary"];

/// Value written when the primary media stream lacks an attribute.
const UNKNOWN: &str = "Unknown";

/// Registry of named field extractors.
pub struct FieldRegistry<T> {
    order: Vec<&'static str>,
    extractors: HashMap<&'static str, Extractor<T>>,
}

impl<T> Default for FieldRegistry<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            extractors: HashMap::new(),
        }
    }
}

impl<T> FieldRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extractor. Re-registering a name replaces the extractor.
    pub fn register(mut self, name: &'static str, extractor: Extractor<T>) -> Self {
        if self.extractors.insert(name, extractor).is_none() {
            self.order.push(name);
        }
        self
    }

    /// Registered field names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.order.clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.extractors.contains_key(name)
    }

    /// Extract one field. Never fails: unknown fields yield `N/A`, failing
    /// extractors yield the extraction-error marker.
    pub fn extract(&self, item: &T, field: &str, label: &str) -> FieldValue {
        let Some(extractor) = self.extractors.get(field) else {
            tracing::warn!("Unknown field '{}' requested for '{}'", field, label);
            return FieldValue::NotAvailable;
        };

        match extractor(item) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Error processing field '{}' for '{}': {}", field, label, e);
                FieldValue::ExtractionError
            }
        }
    }

    /// Extract the selected fields in order.
    pub fn extract_all<S: AsRef<str>>(&self, item: &T, fields: &[S], label: &str) -> FieldRecord {
        let mut record = FieldRecord::default();
        for field in fields {
            let field = field.as_ref();
            record.push(field, self.extract(item, field, label));
        }
        record
    }
}

fn integer<N>(field: &str, value: N) -> Result<FieldValue>
where
    N: TryInto<i64> + Copy + std::fmt::Display,
{
    value
        .try_into()
        .map(FieldValue::Integer)
        .map_err(|_| Error::field(field, format!("value {} out of range", value)))
}

fn integer_or_na<N>(field: &str, value: Option<N>) -> Result<FieldValue>
where
    N: TryInto<i64> + Copy + std::fmt::Display,
{
    match value {
        Some(v) => integer(field, v),
        None => Ok(FieldValue::NotAvailable),
    }
}

fn rating(value: Option<f64>) -> FieldValue {
    match value {
        Some(v) if v != 0.0 => FieldValue::Float(v),
        _ => FieldValue::NotAvailable,
    }
}

/// Register the extractors shared by movies and shows.
fn with_common_fields<T: HasMetadata>(registry: FieldRegistry<T>) -> FieldRegistry<T> {
    registry
        .register("Title", |i: &T| {
            Ok(FieldValue::text_or_na(i.metadata().title.as_deref()))
        })
        .register("Year", |i: &T| integer_or_na("Year", i.metadata().year))
        .register("Studio", |i: &T| {
            Ok(FieldValue::text_or_na(i.metadata().studio.as_deref()))
        })
        .register("ContentRating", |i: &T| {
            Ok(FieldValue::text_or_na(i.metadata().content_rating.as_deref()))
        })
        .register("Summary", |i: &T| {
            Ok(FieldValue::text_or_na(i.metadata().summary.as_deref()))
        })
        .register("Tagline", |i: &T| {
            Ok(FieldValue::text_or_na(i.metadata().tagline.as_deref()))
        })
        .register("AddedAt", |i: &T| {
            Ok(FieldValue::text_or_na(
                i.metadata().added_at.as_ref().map(format::format_datetime),
            ))
        })
        .register("LastViewedAt", |i: &T| {
            Ok(FieldValue::text_or_na(
                i.metadata().last_viewed_at.as_ref().map(format::format_datetime),
            ))
        })
        .register("OriginallyAvailableAt", |i: &T| {
            Ok(FieldValue::text_or_na(
                i.metadata()
                    .originally_available_at
                    .as_ref()
                    .map(format::format_date),
            ))
        })
        .register("AudienceRating", |i: &T| Ok(rating(i.metadata().audience_rating)))
        .register("Rating", |i: &T| Ok(rating(i.metadata().rating)))
        .register("Collections", |i: &T| {
            Ok(FieldValue::text_or_na(format::format_tags(&i.metadata().collections)))
        })
        .register("Genres", |i: &T| {
            Ok(FieldValue::text_or_na(format::format_tags(&i.metadata().genres)))
        })
        .register("Labels", |i: &T| {
            Ok(FieldValue::text_or_na(format::format_tags(&i.metadata().labels)))
        })
        .register("ViewCount", |i: &T| {
            integer("ViewCount", i.metadata().view_count.unwrap_or(0))
        })
        .register("SkipCount", |i: &T| {
            integer("SkipCount", i.metadata().skip_count.unwrap_or(0))
        })
}

/// Registry of every movie field.
pub fn movie_registry() -> FieldRegistry<MovieItem> {
    with_common_fields(FieldRegistry::new())
        .register("Duration (min)", |m: &MovieItem| match m.duration {
            Some(ms) if ms > 0 => integer("Duration (min)", (ms as f64 / 60_000.0).round() as u64),
            _ => Ok(FieldValue::NotAvailable),
        })
        .register("Video Resolution", |m: &MovieItem| {
            Ok(FieldValue::text_or(
                m.primary_media().and_then(|x| x.video_resolution.as_deref()),
                UNKNOWN,
            ))
        })
        .register("Bitrate (kbps)", |m: &MovieItem| {
            match m.primary_media().and_then(|x| x.bitrate).filter(|b| *b > 0) {
                Some(bitrate) => integer("Bitrate (kbps)", bitrate),
                None => Ok(FieldValue::Text(UNKNOWN.to_string())),
            }
        })
        .register("Container", |m: &MovieItem| {
            Ok(FieldValue::text_or(
                m.primary_media().and_then(|x| x.container.as_deref()),
                UNKNOWN,
            ))
        })
        .register("File Path", |m: &MovieItem| {
            Ok(FieldValue::text_or(
                m.primary_part().and_then(|p| p.file.as_deref()),
                UNKNOWN,
            ))
        })
        .register("AspectRatio", |m: &MovieItem| {
            Ok(rating(m.primary_media().and_then(|x| x.aspect_ratio)))
        })
        .register("AudioChannels", |m: &MovieItem| {
            integer_or_na("AudioChannels", m.primary_media().and_then(|x| x.audio_channels))
        })
        .register("AudioCodec", |m: &MovieItem| {
            Ok(FieldValue::text_or_na(
                m.primary_media().and_then(|x| x.audio_codec.as_deref()),
            ))
        })
        .register("VideoCodec", |m: &MovieItem| {
            Ok(FieldValue::text_or_na(
                m.primary_media().and_then(|x| x.video_codec.as_deref()),
            ))
        })
        .register("VideoFrameRate", |m: &MovieItem| {
            Ok(FieldValue::text_or_na(
                m.primary_media().and_then(|x| x.video_frame_rate.as_deref()),
            ))
        })
        .register("Height", |m: &MovieItem| {
            integer_or_na("Height", m.primary_media().and_then(|x| x.height))
        })
        .register("Width", |m: &MovieItem| {
            integer_or_na("Width", m.primary_media().and_then(|x| x.width))
        })
}

/// Registry of every show metadata field.
///
/// Season and completeness columns are computed separately.
pub fn show_registry() -> FieldRegistry<ShowItem> {
    with_common_fields(FieldRegistry::new())
}

/// Field the report is sorted by: `Title` when selected, else the first field.
pub fn sort_field<S: AsRef<str>>(selected: &[S]) -> Option<&str> {
    selected
        .iter()
        .map(|s| s.as_ref())
        .find(|f| *f == "Title")
        .or_else(|| selected.first().map(|s| s.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::{MediaInfo, MediaPart, Tag};

    fn movie() -> MovieItem {
        let mut movie = MovieItem::default();
        movie.metadata.title = Some("Heat".to_string());
        movie.metadata.year = Some(1995);
        movie.metadata.genres = vec![Tag::new("Crime"), Tag::new("Drama")];
        movie.duration = Some(10_200_000);
        movie.media = vec![MediaInfo {
            video_resolution: Some("1080".to_string()),
            bitrate: Some(8000),
            parts: vec![MediaPart {
                file: Some("/movies/Heat.mkv".to_string()),
            }],
            ..Default::default()
        }];
        movie
    }

    #[test]
    fn test_movie_fields() {
        let registry = movie_registry();
        let record = registry.extract_all(
            &movie(),
            &["Title", "Year", "Genres", "Duration (min)", "File Path", "Studio"],
            "Heat",
        );
        assert_eq!(record.get("Title"), Some(&FieldValue::Text("Heat".into())));
        assert_eq!(record.get("Year"), Some(&FieldValue::Integer(1995)));
        assert_eq!(
            record.get("Genres"),
            Some(&FieldValue::Text("Crime, Drama".into()))
        );
        assert_eq!(record.get("Duration (min)"), Some(&FieldValue::Integer(170)));
        assert_eq!(
            record.get("File Path"),
            Some(&FieldValue::Text("/movies/Heat.mkv".into()))
        );
        assert_eq!(record.get("Studio"), Some(&FieldValue::NotAvailable));
    }

    #[test]
    fn test_movie_without_media() {
        let registry = movie_registry();
        let record = registry.extract_all(
            &MovieItem::default(),
            &["Video Resolution", "Bitrate (kbps)", "VideoCodec", "ViewCount"],
            "empty",
        );
        assert_eq!(
            record.get("Video Resolution"),
            Some(&FieldValue::Text("Unknown".into()))
        );
        assert_eq!(
            record.get("Bitrate (kbps)"),
            Some(&FieldValue::Text("Unknown".into()))
        );
        assert_eq!(record.get("VideoCodec"), Some(&FieldValue::NotAvailable));
        assert_eq!(record.get("ViewCount"), Some(&FieldValue::Integer(0)));
    }

    #[test]
    fn test_out_of_range_count_is_isolated() {
        let mut movie = movie();
        movie.metadata.view_count = Some(u64::MAX);
        let record = movie_registry().extract_all(&movie, &["ViewCount", "Title"], "Heat");
        assert_eq!(record.get("ViewCount"), Some(&FieldValue::ExtractionError));
        assert_eq!(record.get("Title"), Some(&FieldValue::Text("Heat".into())));
    }

    #[test]
    fn test_show_registry_has_no_media_fields() {
        let registry = show_registry();
        assert!(registry.contains("Title"));
        assert!(!registry.contains("Video Resolution"));
        assert_eq!(registry.names().len(), 16);
    }

    #[test]
    fn test_sort_field() {
        assert_eq!(sort_field(&["Year", "Title"]), Some("Title"));
        assert_eq!(sort_field(&["Year", "Studio"]), Some("Year"));
        assert_eq!(sort_field::<&str>(&[]), None);
    }
}
