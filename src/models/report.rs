//! Per-item records consumed by the report writer.

use crate::models::catalog::RemoteShowInfo;
use std::collections::BTreeMap;

/// Marker written for fields with no value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Marker written for fields whose extractor failed.
pub const EXTRACTION_ERROR: &str = "Error Processing Field";

/// A single extracted field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    /// No value; rendered as `N/A`.
    NotAvailable,
    /// The extractor failed; rendered as `Error Processing Field`.
    ExtractionError,
}

impl FieldValue {
    /// Text value, or `N/A` when the string is empty.
    pub fn text_or_na<S: AsRef<str>>(value: Option<S>) -> Self {
        match value {
            Some(s) if !s.as_ref().trim().is_empty() => FieldValue::Text(s.as_ref().to_string()),
            _ => FieldValue::NotAvailable,
        }
    }

    /// Text value, or the given fallback when missing or blank.
    pub fn text_or<S: AsRef<str>>(value: Option<S>, fallback: &str) -> Self {
        match value {
            Some(s) if !s.as_ref().trim().is_empty() => {
                FieldValue::Text(s.as_ref().trim().to_string())
            }
            _ => FieldValue::Text(fallback.to_string()),
        }
    }

    /// Sort key: lowercase rendering.
    pub fn sort_key(&self) -> String {
        self.to_string().to_lowercase()
    }

    /// Numeric value for cells that should stay numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) if f.is_finite() => Some(*f),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::NotAvailable => write!(f, "{}", NOT_AVAILABLE),
            FieldValue::ExtractionError => write!(f, "{}", EXTRACTION_ERROR),
        }
    }
}

/// Ordered field values for one item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRecord {
    pub values: Vec<(String, FieldValue)>,
}

impl FieldRecord {
    pub fn push<S: Into<String>>(&mut self, name: S, value: FieldValue) {
        self.values.push((name.into(), value));
    }

    /// Value of a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolution tier used for movie row highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// 4K / UHD.
    UltraHd,
    /// 1080p.
    FullHd,
    /// 720p and SD.
    Standard,
    Unknown,
}

impl ResolutionTier {
    const ULTRA_HD: &'static [&'static str] = &["4k", "uhd", "2160p"];
    const FULL_HD: &'static [&'static str] = &["1080", "1080p"];
    const STANDARD: &'static [&'static str] = &[
        "720", "720p", "sd", "480", "480p", "576", "576p", "dvd", "pal", "ntsc",
    ];

    /// Classify a Plex resolution string such as `"1080"` or `"4k"`.
    pub fn classify(resolution: &str) -> Self {
        let value = resolution.trim().to_lowercase();
        if Self::ULTRA_HD.contains(&value.as_str()) {
            ResolutionTier::UltraHd
        } else if Self::FULL_HD.contains(&value.as_str()) {
            ResolutionTier::FullHd
        } else if Self::STANDARD.contains(&value.as_str()) {
            ResolutionTier::Standard
        } else {
            ResolutionTier::Unknown
        }
    }
}

/// One exported movie.
#[derive(Debug, Clone)]
pub struct MovieRecord {
    pub fields: FieldRecord,
    pub resolution: ResolutionTier,
}

/// Completeness classification of a season or a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    /// Every known episode is present.
    Complete,
    /// Some episodes are present.
    Partial,
    /// The catalog lists episodes but none are present.
    Missing,
    /// Local and remote disagree or the remote side is unknown.
    Attention,
    /// Nothing to report.
    Neutral,
}

/// Display text and status for one report cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCell {
    pub text: String,
    pub status: CompletionStatus,
}

impl CompletionCell {
    pub fn new<S: Into<String>>(text: S, status: CompletionStatus) -> Self {
        Self {
            text: text.into(),
            status,
        }
    }

    /// An empty cell with the given status.
    pub fn blank(status: CompletionStatus) -> Self {
        Self::new(String::new(), status)
    }
}

/// One exported show.
#[derive(Debug, Clone)]
pub struct ShowRecord {
    /// Selected metadata fields.
    pub fields: FieldRecord,
    /// Local episode counts keyed by season number.
    pub local_seasons: BTreeMap<u32, u32>,
    /// Remote catalog counts, `None` when no match was found.
    pub remote_info: Option<RemoteShowInfo>,
}

impl ShowRecord {
    /// Series completeness cell.
    pub fn series_cell(&self) -> CompletionCell {
        crate::core::completeness::series_cell(&self.local_seasons, self.remote_info.as_ref())
    }

    /// Completeness cell for one season.
    pub fn season_cell(&self, season: u32) -> CompletionCell {
        crate::core::completeness::season_cell(
            season,
            &self.local_seasons,
            self.remote_info.as_ref(),
        )
    }

    /// Highest season number known from either side.
    pub fn max_season(&self) -> u32 {
        let local = self.local_seasons.keys().next_back().copied().unwrap_or(0);
        let remote = self.remote_info.as_ref().map(|r| r.total_seasons).unwrap_or(0);
        local.max(remote)
    }

    pub fn has_specials(&self) -> bool {
        self.local_seasons.contains_key(&0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_tiers() {
        assert_eq!(ResolutionTier::classify("4k"), ResolutionTier::UltraHd);
        assert_eq!(ResolutionTier::classify(" 2160P "), ResolutionTier::UltraHd);
        assert_eq!(ResolutionTier::classify("1080"), ResolutionTier::FullHd);
        assert_eq!(ResolutionTier::classify("720"), ResolutionTier::Standard);
        assert_eq!(ResolutionTier::classify("sd"), ResolutionTier::Standard);
        assert_eq!(ResolutionTier::classify("Unknown"), ResolutionTier::Unknown);
    }

    #[test]
    fn test_field_markers() {
        assert_eq!(FieldValue::NotAvailable.to_string(), "N/A");
        assert_eq!(
            FieldValue::ExtractionError.to_string(),
            "Error Processing Field"
        );
        assert_eq!(FieldValue::text_or_na(Some("")), FieldValue::NotAvailable);
        assert_eq!(FieldValue::text_or_na(None::<&str>), FieldValue::NotAvailable);
    }
}
