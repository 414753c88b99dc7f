//! Value formatting helpers.

use crate::models::media::Tag;
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Format a timestamp as ISO 8601.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Join tag names with `", "`. Empty lists yield `None`.
pub fn format_tags(tags: &[Tag]) -> Option<String> {
    let names: Vec<&str> = tags
        .iter()
        .map(|t| t.tag.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

fn imdb_guid_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^imdb://(tt\d+)$").ok()).as_ref()
}

/// Extract `tt1234567` from an `imdb://tt1234567` GUID.
pub fn imdb_id_from_guid(guid: &str) -> Option<String> {
    imdb_guid_regex()?
        .captures(guid.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Make a section title usable as a worksheet name.
///
/// Keeps alphanumerics, spaces, `_` and `-`, replaces anything else with `_`
/// and truncates to Excel's 31-character limit.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .take(31)
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "Sheet".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Season column header, e.g. `S01`.
pub fn season_header(season: u32) -> String {
    format!("S{:02}", season)
}
