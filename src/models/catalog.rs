//! Remote catalog data models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Episode count for one season from one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonCount {
    /// Season number (0 = specials).
    pub season_number: u32,
    /// Number of episodes in the season.
    pub episode_count: u32,
}

/// Season and episode counts for a show as known to the remote catalog.
///
/// A value with `total_seasons == 0` and no seasons means the show exists
/// but has no catalog episodes. That is different from `None`, which means
/// no match was found at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteShowInfo {
    /// Highest season number observed (not a count).
    pub total_seasons: u32,
    /// Per-season episode counts keyed by season number.
    pub seasons: BTreeMap<u32, SeasonCount>,
}

impl RemoteShowInfo {
    /// Build from per-season episode counts.
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let seasons: BTreeMap<u32, SeasonCount> = counts
            .into_iter()
            .map(|(season_number, episode_count)| {
                (
                    season_number,
                    SeasonCount {
                        season_number,
                        episode_count,
                    },
                )
            })
            .collect();
        let total_seasons = seasons.keys().next_back().copied().unwrap_or(0);
        Self {
            total_seasons,
            seasons,
        }
    }

    /// Episode count for a season, if the catalog knows the season.
    pub fn episode_count(&self, season: u32) -> Option<u32> {
        self.seasons.get(&season).map(|s| s.episode_count)
    }

    /// Iterate over regular seasons (season number > 0).
    pub fn regular_seasons(&self) -> impl Iterator<Item = &SeasonCount> {
        self.seasons.values().filter(|s| s.season_number > 0)
    }
}

/// How a show is looked up in the remote catalog.
///
/// The kind is part of the key, so an IMDB ID and a title with the same
/// literal text never share a cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupKey {
    /// Lookup by IMDB identifier (e.g. `tt0903747`).
    ImdbId(String),
    /// Lookup by display title.
    Title(String),
}

impl LookupKey {
    const IMDB_PREFIX: &'static str = "imdb:";
    const TITLE_PREFIX: &'static str = "title:";

    /// Key for an IMDB ID lookup.
    pub fn imdb<S: Into<String>>(id: S) -> Self {
        LookupKey::ImdbId(id.into())
    }

    /// Key for a title lookup.
    pub fn title<S: Into<String>>(title: S) -> Self {
        LookupKey::Title(title.into())
    }

    /// The search term without the kind.
    pub fn term(&self) -> &str {
        match self {
            LookupKey::ImdbId(term) | LookupKey::Title(term) => term,
        }
    }

    /// Parse a persisted key. Unknown prefixes yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(term) = raw.strip_prefix(Self::IMDB_PREFIX) {
            Some(LookupKey::ImdbId(term.to_string()))
        } else {
            raw.strip_prefix(Self::TITLE_PREFIX)
                .map(|term| LookupKey::Title(term.to_string()))
        }
    }
}

impl std::fmt::Display for LookupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupKey::ImdbId(term) => write!(f, "{}{}", Self::IMDB_PREFIX, term),
            LookupKey::Title(term) => write!(f, "{}{}", Self::TITLE_PREFIX, term),
        }
    }
}

/// A cached lookup outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "info", rename_all = "snake_case")]
pub enum CachedLookup {
    /// The catalog matched the show.
    Found(RemoteShowInfo),
    /// The catalog confirmed there is no match.
    NotFound,
}

impl CachedLookup {
    /// Convert into the optional show info callers work with.
    pub fn into_info(self) -> Option<RemoteShowInfo> {
        match self {
            CachedLookup::Found(info) => Some(info),
            CachedLookup::NotFound => None,
        }
    }
}

impl From<Option<RemoteShowInfo>> for CachedLookup {
    fn from(value: Option<RemoteShowInfo>) -> Self {
        match value {
            Some(info) => CachedLookup::Found(info),
            None => CachedLookup::NotFound,
        }
    }
}
