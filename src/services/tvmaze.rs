//! TVMaze API client.

use crate::models::catalog::{LookupKey, RemoteShowInfo};
use crate::models::config::TvMazeConfig;
use crate::services::retry::{retry_with_backoff, RetryPolicy};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Default TVMaze API root.
pub const TVMAZE_BASE_URL: &str = "https://api.tvmaze.com";

/// Source of remote season/episode counts.
///
/// `Ok(None)` means the catalog confirmed there is no match. `Err` means the
/// lookup failed and says nothing about the show.
#[async_trait]
pub trait ShowCatalog: Send + Sync {
    async fn lookup(&self, key: &LookupKey) -> Result<Option<RemoteShowInfo>>;
}

/// Show as returned by `/lookup/shows`.
#[derive(Debug, Deserialize)]
pub struct ShowSummary {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

/// One ranked entry of `/search/shows`.
#[derive(Debug, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub score: Option<f64>,
    pub show: ShowSummary,
}

/// One episode of `/shows/<id>/episodes`.
#[derive(Debug, Deserialize)]
pub struct Episode {
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub number: Option<u32>,
}

/// TVMaze API client.
pub struct TvMazeClient {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl TvMazeClient {
    /// Create a client from configuration.
    pub fn new(config: &TvMazeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("plex-media-export/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            retry: config.retry_policy(),
        })
    }

    /// Create a client with default settings against another API root.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let config = TvMazeConfig {
            base_url: base_url.to_string(),
            ..TvMazeConfig::default()
        };
        Self::new(&config)
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check whether the API answers at all.
    pub async fn verify_connection(&self) -> Result<bool> {
        let url = format!("{}/shows/1", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => Err(e.into()),
        }
    }

    /// GET a JSON document with retries. A 404 yields `Ok(None)`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        let operation = format!("GET {}", path);

        retry_with_backoff(&self.retry, &operation, || async {
            let resp = self.client.get(&url).query(query).send().await?;
            let status = resp.status();

            if status == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(Error::CatalogStatus {
                    status: status.as_u16(),
                    url: url.clone(),
                });
            }

            let body = resp.text().await?;
            let value = serde_json::from_str(&body)?;
            Ok(Some(value))
        })
        .await
    }

    /// Find a show ID by IMDB identifier.
    pub async fn find_show_by_imdb(&self, imdb_id: &str) -> Result<Option<u64>> {
        let show: Option<ShowSummary> = self
            .get_json("/lookup/shows", &[("imdb", imdb_id)])
            .await?;
        Ok(show.map(|s| s.id))
    }

    /// Find a show ID by title. The first ranked hit is taken as the match.
    pub async fn find_show_by_title(&self, title: &str) -> Result<Option<u64>> {
        let hits: Option<Vec<SearchHit>> =
            self.get_json("/search/shows", &[("q", title)]).await?;

        let Some(hit) = hits.and_then(|h| h.into_iter().next()) else {
            return Ok(None);
        };
        tracing::debug!(
            "TVMaze title search '{}' matched '{}' (id {}, score {:?})",
            title,
            hit.show.name.as_deref().unwrap_or("?"),
            hit.show.id,
            hit.score
        );
        Ok(Some(hit.show.id))
    }

    /// Fetch per-season episode counts for a show.
    pub async fn fetch_episode_counts(&self, show_id: u64) -> Result<Option<RemoteShowInfo>> {
        let path = format!("/shows/{}/episodes", show_id);
        let episodes: Option<Vec<Episode>> = self.get_json(&path, &[]).await?;
        Ok(episodes.map(|e| group_episodes(&e)))
    }

    /// Resolve a show by IMDB identifier. Every failure is logged and
    /// reported as `None`.
    pub async fn resolve_by_imdb_id(&self, imdb_id: &str) -> Option<RemoteShowInfo> {
        self.resolve_logged(&LookupKey::imdb(imdb_id)).await
    }

    /// Resolve a show by title. Every failure is logged and reported as `None`.
    pub async fn resolve_by_title(&self, title: &str) -> Option<RemoteShowInfo> {
        self.resolve_logged(&LookupKey::title(title)).await
    }

    async fn resolve_logged(&self, key: &LookupKey) -> Option<RemoteShowInfo> {
        match self.lookup(key).await {
            Ok(info) => info,
            Err(e) => {
                tracing::error!("TVMaze lookup failed for '{}': {}", key.term(), e);
                None
            }
        }
    }
}

#[async_trait]
impl ShowCatalog for TvMazeClient {
    async fn lookup(&self, key: &LookupKey) -> Result<Option<RemoteShowInfo>> {
        let term = key.term().trim();
        if term.is_empty() {
            return Ok(None);
        }

        let show_id = match key {
            LookupKey::ImdbId(_) => self.find_show_by_imdb(term).await?,
            LookupKey::Title(_) => self.find_show_by_title(term).await?,
        };

        match show_id {
            Some(id) => self.fetch_episode_counts(id).await,
            None => Ok(None),
        }
    }
}

/// Group a flat episode list into per-season counts.
///
/// Episodes without a season number are discarded. An empty list yields an
/// info value with zero seasons, which still counts as a match.
pub fn group_episodes(episodes: &[Episode]) -> RemoteShowInfo {
    let mut counts: BTreeMap<u32, u32> = BTreeMap::new();
    for season in episodes.iter().filter_map(|e| e.season) {
        *counts.entry(season).or_insert(0) += 1;
    }
    RemoteShowInfo::from_counts(counts)
}
