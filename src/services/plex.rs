//! Plex Media Server client.

use crate::models::config::PlexConfig;
use crate::models::media::{LibrarySection, LocalSeason, MovieItem, SectionType, ShowItem};
use crate::{Error, Result};
use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Concurrent season fetches per section.
const SEASON_FETCH_CONCURRENCY: usize = 10;

/// Every Plex JSON response is wrapped in a `MediaContainer`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    media_container: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfo {
    #[serde(default)]
    friendly_name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectoryList {
    #[serde(rename = "Directory", default)]
    directories: Vec<LibrarySection>,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct MetadataList<T> {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<T>,
}

/// Server identity reported by the root endpoint.
#[derive(Debug, Clone)]
pub struct ServerIdentity {
    pub name: String,
    pub version: Option<String>,
}

/// Plex HTTP client authenticated with a static token.
pub struct PlexClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl PlexClient {
    /// Create a client from configuration.
    pub fn new(config: &PlexConfig) -> Result<Self> {
        let base_url = config
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(Error::PlexUrlMissing)?;
        let token = config
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(Error::PlexTokenMissing)?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }

    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("X-Plex-Token", &self.token)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.build_request(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::PlexStatus {
                status: status.as_u16(),
                url,
            });
        }

        let envelope: Envelope<T> = resp.json().await?;
        Ok(envelope.media_container)
    }

    /// Connect to the server and read its name.
    pub async fn server_identity(&self) -> Result<ServerIdentity> {
        let info: ServerInfo = self.get_json("/").await?;
        Ok(ServerIdentity {
            name: info
                .friendly_name
                .unwrap_or_else(|| "Plex Media Server".to_string()),
            version: info.version,
        })
    }

    /// Server friendly name.
    pub async fn server_name(&self) -> Result<String> {
        Ok(self.server_identity().await?.name)
    }

    /// Movie and show library sections.
    pub async fn sections(&self) -> Result<Vec<LibrarySection>> {
        let list: DirectoryList = self.get_json("/library/sections").await?;
        Ok(list
            .directories
            .into_iter()
            .filter(|s| s.section_type != SectionType::Other)
            .collect())
    }

    async fn section_items<T: DeserializeOwned>(&self, section: &LibrarySection) -> Result<Vec<T>> {
        let path = format!(
            "/library/sections/{}/all?includeGuids=1",
            urlencoding::encode(&section.key)
        );
        let list: MetadataList<T> = self.get_json(&path).await?;
        Ok(list.metadata)
    }

    /// All movies in a section.
    pub async fn movies(&self, section: &LibrarySection) -> Result<Vec<MovieItem>> {
        let movies = self.section_items(section).await?;
        tracing::info!("Fetched {} movies from '{}'", movies.len(), section.title);
        Ok(movies)
    }

    /// All shows in a section, with their local seasons filled in.
    pub async fn shows(&self, section: &LibrarySection) -> Result<Vec<ShowItem>> {
        let shows: Vec<ShowItem> = self.section_items(section).await?;
        tracing::info!("Fetched {} shows from '{}'", shows.len(), section.title);

        let shows: Vec<ShowItem> = stream::iter(shows)
            .map(|mut show| async move {
                show.seasons = self.seasons_or_empty(&show).await;
                show
            })
            .buffered(SEASON_FETCH_CONCURRENCY)
            .collect()
            .await;
        Ok(shows)
    }

    /// Seasons of a show.
    pub async fn seasons(&self, rating_key: &str) -> Result<Vec<LocalSeason>> {
        let path = format!(
            "/library/metadata/{}/children",
            urlencoding::encode(rating_key)
        );
        let list: MetadataList<LocalSeason> = self.get_json(&path).await?;
        Ok(list.metadata)
    }

    async fn seasons_or_empty(&self, show: &ShowItem) -> Vec<LocalSeason> {
        let title = show.metadata.display_title();
        let Some(key) = show.metadata.rating_key.as_deref() else {
            tracing::warn!("Show '{}' has no rating key; no local seasons", title);
            return Vec::new();
        };

        match self.seasons(key).await {
            Ok(seasons) => seasons,
            Err(e) => {
                tracing::error!("Failed to fetch seasons for '{}': {}", title, e);
                Vec::new()
            }
        }
    }
}
