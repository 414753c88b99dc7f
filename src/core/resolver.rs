//! Remote catalog resolution through the lookup cache.

use crate::core::cache::LookupCache;
use crate::models::catalog::{CachedLookup, LookupKey, RemoteShowInfo};
use crate::services::tvmaze::ShowCatalog;
use std::sync::Arc;

/// Resolves shows against a catalog, consulting the cache first.
///
/// Confirmed outcomes (a match or a confirmed miss) are cached. Failed
/// lookups are logged and reported as `None` without touching the cache,
/// so the next run retries them.
#[derive(Clone)]
pub struct CatalogResolver {
    catalog: Arc<dyn ShowCatalog>,
    cache: Option<Arc<LookupCache>>,
}

impl CatalogResolver {
    pub fn new(catalog: Arc<dyn ShowCatalog>, cache: Option<Arc<LookupCache>>) -> Self {
        Self { catalog, cache }
    }

    /// Resolver that always asks the catalog.
    pub fn uncached(catalog: Arc<dyn ShowCatalog>) -> Self {
        Self::new(catalog, None)
    }

    pub fn cache(&self) -> Option<&Arc<LookupCache>> {
        self.cache.as_ref()
    }

    /// Resolve one lookup key.
    pub async fn resolve(&self, key: &LookupKey) -> Option<RemoteShowInfo> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(key) {
                tracing::debug!("Cache hit for {}", key);
                return hit.into_info();
            }
            tracing::debug!("Cache miss for {}", key);
        }

        match self.catalog.lookup(key).await {
            Ok(info) => {
                if let Some(cache) = &self.cache {
                    cache.put(key.clone(), CachedLookup::from(info.clone()));
                }
                info
            }
            Err(e) => {
                tracing::error!("Catalog lookup failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Resolve a show by IMDB ID, falling back to its title when the ID is
    /// missing or finds no match.
    pub async fn resolve_show(
        &self,
        imdb_id: Option<&str>,
        title: Option<&str>,
    ) -> Option<RemoteShowInfo> {
        if let Some(id) = imdb_id.map(str::trim).filter(|id| !id.is_empty()) {
            if let Some(info) = self.resolve(&LookupKey::imdb(id)).await {
                return Some(info);
            }
            tracing::debug!("No catalog match for IMDB ID {}", id);
        }

        let title = title.map(str::trim).filter(|t| !t.is_empty())?;
        tracing::debug!("Looking up '{}' by title", title);
        self.resolve(&LookupKey::title(title)).await
    }
}
