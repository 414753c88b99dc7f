//! Lookup command implementation.

use crate::core::cache::{CacheOptions, LookupCache};
use crate::core::resolver::CatalogResolver;
use crate::models::config::Config;
use crate::services::tvmaze::{ShowCatalog, TvMazeClient};
use crate::utils::format::season_header;
use crate::{Error, Result};
use colored::Colorize;
use std::sync::Arc;

/// Resolve one show and print its remote season counts.
pub async fn lookup(config: &Config, imdb: Option<&str>, title: Option<&str>) -> Result<()> {
    if imdb.is_none() && title.is_none() {
        return Err(Error::other("Give --imdb and/or --title"));
    }

    let cache = Arc::new(LookupCache::load(
        &config.cache_file(),
        CacheOptions::new(config.cache.capacity, config.cache.max_age_days),
    ));
    let catalog: Arc<dyn ShowCatalog> = Arc::new(TvMazeClient::new(&config.tvmaze)?);
    let resolver = CatalogResolver::new(catalog, Some(cache.clone()));

    let info = resolver.resolve_show(imdb, title).await;
    if let Err(e) = cache.save() {
        tracing::warn!("Failed to save lookup cache: {}", e);
    }

    let label = title.or(imdb).unwrap_or_default();
    let Some(info) = info else {
        println!("{} No TVMaze match for '{}'", "[FAIL]".red(), label);
        return Ok(());
    };

    println!("{} {}", "[OK]".green(), label.bold());
    println!("  Highest season: {}", info.total_seasons);
    for season in info.seasons.values() {
        println!(
            "  {}  {} episodes",
            season_header(season.season_number),
            season.episode_count
        );
    }
    println!("  Regular seasons: {}", info.regular_seasons().count());
    Ok(())
}
