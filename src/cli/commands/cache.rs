//! Cache command implementation.

use crate::core::cache::{CacheOptions, LookupCache};
use crate::models::config::Config;
use crate::Result;
use colored::Colorize;

fn open(config: &Config) -> LookupCache {
    LookupCache::load(
        &config.cache_file(),
        CacheOptions::new(config.cache.capacity, config.cache.max_age_days),
    )
}

/// Print cache statistics.
pub async fn stats(config: &Config) -> Result<()> {
    let cache = open(config);
    let stats = cache.stats();

    println!("{}", "TVMaze lookup cache".bold().cyan());
    println!("  File:      {}", config.cache_file().display());
    println!("  Entries:   {}", stats.entries);
    println!("  No match:  {}", stats.negative_entries);
    println!("  Expired:   {} (dropped on load)", stats.expired_on_load);
    println!("  Max age:   {} days", config.cache.max_age_days);
    Ok(())
}

/// Delete the cache file.
pub async fn clear(config: &Config) -> Result<()> {
    let cache = open(config);
    let entries = cache.len();
    cache.clear()?;
    println!("{} Cleared {} cached lookups", "[OK]".green(), entries);
    Ok(())
}
