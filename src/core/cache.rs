//! Two-tier lookup cache for remote catalog results.
//!
//! A small in-process LRU sits in front of the full persisted map. The file
//! is read once when the cache is loaded and written once by [`LookupCache::save`].
//! Both confirmed matches and confirmed misses are stored.

use crate::models::catalog::{CachedLookup, LookupKey};
use crate::utils::fs::write_atomic;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Persisted file format version.
pub const CACHE_VERSION: u32 = 1;

/// Cache sizing and expiry.
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    /// Hot tier capacity.
    pub capacity: usize,
    /// Age after which an entry counts as a miss.
    pub max_age: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            capacity: 256,
            max_age: Duration::days(30),
        }
    }
}

impl CacheOptions {
    pub fn new(capacity: usize, max_age_days: i64) -> Self {
        Self {
            capacity,
            max_age: Duration::days(max_age_days.max(0)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    timestamp: DateTime<Utc>,
    data: CachedLookup,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: BTreeMap<String, CacheEntry>,
    saved_at: DateTime<Utc>,
}

/// Cache counters for the `cache stats` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries in the persisted tier.
    pub entries: usize,
    /// Entries in the hot tier.
    pub hot_entries: usize,
    /// Entries of the persisted tier that are confirmed misses.
    pub negative_entries: usize,
    /// Entries dropped as expired when the file was loaded.
    pub expired_on_load: usize,
}

struct Tiers {
    hot: LruCache<LookupKey, CacheEntry>,
    persisted: HashMap<LookupKey, CacheEntry>,
}

/// Lookup cache shared by all workers of a run.
pub struct LookupCache {
    path: Option<PathBuf>,
    options: CacheOptions,
    tiers: Mutex<Tiers>,
    expired_on_load: usize,
}

impl LookupCache {
    /// Create an empty cache that is never persisted.
    pub fn in_memory(options: CacheOptions) -> Self {
        Self::with_entries(None, options, HashMap::new(), 0)
    }

    fn with_entries(
        path: Option<PathBuf>,
        options: CacheOptions,
        persisted: HashMap<LookupKey, CacheEntry>,
        expired_on_load: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(options.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            path,
            options,
            tiers: Mutex::new(Tiers {
                hot: LruCache::new(capacity),
                persisted,
            }),
            expired_on_load,
        }
    }

    /// Load the persisted tier from `path`.
    ///
    /// A missing file starts empty. An unreadable or malformed file is
    /// logged and also starts empty; it is overwritten on the next save.
    pub fn load(path: &Path, options: CacheOptions) -> Self {
        let (entries, expired) = match read_cache_file(path, options.max_age) {
            Ok(Some(loaded)) => loaded,
            Ok(None) => {
                tracing::debug!("No cache file at {}", path.display());
                (HashMap::new(), 0)
            }
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable cache file {}: {}. Starting with an empty cache",
                    path.display(),
                    e
                );
                (HashMap::new(), 0)
            }
        };

        tracing::info!(
            "Loaded {} cached lookups from {} ({} expired)",
            entries.len(),
            path.display(),
            expired
        );
        Self::with_entries(Some(path.to_path_buf()), options, entries, expired)
    }

    /// Backing file, if the cache is persisted.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.timestamp > self.options.max_age
    }

    /// Look up a key. Expired entries are evicted and reported as a miss.
    pub fn get(&self, key: &LookupKey) -> Option<CachedLookup> {
        let now = Utc::now();
        let mut tiers = self.tiers.lock();

        if let Some(entry) = tiers.hot.get(key) {
            if !self.is_expired(entry, now) {
                return Some(entry.data.clone());
            }
            tiers.hot.pop(key);
            tiers.persisted.remove(key);
            tracing::debug!("Cache entry expired: {}", key);
            return None;
        }

        let entry = tiers.persisted.get(key)?.clone();
        if self.is_expired(&entry, now) {
            tiers.persisted.remove(key);
            tracing::debug!("Cache entry expired: {}", key);
            return None;
        }

        let data = entry.data.clone();
        tiers.hot.put(key.clone(), entry);
        Some(data)
    }

    /// Store a lookup outcome stamped with the current time.
    pub fn put(&self, key: LookupKey, value: CachedLookup) {
        self.put_at(key, value, Utc::now());
    }

    /// Store a lookup outcome with an explicit timestamp.
    pub fn put_at(&self, key: LookupKey, value: CachedLookup, timestamp: DateTime<Utc>) {
        let entry = CacheEntry {
            timestamp,
            data: value,
        };
        let mut tiers = self.tiers.lock();
        tiers.hot.put(key.clone(), entry.clone());
        tiers.persisted.insert(key, entry);
    }

    /// Number of entries in the persisted tier.
    pub fn len(&self) -> usize {
        self.tiers.lock().persisted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let tiers = self.tiers.lock();
        CacheStats {
            entries: tiers.persisted.len(),
            hot_entries: tiers.hot.len(),
            negative_entries: tiers
                .persisted
                .values()
                .filter(|e| e.data == CachedLookup::NotFound)
                .count(),
            expired_on_load: self.expired_on_load,
        }
    }

    /// Drop every entry and remove the backing file.
    pub fn clear(&self) -> Result<()> {
        {
            let mut tiers = self.tiers.lock();
            tiers.hot.clear();
            tiers.persisted.clear();
        }
        if let Some(path) = &self.path {
            if path.exists() {
                std::fs::remove_file(path)?;
                tracing::info!("Removed cache file {}", path.display());
            }
        }
        Ok(())
    }

    /// Write the persisted tier to disk. In-memory caches do nothing.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let now = Utc::now();
        let entries: BTreeMap<String, CacheEntry> = {
            let tiers = self.tiers.lock();
            tiers
                .persisted
                .iter()
                .filter(|(_, entry)| !self.is_expired(entry, now))
                .map(|(key, entry)| (key.to_string(), entry.clone()))
                .collect()
        };

        let file = CacheFile {
            version: CACHE_VERSION,
            entries,
            saved_at: now,
        };
        let json = serde_json::to_vec_pretty(&file)?;
        write_atomic(path, &json)?;

        tracing::info!(
            "Saved {} cached lookups to {}",
            file.entries.len(),
            path.display()
        );
        Ok(())
    }
}

type LoadedEntries = (HashMap<LookupKey, CacheEntry>, usize);

fn read_cache_file(path: &Path, max_age: Duration) -> Result<Option<LoadedEntries>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    let file: CacheFile = serde_json::from_str(&content)?;
    if file.version != CACHE_VERSION {
        return Err(crate::Error::other(format!(
            "unsupported cache version {}",
            file.version
        )));
    }

    let now = Utc::now();
    let mut expired = 0;
    let mut entries = HashMap::with_capacity(file.entries.len());
    for (raw_key, entry) in file.entries {
        let Some(key) = LookupKey::parse(&raw_key) else {
            tracing::debug!("Skipping cache entry with unknown key '{}'", raw_key);
            continue;
        };
        if now - entry.timestamp > max_age {
            expired += 1;
            continue;
        }
        entries.insert(key, entry);
    }
    Ok(Some((entries, expired)))
}
