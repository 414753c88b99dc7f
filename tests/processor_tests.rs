//! Integration tests for the parallel show processor.
//!
//! Tests cover:
//! - IMDB ID to title fallback
//! - Deterministic ordering and highest season
//! - Isolation of failing and panicking shows
//! - Caching of confirmed outcomes only
//! - Worker ceiling

use async_trait::async_trait;
use plex_media_export::core::cache::{CacheOptions, LookupCache};
use plex_media_export::core::processor::{ProcessorOptions, ShowProcessor, MAX_WORKERS};
use plex_media_export::core::resolver::CatalogResolver;
use plex_media_export::models::catalog::{CachedLookup, LookupKey, RemoteShowInfo};
use plex_media_export::models::media::{Guid, ItemMetadata, LocalSeason, ShowItem};
use plex_media_export::models::report::{CompletionStatus, FieldValue};
use plex_media_export::services::tvmaze::ShowCatalog;
use plex_media_export::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Catalog answering from a fixed table.
///
/// `"Exploding"` panics and `"Broken"` fails; everything else not in the
/// table is a confirmed miss.
#[derive(Default)]
struct FakeCatalog {
    shows: HashMap<LookupKey, RemoteShowInfo>,
    calls: Mutex<Vec<LookupKey>>,
}

impl FakeCatalog {
    fn with(mut self, key: LookupKey, info: RemoteShowInfo) -> Self {
        self.shows.insert(key, info);
        self
    }

    fn calls(&self) -> Vec<LookupKey> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShowCatalog for FakeCatalog {
    async fn lookup(&self, key: &LookupKey) -> Result<Option<RemoteShowInfo>> {
        self.calls.lock().unwrap().push(key.clone());
        match key.term() {
            "Exploding" => panic!("catalog exploded"),
            "Broken" => Err(Error::other("connection reset")),
            _ => Ok(self.shows.get(key).cloned()),
        }
    }
}

fn show(title: &str, imdb: Option<&str>, seasons: &[(i64, u32)]) -> ShowItem {
    ShowItem {
        metadata: ItemMetadata {
            title: Some(title.to_string()),
            year: Some(2010),
            ..Default::default()
        },
        guids: imdb
            .map(|id| vec![Guid { id: format!("imdb://{}", id) }])
            .unwrap_or_default(),
        seasons: seasons
            .iter()
            .map(|&(index, count)| LocalSeason {
                index: Some(index),
                leaf_count: Some(count),
            })
            .collect(),
    }
}

fn processor(catalog: Arc<FakeCatalog>, cache: Option<Arc<LookupCache>>) -> ShowProcessor {
    let resolver = CatalogResolver::new(catalog, cache);
    ShowProcessor::new(
        resolver,
        vec!["Title".to_string(), "Year".to_string()],
        ProcessorOptions {
            max_workers: 3,
            show_progress: false,
        },
    )
}

fn title_of(fields: &plex_media_export::models::report::FieldRecord) -> String {
    fields.get("Title").map(|v| v.to_string()).unwrap_or_default()
}

#[tokio::test]
async fn test_imdb_lookup_preferred() {
    let catalog = Arc::new(
        FakeCatalog::default()
            .with(LookupKey::imdb("tt1"), RemoteShowInfo::from_counts([(1, 10)])),
    );
    let (records, _) = processor(catalog.clone(), None)
        .process_all(&[show("Lost", Some("tt1"), &[(1, 10)])])
        .await;

    assert_eq!(catalog.calls(), vec![LookupKey::imdb("tt1")]);
    assert_eq!(records[0].series_cell().status, CompletionStatus::Complete);
}

#[tokio::test]
async fn test_falls_back_to_title() {
    let catalog = Arc::new(
        FakeCatalog::default()
            .with(LookupKey::title("Lost"), RemoteShowInfo::from_counts([(1, 10), (2, 8)])),
    );
    let (records, max_season) = processor(catalog.clone(), None)
        .process_all(&[show("Lost", Some("tt404"), &[(1, 10)])])
        .await;

    assert_eq!(
        catalog.calls(),
        vec![LookupKey::imdb("tt404"), LookupKey::title("Lost")]
    );
    assert_eq!(records[0].series_cell().text, "1/2");
    assert_eq!(max_season, 2);
}

#[tokio::test]
async fn test_sorted_by_title_case_insensitive() {
    let catalog = Arc::new(FakeCatalog::default());
    let shows: Vec<ShowItem> = ["the wire", "Alias", "Sherlock", "alf", "Fargo"]
        .iter()
        .map(|t| show(t, None, &[(1, 1)]))
        .collect();

    let (records, _) = processor(catalog, None).process_all(&shows).await;
    let titles: Vec<String> = records.iter().map(|r| title_of(&r.fields)).collect();
    assert_eq!(titles, vec!["alf", "Alias", "Fargo", "Sherlock", "the wire"]);
}

#[tokio::test]
async fn test_max_season_from_both_sides() {
    let catalog = Arc::new(
        FakeCatalog::default()
            .with(LookupKey::title("Remote Long"), RemoteShowInfo::from_counts([(1, 5), (7, 5)])),
    );
    let shows = vec![
        show("Local Long", None, &[(1, 5), (9, 3)]),
        show("Remote Long", None, &[(1, 5)]),
    ];

    let (_, max_season) = processor(catalog, None).process_all(&shows).await;
    assert_eq!(max_season, 9);
}

#[tokio::test]
async fn test_panicking_lookup_only_affects_its_show() {
    let catalog = Arc::new(
        FakeCatalog::default()
            .with(LookupKey::title("Dark"), RemoteShowInfo::from_counts([(1, 10)]))
            .with(LookupKey::title("Lost"), RemoteShowInfo::from_counts([(1, 25)])),
    );
    let shows = vec![
        show("Lost", None, &[(1, 25)]),
        show("Exploding", None, &[(1, 3)]),
        show("Dark", None, &[(1, 10)]),
        show("Broken", None, &[(1, 2)]),
    ];

    let (records, _) = processor(catalog, None).process_all(&shows).await;
    assert_eq!(records.len(), 4);

    let by_title: HashMap<String, _> = records.iter().map(|r| (title_of(&r.fields), r)).collect();
    assert_eq!(by_title["Lost"].series_cell().status, CompletionStatus::Complete);
    assert_eq!(by_title["Dark"].series_cell().status, CompletionStatus::Complete);

    let exploded = by_title["Exploding"];
    assert!(exploded.remote_info.is_none());
    assert_eq!(exploded.fields.get("Year"), Some(&FieldValue::NotAvailable));

    let broken = by_title["Broken"];
    assert!(broken.remote_info.is_none());
    assert_eq!(broken.series_cell().text, "1/?");
}

#[tokio::test]
async fn test_only_confirmed_outcomes_are_cached() {
    let catalog = Arc::new(
        FakeCatalog::default()
            .with(LookupKey::title("Dark"), RemoteShowInfo::from_counts([(1, 10)])),
    );
    let cache = Arc::new(LookupCache::in_memory(CacheOptions::default()));
    let shows = vec![
        show("Dark", None, &[(1, 10)]),
        show("Unknown Show", None, &[(1, 1)]),
        show("Broken", None, &[(1, 1)]),
    ];

    processor(catalog.clone(), Some(cache.clone()))
        .process_all(&shows)
        .await;

    assert!(matches!(
        cache.get(&LookupKey::title("Dark")),
        Some(CachedLookup::Found(_))
    ));
    assert_eq!(
        cache.get(&LookupKey::title("Unknown Show")),
        Some(CachedLookup::NotFound)
    );
    assert_eq!(cache.get(&LookupKey::title("Broken")), None);

    // Second run is served from the cache except for the failed lookup.
    let before = catalog.calls().len();
    processor(catalog.clone(), Some(cache)).process_all(&shows).await;
    assert_eq!(catalog.calls().len(), before + 1);
}

/// Catalog that sleeps on every lookup and records peak concurrency.
#[derive(Default)]
struct SlowCatalog {
    active: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl ShowCatalog for SlowCatalog {
    async fn lookup(&self, _key: &LookupKey) -> Result<Option<RemoteShowInfo>> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(None)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_worker_count_is_capped() {
    let catalog = Arc::new(SlowCatalog::default());
    let processor = ShowProcessor::new(
        CatalogResolver::uncached(catalog.clone()),
        vec!["Title".to_string()],
        ProcessorOptions {
            max_workers: 40,
            show_progress: false,
        },
    );
    let shows: Vec<ShowItem> = (0..40)
        .map(|i| show(&format!("Show {}", i), None, &[]))
        .collect();

    let (records, _) = processor.process_all(&shows).await;

    assert_eq!(records.len(), 40);
    let peak = catalog.peak.load(Ordering::SeqCst);
    assert!(peak >= 1);
    assert!(peak <= MAX_WORKERS, "peak concurrency {} exceeds {}", peak, MAX_WORKERS);
}
