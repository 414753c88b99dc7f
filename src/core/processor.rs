//! Parallel show and movie processing.
//!
//! Items are processed on spawned tokio tasks, at most `max_workers` (and
//! never more than [`MAX_WORKERS`]) at a time. A task that panics only
//! costs its own item, which falls back to a minimal record. Results are
//! re-ordered by the sort field afterwards, so completion order never leaks
//! into the report.

use crate::core::fields::{movie_registry, show_registry, sort_field, FieldRegistry};
use crate::core::resolver::CatalogResolver;
use crate::models::media::{MovieItem, ShowItem};
use crate::models::report::{FieldRecord, FieldValue, MovieRecord, ResolutionTier, ShowRecord};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Hard ceiling on concurrent workers, whatever the configuration asks for.
pub const MAX_WORKERS: usize = 10;

/// Worker pool settings.
#[derive(Debug, Clone, Copy)]
pub struct ProcessorOptions {
    /// Upper bound on concurrently processed items.
    pub max_workers: usize,
    /// Draw a progress bar on stderr.
    pub show_progress: bool,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            max_workers: MAX_WORKERS,
            show_progress: true,
        }
    }
}

fn progress_bar(len: usize, what: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(format!("Processing {}", what));
    pb
}

/// Run `work` for every item on a bounded pool of spawned tasks.
///
/// Output order matches input order. `None` marks an item whose task
/// panicked or was cancelled.
async fn run_pool<I, O, F, Fut>(
    items: &[I],
    max_workers: usize,
    pb: &ProgressBar,
    work: F,
) -> Vec<Option<O>>
where
    I: Clone,
    F: Fn(I) -> Fut,
    Fut: Future<Output = O> + Send + 'static,
    O: Send + 'static,
{
    let workers = max_workers.min(MAX_WORKERS).min(items.len()).max(1);
    let semaphore = Arc::new(Semaphore::new(workers));
    tracing::debug!("Processing {} items with {} workers", items.len(), workers);

    let mut handles = Vec::with_capacity(items.len());
    for item in items {
        let semaphore = semaphore.clone();
        let pb = pb.clone();
        let task = work(item.clone());

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let output = task.await;
            pb.inc(1);
            output
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(output) => results.push(Some(output)),
            Err(e) => {
                tracing::error!("Worker task failed: {}", e);
                pb.inc(1);
                results.push(None);
            }
        }
    }
    pb.finish_and_clear();
    results
}

/// Stable, case-insensitive sort by the report's sort field.
fn sort_records<T>(records: &mut [T], field: Option<&str>, fields_of: impl Fn(&T) -> &FieldRecord) {
    let Some(field) = field else {
        return;
    };
    records.sort_by_cached_key(|r| {
        fields_of(r)
            .get(field)
            .map(FieldValue::sort_key)
            .unwrap_or_default()
    });
}

/// Record with the title in place of every selected field that could not
/// be computed.
fn minimal_fields(title: &str, fields: &[String]) -> FieldRecord {
    let mut record = FieldRecord::default();
    for field in fields {
        let value = if field == "Title" {
            FieldValue::Text(title.to_string())
        } else {
            FieldValue::NotAvailable
        };
        record.push(field.as_str(), value);
    }
    if !fields.iter().any(|f| f == "Title") {
        record.push("Title", FieldValue::Text(title.to_string()));
    }
    record
}

/// Processes TV shows: fields, remote resolution and season counts.
pub struct ShowProcessor {
    resolver: CatalogResolver,
    registry: Arc<FieldRegistry<ShowItem>>,
    fields: Arc<Vec<String>>,
    options: ProcessorOptions,
}

impl ShowProcessor {
    pub fn new(resolver: CatalogResolver, fields: Vec<String>, options: ProcessorOptions) -> Self {
        Self {
            resolver,
            registry: Arc::new(show_registry()),
            fields: Arc::new(fields),
            options,
        }
    }

    /// Process every show. Returns the sorted records and the highest
    /// season number seen on either side.
    pub async fn process_all(&self, shows: &[ShowItem]) -> (Vec<ShowRecord>, u32) {
        let max_season = Arc::new(AtomicU32::new(0));
        let pb = progress_bar(shows.len(), "shows", self.options.show_progress);

        let results = run_pool(shows, self.options.max_workers, &pb, |show: ShowItem| {
            let resolver = self.resolver.clone();
            let registry = self.registry.clone();
            let fields = self.fields.clone();
            let max_season = max_season.clone();
            async move {
                let record = process_show(&show, &resolver, &registry, &fields).await;
                max_season.fetch_max(record.max_season(), Ordering::Relaxed);
                record
            }
        })
        .await;

        let mut records: Vec<ShowRecord> = results
            .into_iter()
            .zip(shows)
            .map(|(result, show)| match result {
                Some(record) => record,
                None => {
                    let title = show.metadata.display_title();
                    tracing::error!("Show '{}' could not be processed; writing a minimal row", title);
                    ShowRecord {
                        fields: minimal_fields(title, &self.fields),
                        local_seasons: BTreeMap::new(),
                        remote_info: None,
                    }
                }
            })
            .collect();

        sort_records(&mut records, sort_field(self.fields.as_slice()), |r| &r.fields);
        let max_season = max_season.load(Ordering::Relaxed);
        tracing::info!(
            "Processed {} shows (highest season: {})",
            records.len(),
            max_season
        );
        (records, max_season)
    }
}

/// Build the record for one show.
pub async fn process_show(
    show: &ShowItem,
    resolver: &CatalogResolver,
    registry: &FieldRegistry<ShowItem>,
    fields: &[String],
) -> ShowRecord {
    let title = show.metadata.display_title();
    let record_fields = registry.extract_all(show, fields, title);
    let local_seasons = show.local_season_counts();

    let imdb_id = show.imdb_id();
    let remote_info = resolver
        .resolve_show(imdb_id.as_deref(), show.search_title())
        .await;
    if remote_info.is_none() {
        tracing::debug!("No catalog data for '{}'", title);
    }

    ShowRecord {
        fields: record_fields,
        local_seasons,
        remote_info,
    }
}

/// Processes movies: field extraction and resolution tier.
pub struct MovieProcessor {
    registry: Arc<FieldRegistry<MovieItem>>,
    fields: Arc<Vec<String>>,
    options: ProcessorOptions,
}

impl MovieProcessor {
    pub fn new(fields: Vec<String>, options: ProcessorOptions) -> Self {
        Self {
            registry: Arc::new(movie_registry()),
            fields: Arc::new(fields),
            options,
        }
    }

    /// Process every movie and return the sorted records.
    pub async fn process_all(&self, movies: &[MovieItem]) -> Vec<MovieRecord> {
        let pb = progress_bar(movies.len(), "movies", self.options.show_progress);

        let results = run_pool(movies, self.options.max_workers, &pb, |movie: MovieItem| {
            let registry = self.registry.clone();
            let fields = self.fields.clone();
            async move { process_movie(&movie, &registry, &fields) }
        })
        .await;

        let mut records: Vec<MovieRecord> = results
            .into_iter()
            .zip(movies)
            .map(|(result, movie)| {
                result.unwrap_or_else(|| {
                    let title = movie.metadata.display_title();
                    tracing::error!("Movie '{}' could not be processed; writing a minimal row", title);
                    MovieRecord {
                        fields: minimal_fields(title, &self.fields),
                        resolution: ResolutionTier::Unknown,
                    }
                })
            })
            .collect();

        sort_records(&mut records, sort_field(self.fields.as_slice()), |r| &r.fields);
        tracing::info!("Processed {} movies", records.len());
        records
    }
}

/// Build the record for one movie.
pub fn process_movie(
    movie: &MovieItem,
    registry: &FieldRegistry<MovieItem>,
    fields: &[String],
) -> MovieRecord {
    let resolution = movie
        .primary_media()
        .and_then(|m| m.video_resolution.as_deref())
        .map(ResolutionTier::classify)
        .unwrap_or(ResolutionTier::Unknown);

    MovieRecord {
        fields: registry.extract_all(movie, fields, movie.metadata.display_title()),
        resolution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_fields_keeps_columns() {
        let fields = vec!["Year".to_string(), "Title".to_string()];
        let record = minimal_fields("Lost", &fields);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("Year"), Some(&FieldValue::NotAvailable));
        assert_eq!(record.get("Title"), Some(&FieldValue::Text("Lost".into())));

        let record = minimal_fields("Lost", &["Year".to_string()]);
        assert_eq!(record.get("Title"), Some(&FieldValue::Text("Lost".into())));
    }

    #[test]
    fn test_sort_is_case_insensitive_and_stable() {
        let mk = |title: &str, year: i64| {
            let mut r = FieldRecord::default();
            r.push("Title", FieldValue::Text(title.to_string()));
            r.push("Year", FieldValue::Integer(year));
            r
        };
        let mut records = vec![mk("b", 1), mk("A", 2), mk("a", 3)];
        sort_records(&mut records, Some("Title"), |r| r);
        let years: Vec<_> = records.iter().map(|r| r.get("Year").cloned()).collect();
        assert_eq!(
            years,
            vec![
                Some(FieldValue::Integer(2)),
                Some(FieldValue::Integer(3)),
                Some(FieldValue::Integer(1))
            ]
        );
    }

    #[tokio::test]
    async fn test_movie_resolution_tier() {
        let mut movie = MovieItem::default();
        movie.metadata.title = Some("Dune".to_string());
        movie.media = vec![crate::models::media::MediaInfo {
            video_resolution: Some("4k".to_string()),
            ..Default::default()
        }];

        let processor = MovieProcessor::new(
            vec!["Title".to_string()],
            ProcessorOptions {
                max_workers: 2,
                show_progress: false,
            },
        );
        let records = processor.process_all(&[movie]).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].resolution, ResolutionTier::UltraHd);
    }
}
