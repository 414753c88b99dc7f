//! Export command implementation.
//!
//! Reads the selected Plex sections, enriches shows from TVMaze and writes
//! one workbook with a sheet per section.

use crate::core::cache::{CacheOptions, LookupCache};
use crate::core::processor::{MovieProcessor, ProcessorOptions, ShowProcessor};
use crate::core::report::{default_report_path, ReportWriter};
use crate::core::resolver::CatalogResolver;
use crate::models::config::Config;
use crate::models::media::{LibrarySection, SectionType};
use crate::services::plex::PlexClient;
use crate::services::tvmaze::{ShowCatalog, TvMazeClient};
use crate::utils::fs;
use crate::{Error, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Options given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Overrides the configured export directory.
    pub output_dir: Option<PathBuf>,
    /// Section titles to export; empty exports every section.
    pub sections: Vec<String>,
    /// Skip the persisted lookup cache.
    pub no_cache: bool,
}

/// Counters printed at the end of a run.
#[derive(Debug, Default)]
struct ExportSummary {
    movies: usize,
    shows: usize,
    shows_without_match: usize,
    failed_sections: Vec<String>,
}

/// Keep the sections whose title matches one of `wanted` (case-insensitive).
pub fn filter_sections(sections: Vec<LibrarySection>, wanted: &[String]) -> Vec<LibrarySection> {
    if wanted.is_empty() {
        return sections;
    }

    for name in wanted {
        if !sections.iter().any(|s| s.title.eq_ignore_ascii_case(name)) {
            tracing::warn!("Library section '{}' not found", name);
        }
    }
    sections
        .into_iter()
        .filter(|s| wanted.iter().any(|w| s.title.eq_ignore_ascii_case(w)))
        .collect()
}

/// Run a full export and return the report path, if anything was written.
pub async fn export(config: &Config, options: ExportOptions) -> Result<Option<PathBuf>> {
    let started = Instant::now();
    println!("{}", "[EXPORT] Exporting Plex libraries...".bold().cyan());
    println!();

    let mut config = config.clone();
    if let Some(dir) = options.output_dir {
        config.export.output_dir = dir;
    }

    let validation = config.validate();
    for warning in &validation.warnings {
        tracing::warn!("{}", warning);
    }
    if !validation.is_ok() {
        return Err(Error::InvalidConfig(validation.errors.join("; ")));
    }

    let output_dir = config.export.output_dir.clone();
    fs::create_dir_all(&output_dir)?;
    let report_path = default_report_path(&output_dir);
    if !fs::is_writable(&report_path) {
        return Err(Error::PermissionDenied(output_dir.display().to_string()));
    }

    let plex = PlexClient::new(&config.plex)?;
    let server = plex.server_name().await?;
    println!("Connected to Plex server: {}", server.green());

    let sections = filter_sections(plex.sections().await?, &options.sections);
    if sections.is_empty() {
        println!("{}", "No movie or show sections to export.".yellow());
        return Ok(None);
    }

    let cache = if options.no_cache {
        None
    } else {
        let cache_options = CacheOptions::new(config.cache.capacity, config.cache.max_age_days);
        Some(Arc::new(LookupCache::load(&config.cache_file(), cache_options)))
    };
    let catalog: Arc<dyn ShowCatalog> = Arc::new(TvMazeClient::new(&config.tvmaze)?);
    let resolver = CatalogResolver::new(catalog, cache.clone());

    let processor_options = ProcessorOptions {
        max_workers: config.export.max_workers,
        show_progress: true,
    };
    let movie_processor = MovieProcessor::new(config.export.movie_fields.clone(), processor_options);
    let show_processor = ShowProcessor::new(
        resolver,
        config.export.show_fields.clone(),
        processor_options,
    );

    let mut writer = ReportWriter::new();
    let mut summary = ExportSummary::default();

    for section in &sections {
        println!("{} {} ({})", "->".cyan(), section.title.bold(), section.section_type);
        let result = match section.section_type {
            SectionType::Movie => {
                export_movies(&plex, section, &movie_processor, &mut writer, &config, &mut summary).await
            }
            SectionType::Show => {
                export_shows(&plex, section, &show_processor, &mut writer, &config, &mut summary).await
            }
            SectionType::Other => Ok(()),
        };

        if let Err(e) = result {
            tracing::error!("Failed to export section '{}': {}", section.title, e);
            summary.failed_sections.push(section.title.clone());
        }
    }

    if let Some(cache) = &cache {
        if let Err(e) = cache.save() {
            tracing::warn!("Failed to save lookup cache: {}", e);
        }
    }

    let written = if writer.sheet_count() > 0 {
        writer.save(&report_path)?;
        Some(report_path)
    } else {
        None
    };

    print_summary(&summary, written.as_deref(), started.elapsed().as_secs_f64());
    Ok(written)
}

async fn export_movies(
    plex: &PlexClient,
    section: &LibrarySection,
    processor: &MovieProcessor,
    writer: &mut ReportWriter,
    config: &Config,
    summary: &mut ExportSummary,
) -> Result<()> {
    let movies = plex.movies(section).await?;
    let records = processor.process_all(&movies).await;
    writer.add_movie_sheet(&section.title, &config.export.movie_fields, &records)?;
    summary.movies += records.len();
    Ok(())
}

async fn export_shows(
    plex: &PlexClient,
    section: &LibrarySection,
    processor: &ShowProcessor,
    writer: &mut ReportWriter,
    config: &Config,
    summary: &mut ExportSummary,
) -> Result<()> {
    let shows = plex.shows(section).await?;
    let (records, max_season) = processor.process_all(&shows).await;
    writer.add_show_sheet(&section.title, &config.export.show_fields, &records, max_season)?;
    summary.shows += records.len();
    summary.shows_without_match += records.iter().filter(|r| r.remote_info.is_none()).count();
    Ok(())
}

fn print_summary(summary: &ExportSummary, report: Option<&std::path::Path>, seconds: f64) {
    println!();
    println!("{}", "Summary".bold());
    println!("  Movies exported:     {}", summary.movies);
    println!("  Shows exported:      {}", summary.shows);
    if summary.shows_without_match > 0 {
        println!(
            "  Shows without TVMaze match: {}",
            summary.shows_without_match.to_string().yellow()
        );
    }
    if !summary.failed_sections.is_empty() {
        println!(
            "  {} {}",
            "Failed sections:".red(),
            summary.failed_sections.join(", ")
        );
    }
    match report {
        Some(path) => println!(
            "{} Report written to {} in {:.1}s",
            "[OK]".green(),
            path.display(),
            seconds
        ),
        None => println!("{}", "Nothing to export, no report written.".yellow()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(key: &str, title: &str, section_type: SectionType) -> LibrarySection {
        LibrarySection {
            key: key.to_string(),
            title: title.to_string(),
            section_type,
        }
    }

    #[test]
    fn test_filter_sections() {
        let sections = vec![
            section("1", "Movies", SectionType::Movie),
            section("2", "TV Shows", SectionType::Show),
        ];
        assert_eq!(filter_sections(sections.clone(), &[]).len(), 2);

        let picked = filter_sections(sections, &["tv shows".to_string(), "Anime".to_string()]);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].key, "2");
    }
}
