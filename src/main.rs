//! Plex Media Export CLI
//!
//! A command-line tool that exports Plex libraries to Excel and checks TV
//! shows for missing episodes against TVMaze.

use clap::Parser;
use plex_media_export::cli::{
    args::{CacheAction, Cli, Commands},
    commands::{cache, export, fields, lookup},
};
use plex_media_export::models::config;
use plex_media_export::preflight;
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Settings from .env, the config file and the environment
    dotenvy::dotenv().ok();
    let (config, warnings) = config::load_config();

    // Initialize logging
    let log_file = init_logging(cli.verbose, &config.log_dir());
    if let Some(path) = log_file {
        tracing::debug!("Writing log file {}", path.display());
    }
    for warning in warnings {
        tracing::warn!("{}", warning);
    }

    // Run the appropriate command
    match cli.command {
        Commands::Export {
            output_dir,
            section,
            no_cache,
        } => {
            // Run preflight checks unless skipped
            if !cli.skip_preflight {
                run_preflight_checks(&config).await?;
            }

            let options = export::ExportOptions {
                output_dir,
                sections: section,
                no_cache,
            };
            export::export(&config, options).await?;
        }

        Commands::Lookup { imdb, title } => {
            lookup::lookup(&config, imdb.as_deref(), title.as_deref()).await?;
        }

        Commands::Cache { action } => match action {
            CacheAction::Stats => {
                cache::stats(&config).await?;
            }
            CacheAction::Clear => {
                cache::clear(&config).await?;
            }
        },

        Commands::Fields => {
            fields::list_fields(&config);
        }
    }

    Ok(())
}

/// Initialize the logging system.
///
/// Console output follows `--verbose`. A debug-level log file is written to
/// `log_dir` when the directory can be created; its path is returned.
fn init_logging(verbose: bool, log_dir: &Path) -> Option<PathBuf> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("plex_media_export=debug")
    } else {
        EnvFilter::new("plex_media_export=info")
    };
    let console = fmt::layer()
        .with_target(false)
        .without_time()
        .with_filter(filter);

    let log_path = log_dir.join(format!(
        "plex_export_{}.log",
        chrono::Local::now().format("%Y%m%d")
    ));
    let log_file = std::fs::create_dir_all(log_dir).and_then(|_| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
    });

    match log_file {
        Ok(file) => {
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .with_filter(EnvFilter::new("plex_media_export=debug"));
            tracing_subscriber::registry()
                .with(console)
                .with(file_layer)
                .init();
            Some(log_path)
        }
        Err(e) => {
            tracing_subscriber::registry().with(console).init();
            tracing::warn!("File logging disabled ({}): {}", log_path.display(), e);
            None
        }
    }
}

/// Run preflight checks and exit if a required one fails.
async fn run_preflight_checks(config: &config::Config) -> anyhow::Result<()> {
    use colored::Colorize;

    println!("{}", "Running preflight checks...".bold());
    println!();

    let results = preflight::run_preflight_checks(config).await?;
    preflight::print_results(&results);

    println!();

    if !preflight::required_passed(&results) {
        anyhow::bail!("Preflight checks failed. Fix the issues above and try again.");
    }
    if !preflight::all_passed(&results) {
        println!(
            "{}",
            "Continuing without TVMaze; season completeness will be unknown.".yellow()
        );
        println!();
    }

    Ok(())
}
