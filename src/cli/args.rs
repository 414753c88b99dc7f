//! Command line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Plex Media Export - Export your Plex libraries to Excel
#[derive(Parser, Debug)]
#[command(name = "plex-media-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip preflight checks
    #[arg(long, global = true)]
    pub skip_preflight: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export movie and show libraries to an .xlsx report
    Export {
        /// Directory for the report (defaults to PLEX_EXPORT_DIR)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Only export these library sections (repeatable)
        #[arg(short, long, value_name = "NAME")]
        section: Vec<String>,

        /// Ignore and do not update the TVMaze lookup cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Look up one show on TVMaze and print its season counts
    Lookup {
        /// IMDB ID, e.g. tt0903747
        #[arg(long, value_name = "ID")]
        imdb: Option<String>,

        /// Show title, used when the IMDB ID is missing or not found
        #[arg(short, long, value_name = "TITLE")]
        title: Option<String>,
    },

    /// Inspect or clear the TVMaze lookup cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// List the fields available for export
    Fields,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache statistics
    Stats,
    /// Delete every cached lookup
    Clear,
}
