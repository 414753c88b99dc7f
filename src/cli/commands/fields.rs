//! Fields command implementation.

use crate::core::fields::{movie_registry, show_registry, DEFAULT_MOVIE_FIELDS, DEFAULT_SHOW_FIELDS};
use crate::models::config::Config;
use colored::Colorize;

fn print_group(title: &str, names: &[&str], defaults: &[&str], selected: &[String]) {
    println!("{}", title.bold().cyan());
    for name in names {
        let marker = if selected.iter().any(|s| s == name) {
            "*".green().to_string()
        } else {
            " ".to_string()
        };
        let default = if defaults.contains(name) { " (default)" } else { "" };
        println!("  {} {}{}", marker, name, default.dimmed());
    }
    println!();
}

/// List every exportable field. Fields selected by the current
/// configuration are marked with `*`.
pub fn list_fields(config: &Config) {
    print_group(
        "Movie fields (PLEX_MOVIE_EXPORT_FIELDS)",
        &movie_registry().names(),
        DEFAULT_MOVIE_FIELDS,
        &config.export.movie_fields,
    );
    print_group(
        "Show fields (PLEX_SHOW_EXPORT_FIELDS)",
        &show_registry().names(),
        DEFAULT_SHOW_FIELDS,
        &config.export.show_fields,
    );
    println!("Show sheets always add series and per-season completeness columns.");
}
