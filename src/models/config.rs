//! Configuration model.
//!
//! Configuration is read from `config.toml` in the user config directory,
//! then overridden by environment variables (a `.env` file is loaded by the
//! binary before this runs).

use crate::core::fields::{self, DEFAULT_MOVIE_FIELDS, DEFAULT_SHOW_FIELDS};
use crate::core::processor::MAX_WORKERS;
use crate::services::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const PLEX_URL_ENV_VAR: &str = "PLEX_URL";
pub const PLEX_TOKEN_ENV_VAR: &str = "PLEX_TOKEN";
pub const PLEX_EXPORT_DIR_ENV_VAR: &str = "PLEX_EXPORT_DIR";
pub const PLEX_MOVIE_EXPORT_FIELDS_ENV_VAR: &str = "PLEX_MOVIE_EXPORT_FIELDS";
pub const PLEX_SHOW_EXPORT_FIELDS_ENV_VAR: &str = "PLEX_SHOW_EXPORT_FIELDS";
pub const TVMAZE_API_URL_ENV_VAR: &str = "TVMAZE_API_URL";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Plex server configuration.
    pub plex: PlexConfig,
    /// TVMaze configuration.
    pub tvmaze: TvMazeConfig,
    /// Lookup cache configuration.
    pub cache: CacheConfig,
    /// Export configuration.
    pub export: ExportConfig,
}

/// Plex configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlexConfig {
    /// Server URL, e.g. `http://192.168.1.10:32400`.
    pub url: Option<String>,
    /// Authentication token.
    pub token: Option<String>,
    /// Request timeout in seconds.
    pub timeout: u64,
}

/// TVMaze configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TvMazeConfig {
    /// API base URL.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in seconds.
    pub retry_delay: f64,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
}

/// Lookup cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache file; defaults to `.tvmaze_cache.json` in the export directory.
    pub file: Option<PathBuf>,
    /// In-memory LRU capacity.
    pub capacity: usize,
    /// Entries older than this many days are ignored.
    pub max_age_days: i64,
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory for the workbook, cache and logs.
    pub output_dir: PathBuf,
    /// Movie fields in column order.
    pub movie_fields: Vec<String>,
    /// Show fields in column order.
    pub show_fields: Vec<String>,
    /// Upper bound on parallel workers.
    pub max_workers: usize,
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout: 10,
        }
    }
}

impl Default for TvMazeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tvmaze.com".to_string(),
            timeout: 10,
            max_retries: 3,
            retry_delay: 1.0,
            backoff_factor: 2.0,
        }
    }
}

impl TvMazeConfig {
    /// Retry policy described by this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_secs_f64(self.retry_delay.max(0.0)),
            backoff_factor: self.backoff_factor,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            file: None,
            capacity: 256,
            max_age_days: 30,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            movie_fields: DEFAULT_MOVIE_FIELDS.iter().map(|s| s.to_string()).collect(),
            show_fields: DEFAULT_SHOW_FIELDS.iter().map(|s| s.to_string()).collect(),
            max_workers: MAX_WORKERS,
        }
    }
}

/// Outcome of configuration validation.
#[derive(Debug, Clone, Default)]
pub struct Validation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Config {
    /// Path of the persisted lookup cache.
    pub fn cache_file(&self) -> PathBuf {
        self.cache
            .file
            .clone()
            .unwrap_or_else(|| self.export.output_dir.join(".tvmaze_cache.json"))
    }

    /// Directory for log files.
    pub fn log_dir(&self) -> PathBuf {
        self.export.output_dir.join("logs")
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Vec<String> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup and return warnings.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        if let Some(url) = lookup(PLEX_URL_ENV_VAR) {
            self.plex.url = Some(url);
        }
        if let Some(token) = lookup(PLEX_TOKEN_ENV_VAR) {
            self.plex.token = Some(token);
        }
        if let Some(dir) = lookup(PLEX_EXPORT_DIR_ENV_VAR).filter(|d| !d.trim().is_empty()) {
            self.export.output_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup(TVMAZE_API_URL_ENV_VAR) {
            self.tvmaze.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup(PLEX_MOVIE_EXPORT_FIELDS_ENV_VAR) {
            self.export.movie_fields = split_field_list(&raw);
        }
        if let Some(raw) = lookup(PLEX_SHOW_EXPORT_FIELDS_ENV_VAR) {
            self.export.show_fields = split_field_list(&raw);
        }

        let movie_names = fields::movie_registry().names();
        let (movie_fields, warning) = select_fields(
            &self.export.movie_fields,
            &movie_names,
            DEFAULT_MOVIE_FIELDS,
            PLEX_MOVIE_EXPORT_FIELDS_ENV_VAR,
        );
        self.export.movie_fields = movie_fields;
        warnings.extend(warning);

        let show_names = fields::show_registry().names();
        let (show_fields, warning) = select_fields(
            &self.export.show_fields,
            &show_names,
            DEFAULT_SHOW_FIELDS,
            PLEX_SHOW_EXPORT_FIELDS_ENV_VAR,
        );
        self.export.show_fields = show_fields;
        warnings.extend(warning);

        warnings
    }

    /// Validate settings required for an export.
    pub fn validate(&self) -> Validation {
        let mut result = Validation::default();

        match self.plex.url.as_deref().map(str::trim) {
            None | Some("") => result
                .errors
                .push(format!("{} is required", PLEX_URL_ENV_VAR)),
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => result
                .errors
                .push(format!("{} must start with http:// or https://", PLEX_URL_ENV_VAR)),
            Some(_) => {}
        }

        match self.plex.token.as_deref().map(str::trim) {
            None | Some("") => result
                .errors
                .push(format!("{} is required", PLEX_TOKEN_ENV_VAR)),
            Some(token) if token.len() < 10 => result.warnings.push(format!(
                "{} seems too short, verify it's correct",
                PLEX_TOKEN_ENV_VAR
            )),
            Some(_) => {}
        }

        if !self.export.output_dir.is_absolute() {
            result.warnings.push(format!(
                "{} should be an absolute path for clarity",
                PLEX_EXPORT_DIR_ENV_VAR
            ));
        }

        if self.export.max_workers == 0 {
            result
                .errors
                .push("export.max_workers must be at least 1".to_string());
        } else if self.export.max_workers > MAX_WORKERS {
            result.warnings.push(format!(
                "export.max_workers = {} exceeds the limit; using {}",
                self.export.max_workers, MAX_WORKERS
            ));
        }

        result
    }
}

/// Split a comma-separated field list.
pub fn split_field_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keep only known fields, in the requested order; fall back to defaults.
pub fn select_fields(
    requested: &[String],
    available: &[&str],
    defaults: &[&str],
    setting: &str,
) -> (Vec<String>, Option<String>) {
    let selected: Vec<String> = requested
        .iter()
        .filter(|f| available.contains(&f.as_str()))
        .cloned()
        .collect();

    if selected.is_empty() {
        let warning = (!requested.is_empty())
            .then(|| format!("{} contains no valid fields, using defaults", setting));
        (defaults.iter().map(|s| s.to_string()).collect(), warning)
    } else {
        (selected, None)
    }
}

/// Get the configuration directory path.
fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plex_media_export")
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    dirs_config_path().join("config.toml")
}

/// Load configuration from a TOML file, falling back to defaults.
///
/// A missing file is not an error. An unreadable or invalid file yields the
/// defaults plus a warning for the caller to log.
pub fn load_config_from(path: &Path) -> (Config, Option<String>) {
    if !path.exists() {
        return (Config::default(), None);
    }

    let warning = match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => return (config, None),
            Err(e) => format!("Ignoring invalid config file {}: {}", path.display(), e),
        },
        Err(e) => format!("Cannot read config file {}: {}", path.display(), e),
    };
    (Config::default(), Some(warning))
}

/// Load configuration from file and apply environment overrides.
///
/// Returns the warnings collected on the way; logging is usually not set up
/// yet when this runs.
pub fn load_config() -> (Config, Vec<String>) {
    let (mut config, file_warning) = load_config_from(&config_file_path());
    let mut warnings: Vec<String> = file_warning.into_iter().collect();
    warnings.extend(config.apply_env());
    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_overrides_and_field_filtering() {
        let vars = env(&[
            (PLEX_URL_ENV_VAR, "http://plex:32400"),
            (PLEX_TOKEN_ENV_VAR, "abcdefghijkl"),
            (PLEX_SHOW_EXPORT_FIELDS_ENV_VAR, "Genres, Bogus ,Title,"),
        ]);
        let mut config = Config::default();
        let warnings = config.apply_overrides(|k| vars.get(k).cloned());

        assert!(warnings.is_empty());
        assert_eq!(config.export.show_fields, vec!["Genres", "Title"]);
        assert_eq!(config.plex.url.as_deref(), Some("http://plex:32400"));
    }

    #[test]
    fn test_all_invalid_fields_fall_back_to_defaults() {
        let vars = env(&[(PLEX_MOVIE_EXPORT_FIELDS_ENV_VAR, "Nope, , Nothing")]);
        let mut config = Config::default();
        let warnings = config.apply_overrides(|k| vars.get(k).cloned());

        assert_eq!(warnings.len(), 1);
        assert_eq!(config.export.movie_fields.len(), DEFAULT_MOVIE_FIELDS.len());
    }

    #[test]
    fn test_validate_requires_plex_settings() {
        let config = Config::default();
        let validation = config.validate();
        assert_eq!(validation.errors.len(), 2);

        let mut config = Config::default();
        config.plex.url = Some("plex:32400".to_string());
        config.plex.token = Some("short".to_string());
        let validation = config.validate();
        assert_eq!(validation.errors.len(), 1);
        assert!(validation.warnings.iter().any(|w| w.contains(PLEX_TOKEN_ENV_VAR)));
    }

    #[test]
    fn test_validate_warns_on_too_many_workers() {
        let mut config = Config::default();
        config.export.max_workers = 40;
        let validation = config.validate();
        assert!(validation
            .warnings
            .iter()
            .any(|w| w.contains("export.max_workers = 40")));

        config.export.max_workers = 0;
        assert!(config
            .validate()
            .errors
            .iter()
            .any(|e| e.contains("max_workers")));
    }

    #[test]
    fn test_invalid_config_file_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let (config, warning) = load_config_from(&path);
        assert!(warning.is_some());
        assert_eq!(config.export.max_workers, 10);

        let (_, warning) = load_config_from(&dir.path().join("missing.toml"));
        assert!(warning.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str("[tvmaze]\nmax_retries = 5\n").unwrap();
        assert_eq!(config.tvmaze.max_retries, 5);
        assert_eq!(config.tvmaze.timeout, 10);
        assert_eq!(config.cache.capacity, 256);
    }
}
