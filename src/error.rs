//! Error types for the Plex media exporter.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Plex media exporter.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Plex URL not configured. Set PLEX_URL in your .env file or environment")]
    PlexUrlMissing,

    #[error("Plex token not configured. Set PLEX_TOKEN in your .env file or environment")]
    PlexTokenMissing,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // File system errors
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // Remote errors
    #[error("Plex request failed with status {status}: {url}")]
    PlexStatus { status: u16, url: String },

    #[error("TVMaze request failed with status {status}: {url}")]
    CatalogStatus { status: u16, url: String },

    // Field extraction errors
    #[error("Field '{field}' could not be extracted: {reason}")]
    Field { field: String, reason: String },

    // Report errors
    #[error("Spreadsheet error: {0}")]
    Report(#[from] rust_xlsxwriter::XlsxError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Create a field extraction error.
    pub fn field<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Error::Field {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure is worth retrying.
    ///
    /// Network-level failures, server errors and rate limiting are transient.
    /// Client errors and malformed payloads are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            Error::CatalogStatus { status, .. } | Error::PlexStatus { status, .. } => {
                *status >= 500 || *status == 429
            }
            _ => false,
        }
    }
}
