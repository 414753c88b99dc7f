//! External service clients.

pub mod plex;
pub mod retry;
pub mod tvmaze;

pub use plex::PlexClient;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use tvmaze::{ShowCatalog, TvMazeClient};
