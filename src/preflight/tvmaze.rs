//! TVMaze API preflight check.

use super::CheckResult;
use crate::models::config::TvMazeConfig;
use crate::services::tvmaze::TvMazeClient;

/// Check if the TVMaze API is reachable.
pub async fn check(config: &TvMazeConfig) -> CheckResult {
    match TvMazeClient::new(config) {
        Ok(client) => match client.verify_connection().await {
            Ok(true) => CheckResult::ok("TVMaze API", "connected"),
            Ok(false) => CheckResult::fail(
                "TVMaze API",
                "unexpected response",
                "Check TVMAZE_API_URL",
            ),
            Err(_) => CheckResult::fail(
                "TVMaze API",
                "connection failed",
                "Check your network connection. Completeness columns will show '?' without it",
            ),
        },
        Err(e) => CheckResult::fail("TVMaze API", &e.to_string(), "Check TVMAZE_API_URL"),
    }
}
