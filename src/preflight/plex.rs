//! Plex server preflight check.

use super::CheckResult;
use crate::models::config::PlexConfig;
use crate::services::plex::PlexClient;
use crate::Error;

/// Check that the Plex server answers with the configured token.
pub async fn check(config: &PlexConfig) -> CheckResult {
    let client = match PlexClient::new(config) {
        Ok(client) => client,
        Err(Error::PlexUrlMissing) => {
            return CheckResult::fail(
                "Plex",
                "server URL not configured",
                "Set PLEX_URL in your .env file or environment",
            )
        }
        Err(Error::PlexTokenMissing) => {
            return CheckResult::fail(
                "Plex",
                "token not configured",
                "Set PLEX_TOKEN in your .env file or environment",
            )
        }
        Err(e) => {
            return CheckResult::fail("Plex", &e.to_string(), "Check your Plex settings")
        }
    };

    match client.server_identity().await {
        Ok(server) => {
            let message = match server.version {
                Some(version) => format!("connected to '{}' ({})", server.name, version),
                None => format!("connected to '{}'", server.name),
            };
            CheckResult::ok("Plex", &message)
        }
        Err(Error::PlexStatus { status: 401, .. }) => CheckResult::fail(
            "Plex",
            "token rejected",
            "Check your PLEX_TOKEN",
        ),
        Err(_) => CheckResult::fail(
            "Plex",
            "connection failed",
            "Check PLEX_URL and that the server is running",
        ),
    }
}
