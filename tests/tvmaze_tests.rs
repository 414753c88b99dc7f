//! Integration tests for the TVMaze client.
//!
//! Tests cover:
//! - IMDB lookup and title search
//! - Episode grouping
//! - Retry and error classification

use plex_media_export::models::catalog::LookupKey;
use plex_media_export::services::retry::RetryPolicy;
use plex_media_export::services::tvmaze::{ShowCatalog, TvMazeClient};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> TvMazeClient {
    TvMazeClient::with_base_url(&server.uri())
        .unwrap()
        .with_retry(RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(5),
            backoff_factor: 2.0,
        })
}

fn episodes() -> serde_json::Value {
    json!([
        {"id": 1, "season": 1, "number": 1},
        {"id": 2, "season": 1, "number": 2},
        {"id": 3, "season": 2, "number": 1},
        {"id": 4, "season": null, "number": null},
        {"id": 5, "season": 0, "number": null}
    ])
}

async fn mount_episodes(server: &MockServer, show_id: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/shows/{}/episodes", show_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(episodes()))
        .mount(server)
        .await;
}

// ========== LOOKUP TESTS ==========

#[tokio::test]
async fn test_lookup_by_imdb_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lookup/shows"))
        .and(query_param("imdb", "tt0903747"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 169, "name": "Breaking Bad"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_episodes(&server, 169).await;

    let info = client(&server)
        .lookup(&LookupKey::imdb("tt0903747"))
        .await
        .unwrap()
        .expect("show should resolve");

    assert_eq!(info.total_seasons, 2);
    assert_eq!(info.episode_count(0), Some(1));
    assert_eq!(info.episode_count(1), Some(2));
    assert_eq!(info.episode_count(2), Some(1));
}

#[tokio::test]
async fn test_unknown_imdb_id_is_confirmed_miss() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lookup/shows"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server).lookup(&LookupKey::imdb("tt0000000")).await;
    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn test_title_search_takes_first_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/shows"))
        .and(query_param("q", "The Office"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"score": 0.9, "show": {"id": 526, "name": "The Office"}},
            {"score": 0.8, "show": {"id": 3, "name": "The Office (UK)"}}
        ])))
        .mount(&server)
        .await;
    mount_episodes(&server, 526).await;

    let info = client(&server).resolve_by_title("The Office").await;
    assert_eq!(info.map(|i| i.total_seasons), Some(2));
}

#[tokio::test]
async fn test_empty_search_is_no_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/shows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = client(&server).lookup(&LookupKey::title("Nothing Like This")).await;
    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn test_show_without_episodes_is_still_a_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lookup/shows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shows/7/episodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let info = client(&server).resolve_by_imdb_id("tt7").await.unwrap();
    assert_eq!(info.total_seasons, 0);
    assert!(info.seasons.is_empty());
}

// ========== RETRY TESTS ==========

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lookup/shows"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lookup/shows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 169})))
        .expect(1)
        .mount(&server)
        .await;
    mount_episodes(&server, 169).await;

    let info = client(&server).resolve_by_imdb_id("tt0903747").await;
    assert_eq!(info.map(|i| i.total_seasons), Some(2));
}

#[tokio::test]
async fn test_exhausted_retries_surface_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/shows"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    let tvmaze = client(&server);
    assert!(tvmaze.lookup(&LookupKey::title("Lost")).await.is_err());
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/shows"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client(&server).resolve_by_title("Lost").await.is_none());
}

#[tokio::test]
async fn test_malformed_payload_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lookup/shows"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server).lookup(&LookupKey::imdb("tt1")).await;
    assert!(result.is_err());
}
