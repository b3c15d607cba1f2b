//! Integration tests for rate-limit backoff
//!
//! These tests verify:
//! - 429 responses and transport failures are retried after the policy delay
//! - Telemetry headers do not need to be present
//! - Bounded policies surface `RetriesExhausted`

mod common;

use bridge_traits::http::{Backoff, RetryPolicy};
use common::{discogs_client, release_url, FakeTime, Reply, ScriptedHttpClient};
use core_metadata::{extract_release, MetadataError, ReleaseReference};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_rate_limit_then_success_waits_sixty_seconds() {
    let http = ScriptedHttpClient::new();
    let url = release_url(42);
    http.rate_limited(&url, "0");
    http.json(&url, 200, json!({"id": 42, "genres": ["Electronic"]}));
    let time = FakeTime::new();

    let client = discogs_client(http.clone(), time.clone(), RetryPolicy::default());
    let payload = client
        .fetch_release(&ReleaseReference::new(url.clone()))
        .await
        .unwrap();

    assert_eq!(extract_release(&payload).unwrap().id(), 42);
    assert_eq!(time.sleeps(), vec![Duration::from_secs(60)]);
    assert_eq!(http.request_urls(), vec![url.clone(), url]);
}

#[tokio::test]
async fn test_unbounded_policy_never_surfaces_rate_limit() {
    let http = ScriptedHttpClient::new();
    let url = release_url(1);
    for _ in 0..25 {
        http.rate_limited(&url, "0");
    }
    http.json(&url, 200, json!({"id": 1}));
    let time = FakeTime::new();

    let client = discogs_client(http.clone(), time.clone(), RetryPolicy::default());
    let result = client.fetch_release(&ReleaseReference::new(url)).await;

    assert!(result.is_ok());
    assert_eq!(time.sleeps().len(), 25);
    assert_eq!(http.requests().len(), 26);
}

#[tokio::test]
async fn test_transport_failure_is_retried() {
    let http = ScriptedHttpClient::new();
    let url = release_url(3);
    http.reply(&url, Reply::TransportError("connection reset".to_string()));
    http.json(&url, 200, json!({"id": 3}));
    let time = FakeTime::new();

    let client = discogs_client(http, time.clone(), RetryPolicy::default());
    let result = client.fetch_release(&ReleaseReference::new(url)).await;

    assert!(result.is_ok());
    assert_eq!(time.sleeps(), vec![Duration::from_secs(60)]);
}

#[tokio::test]
async fn test_rate_limit_without_telemetry_headers() {
    let http = ScriptedHttpClient::new();
    let url = release_url(4);
    http.reply(
        &url,
        Reply::Response(bridge_traits::HttpResponse::new(429, "")),
    );
    http.json(&url, 200, json!({"id": 4}));

    let client = discogs_client(http, FakeTime::new(), RetryPolicy::default());

    assert!(client
        .fetch_release(&ReleaseReference::new(url))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_bounded_policy_exhausts() {
    let http = ScriptedHttpClient::new();
    let url = release_url(5);
    http.rate_limited(&url, "0");
    let time = FakeTime::new();

    let policy = RetryPolicy::bounded(4, Backoff::Fixed(Duration::from_secs(2)));
    let client = discogs_client(http.clone(), time.clone(), policy);
    let result = client.fetch_release(&ReleaseReference::new(url.clone())).await;

    match result {
        Err(MetadataError::RetriesExhausted {
            url: failed,
            attempts,
            last_error,
        }) => {
            assert_eq!(failed, url);
            assert_eq!(attempts, 4);
            assert_eq!(last_error, "HTTP 429");
        }
        other => panic!("expected retries exhausted, got {:?}", other),
    }
    assert_eq!(http.requests().len(), 4);
    assert_eq!(time.sleeps().len(), 3);
}

#[tokio::test]
async fn test_max_elapsed_stops_retrying() {
    let http = ScriptedHttpClient::new();
    let url = release_url(6);
    http.rate_limited(&url, "0");
    let time = FakeTime::new();

    let policy =
        RetryPolicy::unbounded(Duration::from_secs(60)).with_max_elapsed(Duration::from_secs(150));
    let client = discogs_client(http.clone(), time.clone(), policy);
    let result = client.fetch_release(&ReleaseReference::new(url)).await;

    assert!(matches!(
        result,
        Err(MetadataError::RetriesExhausted { attempts: 3, .. })
    ));
    assert_eq!(time.sleeps().len(), 2);
}

#[tokio::test]
async fn test_exponential_backoff_delays() {
    let http = ScriptedHttpClient::new();
    let url = release_url(7);
    for _ in 0..3 {
        http.rate_limited(&url, "0");
    }
    http.json(&url, 200, json!({"id": 7}));
    let time = FakeTime::new();

    let policy = RetryPolicy::bounded(
        10,
        Backoff::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(3),
        },
    );
    let client = discogs_client(http, time.clone(), policy);
    client
        .fetch_release(&ReleaseReference::new(url))
        .await
        .unwrap();

    assert_eq!(
        time.sleeps(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(3)
        ]
    );
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let http = ScriptedHttpClient::new();
    let url = release_url(8);
    http.json(&url, 503, json!({"message": "down"}));
    let time = FakeTime::new();

    let client = discogs_client(http.clone(), time.clone(), RetryPolicy::default());
    let result = client.fetch_release(&ReleaseReference::new(url)).await;

    assert!(matches!(result, Err(MetadataError::Http { status: 503, .. })));
    assert!(time.sleeps().is_empty());
    assert_eq!(http.requests().len(), 1);
}
